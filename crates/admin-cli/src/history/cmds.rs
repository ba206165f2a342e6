/*
 * SPDX-FileCopyrightText: Copyright (c) 2026 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
 * SPDX-License-Identifier: LicenseRef-NvidiaProprietary
 *
 * NVIDIA CORPORATION, its affiliates and licensors retain all intellectual
 * property and proprietary rights in and to this material, related
 * documentation and any modifications thereto. Any use, reproduction,
 * disclosure or distribution of this material and related documentation
 * without an express license agreement from NVIDIA CORPORATION or
 * its affiliates is strictly prohibited.
 */

use model::switch_history::SwitchAttempt;
use prettytable::{Table, row};
use switchover::history::SwitchHistoryLog;

use super::Opts;
use crate::cfg::cli_options::OutputFormat;
use crate::errors::CliResult;
use crate::output;

pub async fn history(opts: Opts, log: &SwitchHistoryLog, format: OutputFormat) -> CliResult<()> {
    let page = log.list(opts.page, opts.page_size).await?;
    if format == OutputFormat::Json {
        return output::print_json(&page);
    }

    if page.attempts.is_empty() {
        println!("No switch attempts on page {} ({} in total)", page.page, page.total);
        return Ok(());
    }
    attempts_table(&page.attempts).printstd();
    println!(
        "Page {} of {} ({} attempts)",
        page.page, page.total_pages, page.total
    );
    Ok(())
}

fn attempts_table(attempts: &[SwitchAttempt]) -> Table {
    let mut table = Table::new();
    table.set_titles(row![
        "ID", "Started", "Kind", "Status", "From", "To", "Rows", "Duration (ms)", "Actor", "Error"
    ]);
    for attempt in attempts {
        table.add_row(row![
            attempt.id,
            output::timestamp(Some(attempt.started_at)),
            attempt.kind,
            attempt.status,
            output::optional(attempt.source_connection_id),
            attempt.target_connection_id,
            attempt.total_rows,
            attempt.duration_ms,
            output::optional(attempt.actor.as_ref()),
            output::optional(attempt.error_message.as_ref()),
        ]);
    }
    table
}
