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

use db::DatabaseError;
use model::switchover::{SwitchOptions, SwitchResult};
use prettytable::{Table, row};
use sqlx::postgres::PgConnectOptions;
use sqlx::{Connection, PgConnection};

use super::Opts;
use crate::cfg::cli_options::OutputFormat;
use crate::cfg::runtime::RuntimeContext;
use crate::errors::{CliError, CliResult};
use crate::output;

impl Opts {
    pub fn switch_options(&self, default_batch_size: usize) -> SwitchOptions {
        SwitchOptions {
            create_backup: !self.no_backup,
            tables: self.tables.clone(),
            batch_size: self.batch_size.unwrap_or(default_batch_size),
            validate_after_migration: !self.skip_validation,
            verify_checksums: self.verify_checksums,
        }
    }
}

pub async fn switch(opts: Opts, ctx: &RuntimeContext) -> CliResult<()> {
    let options = opts.switch_options(ctx.config.default_batch_size);
    let actor = ctx.config.actor.as_deref();

    let result = with_switch_lock(&ctx.control_options, async {
        ctx.engine
            .switch_database(opts.target, options, actor)
            .await
    })
    .await?;
    report(result, ctx.config.format)
}

/// Runs `switch` while holding the control database's switch lock.
///
/// The lock lives on its own connection outside the control pool, so the engine keeps every
/// pooled connection for itself.
pub async fn with_switch_lock<F, T>(options: &PgConnectOptions, switch: F) -> CliResult<T>
where
    F: Future<Output = T>,
{
    let mut conn = PgConnection::connect_with(options)
        .await
        .map_err(DatabaseError::acquire)?;
    if !db::switch_lock::try_acquire(&mut conn).await? {
        return Err(CliError::SwitchInProgress);
    }

    let result = switch.await;

    if let Err(e) = db::switch_lock::release(&mut conn).await {
        // the lock goes away with the session at the latest
        tracing::warn!(error = %e, "Unable to release the switch lock");
    }
    if let Err(e) = conn.close().await {
        tracing::debug!(error = %e, "Unable to close the switch lock connection");
    }
    Ok(result)
}

/// Prints the outcome. A failed switch is an error so the exit code reflects it.
pub fn report(result: SwitchResult, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => output::print_json(&result)?,
        OutputFormat::AsciiTable => {
            println!("{}", result.message);
            if let Some(details) = &result.details {
                if !details.migrated_tables.is_empty() {
                    let mut table = Table::new();
                    table.set_titles(row!["Table", "Rows", "Duration (ms)"]);
                    for migrated in &details.migrated_tables {
                        table.add_row(row![migrated.table, migrated.rows, migrated.duration_ms]);
                    }
                    table.printstd();
                }
                if let Some(path) = &details.backup_path {
                    println!("Backup: {path}");
                }
                if let Some(passed) = details.validation_passed {
                    println!("Validation passed: {passed}");
                }
                println!("Duration: {} ms", details.total_duration_ms);
            }
        }
    }

    if result.success {
        Ok(())
    } else {
        Err(CliError::SwitchFailed(result.message))
    }
}
