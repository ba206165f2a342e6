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

use model::connection::{ConnectionRecord, ConnectionTestReport};
use prettytable::{Table, row};
use switchover::registry::{ConnectionRegistry, ConnectionUpdate, NewConnection};

use super::args::{ConnectionSelector, CreateConnection, UpdateConnection};
use crate::cfg::cli_options::OutputFormat;
use crate::errors::{CliError, CliResult};
use crate::output;

pub async fn create(
    args: CreateConnection,
    registry: &ConnectionRegistry,
    actor: Option<&str>,
    format: OutputFormat,
) -> CliResult<()> {
    let record = registry
        .create(NewConnection {
            name: args.name,
            connection_string: args.url,
            environment: args.environment,
            created_by: actor.map(str::to_string),
        })
        .await?;
    show_record(&record, format)
}

pub async fn list(registry: &ConnectionRegistry, format: OutputFormat) -> CliResult<()> {
    let records = registry.list().await?;
    if records.is_empty() && format == OutputFormat::AsciiTable {
        println!("No database connections registered");
        return Ok(());
    }
    output::print(format, &records, || {
        let mut table = Table::new();
        table.set_titles(row![
            "ID",
            "Name",
            "Environment",
            "Active",
            "Last Switched",
            "Last Test"
        ]);
        for record in &records {
            table.add_row(row![
                record.id,
                record.name,
                record.environment,
                if record.is_active { "*" } else { "" },
                output::timestamp(record.last_switched_at),
                output::optional(record.last_test_status),
            ]);
        }
        table
    })
}

pub async fn show(
    args: ConnectionSelector,
    registry: &ConnectionRegistry,
    format: OutputFormat,
) -> CliResult<()> {
    let record = registry.get(args.id).await?;
    show_record(&record, format)
}

pub async fn update(
    args: UpdateConnection,
    registry: &ConnectionRegistry,
    format: OutputFormat,
) -> CliResult<()> {
    let record = registry
        .update(
            args.id,
            ConnectionUpdate {
                name: args.name,
                connection_string: args.url,
                environment: args.environment,
            },
        )
        .await?;
    show_record(&record, format)
}

pub async fn delete(args: ConnectionSelector, registry: &ConnectionRegistry) -> CliResult<()> {
    registry.delete(args.id).await?;
    println!("Connection {} deleted", args.id);
    Ok(())
}

pub async fn test(
    args: ConnectionSelector,
    registry: &ConnectionRegistry,
    format: OutputFormat,
) -> CliResult<()> {
    let report = registry.test(args.id).await?;
    output::print(format, &report, || report_table(&report))?;
    if report.succeeded() {
        Ok(())
    } else {
        Err(CliError::TestFailed(report.message))
    }
}

pub async fn active(registry: &ConnectionRegistry, format: OutputFormat) -> CliResult<()> {
    match registry.get_active().await? {
        Some(record) => show_record(&record, format),
        None if format == OutputFormat::Json => output::print_json(&None::<ConnectionRecord>),
        None => {
            println!("No connection is active");
            Ok(())
        }
    }
}

/// The encrypted connection string never leaves the control database through this table
fn show_record(record: &ConnectionRecord, format: OutputFormat) -> CliResult<()> {
    output::print(format, record, || {
        output::detail_table(vec![
            ("ID", record.id.to_string()),
            ("Name", record.name.clone()),
            ("Environment", record.environment.to_string()),
            ("Active", record.is_active.to_string()),
            ("Created By", output::optional(record.created_by.as_ref())),
            ("Created", output::timestamp(Some(record.created_at))),
            ("Updated", output::timestamp(Some(record.updated_at))),
            ("Last Switched", output::timestamp(record.last_switched_at)),
            ("Last Switched By", output::optional(record.last_switched_by.as_ref())),
            ("Last Test", output::optional(record.last_test_status)),
            ("Last Test Message", output::optional(record.last_test_message.as_ref())),
            ("Last Tested", output::timestamp(record.last_tested_at)),
        ])
    })
}

fn report_table(report: &ConnectionTestReport) -> Table {
    output::detail_table(vec![
        ("Connection", report.connection_id.to_string()),
        ("Status", report.status.to_string()),
        (
            "Latency",
            report
                .latency_ms
                .map(|ms| format!("{ms} ms"))
                .unwrap_or_default(),
        ),
        ("Server Version", output::optional(report.server_version.as_ref())),
        ("Message", report.message.clone()),
        ("Tested", output::timestamp(Some(report.tested_at))),
    ])
}
