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

//! Rendering shared by the commands.

use chrono::{DateTime, Utc};
use prettytable::{Table, row};
use serde::Serialize;

use crate::cfg::cli_options::OutputFormat;
use crate::errors::CliResult;

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Prints `value` as JSON, or renders it as a table otherwise
pub fn print<T: Serialize + ?Sized>(
    format: OutputFormat,
    value: &T,
    table: impl FnOnce() -> Table,
) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(value),
        OutputFormat::AsciiTable => {
            table().printstd();
            Ok(())
        }
    }
}

pub fn timestamp(at: Option<DateTime<Utc>>) -> String {
    at.map(|at| at.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_default()
}

pub fn optional<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Two column key/value table for a single record
pub fn detail_table(rows: Vec<(&str, String)>) -> Table {
    let mut table = Table::new();
    for (key, value) in rows {
        table.add_row(row![key, value]);
    }
    table
}
