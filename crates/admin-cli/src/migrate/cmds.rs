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

use db::migrations::MIGRATOR;
use prettytable::{Table, row};
use serde::Serialize;
use sqlx::PgPool;

use super::Opts;
use crate::cfg::cli_options::OutputFormat;
use crate::errors::CliResult;
use crate::output;

#[derive(Serialize)]
struct BundledMigration {
    version: i64,
    description: String,
}

pub async fn migrate(pool: &PgPool, opts: &Opts, format: OutputFormat) -> CliResult<()> {
    if opts.list {
        let migrations: Vec<BundledMigration> = MIGRATOR
            .iter()
            .map(|m| BundledMigration {
                version: m.version,
                description: m.description.to_string(),
            })
            .collect();
        return output::print(format, &migrations, || {
            let mut table = Table::new();
            table.set_titles(row!["Version", "Description"]);
            for migration in &migrations {
                table.add_row(row![migration.version, migration.description]);
            }
            table
        });
    }

    db::migrations::migrate(pool)
        .await
        .map_err(db::DatabaseError::from)?;
    println!("Control database schema is up to date");
    Ok(())
}
