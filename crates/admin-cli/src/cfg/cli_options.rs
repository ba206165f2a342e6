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

use std::path::PathBuf;

use clap::{ArgAction, Parser, ValueEnum};

use crate::{connection, history, maintenance, migrate, rollback, switch};

#[derive(Parser, Debug)]
#[clap(name = "bursar-admin-cli")]
#[clap(author, version, about = "Manage database connections and switch the live database")]
pub struct CliOptions {
    #[clap(
        long,
        short,
        global = true,
        env = "BURSAR_CONFIG",
        help = "Path to a TOML configuration file"
    )]
    pub config: Option<PathBuf>,

    #[clap(
        long,
        short,
        global = true,
        action = ArgAction::Count,
        help = "Raise the log level, repeat for more (-d debug, -dd trace)"
    )]
    pub debug: u8,

    #[clap(
        long,
        short,
        global = true,
        value_enum,
        default_value_t = OutputFormat::AsciiTable,
        help = "Output format"
    )]
    pub format: OutputFormat,

    #[clap(
        long,
        global = true,
        env = "BURSAR_ACTOR",
        help = "Operator name recorded on switches and new connections"
    )]
    pub actor: Option<String>,

    #[clap(subcommand)]
    pub commands: CliCommand,
}

#[derive(Parser, Debug)]
#[clap(rename_all = "kebab_case")]
pub enum CliCommand {
    #[clap(about = "Create or upgrade the control database schema")]
    Migrate(migrate::Opts),
    #[clap(about = "Manage registered database connections", subcommand)]
    Connection(connection::Cmd),
    #[clap(about = "Move the deployment to another database connection")]
    Switch(switch::Opts),
    #[clap(about = "Switch back to the connection that was active before the last switch")]
    Rollback(rollback::Opts),
    #[clap(about = "Show past switch attempts")]
    History(history::Opts),
    #[clap(about = "Inspect or toggle maintenance mode", subcommand)]
    Maintenance(maintenance::Cmd),
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    AsciiTable,
    Json,
}

impl CliOptions {
    pub fn load() -> Self {
        Self::parse()
    }
}
