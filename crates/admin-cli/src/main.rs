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

mod cfg;
mod connection;
mod errors;
mod history;
mod maintenance;
mod migrate;
mod output;
mod rollback;
mod switch;

use cfg::cli_options::{CliCommand, CliOptions};
use cfg::dispatch::Dispatch;
use cfg::runtime::RuntimeContext;
use switchover::config::SwitchoverConfig;
use tracing::metadata::LevelFilter;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::prelude::*;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let options = CliOptions::load();
    setup_logging(options.debug)?;

    let config = SwitchoverConfig::load(options.config.as_deref())?;
    tracing::debug!(?config, "Loaded configuration");
    let ctx = RuntimeContext::connect(&config, &options).await?;

    match options.commands {
        CliCommand::Migrate(opts) => opts.dispatch(ctx).await?,
        CliCommand::Connection(cmd) => cmd.dispatch(ctx).await?,
        CliCommand::Switch(opts) => opts.dispatch(ctx).await?,
        CliCommand::Rollback(opts) => opts.dispatch(ctx).await?,
        CliCommand::History(opts) => opts.dispatch(ctx).await?,
        CliCommand::Maintenance(cmd) => cmd.dispatch(ctx).await?,
    }
    Ok(())
}

fn setup_logging(debug: u8) -> eyre::Result<()> {
    let level = match debug {
        0 => LevelFilter::INFO,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    let env_filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy()
        .add_directive("sqlx=warn".parse()?);

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().compact().with_writer(std::io::stderr))
        .with(env_filter)
        .try_init()?;
    Ok(())
}
