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

use std::str::FromStr;
use std::sync::Arc;

use bursar_secrets::CredentialCipher;
use db::DatabaseError;
use sqlx::PgPool;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use switchover::MigrationEngine;
use switchover::backup::BackupGenerator;
use switchover::config::SwitchoverConfig;
use switchover::history::SwitchHistoryLog;
use switchover::maintenance::MaintenanceGate;
use switchover::postgres::PgConnector;
use switchover::registry::ConnectionRegistry;
use switchover::store::PgSwitchoverStore;

use crate::cfg::cli_options::{CliOptions, OutputFormat};
use crate::errors::{CliError, CliResult};

// RuntimeContext is passed to every dispatch handler. It's built
// once at startup from the configuration and the global options.
pub struct RuntimeContext {
    pub pool: PgPool,
    /// For connections that must stay out of `pool`, like the one holding the switch lock
    pub control_options: PgConnectOptions,
    pub engine: MigrationEngine,
    pub config: RuntimeConfig,
}

// RuntimeConfig holds the global options a command handler may need.
pub struct RuntimeConfig {
    pub format: OutputFormat,
    pub actor: Option<String>,
    pub default_batch_size: usize,
}

impl RuntimeContext {
    pub async fn connect(config: &SwitchoverConfig, options: &CliOptions) -> CliResult<Self> {
        let Some(url) = config.control_database_url.as_deref() else {
            return Err(CliError::GenericError(
                "control_database_url is not configured (set BURSAR_CONTROL_DATABASE_URL)"
                    .to_string(),
            ));
        };
        let control_options = PgConnectOptions::from_str(url).map_err(|e| {
            CliError::GenericError(format!("control_database_url is invalid: {e}"))
        })?;
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.connect_timeout)
            .connect_with(control_options.clone())
            .await
            .map_err(DatabaseError::acquire)?;

        let cipher = Arc::new(CredentialCipher::load(
            config.credential_key.as_deref(),
            config.credential_key_path.as_deref(),
        )?);
        let store = Arc::new(PgSwitchoverStore::new(pool.clone()));
        let connector = Arc::new(PgConnector::new(
            config.connect_timeout,
            config.max_connections,
            config.default_batch_size,
        ));
        let registry = Arc::new(ConnectionRegistry::new(store.clone(), cipher, connector));
        let engine = MigrationEngine::new(
            registry,
            MaintenanceGate::new(store.clone()),
            SwitchHistoryLog::new(store),
            BackupGenerator::new(config.backup_dir.clone()),
        );

        Ok(Self {
            pool,
            control_options,
            engine,
            config: RuntimeConfig {
                format: options.format,
                actor: options.actor.clone(),
                default_batch_size: config.default_batch_size,
            },
        })
    }
}
