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

//! The switchover protocol.
//!
//! ```text
//! Idle -> ValidatingRequest -> ProbingTarget -> BackingUp -> Migrating -> Validating
//!      -> SyncingSequences -> Activating -> Completed
//! ```
//!
//! Any failure after request validation moves to RollingBack and then Failed. Request
//! validation failures are returned to the caller without a trace in the switch history;
//! every later outcome is recorded exactly once.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use futures::FutureExt;
use model::connection::{ConnectionId, ConnectionRecord};
use model::switch_history::{MigratedTable, NewSwitchAttempt, SwitchKind, SwitchStatus};
use model::switchover::{SwitchDetails, SwitchOptions, SwitchResult};
use model::table::BusinessTable;
use strum_macros::{AsRefStr, Display};

use crate::backup::{BackupGenerator, ROLLBACK_BACKUP_PURPOSE, SWITCH_BACKUP_PURPOSE};
use crate::client::{ClientError, RelationalClient};
use crate::error::{SwitchoverError, SwitchoverResult};
use crate::history::SwitchHistoryLog;
use crate::maintenance::MaintenanceGate;
use crate::registry::ConnectionRegistry;
use crate::sql::{Column, rows_digest};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum SwitchPhase {
    #[default]
    Idle,
    ValidatingRequest,
    ProbingTarget,
    BackingUp,
    Migrating,
    Validating,
    SyncingSequences,
    Activating,
    Completed,
    RollingBack,
    Failed,
}

/// A request that passed validation
struct SwitchRequest {
    kind: SwitchKind,
    source: Option<ConnectionRecord>,
    target: ConnectionRecord,
    tables: Vec<BusinessTable>,
}

/// What a switch has done so far. Survives failures and panics of the protocol so the
/// outcome can be cleaned up and recorded.
#[derive(Default)]
struct SwitchProgress {
    phase: SwitchPhase,
    gate_engaged: bool,
    source_client: Option<Arc<dyn RelationalClient>>,
    backup_path: Option<PathBuf>,
    migrated_tables: Vec<MigratedTable>,
    validation_passed: Option<bool>,
}

impl SwitchProgress {
    fn enter(&mut self, phase: SwitchPhase) {
        tracing::info!(from = %self.phase, to = %phase, "Switch phase");
        self.phase = phase;
    }
}

/// Source state a migrated table is validated against
struct TableSnapshot {
    table: BusinessTable,
    columns: Vec<Column>,
    rows: u64,
    digest: Option<String>,
}

pub struct MigrationEngine {
    registry: Arc<ConnectionRegistry>,
    gate: MaintenanceGate,
    history: SwitchHistoryLog,
    backups: BackupGenerator,
}

impl MigrationEngine {
    pub fn new(
        registry: Arc<ConnectionRegistry>,
        gate: MaintenanceGate,
        history: SwitchHistoryLog,
        backups: BackupGenerator,
    ) -> Self {
        Self {
            registry,
            gate,
            history,
            backups,
        }
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    pub fn gate(&self) -> &MaintenanceGate {
        &self.gate
    }

    pub fn history(&self) -> &SwitchHistoryLog {
        &self.history
    }

    /// Moves the deployment from the active connection to `target`
    #[tracing::instrument(skip(self, options))]
    pub async fn switch_database(
        &self,
        target: ConnectionId,
        options: SwitchOptions,
        actor: Option<&str>,
    ) -> SwitchResult {
        match self
            .validate_request(SwitchKind::Switch, target, &options)
            .await
        {
            Ok(request) => self.run(request, &options, actor).await,
            Err(e) => reject(e),
        }
    }

    /// Switches back to the source of the most recent successful switch, as long as that
    /// switch's target is still the active connection
    #[tracing::instrument(skip(self, options))]
    pub async fn rollback_last_switch(
        &self,
        options: SwitchOptions,
        actor: Option<&str>,
    ) -> SwitchResult {
        match self.rollback_request(&options).await {
            Ok(request) => self.run(request, &options, actor).await,
            Err(e) => reject(e),
        }
    }

    async fn rollback_request(&self, options: &SwitchOptions) -> SwitchoverResult<SwitchRequest> {
        let Some(last) = self.history.latest_successful().await? else {
            return Err(SwitchoverError::NothingToRollBack(
                "no switch has succeeded yet".to_string(),
            ));
        };
        let Some(source) = last.source_connection_id else {
            return Err(SwitchoverError::NothingToRollBack(format!(
                "switch {} activated connection {} without a previous connection",
                last.id, last.target_connection_id
            )));
        };
        let active = self.registry.get_active().await?;
        if active.as_ref().map(|a| a.id) != Some(last.target_connection_id) {
            return Err(SwitchoverError::NothingToRollBack(format!(
                "connection {} activated by switch {} is no longer active",
                last.target_connection_id, last.id
            )));
        }
        self.validate_request(SwitchKind::Rollback, source, options)
            .await
    }

    async fn validate_request(
        &self,
        kind: SwitchKind,
        target: ConnectionId,
        options: &SwitchOptions,
    ) -> SwitchoverResult<SwitchRequest> {
        tracing::debug!(phase = %SwitchPhase::ValidatingRequest, %kind, "Switch phase");
        let source = self.registry.get_active().await?;
        if source.as_ref().is_some_and(|s| s.id == target) {
            return Err(SwitchoverError::SameTarget(target));
        }
        let target = self
            .registry
            .find(target)
            .await?
            .ok_or(SwitchoverError::UnknownConnection(target))?;
        if options.batch_size == 0 {
            return Err(SwitchoverError::InvalidOptions(
                "batch size must be at least 1".to_string(),
            ));
        }
        if options.tables.as_ref().is_some_and(Vec::is_empty) {
            return Err(SwitchoverError::InvalidOptions(
                "no tables selected".to_string(),
            ));
        }

        Ok(SwitchRequest {
            kind,
            source,
            target,
            tables: options.resolved_tables(),
        })
    }

    async fn run(
        &self,
        request: SwitchRequest,
        options: &SwitchOptions,
        actor: Option<&str>,
    ) -> SwitchResult {
        let started_at = Utc::now();
        let started = Instant::now();
        let mut progress = SwitchProgress::default();

        let outcome = AssertUnwindSafe(self.execute(&request, options, actor, &mut progress))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(SwitchoverError::Panic(panic_message(panic.as_ref()))));

        let mut status = SwitchStatus::Success;
        let mut error_message = None;
        if let Err(err) = &outcome {
            tracing::error!(phase = %progress.phase, error = %err, "Switch failed");
            let mut message = err.to_string();
            progress.enter(SwitchPhase::RollingBack);
            status = self.roll_back(&request, &progress, &mut message).await;
            error_message = Some(message);
        }

        if progress.gate_engaged
            && let Err(e) = self.gate.disable().await
        {
            tracing::error!(error = %e, "Unable to disable maintenance mode");
            let note = format!("maintenance mode could not be disabled: {e}");
            error_message = Some(match error_message {
                Some(message) => format!("{message}; {note}"),
                None => note,
            });
        }
        if outcome.is_err() {
            progress.enter(SwitchPhase::Failed);
        }

        let backup_path = progress
            .backup_path
            .as_ref()
            .map(|path| path.display().to_string());
        let attempt = NewSwitchAttempt {
            source_connection_id: request.source.as_ref().map(|s| s.id),
            target_connection_id: request.target.id,
            kind: request.kind,
            status,
            backup_path: backup_path.clone(),
            migrated_tables: progress.migrated_tables.clone(),
            validation_passed: progress.validation_passed,
            error_message: error_message.clone(),
            actor: actor.map(str::to_string),
            started_at,
            completed_at: Utc::now(),
        };
        let details = SwitchDetails {
            backup_path,
            total_rows: attempt.total_rows(),
            migrated_tables: progress.migrated_tables,
            total_duration_ms: started.elapsed().as_millis() as u64,
            validation_passed: progress.validation_passed,
        };

        let action = match request.kind {
            SwitchKind::Switch => "Switch",
            SwitchKind::Rollback => "Rollback",
        };
        let target = format!("{} ({})", request.target.name, request.target.id);
        let mut message = match (&outcome, &error_message) {
            (Ok(()), None) => format!(
                "{action} to {target} completed: {} rows in {} tables",
                details.total_rows,
                details.migrated_tables.len()
            ),
            (Ok(()), Some(note)) => format!("{action} to {target} completed, but {note}"),
            (Err(_), error) => format!(
                "{action} to {target} failed: {}",
                error.as_deref().unwrap_or_default()
            ),
        };

        if let Err(e) = self.history.record(attempt).await {
            tracing::error!(error = %e, "Unable to record switch attempt");
            message.push_str(&format!(" (switch history not recorded: {e})"));
        }

        SwitchResult {
            success: outcome.is_ok(),
            message,
            details: Some(details),
        }
    }

    async fn execute(
        &self,
        request: &SwitchRequest,
        options: &SwitchOptions,
        actor: Option<&str>,
        progress: &mut SwitchProgress,
    ) -> SwitchoverResult<()> {
        let target = &request.target;

        progress.enter(SwitchPhase::ProbingTarget);
        let target_client = self.connect_and_probe(target).await?;
        let missing = missing_tables(target_client.as_ref(), &request.tables)
            .await
            .map_err(|source| SwitchoverError::Connect {
                connection: target.id,
                source,
            })?;
        if !missing.is_empty() {
            return Err(SwitchoverError::MissingTables {
                connection: target.id,
                tables: missing,
            });
        }
        let source_client = match &request.source {
            Some(source) => Some(self.connect_and_probe(source).await?),
            None => {
                tracing::info!("No active connection, activating the target without moving data");
                None
            }
        };

        progress.enter(SwitchPhase::BackingUp);
        progress.gate_engaged = true;
        self.gate.enable().await?;

        if let (Some(source), Some(source_client)) = (&request.source, source_client) {
            progress.source_client = Some(source_client.clone());
            if options.create_backup {
                let purpose = match request.kind {
                    SwitchKind::Switch => SWITCH_BACKUP_PURPOSE,
                    SwitchKind::Rollback => ROLLBACK_BACKUP_PURPOSE,
                };
                let artifact = self
                    .backups
                    .capture(
                        source_client.as_ref(),
                        &request.tables,
                        purpose,
                        source.id,
                        target.id,
                    )
                    .await?;
                progress.backup_path = Some(artifact.path);
            } else {
                tracing::warn!("Backup disabled, a failed switch will not be rolled back");
            }

            progress.enter(SwitchPhase::Migrating);
            empty_tables(target_client.as_ref(), &request.tables).await?;
            let mut snapshots = Vec::with_capacity(request.tables.len());
            for table in &request.tables {
                let (snapshot, migrated) = migrate_table(
                    source_client.as_ref(),
                    target_client.as_ref(),
                    *table,
                    options,
                )
                .await?;
                progress.migrated_tables.push(migrated);
                snapshots.push(snapshot);
            }

            if options.validate_after_migration {
                progress.enter(SwitchPhase::Validating);
                progress.validation_passed = Some(false);
                validate(source_client.as_ref(), target_client.as_ref(), &snapshots).await?;
                progress.validation_passed = Some(true);
            }

            progress.enter(SwitchPhase::SyncingSequences);
            sync_sequences(target_client.as_ref(), &request.tables).await;
        }

        progress.enter(SwitchPhase::Activating);
        self.registry
            .set_active(target.id, actor)
            .await
            .map_err(|e| match e {
                SwitchoverError::Database(source) => SwitchoverError::Activation {
                    connection: target.id,
                    source,
                },
                other => other,
            })?;

        progress.enter(SwitchPhase::Completed);
        Ok(())
    }

    /// Restores the source from the backup taken by this switch, if there is one.
    /// Problems are appended to `message`, never replace it.
    async fn roll_back(
        &self,
        request: &SwitchRequest,
        progress: &SwitchProgress,
        message: &mut String,
    ) -> SwitchStatus {
        let (Some(path), Some(source_client)) = (&progress.backup_path, &progress.source_client)
        else {
            return SwitchStatus::Failed;
        };

        match self
            .backups
            .restore_file(source_client.as_ref(), path, &request.tables)
            .await
        {
            Ok(summary) => {
                tracing::info!(
                    path = %path.display(),
                    rows = summary.rows,
                    "Restored the source connection from its backup"
                );
                message.push_str(&format!(
                    "; source connection restored from {}",
                    path.display()
                ));
                SwitchStatus::RolledBack
            }
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "Unable to restore the source connection");
                message.push_str(&format!(
                    "; restoring the source from {} also failed: {e}",
                    path.display()
                ));
                SwitchStatus::Failed
            }
        }
    }

    async fn connect_and_probe(
        &self,
        record: &ConnectionRecord,
    ) -> SwitchoverResult<Arc<dyn RelationalClient>> {
        let client = self.registry.connect(record).await?;
        let info = client
            .probe()
            .await
            .map_err(|source| SwitchoverError::Connect {
                connection: record.id,
                source,
            })?;
        tracing::info!(connection_id = %record.id, version = %info.version, "Connection reachable");
        Ok(client)
    }
}

fn reject(err: SwitchoverError) -> SwitchResult {
    tracing::warn!(error = %err, "Switch request rejected");
    SwitchResult::rejected(err.to_string())
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

async fn missing_tables(
    client: &dyn RelationalClient,
    tables: &[BusinessTable],
) -> Result<Vec<BusinessTable>, ClientError> {
    let mut missing = Vec::new();
    for table in tables {
        if !client.table_exists(*table).await? {
            missing.push(*table);
        }
    }
    Ok(missing)
}

/// Empties the selected tables on the target, tables holding references first
async fn empty_tables(
    target: &dyn RelationalClient,
    tables: &[BusinessTable],
) -> SwitchoverResult<()> {
    for table in BusinessTable::deletion_order()
        .into_iter()
        .filter(|table| tables.contains(table))
    {
        let deleted = target
            .delete_all(table)
            .await
            .map_err(|source| SwitchoverError::Transfer { table, source })?;
        tracing::debug!(%table, deleted, "Emptied target table");
    }
    Ok(())
}

/// Copies one table into the already emptied target table
async fn migrate_table(
    source: &dyn RelationalClient,
    target: &dyn RelationalClient,
    table: BusinessTable,
    options: &SwitchOptions,
) -> SwitchoverResult<(TableSnapshot, MigratedTable)> {
    let started = Instant::now();
    let transfer_error = |source| SwitchoverError::Transfer { table, source };

    let columns = source.columns(table).await.map_err(transfer_error)?;
    let rows = source
        .fetch_rows(table, &columns)
        .await
        .map_err(transfer_error)?;
    let digest = options.verify_checksums.then(|| rows_digest(&rows));
    let names: Vec<String> = columns.iter().map(|c| c.name.clone()).collect();

    let mut batches = 0;
    for batch in rows.chunks(options.batch_size) {
        target
            .insert_rows(table, &names, batch)
            .await
            .map_err(transfer_error)?;
        batches += 1;
    }

    let duration_ms = started.elapsed().as_millis() as u64;
    tracing::info!(%table, rows = rows.len(), batches, duration_ms, "Migrated table");
    Ok((
        TableSnapshot {
            table,
            columns,
            rows: rows.len() as u64,
            digest,
        },
        MigratedTable {
            table,
            rows: rows.len() as u64,
            duration_ms,
        },
    ))
}

async fn validate(
    source: &dyn RelationalClient,
    target: &dyn RelationalClient,
    snapshots: &[TableSnapshot],
) -> SwitchoverResult<()> {
    for snapshot in snapshots {
        let table = snapshot.table;
        let target_rows = target.count_rows(table).await.map_err(|e| {
            SwitchoverError::Validation(format!("{table} is not queryable on the target: {e}"))
        })?;
        if target_rows != snapshot.rows {
            return Err(SwitchoverError::Validation(format!(
                "{table} has {target_rows} rows on the target, expected {}",
                snapshot.rows
            )));
        }

        let source_rows = source.count_rows(table).await.map_err(|e| {
            SwitchoverError::Validation(format!("{table} could not be recounted on the source: {e}"))
        })?;
        if source_rows != snapshot.rows {
            return Err(SwitchoverError::Validation(format!(
                "{table} changed on the source during the switch: {} rows at the snapshot, {source_rows} now",
                snapshot.rows
            )));
        }

        if let Some(expected) = &snapshot.digest {
            let rows = target
                .fetch_rows(table, &snapshot.columns)
                .await
                .map_err(|e| {
                    SwitchoverError::Validation(format!("{table} could not be read back: {e}"))
                })?;
            if rows_digest(&rows) != *expected {
                return Err(SwitchoverError::Validation(format!(
                    "{table} contents on the target differ from the source snapshot"
                )));
            }
        }
        tracing::debug!(%table, rows = snapshot.rows, "Table validated");
    }
    Ok(())
}

/// Failures are logged and otherwise ignored
async fn sync_sequences(target: &dyn RelationalClient, tables: &[BusinessTable]) {
    for table in tables {
        let Some(column) = table.identity_column() else {
            continue;
        };
        match target.resync_sequence(*table, column).await {
            Ok(Some(next_value)) => {
                tracing::debug!(%table, next_value, "Resynced identity sequence");
            }
            Ok(None) => tracing::debug!(%table, column, "No sequence to resync"),
            Err(e) => {
                tracing::warn!(%table, error = %e, "Unable to resync identity sequence");
            }
        }
    }
}
