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

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{FromRow, Row};
use strum_macros::{AsRefStr, Display, EnumString};

use crate::connection::ConnectionId;
use crate::table::BusinessTable;
use crate::decode_text_column;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct SwitchAttemptId(pub i64);

impl fmt::Display for SwitchAttemptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, Display, AsRefStr,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SwitchKind {
    Switch,
    Rollback,
}

/// Terminal status of a switch attempt
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, Display, AsRefStr,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SwitchStatus {
    Success,
    /// The attempt failed and the source could not be restored, or there was nothing to restore
    Failed,
    /// The attempt failed and the source was restored from its backup
    RolledBack,
}

/// Per-table transfer summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigratedTable {
    pub table: BusinessTable,
    pub rows: u64,
    pub duration_ms: u64,
}

/// One entry of the switch audit log. Written once, never updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwitchAttempt {
    pub id: SwitchAttemptId,
    pub source_connection_id: Option<ConnectionId>,
    pub target_connection_id: ConnectionId,
    pub kind: SwitchKind,
    pub status: SwitchStatus,
    pub backup_path: Option<String>,
    pub migrated_tables: Vec<MigratedTable>,
    pub total_rows: i64,
    pub duration_ms: i64,
    pub validation_passed: Option<bool>,
    pub error_message: Option<String>,
    pub actor: Option<String>,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for SwitchAttempt {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let migrated_tables: Json<Vec<MigratedTable>> = row.try_get("migrated_tables")?;
        Ok(SwitchAttempt {
            id: row.try_get("id")?,
            source_connection_id: row.try_get("source_connection_id")?,
            target_connection_id: row.try_get("target_connection_id")?,
            kind: decode_text_column(row, "kind")?,
            status: decode_text_column(row, "status")?,
            backup_path: row.try_get("backup_path")?,
            migrated_tables: migrated_tables.0,
            total_rows: row.try_get("total_rows")?,
            duration_ms: row.try_get("duration_ms")?,
            validation_passed: row.try_get("validation_passed")?,
            error_message: row.try_get("error_message")?,
            actor: row.try_get("actor")?,
            started_at: row.try_get("started_at")?,
            completed_at: row.try_get("completed_at")?,
        })
    }
}

/// A SwitchAttempt before it has been assigned an id
#[derive(Debug, Clone, PartialEq)]
pub struct NewSwitchAttempt {
    pub source_connection_id: Option<ConnectionId>,
    pub target_connection_id: ConnectionId,
    pub kind: SwitchKind,
    pub status: SwitchStatus,
    pub backup_path: Option<String>,
    pub migrated_tables: Vec<MigratedTable>,
    pub validation_passed: Option<bool>,
    pub error_message: Option<String>,
    pub actor: Option<String>,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

impl NewSwitchAttempt {
    pub fn total_rows(&self) -> u64 {
        self.migrated_tables.iter().map(|t| t.rows).sum()
    }

    pub fn duration_ms(&self) -> u64 {
        (self.completed_at - self.started_at)
            .num_milliseconds()
            .max(0) as u64
    }

    pub fn into_attempt(self, id: SwitchAttemptId) -> SwitchAttempt {
        SwitchAttempt {
            id,
            total_rows: self.total_rows() as i64,
            duration_ms: self.duration_ms() as i64,
            source_connection_id: self.source_connection_id,
            target_connection_id: self.target_connection_id,
            kind: self.kind,
            status: self.status,
            backup_path: self.backup_path,
            migrated_tables: self.migrated_tables,
            validation_passed: self.validation_passed,
            error_message: self.error_message,
            actor: self.actor,
            started_at: self.started_at,
            completed_at: self.completed_at,
        }
    }
}
