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
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, Row};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

use crate::{decode_optional_text_column, decode_text_column};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct ConnectionId(pub i64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ConnectionId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.trim().parse()?))
    }
}

/// Which deployment stage an endpoint belongs to
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    EnumIter,
    EnumString,
    Display,
    AsRefStr,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ConnectionEnvironment {
    #[default]
    Production,
    Staging,
    Development,
    Testing,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, Display, AsRefStr,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ConnectionTestStatus {
    Success,
    Failed,
}

/// A known database endpoint.
///
/// The connection string is only ever held encrypted here. Use the registry to decrypt it
/// for the duration of a connection attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionRecord {
    pub id: ConnectionId,
    pub name: String,
    pub encrypted_connection_string: String,
    pub environment: ConnectionEnvironment,
    pub is_active: bool,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_switched_at: Option<DateTime<Utc>>,
    pub last_switched_by: Option<String>,
    pub last_test_status: Option<ConnectionTestStatus>,
    pub last_test_message: Option<String>,
    pub last_tested_at: Option<DateTime<Utc>>,
}

impl<'r> FromRow<'r, PgRow> for ConnectionRecord {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(ConnectionRecord {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            encrypted_connection_string: row.try_get("encrypted_connection_string")?,
            environment: decode_text_column(row, "environment")?,
            is_active: row.try_get("is_active")?,
            created_by: row.try_get("created_by")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            last_switched_at: row.try_get("last_switched_at")?,
            last_switched_by: row.try_get("last_switched_by")?,
            last_test_status: decode_optional_text_column(row, "last_test_status")?,
            last_test_message: row.try_get("last_test_message")?,
            last_tested_at: row.try_get("last_tested_at")?,
        })
    }
}

/// Everything needed to insert a ConnectionRecord. The connection string must already be
/// encrypted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewConnectionRecord {
    pub name: String,
    pub encrypted_connection_string: String,
    pub environment: ConnectionEnvironment,
    pub created_by: Option<String>,
}

/// A partial update. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConnectionRecordChanges {
    pub name: Option<String>,
    pub encrypted_connection_string: Option<String>,
    pub environment: Option<ConnectionEnvironment>,
}

impl ConnectionRecordChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.encrypted_connection_string.is_none()
            && self.environment.is_none()
    }
}

/// Result of a reachability test against one endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionTestReport {
    pub connection_id: ConnectionId,
    pub status: ConnectionTestStatus,
    pub latency_ms: Option<u64>,
    pub server_version: Option<String>,
    pub message: String,
    pub tested_at: DateTime<Utc>,
}

impl ConnectionTestReport {
    pub fn succeeded(&self) -> bool {
        self.status == ConnectionTestStatus::Success
    }
}
