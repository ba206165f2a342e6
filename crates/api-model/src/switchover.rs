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

//! Request and response types of the switchover protocol.

use serde::{Deserialize, Serialize};

use crate::switch_history::MigratedTable;
use crate::table::BusinessTable;

pub const DEFAULT_BATCH_SIZE: usize = 1000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwitchOptions {
    /// Capture the source into a backup artifact before anything is moved. Without a backup
    /// a failed switch cannot be rolled back.
    pub create_backup: bool,
    /// Tables to move. `None` moves every business table.
    pub tables: Option<Vec<BusinessTable>>,
    pub batch_size: usize,
    pub validate_after_migration: bool,
    /// Compare an order-independent digest of every table on top of the row counts
    pub verify_checksums: bool,
}

impl Default for SwitchOptions {
    fn default() -> Self {
        Self {
            create_backup: true,
            tables: None,
            batch_size: DEFAULT_BATCH_SIZE,
            validate_after_migration: true,
            verify_checksums: false,
        }
    }
}

impl SwitchOptions {
    /// The selected tables in dependency order
    pub fn resolved_tables(&self) -> Vec<BusinessTable> {
        BusinessTable::resolve(self.tables.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwitchResult {
    pub success: bool,
    pub message: String,
    pub details: Option<SwitchDetails>,
}

impl SwitchResult {
    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            details: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwitchDetails {
    pub backup_path: Option<String>,
    pub migrated_tables: Vec<MigratedTable>,
    pub total_rows: u64,
    pub total_duration_ms: u64,
    pub validation_passed: Option<bool>,
}
