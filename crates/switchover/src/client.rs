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

//! The seam between the engine and the endpoints it moves data between.

use std::sync::Arc;

use async_trait::async_trait;
use model::table::BusinessTable;

use crate::sql::{Column, Row};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    #[error("Unable to connect: {0}")]
    Connect(String),
    #[error("{context} failed: {message}")]
    Query { context: String, message: String },
    #[error("Unable to decode {table}.{column}: {message}")]
    Decode {
        table: BusinessTable,
        column: String,
        message: String,
    },
}

impl ClientError {
    pub fn query(context: impl Into<String>, message: impl ToString) -> Self {
        Self::Query {
            context: context.into(),
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerInfo {
    pub version: String,
}

/// Typed INSERTs recovered from a backup script
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RestorePlan {
    /// Every table the plan resets, in dependency order. Includes tables without rows.
    pub tables: Vec<BusinessTable>,
    pub statements: Vec<InsertStatement>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InsertStatement {
    pub table: BusinessTable,
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestoreSummary {
    pub tables: usize,
    pub rows: u64,
}

/// A live connection to one endpoint
#[async_trait]
pub trait RelationalClient: Send + Sync {
    /// Round-trips a trivial query
    async fn probe(&self) -> Result<ServerInfo, ClientError>;

    async fn table_exists(&self, table: BusinessTable) -> Result<bool, ClientError>;

    /// Columns of `table` in ordinal order
    async fn columns(&self, table: BusinessTable) -> Result<Vec<Column>, ClientError>;

    async fn fetch_rows(
        &self,
        table: BusinessTable,
        columns: &[Column],
    ) -> Result<Vec<Row>, ClientError>;

    async fn count_rows(&self, table: BusinessTable) -> Result<u64, ClientError>;

    async fn delete_all(&self, table: BusinessTable) -> Result<u64, ClientError>;

    /// Inserts one batch with a single statement
    async fn insert_rows(
        &self,
        table: BusinessTable,
        columns: &[String],
        rows: &[Row],
    ) -> Result<u64, ClientError>;

    /// Moves the sequence behind `column` past its current maximum. Returns the value the
    /// sequence hands out next, or `None` if the column has no sequence.
    async fn resync_sequence(
        &self,
        table: BusinessTable,
        column: &str,
    ) -> Result<Option<i64>, ClientError>;

    /// Atomically empties every table of the plan, replays its statements and resyncs
    /// identity sequences. Nothing is applied if any step fails.
    async fn apply_restore(&self, plan: &RestorePlan) -> Result<RestoreSummary, ClientError>;
}

/// Opens clients from decrypted connection strings
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(
        &self,
        connection_string: &str,
    ) -> Result<Arc<dyn RelationalClient>, ClientError>;
}
