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

//! Queries against the switchover control database.
//!
//! Every function takes a `&mut PgConnection` so callers decide whether it runs on a pooled
//! connection or inside a transaction.

pub mod connection_record;
pub mod migrations;
pub mod settings;
pub mod switch_history;
pub mod switch_lock;

pub type DatabaseResult<T> = Result<T, DatabaseError>;

#[derive(thiserror::Error, Debug)]
pub enum DatabaseError {
    #[error("Database error running {query}: {source}")]
    Query {
        query: String,
        #[source]
        source: sqlx::Error,
    },
    #[error("Unable to acquire a database connection: {0}")]
    Acquire(#[source] sqlx::Error),
    #[error("{kind} not found: {id}")]
    NotFoundError { kind: &'static str, id: String },
    #[error("{kind} already exists: {id}")]
    AlreadyFoundError { kind: &'static str, id: String },
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Failed precondition: {0}")]
    FailedPrecondition(String),
    #[error("Database migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

impl DatabaseError {
    /// Wraps an error returned by an operation that isn't a single query, such as beginning or
    /// committing a transaction.
    pub fn new(op_name: &str, source: sqlx::Error) -> Self {
        Self::Query {
            query: op_name.to_string(),
            source,
        }
    }

    pub fn query(query: &str, source: sqlx::Error) -> Self {
        Self::Query {
            query: query.to_string(),
            source,
        }
    }

    pub fn acquire(source: sqlx::Error) -> Self {
        Self::Acquire(source)
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::NotFoundError { .. }
                | Self::Query {
                    source: sqlx::Error::RowNotFound,
                    ..
                }
        )
    }

    /// Whether the underlying postgres error is a unique constraint violation
    pub fn is_unique_violation(&self) -> bool {
        match self {
            Self::AlreadyFoundError { .. } => true,
            Self::Query { source, .. } => source
                .as_database_error()
                .is_some_and(|e| e.is_unique_violation()),
            _ => false,
        }
    }
}
