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

use model::switch_history::{NewSwitchAttempt, SwitchAttempt};
use sqlx::PgConnection;
use sqlx::types::Json;

use crate::{DatabaseError, DatabaseResult};

/// Appends an attempt to the audit log
pub async fn persist(
    txn: &mut PgConnection,
    attempt: &NewSwitchAttempt,
) -> DatabaseResult<SwitchAttempt> {
    let query = "INSERT INTO database_switch_history (
            source_connection_id, target_connection_id, kind, status, backup_path,
            migrated_tables, total_rows, duration_ms, validation_passed, error_message,
            actor, started_at, completed_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
        RETURNING *";
    sqlx::query_as(query)
        .bind(attempt.source_connection_id)
        .bind(attempt.target_connection_id)
        .bind(attempt.kind.as_ref())
        .bind(attempt.status.as_ref())
        .bind(&attempt.backup_path)
        .bind(Json(&attempt.migrated_tables))
        .bind(attempt.total_rows() as i64)
        .bind(attempt.duration_ms() as i64)
        .bind(attempt.validation_passed)
        .bind(&attempt.error_message)
        .bind(&attempt.actor)
        .bind(attempt.started_at)
        .bind(attempt.completed_at)
        .fetch_one(txn)
        .await
        .map_err(|e| DatabaseError::query(query, e))
}

/// Newest first
pub async fn find_page(
    txn: &mut PgConnection,
    limit: i64,
    offset: i64,
) -> DatabaseResult<Vec<SwitchAttempt>> {
    let query = "SELECT * FROM database_switch_history
        ORDER BY started_at DESC, id DESC
        LIMIT $1 OFFSET $2";
    sqlx::query_as(query)
        .bind(limit)
        .bind(offset)
        .fetch_all(txn)
        .await
        .map_err(|e| DatabaseError::query(query, e))
}

pub async fn count(txn: &mut PgConnection) -> DatabaseResult<i64> {
    let query = "SELECT COUNT(*) FROM database_switch_history";
    sqlx::query_scalar(query)
        .fetch_one(txn)
        .await
        .map_err(|e| DatabaseError::query(query, e))
}

pub async fn find_latest_successful(
    txn: &mut PgConnection,
) -> DatabaseResult<Option<SwitchAttempt>> {
    let query = "SELECT * FROM database_switch_history
        WHERE status = 'success'
        ORDER BY completed_at DESC, id DESC
        LIMIT 1";
    sqlx::query_as(query)
        .fetch_optional(txn)
        .await
        .map_err(|e| DatabaseError::query(query, e))
}
