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

use model::connection::{
    ConnectionId, ConnectionRecord, ConnectionRecordChanges, ConnectionTestStatus,
    NewConnectionRecord,
};
use sqlx::PgConnection;

use crate::{DatabaseError, DatabaseResult};

const KIND: &str = "database connection";

pub async fn create(
    txn: &mut PgConnection,
    record: &NewConnectionRecord,
) -> DatabaseResult<ConnectionRecord> {
    let query = "INSERT INTO database_connections
            (name, encrypted_connection_string, environment, created_by)
        VALUES ($1, $2, $3, $4)
        RETURNING *";
    sqlx::query_as(query)
        .bind(&record.name)
        .bind(&record.encrypted_connection_string)
        .bind(record.environment.as_ref())
        .bind(&record.created_by)
        .fetch_one(txn)
        .await
        .map_err(|e| {
            let err = DatabaseError::query(query, e);
            if err.is_unique_violation() {
                DatabaseError::AlreadyFoundError {
                    kind: KIND,
                    id: record.name.clone(),
                }
            } else {
                err
            }
        })
}

pub async fn find_all(txn: &mut PgConnection) -> DatabaseResult<Vec<ConnectionRecord>> {
    let query = "SELECT * FROM database_connections ORDER BY id";
    sqlx::query_as(query)
        .fetch_all(txn)
        .await
        .map_err(|e| DatabaseError::query(query, e))
}

pub async fn find_by_id(
    txn: &mut PgConnection,
    id: ConnectionId,
) -> DatabaseResult<Option<ConnectionRecord>> {
    let query = "SELECT * FROM database_connections WHERE id = $1";
    sqlx::query_as(query)
        .bind(id)
        .fetch_optional(txn)
        .await
        .map_err(|e| DatabaseError::query(query, e))
}

pub async fn find_active(txn: &mut PgConnection) -> DatabaseResult<Option<ConnectionRecord>> {
    let query = "SELECT * FROM database_connections WHERE is_active";
    sqlx::query_as(query)
        .fetch_optional(txn)
        .await
        .map_err(|e| DatabaseError::query(query, e))
}

/// Applies a partial update. Fields left `None` in `changes` keep their stored value.
pub async fn update(
    txn: &mut PgConnection,
    id: ConnectionId,
    changes: &ConnectionRecordChanges,
) -> DatabaseResult<ConnectionRecord> {
    let query = "UPDATE database_connections SET
            name = COALESCE($2, name),
            encrypted_connection_string = COALESCE($3, encrypted_connection_string),
            environment = COALESCE($4, environment),
            updated_at = NOW()
        WHERE id = $1
        RETURNING *";
    match sqlx::query_as::<_, ConnectionRecord>(query)
        .bind(id)
        .bind(&changes.name)
        .bind(&changes.encrypted_connection_string)
        .bind(changes.environment.map(|e| e.to_string()))
        .fetch_one(txn)
        .await
    {
        Ok(record) => Ok(record),
        Err(sqlx::Error::RowNotFound) => Err(DatabaseError::NotFoundError {
            kind: KIND,
            id: id.to_string(),
        }),
        Err(e) => {
            let err = DatabaseError::query(query, e);
            match (err.is_unique_violation(), &changes.name) {
                (true, Some(name)) => Err(DatabaseError::AlreadyFoundError {
                    kind: KIND,
                    id: name.clone(),
                }),
                _ => Err(err),
            }
        }
    }
}

/// Deletes a connection. The active connection can't be deleted.
pub async fn delete(txn: &mut PgConnection, id: ConnectionId) -> DatabaseResult<()> {
    let Some(record) = find_by_id(txn, id).await? else {
        return Err(DatabaseError::NotFoundError {
            kind: KIND,
            id: id.to_string(),
        });
    };
    if record.is_active {
        return Err(DatabaseError::FailedPrecondition(format!(
            "connection {id} ({}) is the active connection and can't be deleted",
            record.name
        )));
    }

    // The guard covers a switch activating the record between the lookup and here
    let query = "DELETE FROM database_connections WHERE id = $1 AND NOT is_active";
    let result = sqlx::query(query)
        .bind(id)
        .execute(txn)
        .await
        .map_err(|e| DatabaseError::query(query, e))?;
    if result.rows_affected() == 0 {
        return Err(DatabaseError::FailedPrecondition(format!(
            "connection {id} became active and can't be deleted"
        )));
    }
    Ok(())
}

/// Makes `id` the only active connection and stamps who switched to it.
///
/// Clears every other active flag first, so the single-active index holds after each
/// statement. Must run inside a transaction to be atomic.
pub async fn activate(
    txn: &mut PgConnection,
    id: ConnectionId,
    actor: Option<&str>,
) -> DatabaseResult<ConnectionRecord> {
    let query = "UPDATE database_connections SET is_active = FALSE, updated_at = NOW()
        WHERE is_active AND id <> $1";
    sqlx::query(query)
        .bind(id)
        .execute(&mut *txn)
        .await
        .map_err(|e| DatabaseError::query(query, e))?;

    let query = "UPDATE database_connections SET
            is_active = TRUE,
            last_switched_at = NOW(),
            last_switched_by = $2,
            updated_at = NOW()
        WHERE id = $1
        RETURNING *";
    match sqlx::query_as::<_, ConnectionRecord>(query)
        .bind(id)
        .bind(actor)
        .fetch_one(txn)
        .await
    {
        Ok(record) => Ok(record),
        Err(sqlx::Error::RowNotFound) => Err(DatabaseError::NotFoundError {
            kind: KIND,
            id: id.to_string(),
        }),
        Err(e) => Err(DatabaseError::query(query, e)),
    }
}

pub async fn record_test_result(
    txn: &mut PgConnection,
    id: ConnectionId,
    status: ConnectionTestStatus,
    message: &str,
) -> DatabaseResult<ConnectionRecord> {
    let query = "UPDATE database_connections SET
            last_test_status = $2,
            last_test_message = $3,
            last_tested_at = NOW()
        WHERE id = $1
        RETURNING *";
    match sqlx::query_as::<_, ConnectionRecord>(query)
        .bind(id)
        .bind(status.as_ref())
        .bind(message)
        .fetch_one(txn)
        .await
    {
        Ok(record) => Ok(record),
        Err(sqlx::Error::RowNotFound) => Err(DatabaseError::NotFoundError {
            kind: KIND,
            id: id.to_string(),
        }),
        Err(e) => Err(DatabaseError::query(query, e)),
    }
}
