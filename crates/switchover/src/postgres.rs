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

//! [`RelationalClient`] over a postgres connection pool.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use model::table::BusinessTable;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgConnection, PgPool, Row as _};

use crate::client::{
    ClientError, Connector, RelationalClient, RestorePlan, RestoreSummary, ServerInfo,
};
use crate::sql::{Column, ColumnKind, Row, SqlValue, insert_statement, quote_ident};

pub struct PgConnector {
    connect_timeout: Duration,
    max_connections: u32,
    restore_batch_size: usize,
}

impl PgConnector {
    /// `restore_batch_size` is the number of rows per INSERT when replaying a backup
    pub fn new(connect_timeout: Duration, max_connections: u32, restore_batch_size: usize) -> Self {
        Self {
            connect_timeout,
            max_connections: max_connections.max(1),
            restore_batch_size: restore_batch_size.max(1),
        }
    }
}

#[async_trait]
impl Connector for PgConnector {
    async fn connect(
        &self,
        connection_string: &str,
    ) -> Result<Arc<dyn RelationalClient>, ClientError> {
        let connect = PgPoolOptions::new()
            .max_connections(self.max_connections)
            .acquire_timeout(self.connect_timeout)
            .connect(connection_string);
        let pool = tokio::time::timeout(self.connect_timeout, connect)
            .await
            .map_err(|_| {
                ClientError::Connect(format!("timed out after {:?}", self.connect_timeout))
            })?
            .map_err(|e| ClientError::Connect(e.to_string()))?;
        Ok(Arc::new(PgClient::new(pool, self.restore_batch_size)))
    }
}

pub struct PgClient {
    pool: PgPool,
    restore_batch_size: usize,
}

impl PgClient {
    pub fn new(pool: PgPool, restore_batch_size: usize) -> Self {
        Self {
            pool,
            restore_batch_size: restore_batch_size.max(1),
        }
    }

    async fn acquire(&self) -> Result<sqlx::pool::PoolConnection<sqlx::Postgres>, ClientError> {
        self.pool
            .acquire()
            .await
            .map_err(|e| ClientError::Connect(e.to_string()))
    }
}

#[async_trait]
impl RelationalClient for PgClient {
    async fn probe(&self) -> Result<ServerInfo, ClientError> {
        let query = "SELECT version()";
        let version: String = sqlx::query_scalar(query)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| ClientError::query(query, e))?;
        Ok(ServerInfo { version })
    }

    async fn table_exists(&self, table: BusinessTable) -> Result<bool, ClientError> {
        let query = "SELECT EXISTS (
            SELECT 1 FROM information_schema.tables
            WHERE table_schema = current_schema() AND table_name = $1)";
        sqlx::query_scalar(query)
            .bind(table.name())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| ClientError::query(query, e))
    }

    async fn columns(&self, table: BusinessTable) -> Result<Vec<Column>, ClientError> {
        let query = "SELECT column_name::text, data_type::text
            FROM information_schema.columns
            WHERE table_schema = current_schema() AND table_name = $1
            ORDER BY ordinal_position";
        let columns: Vec<(String, String)> = sqlx::query_as(query)
            .bind(table.name())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| ClientError::query(query, e))?;
        Ok(columns
            .into_iter()
            .map(|(name, data_type)| Column::new(name, ColumnKind::from_data_type(&data_type)))
            .collect())
    }

    async fn fetch_rows(
        &self,
        table: BusinessTable,
        columns: &[Column],
    ) -> Result<Vec<Row>, ClientError> {
        let Some(first) = columns.first() else {
            return Ok(Vec::new());
        };
        // Every value comes back in its text rendering and gets typed by column kind
        let select_list = columns
            .iter()
            .map(|c| format!("{}::text", quote_ident(&c.name)))
            .collect::<Vec<_>>()
            .join(", ");
        let query = format!(
            "SELECT {select_list} FROM {} ORDER BY {}",
            table.quoted(),
            quote_ident(&first.name)
        );
        let rows = sqlx::query(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| ClientError::query(format!("reading {table}"), e))?;

        rows.iter()
            .map(|row| {
                columns
                    .iter()
                    .enumerate()
                    .map(|(index, column)| {
                        let text: Option<String> =
                            row.try_get(index).map_err(|e| ClientError::Decode {
                                table,
                                column: column.name.clone(),
                                message: e.to_string(),
                            })?;
                        SqlValue::from_text(column.kind, text.as_deref()).map_err(|message| {
                            ClientError::Decode {
                                table,
                                column: column.name.clone(),
                                message,
                            }
                        })
                    })
                    .collect::<Result<Row, _>>()
            })
            .collect()
    }

    async fn count_rows(&self, table: BusinessTable) -> Result<u64, ClientError> {
        let query = format!("SELECT COUNT(*) FROM {}", table.quoted());
        let count: i64 = sqlx::query_scalar(&query)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| ClientError::query(format!("counting {table}"), e))?;
        Ok(count.max(0) as u64)
    }

    async fn delete_all(&self, table: BusinessTable) -> Result<u64, ClientError> {
        let mut conn = self.acquire().await?;
        delete_all_on(&mut conn, table).await
    }

    async fn insert_rows(
        &self,
        table: BusinessTable,
        columns: &[String],
        rows: &[Row],
    ) -> Result<u64, ClientError> {
        if rows.is_empty() {
            return Ok(0);
        }
        let statement = insert_statement(table, columns, rows);
        sqlx::raw_sql(&statement)
            .execute(&self.pool)
            .await
            .map(|result| result.rows_affected())
            .map_err(|e| ClientError::query(format!("inserting into {table}"), e))
    }

    async fn resync_sequence(
        &self,
        table: BusinessTable,
        column: &str,
    ) -> Result<Option<i64>, ClientError> {
        let mut conn = self.acquire().await?;
        resync_sequence_on(&mut conn, table, column).await
    }

    async fn apply_restore(&self, plan: &RestorePlan) -> Result<RestoreSummary, ClientError> {
        let mut txn = self
            .pool
            .begin()
            .await
            .map_err(|e| ClientError::query("begin restore", e))?;
        // dropping the transaction on error rolls it back
        let summary = restore_on(&mut txn, plan, self.restore_batch_size).await?;
        txn.commit()
            .await
            .map_err(|e| ClientError::query("commit restore", e))?;
        Ok(summary)
    }
}

async fn restore_on(
    conn: &mut PgConnection,
    plan: &RestorePlan,
    batch_size: usize,
) -> Result<RestoreSummary, ClientError> {
    for table in BusinessTable::deletion_order()
        .into_iter()
        .filter(|table| plan.tables.contains(table))
    {
        delete_all_on(&mut *conn, table).await?;
    }

    let mut rows = 0;
    for statement in &plan.statements {
        for batch in statement.rows.chunks(batch_size) {
            rows += insert_on(&mut *conn, statement.table, &statement.columns, batch).await?;
        }
    }

    for table in &plan.tables {
        if let Some(column) = table.identity_column() {
            resync_sequence_on(&mut *conn, *table, column).await?;
        }
    }

    Ok(RestoreSummary {
        tables: plan.tables.len(),
        rows,
    })
}

async fn insert_on(
    conn: &mut PgConnection,
    table: BusinessTable,
    columns: &[String],
    rows: &[Row],
) -> Result<u64, ClientError> {
    let statement = insert_statement(table, columns, rows);
    // literal-only statements, not worth caching
    sqlx::query(&statement)
        .persistent(false)
        .execute(conn)
        .await
        .map(|result| result.rows_affected())
        .map_err(|e| ClientError::query(format!("restoring {table}"), e))
}

async fn delete_all_on(conn: &mut PgConnection, table: BusinessTable) -> Result<u64, ClientError> {
    let query = format!("DELETE FROM {}", table.quoted());
    sqlx::query(&query)
        .execute(conn)
        .await
        .map(|result| result.rows_affected())
        .map_err(|e| ClientError::query(format!("emptying {table}"), e))
}

async fn resync_sequence_on(
    conn: &mut PgConnection,
    table: BusinessTable,
    column: &str,
) -> Result<Option<i64>, ClientError> {
    let query = "SELECT pg_get_serial_sequence($1, $2)";
    let sequence: Option<String> = sqlx::query_scalar(query)
        .bind(table.name())
        .bind(column)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| ClientError::query(query, e))?;
    let Some(sequence) = sequence else {
        return Ok(None);
    };

    let query = format!(
        "SELECT MAX({})::bigint FROM {}",
        quote_ident(column),
        table.quoted()
    );
    let max: Option<i64> = sqlx::query_scalar(&query)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| ClientError::query(format!("reading max {table}.{column}"), e))?;

    // With is_called = false the next nextval() returns the value itself
    let query = "SELECT setval($1::regclass, $2, $3)";
    sqlx::query(query)
        .bind(&sequence)
        .bind(max.unwrap_or(1))
        .bind(max.is_some())
        .execute(&mut *conn)
        .await
        .map_err(|e| ClientError::query(query, e))?;

    Ok(Some(max.map_or(1, |max| max + 1)))
}
