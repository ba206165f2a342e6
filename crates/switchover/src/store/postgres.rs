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

use async_trait::async_trait;
use db::{DatabaseError, DatabaseResult};
use model::connection::{
    ConnectionId, ConnectionRecord, ConnectionRecordChanges, ConnectionTestStatus,
    NewConnectionRecord,
};
use model::switch_history::{NewSwitchAttempt, SwitchAttempt};
use sqlx::PgPool;
use sqlx::pool::PoolConnection;

use super::SwitchoverStore;

/// [`SwitchoverStore`] on the control database
#[derive(Debug, Clone)]
pub struct PgSwitchoverStore {
    pool: PgPool,
}

impl PgSwitchoverStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn conn(&self) -> DatabaseResult<PoolConnection<sqlx::Postgres>> {
        self.pool.acquire().await.map_err(DatabaseError::acquire)
    }
}

#[async_trait]
impl SwitchoverStore for PgSwitchoverStore {
    async fn create_connection(
        &self,
        record: NewConnectionRecord,
    ) -> DatabaseResult<ConnectionRecord> {
        db::connection_record::create(&mut *self.conn().await?, &record).await
    }

    async fn list_connections(&self) -> DatabaseResult<Vec<ConnectionRecord>> {
        db::connection_record::find_all(&mut *self.conn().await?).await
    }

    async fn find_connection(&self, id: ConnectionId) -> DatabaseResult<Option<ConnectionRecord>> {
        db::connection_record::find_by_id(&mut *self.conn().await?, id).await
    }

    async fn find_active_connection(&self) -> DatabaseResult<Option<ConnectionRecord>> {
        db::connection_record::find_active(&mut *self.conn().await?).await
    }

    async fn update_connection(
        &self,
        id: ConnectionId,
        changes: ConnectionRecordChanges,
    ) -> DatabaseResult<ConnectionRecord> {
        db::connection_record::update(&mut *self.conn().await?, id, &changes).await
    }

    async fn delete_connection(&self, id: ConnectionId) -> DatabaseResult<()> {
        let mut txn = self
            .pool
            .begin()
            .await
            .map_err(|e| DatabaseError::new("begin delete_connection", e))?;
        db::connection_record::delete(&mut txn, id).await?;
        txn.commit()
            .await
            .map_err(|e| DatabaseError::new("commit delete_connection", e))
    }

    async fn activate_connection(
        &self,
        id: ConnectionId,
        actor: Option<&str>,
    ) -> DatabaseResult<ConnectionRecord> {
        let mut txn = self
            .pool
            .begin()
            .await
            .map_err(|e| DatabaseError::new("begin activate_connection", e))?;
        let record = db::connection_record::activate(&mut txn, id, actor).await?;
        txn.commit()
            .await
            .map_err(|e| DatabaseError::new("commit activate_connection", e))?;
        Ok(record)
    }

    async fn record_connection_test(
        &self,
        id: ConnectionId,
        status: ConnectionTestStatus,
        message: &str,
    ) -> DatabaseResult<ConnectionRecord> {
        db::connection_record::record_test_result(&mut *self.conn().await?, id, status, message)
            .await
    }

    async fn append_switch_attempt(
        &self,
        attempt: NewSwitchAttempt,
    ) -> DatabaseResult<SwitchAttempt> {
        db::switch_history::persist(&mut *self.conn().await?, &attempt).await
    }

    async fn list_switch_attempts(
        &self,
        limit: i64,
        offset: i64,
    ) -> DatabaseResult<Vec<SwitchAttempt>> {
        db::switch_history::find_page(&mut *self.conn().await?, limit, offset).await
    }

    async fn count_switch_attempts(&self) -> DatabaseResult<i64> {
        db::switch_history::count(&mut *self.conn().await?).await
    }

    async fn latest_successful_switch(&self) -> DatabaseResult<Option<SwitchAttempt>> {
        db::switch_history::find_latest_successful(&mut *self.conn().await?).await
    }

    async fn get_setting(&self, key: &str) -> DatabaseResult<Option<String>> {
        db::settings::get(&mut *self.conn().await?, key).await
    }

    async fn set_setting(&self, key: &str, value: &str) -> DatabaseResult<()> {
        db::settings::set(&mut *self.conn().await?, key, value).await
    }
}
