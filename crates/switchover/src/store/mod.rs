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

//! Persistence of the registry, the switch log and settings.

mod postgres;

use async_trait::async_trait;
use db::DatabaseResult;
use model::connection::{
    ConnectionId, ConnectionRecord, ConnectionRecordChanges, ConnectionTestStatus,
    NewConnectionRecord,
};
use model::switch_history::{NewSwitchAttempt, SwitchAttempt};

pub use self::postgres::PgSwitchoverStore;

#[async_trait]
pub trait SwitchoverStore: Send + Sync {
    async fn create_connection(
        &self,
        record: NewConnectionRecord,
    ) -> DatabaseResult<ConnectionRecord>;

    async fn list_connections(&self) -> DatabaseResult<Vec<ConnectionRecord>>;

    async fn find_connection(&self, id: ConnectionId) -> DatabaseResult<Option<ConnectionRecord>>;

    async fn find_active_connection(&self) -> DatabaseResult<Option<ConnectionRecord>>;

    async fn update_connection(
        &self,
        id: ConnectionId,
        changes: ConnectionRecordChanges,
    ) -> DatabaseResult<ConnectionRecord>;

    /// Fails with `FailedPrecondition` for the active connection
    async fn delete_connection(&self, id: ConnectionId) -> DatabaseResult<()>;

    /// Clears every other active flag and activates `id` atomically
    async fn activate_connection(
        &self,
        id: ConnectionId,
        actor: Option<&str>,
    ) -> DatabaseResult<ConnectionRecord>;

    async fn record_connection_test(
        &self,
        id: ConnectionId,
        status: ConnectionTestStatus,
        message: &str,
    ) -> DatabaseResult<ConnectionRecord>;

    async fn append_switch_attempt(
        &self,
        attempt: NewSwitchAttempt,
    ) -> DatabaseResult<SwitchAttempt>;

    /// Newest first
    async fn list_switch_attempts(
        &self,
        limit: i64,
        offset: i64,
    ) -> DatabaseResult<Vec<SwitchAttempt>>;

    async fn count_switch_attempts(&self) -> DatabaseResult<i64>;

    async fn latest_successful_switch(&self) -> DatabaseResult<Option<SwitchAttempt>>;

    async fn get_setting(&self, key: &str) -> DatabaseResult<Option<String>>;

    async fn set_setting(&self, key: &str, value: &str) -> DatabaseResult<()>;
}
