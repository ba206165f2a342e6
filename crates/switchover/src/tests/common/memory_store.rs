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

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use db::{DatabaseError, DatabaseResult};
use model::connection::{
    ConnectionId, ConnectionRecord, ConnectionRecordChanges, ConnectionTestStatus,
    NewConnectionRecord,
};
use model::settings::MAINTENANCE_MODE_KEY;
use model::switch_history::{NewSwitchAttempt, SwitchAttempt, SwitchAttemptId, SwitchStatus};

use crate::store::SwitchoverStore;

const KIND: &str = "database connection";

/// A control store that keeps everything in memory, with the same constraint behavior as
/// the postgres tables.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<StoreState>,
}

#[derive(Default)]
struct StoreState {
    connections: BTreeMap<ConnectionId, ConnectionRecord>,
    next_connection_id: i64,
    attempts: Vec<SwitchAttempt>,
    settings: HashMap<String, String>,
    setting_writes: Vec<(String, String)>,
    fail_activation: bool,
}

impl MemoryStore {
    fn state(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap()
    }

    /// Every recorded attempt, oldest first
    pub fn attempts(&self) -> Vec<SwitchAttempt> {
        self.state().attempts.clone()
    }

    /// Every value written to the maintenance flag, in order
    pub fn maintenance_writes(&self) -> Vec<String> {
        self.state()
            .setting_writes
            .iter()
            .filter(|(key, _)| key == MAINTENANCE_MODE_KEY)
            .map(|(_, value)| value.clone())
            .collect()
    }

    /// Makes every following activation fail
    pub fn fail_activation(&self) {
        self.state().fail_activation = true;
    }

    fn name_taken(state: &StoreState, name: &str, except: Option<ConnectionId>) -> bool {
        state
            .connections
            .values()
            .any(|c| c.name == name && Some(c.id) != except)
    }
}

fn not_found(id: ConnectionId) -> DatabaseError {
    DatabaseError::NotFoundError {
        kind: KIND,
        id: id.to_string(),
    }
}

#[async_trait]
impl SwitchoverStore for MemoryStore {
    async fn create_connection(
        &self,
        record: NewConnectionRecord,
    ) -> DatabaseResult<ConnectionRecord> {
        let mut state = self.state();
        if Self::name_taken(&state, &record.name, None) {
            return Err(DatabaseError::AlreadyFoundError {
                kind: KIND,
                id: record.name,
            });
        }
        state.next_connection_id += 1;
        let now = Utc::now();
        let created = ConnectionRecord {
            id: ConnectionId(state.next_connection_id),
            name: record.name,
            encrypted_connection_string: record.encrypted_connection_string,
            environment: record.environment,
            is_active: false,
            created_by: record.created_by,
            created_at: now,
            updated_at: now,
            last_switched_at: None,
            last_switched_by: None,
            last_test_status: None,
            last_test_message: None,
            last_tested_at: None,
        };
        state.connections.insert(created.id, created.clone());
        Ok(created)
    }

    async fn list_connections(&self) -> DatabaseResult<Vec<ConnectionRecord>> {
        Ok(self.state().connections.values().cloned().collect())
    }

    async fn find_connection(&self, id: ConnectionId) -> DatabaseResult<Option<ConnectionRecord>> {
        Ok(self.state().connections.get(&id).cloned())
    }

    async fn find_active_connection(&self) -> DatabaseResult<Option<ConnectionRecord>> {
        Ok(self
            .state()
            .connections
            .values()
            .find(|c| c.is_active)
            .cloned())
    }

    async fn update_connection(
        &self,
        id: ConnectionId,
        changes: ConnectionRecordChanges,
    ) -> DatabaseResult<ConnectionRecord> {
        let mut state = self.state();
        if let Some(name) = &changes.name
            && Self::name_taken(&state, name, Some(id))
        {
            return Err(DatabaseError::AlreadyFoundError {
                kind: KIND,
                id: name.clone(),
            });
        }
        let record = state.connections.get_mut(&id).ok_or_else(|| not_found(id))?;
        if let Some(name) = changes.name {
            record.name = name;
        }
        if let Some(encrypted) = changes.encrypted_connection_string {
            record.encrypted_connection_string = encrypted;
        }
        if let Some(environment) = changes.environment {
            record.environment = environment;
        }
        record.updated_at = Utc::now();
        Ok(record.clone())
    }

    async fn delete_connection(&self, id: ConnectionId) -> DatabaseResult<()> {
        let mut state = self.state();
        let record = state.connections.get(&id).ok_or_else(|| not_found(id))?;
        if record.is_active {
            return Err(DatabaseError::FailedPrecondition(format!(
                "connection {id} ({}) is the active connection and can't be deleted",
                record.name
            )));
        }
        state.connections.remove(&id);
        Ok(())
    }

    async fn activate_connection(
        &self,
        id: ConnectionId,
        actor: Option<&str>,
    ) -> DatabaseResult<ConnectionRecord> {
        let mut state = self.state();
        if state.fail_activation {
            return Err(DatabaseError::FailedPrecondition(
                "activation disabled for this test".to_string(),
            ));
        }
        if !state.connections.contains_key(&id) {
            return Err(not_found(id));
        }
        let now = Utc::now();
        for record in state.connections.values_mut() {
            if record.id == id {
                record.is_active = true;
                record.last_switched_at = Some(now);
                record.last_switched_by = actor.map(str::to_string);
                record.updated_at = now;
            } else if record.is_active {
                record.is_active = false;
                record.updated_at = now;
            }
        }
        state.connections.get(&id).cloned().ok_or_else(|| not_found(id))
    }

    async fn record_connection_test(
        &self,
        id: ConnectionId,
        status: ConnectionTestStatus,
        message: &str,
    ) -> DatabaseResult<ConnectionRecord> {
        let mut state = self.state();
        let record = state.connections.get_mut(&id).ok_or_else(|| not_found(id))?;
        record.last_test_status = Some(status);
        record.last_test_message = Some(message.to_string());
        record.last_tested_at = Some(Utc::now());
        Ok(record.clone())
    }

    async fn append_switch_attempt(
        &self,
        attempt: NewSwitchAttempt,
    ) -> DatabaseResult<SwitchAttempt> {
        let mut state = self.state();
        let id = SwitchAttemptId(state.attempts.len() as i64 + 1);
        let attempt = attempt.into_attempt(id);
        state.attempts.push(attempt.clone());
        Ok(attempt)
    }

    async fn list_switch_attempts(
        &self,
        limit: i64,
        offset: i64,
    ) -> DatabaseResult<Vec<SwitchAttempt>> {
        let mut attempts = self.state().attempts.clone();
        attempts.sort_by(|a, b| b.started_at.cmp(&a.started_at).then(b.id.0.cmp(&a.id.0)));
        Ok(attempts
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn count_switch_attempts(&self) -> DatabaseResult<i64> {
        Ok(self.state().attempts.len() as i64)
    }

    async fn latest_successful_switch(&self) -> DatabaseResult<Option<SwitchAttempt>> {
        Ok(self
            .state()
            .attempts
            .iter()
            .filter(|a| a.status == SwitchStatus::Success)
            .max_by(|a, b| a.completed_at.cmp(&b.completed_at).then(a.id.0.cmp(&b.id.0)))
            .cloned())
    }

    async fn get_setting(&self, key: &str) -> DatabaseResult<Option<String>> {
        Ok(self.state().settings.get(key).cloned())
    }

    async fn set_setting(&self, key: &str, value: &str) -> DatabaseResult<()> {
        let mut state = self.state();
        state.settings.insert(key.to_string(), value.to_string());
        state
            .setting_writes
            .push((key.to_string(), value.to_string()));
        Ok(())
    }
}
