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

use std::sync::Arc;
use std::time::Instant;

use bursar_secrets::CredentialCipher;
use chrono::Utc;
use db::DatabaseError;
use model::connection::{
    ConnectionEnvironment, ConnectionId, ConnectionRecord, ConnectionRecordChanges,
    ConnectionTestReport, ConnectionTestStatus, NewConnectionRecord,
};

use crate::client::{Connector, RelationalClient, ServerInfo};
use crate::error::{SwitchoverError, SwitchoverResult};
use crate::store::SwitchoverStore;

/// A connection as entered by an operator, with the connection string in plain text
#[derive(Clone, PartialEq)]
pub struct NewConnection {
    pub name: String,
    pub connection_string: String,
    pub environment: ConnectionEnvironment,
    pub created_by: Option<String>,
}

#[derive(Clone, Default, PartialEq)]
pub struct ConnectionUpdate {
    pub name: Option<String>,
    pub connection_string: Option<String>,
    pub environment: Option<ConnectionEnvironment>,
}

// Connection strings carry passwords and stay out of Debug output
impl std::fmt::Debug for NewConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewConnection")
            .field("name", &self.name)
            .field("environment", &self.environment)
            .field("created_by", &self.created_by)
            .finish_non_exhaustive()
    }
}

impl std::fmt::Debug for ConnectionUpdate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionUpdate")
            .field("name", &self.name)
            .field(
                "connection_string",
                &self.connection_string.as_ref().map(|_| "<redacted>"),
            )
            .field("environment", &self.environment)
            .finish()
    }
}

/// Catalog of known endpoints. At most one of them is active.
pub struct ConnectionRegistry {
    store: Arc<dyn SwitchoverStore>,
    cipher: Arc<CredentialCipher>,
    connector: Arc<dyn Connector>,
}

impl ConnectionRegistry {
    pub fn new(
        store: Arc<dyn SwitchoverStore>,
        cipher: Arc<CredentialCipher>,
        connector: Arc<dyn Connector>,
    ) -> Self {
        Self {
            store,
            cipher,
            connector,
        }
    }

    #[tracing::instrument(skip(self))]
    pub async fn create(&self, connection: NewConnection) -> SwitchoverResult<ConnectionRecord> {
        let name = non_empty("name", &connection.name)?;
        non_empty("connection string", &connection.connection_string)?;

        let record = self
            .store
            .create_connection(NewConnectionRecord {
                name: name.to_string(),
                encrypted_connection_string: self.cipher.encrypt(&connection.connection_string)?,
                environment: connection.environment,
                created_by: connection.created_by,
            })
            .await?;
        tracing::info!(connection_id = %record.id, name = %record.name, "Registered database connection");
        Ok(record)
    }

    pub async fn list(&self) -> SwitchoverResult<Vec<ConnectionRecord>> {
        Ok(self.store.list_connections().await?)
    }

    pub async fn find(&self, id: ConnectionId) -> SwitchoverResult<Option<ConnectionRecord>> {
        Ok(self.store.find_connection(id).await?)
    }

    pub async fn get(&self, id: ConnectionId) -> SwitchoverResult<ConnectionRecord> {
        self.find(id)
            .await?
            .ok_or(SwitchoverError::UnknownConnection(id))
    }

    /// Applies a partial update. A new connection string is encrypted before it's stored.
    #[tracing::instrument(skip(self))]
    pub async fn update(
        &self,
        id: ConnectionId,
        update: ConnectionUpdate,
    ) -> SwitchoverResult<ConnectionRecord> {
        let mut changes = ConnectionRecordChanges {
            environment: update.environment,
            ..Default::default()
        };
        if let Some(name) = &update.name {
            changes.name = Some(non_empty("name", name)?.to_string());
        }
        if let Some(connection_string) = &update.connection_string {
            non_empty("connection string", connection_string)?;
            changes.encrypted_connection_string = Some(self.cipher.encrypt(connection_string)?);
        }
        if changes.is_empty() {
            return Err(SwitchoverError::InvalidArgument(
                "no changes requested".to_string(),
            ));
        }

        self.store
            .update_connection(id, changes)
            .await
            .map_err(|e| unknown_if_missing(id, e))
    }

    /// Deletes a connection. The active connection can't be deleted.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: ConnectionId) -> SwitchoverResult<()> {
        self.store
            .delete_connection(id)
            .await
            .map_err(|e| unknown_if_missing(id, e))?;
        tracing::info!(connection_id = %id, "Deleted database connection");
        Ok(())
    }

    pub async fn get_active(&self) -> SwitchoverResult<Option<ConnectionRecord>> {
        Ok(self.store.find_active_connection().await?)
    }

    /// Makes `id` the one active connection in a single transaction
    #[tracing::instrument(skip(self))]
    pub async fn set_active(
        &self,
        id: ConnectionId,
        actor: Option<&str>,
    ) -> SwitchoverResult<ConnectionRecord> {
        let record = self
            .store
            .activate_connection(id, actor)
            .await
            .map_err(|e| unknown_if_missing(id, e))?;
        tracing::info!(connection_id = %id, name = %record.name, "Activated database connection");
        Ok(record)
    }

    /// The plain connection string. Only use it to connect, never persist or log it.
    pub fn decrypt_connection_string(&self, record: &ConnectionRecord) -> SwitchoverResult<String> {
        Ok(self.cipher.decrypt(&record.encrypted_connection_string)?)
    }

    pub async fn connect(
        &self,
        record: &ConnectionRecord,
    ) -> SwitchoverResult<Arc<dyn RelationalClient>> {
        let connection_string = self.decrypt_connection_string(record)?;
        self.connector
            .connect(&connection_string)
            .await
            .map_err(|source| SwitchoverError::Connect {
                connection: record.id,
                source,
            })
    }

    /// Connects, runs a round trip and stores the outcome on the record
    #[tracing::instrument(skip(self))]
    pub async fn test(&self, id: ConnectionId) -> SwitchoverResult<ConnectionTestReport> {
        let record = self.get(id).await?;

        let started = Instant::now();
        let outcome = self.probe(&record).await;
        let latency_ms = started.elapsed().as_millis() as u64;

        let (status, latency_ms, server_version, message) = match outcome {
            Ok(info) => (
                ConnectionTestStatus::Success,
                Some(latency_ms),
                Some(info.version),
                format!("Connected in {latency_ms} ms"),
            ),
            Err(e) => {
                tracing::warn!(connection_id = %id, error = %e, "Connection test failed");
                (ConnectionTestStatus::Failed, None, None, e.to_string())
            }
        };

        let record = self
            .store
            .record_connection_test(id, status, &message)
            .await
            .map_err(|e| unknown_if_missing(id, e))?;

        Ok(ConnectionTestReport {
            connection_id: id,
            status,
            latency_ms,
            server_version,
            message,
            tested_at: record.last_tested_at.unwrap_or_else(Utc::now),
        })
    }

    async fn probe(&self, record: &ConnectionRecord) -> SwitchoverResult<ServerInfo> {
        let client = self.connect(record).await?;
        client
            .probe()
            .await
            .map_err(|source| SwitchoverError::Connect {
                connection: record.id,
                source,
            })
    }
}

fn non_empty<'a>(field: &str, value: &'a str) -> SwitchoverResult<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(SwitchoverError::InvalidArgument(format!(
            "{field} must not be empty"
        )));
    }
    Ok(trimmed)
}

fn unknown_if_missing(id: ConnectionId, err: DatabaseError) -> SwitchoverError {
    if err.is_not_found() {
        SwitchoverError::UnknownConnection(id)
    } else {
        SwitchoverError::Database(err)
    }
}
