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

mod memory_database;
mod memory_store;

use std::sync::Arc;

use bursar_secrets::CredentialCipher;
use model::connection::{ConnectionEnvironment, ConnectionRecord};

pub use self::memory_database::{
    MemoryConnector, MemoryDatabase, columns_for, sample_row, sample_rows,
};
pub use self::memory_store::MemoryStore;
use crate::MigrationEngine;
use crate::backup::BackupGenerator;
use crate::history::SwitchHistoryLog;
use crate::maintenance::MaintenanceGate;
use crate::registry::{ConnectionRegistry, NewConnection};

pub const TEST_KEY: &str = "5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a";

/// An engine wired to in-memory endpoints and an in-memory control store
pub struct TestEnv {
    pub store: Arc<MemoryStore>,
    pub connector: Arc<MemoryConnector>,
    pub cipher: Arc<CredentialCipher>,
    pub registry: Arc<ConnectionRegistry>,
    pub engine: MigrationEngine,
    pub backup_dir: tempfile::TempDir,
}

impl TestEnv {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::default());
        let connector = Arc::new(MemoryConnector::default());
        let cipher = Arc::new(CredentialCipher::from_hex_key(TEST_KEY).unwrap());
        let registry = Arc::new(ConnectionRegistry::new(
            store.clone(),
            cipher.clone(),
            connector.clone(),
        ));
        let backup_dir = tempfile::tempdir().unwrap();
        let engine = MigrationEngine::new(
            registry.clone(),
            MaintenanceGate::new(store.clone()),
            SwitchHistoryLog::new(store.clone()),
            BackupGenerator::new(backup_dir.path()),
        );
        Self {
            store,
            connector,
            cipher,
            registry,
            engine,
            backup_dir,
        }
    }

    pub fn connection_string(name: &str) -> String {
        format!("postgres://bursar:s3cret@{name}.db.internal:5432/bursar")
    }

    /// Registers an endpoint served by `database`
    pub async fn add_endpoint(&self, name: &str, database: Arc<MemoryDatabase>) -> ConnectionRecord {
        let connection_string = Self::connection_string(name);
        self.connector.add(&connection_string, database);
        self.registry
            .create(NewConnection {
                name: name.to_string(),
                connection_string,
                environment: ConnectionEnvironment::Staging,
                created_by: Some("tester".to_string()),
            })
            .await
            .unwrap()
    }

    pub async fn add_active_endpoint(
        &self,
        name: &str,
        database: Arc<MemoryDatabase>,
    ) -> ConnectionRecord {
        let record = self.add_endpoint(name, database).await;
        self.registry
            .set_active(record.id, Some("setup"))
            .await
            .unwrap()
    }
}
