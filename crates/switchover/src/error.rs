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

use bursar_secrets::CipherError;
use db::DatabaseError;
use model::connection::ConnectionId;
use model::table::BusinessTable;

use crate::backup::BackupError;
use crate::client::ClientError;

pub type SwitchoverResult<T> = Result<T, SwitchoverError>;

#[derive(thiserror::Error, Debug)]
pub enum SwitchoverError {
    #[error("Connection {0} is already the active connection")]
    SameTarget(ConnectionId),
    #[error("Connection {0} does not exist")]
    UnknownConnection(ConnectionId),
    #[error("Invalid switch options: {0}")]
    InvalidOptions(String),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Nothing to roll back: {0}")]
    NothingToRollBack(String),

    #[error("Unable to reach connection {connection}: {source}")]
    Connect {
        connection: ConnectionId,
        #[source]
        source: ClientError,
    },
    #[error("Connection {connection} is missing tables: {}", .tables.iter().map(|t| t.name()).collect::<Vec<_>>().join(", "))]
    MissingTables {
        connection: ConnectionId,
        tables: Vec<BusinessTable>,
    },
    #[error("Backup failed: {0}")]
    Backup(#[from] BackupError),
    #[error("Migrating {table} failed: {source}")]
    Transfer {
        table: BusinessTable,
        #[source]
        source: ClientError,
    },
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Activating connection {connection} failed: {source}")]
    Activation {
        connection: ConnectionId,
        #[source]
        source: DatabaseError,
    },
    #[error("Switch aborted by a panic: {0}")]
    Panic(String),

    #[error("Credential error: {0}")]
    Cipher(#[from] CipherError),
    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl SwitchoverError {
    /// Errors raised before a switch passes request validation. These are never recorded in
    /// the switch history.
    pub fn is_request_rejection(&self) -> bool {
        matches!(
            self,
            Self::SameTarget(_)
                | Self::UnknownConnection(_)
                | Self::InvalidOptions(_)
                | Self::InvalidArgument(_)
                | Self::NothingToRollBack(_)
        )
    }
}
