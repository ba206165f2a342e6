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
use switchover::SwitchoverError;
use switchover::config::ConfigError;

pub type CliResult<T> = Result<T, CliError>;

#[derive(thiserror::Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    GenericError(String),
    #[error("Another switch holds the switch lock, try again once it finished")]
    SwitchInProgress,
    #[error("{0}")]
    SwitchFailed(String),
    #[error("Connection test failed: {0}")]
    TestFailed(String),
    #[error(transparent)]
    Switchover(#[from] SwitchoverError),
    #[error(transparent)]
    Database(#[from] DatabaseError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Cipher(#[from] CipherError),
    #[error("Unable to render JSON: {0}")]
    JsonError(#[from] serde_json::Error),
}
