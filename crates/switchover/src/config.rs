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

use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use model::switchover::DEFAULT_BATCH_SIZE;
use serde::{Deserialize, Serialize};

pub const ENV_PREFIX: &str = "BURSAR_";

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file {0} does not exist")]
    MissingFile(String),
    #[error("Unable to load configuration: {0}")]
    Extract(#[from] figment::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwitchoverConfig {
    /// The database holding the connection registry, switch history and settings
    pub control_database_url: Option<String>,
    /// Where backup artifacts are written
    pub backup_dir: PathBuf,
    /// Bound on connecting to, and acquiring connections from, an endpoint
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,
    /// Pool size per endpoint
    pub max_connections: u32,
    pub default_batch_size: usize,
    /// 64 hex characters. Wins over `credential_key_path`.
    pub credential_key: Option<String>,
    pub credential_key_path: Option<PathBuf>,
}

impl Default for SwitchoverConfig {
    fn default() -> Self {
        Self {
            control_database_url: None,
            backup_dir: PathBuf::from("backups"),
            connect_timeout: Duration::from_secs(5),
            max_connections: 5,
            default_batch_size: DEFAULT_BATCH_SIZE,
            credential_key: None,
            credential_key_path: None,
        }
    }
}

impl std::fmt::Debug for SwitchoverConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redacted = |value: &Option<String>| value.as_ref().map(|_| "<redacted>");
        f.debug_struct("SwitchoverConfig")
            .field("control_database_url", &redacted(&self.control_database_url))
            .field("backup_dir", &self.backup_dir)
            .field("connect_timeout", &self.connect_timeout)
            .field("max_connections", &self.max_connections)
            .field("default_batch_size", &self.default_batch_size)
            .field("credential_key", &redacted(&self.credential_key))
            .field("credential_key_path", &self.credential_key_path)
            .finish()
    }
}

impl SwitchoverConfig {
    /// Defaults, then the TOML file at `path` if given, then `BURSAR_*` environment variables
    pub fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(SwitchoverConfig::default()));
        if let Some(path) = path {
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX))
    }

    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path
            && !path.exists()
        {
            return Err(ConfigError::MissingFile(path.display().to_string()));
        }
        let config: SwitchoverConfig = Self::figment(path).extract()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_batch_size == 0 {
            return Err(ConfigError::Invalid(
                "default_batch_size must be at least 1".to_string(),
            ));
        }
        if self.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "max_connections must be at least 1".to_string(),
            ));
        }
        if self.connect_timeout.is_zero() {
            return Err(ConfigError::Invalid(
                "connect_timeout must not be zero".to_string(),
            ));
        }
        Ok(())
    }
}
