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

use db::DatabaseResult;
use model::settings::{MAINTENANCE_MODE_KEY, format_flag, parse_flag};

use crate::store::SwitchoverStore;

/// Process-wide switch that fences ordinary traffic off while a switch runs.
///
/// The state lives in the `maintenance_mode` setting so every process consulting the gate sees
/// the same value.
#[derive(Clone)]
pub struct MaintenanceGate {
    store: Arc<dyn SwitchoverStore>,
}

impl MaintenanceGate {
    pub fn new(store: Arc<dyn SwitchoverStore>) -> Self {
        Self { store }
    }

    pub async fn enable(&self) -> DatabaseResult<()> {
        self.set(true).await
    }

    pub async fn disable(&self) -> DatabaseResult<()> {
        self.set(false).await
    }

    /// A missing setting reads as disabled
    pub async fn is_enabled(&self) -> DatabaseResult<bool> {
        Ok(self
            .store
            .get_setting(MAINTENANCE_MODE_KEY)
            .await?
            .is_some_and(|value| parse_flag(&value)))
    }

    async fn set(&self, enabled: bool) -> DatabaseResult<()> {
        self.store
            .set_setting(MAINTENANCE_MODE_KEY, format_flag(enabled))
            .await?;
        tracing::info!(enabled, "Maintenance mode changed");
        Ok(())
    }
}
