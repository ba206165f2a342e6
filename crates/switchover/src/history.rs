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
use model::switch_history::{NewSwitchAttempt, SwitchAttempt};
use serde::Serialize;

use crate::error::{SwitchoverError, SwitchoverResult};
use crate::store::SwitchoverStore;

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryPage {
    pub attempts: Vec<SwitchAttempt>,
    /// 1-based
    pub page: u32,
    pub page_size: u32,
    pub total: u64,
    pub total_pages: u32,
}

/// Append-only audit log of switch attempts
#[derive(Clone)]
pub struct SwitchHistoryLog {
    store: Arc<dyn SwitchoverStore>,
}

impl SwitchHistoryLog {
    pub fn new(store: Arc<dyn SwitchoverStore>) -> Self {
        Self { store }
    }

    pub async fn record(&self, attempt: NewSwitchAttempt) -> DatabaseResult<SwitchAttempt> {
        let attempt = self.store.append_switch_attempt(attempt).await?;
        tracing::info!(
            attempt_id = %attempt.id,
            kind = %attempt.kind,
            status = %attempt.status,
            source = ?attempt.source_connection_id.map(|id| id.0),
            target = %attempt.target_connection_id,
            "Recorded switch attempt"
        );
        Ok(attempt)
    }

    /// Newest attempts first. `page` starts at 1.
    pub async fn list(&self, page: u32, page_size: u32) -> SwitchoverResult<HistoryPage> {
        if page == 0 {
            return Err(SwitchoverError::InvalidArgument(
                "page numbers start at 1".to_string(),
            ));
        }
        if page_size == 0 || page_size > MAX_PAGE_SIZE {
            return Err(SwitchoverError::InvalidArgument(format!(
                "page size must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }

        let offset = i64::from(page - 1) * i64::from(page_size);
        let attempts = self
            .store
            .list_switch_attempts(i64::from(page_size), offset)
            .await?;
        let total = self.store.count_switch_attempts().await?.max(0) as u64;
        Ok(HistoryPage {
            attempts,
            page,
            page_size,
            total,
            total_pages: total.div_ceil(u64::from(page_size)) as u32,
        })
    }

    pub async fn latest_successful(&self) -> DatabaseResult<Option<SwitchAttempt>> {
        self.store.latest_successful_switch().await
    }
}
