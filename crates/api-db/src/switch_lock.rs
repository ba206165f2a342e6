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

//! Session-level advisory lock that keeps switches single-flight.
//!
//! The lock belongs to the session that took it, so acquire and release have to run on the
//! same connection, and that connection has to stay checked out for the whole switch.

use sqlx::PgConnection;

use crate::{DatabaseError, DatabaseResult};

/// Arbitrary, but shared by every process that switches against the same control database
pub const SWITCH_LOCK_KEY: i64 = 0x6275_7273_6172; // "bursar"

/// Returns false without waiting if another session holds the lock
pub async fn try_acquire(txn: &mut PgConnection) -> DatabaseResult<bool> {
    let query = "SELECT pg_try_advisory_lock($1)";
    sqlx::query_scalar(query)
        .bind(SWITCH_LOCK_KEY)
        .fetch_one(txn)
        .await
        .map_err(|e| DatabaseError::query(query, e))
}

pub async fn release(txn: &mut PgConnection) -> DatabaseResult<bool> {
    let query = "SELECT pg_advisory_unlock($1)";
    sqlx::query_scalar(query)
        .bind(SWITCH_LOCK_KEY)
        .fetch_one(txn)
        .await
        .map_err(|e| DatabaseError::query(query, e))
}
