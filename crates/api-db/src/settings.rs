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

use sqlx::PgConnection;

use crate::{DatabaseError, DatabaseResult};

pub async fn get(txn: &mut PgConnection, key: &str) -> DatabaseResult<Option<String>> {
    let query = "SELECT value FROM system_settings WHERE key = $1";
    sqlx::query_scalar(query)
        .bind(key)
        .fetch_optional(txn)
        .await
        .map_err(|e| DatabaseError::query(query, e))
}

pub async fn set(txn: &mut PgConnection, key: &str, value: &str) -> DatabaseResult<()> {
    let query = "INSERT INTO system_settings (key, value) VALUES ($1, $2)
        ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value, updated_at = NOW()";
    sqlx::query(query)
        .bind(key)
        .bind(value)
        .execute(txn)
        .await
        .map(|_| ())
        .map_err(|e| DatabaseError::query(query, e))
}
