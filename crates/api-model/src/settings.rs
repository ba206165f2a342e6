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

//! Keys and value encoding of the `system_settings` table.

pub const MAINTENANCE_MODE_KEY: &str = "maintenance_mode";

/// Settings are stored as text. Anything other than a case-insensitive "true" reads as off.
pub fn parse_flag(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("true")
}

pub fn format_flag(enabled: bool) -> &'static str {
    if enabled { "true" } else { "false" }
}
