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

//! Database switchover engine.
//!
//! Moves a deployment from its active database connection to another registered one: probe
//! the target, fence traffic off with the maintenance gate, back up the source, copy every
//! business table, validate, resync identity sequences and flip the active connection. A
//! failure restores the source from its backup. Every attempt past request validation ends up
//! in the switch history.

pub mod backup;
pub mod client;
pub mod config;
pub mod engine;
pub mod error;
pub mod history;
pub mod maintenance;
pub mod postgres;
pub mod registry;
pub mod sql;
pub mod store;

#[cfg(test)]
mod tests;

pub use crate::engine::{MigrationEngine, SwitchPhase};
pub use crate::error::{SwitchoverError, SwitchoverResult};
