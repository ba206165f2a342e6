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

use clap::Parser;
use model::connection::{ConnectionEnvironment, ConnectionId};

#[derive(Parser, Debug, Clone)]
#[clap(rename_all = "kebab_case")]
pub enum Cmd {
    #[clap(about = "Register a database connection")]
    Create(CreateConnection),
    #[clap(about = "List registered connections")]
    List,
    #[clap(about = "Show a single connection")]
    Show(ConnectionSelector),
    #[clap(about = "Change name, connection string or environment of a connection")]
    Update(UpdateConnection),
    #[clap(about = "Delete a connection that isn't active")]
    Delete(ConnectionSelector),
    #[clap(about = "Check that a connection is reachable and record the outcome")]
    Test(ConnectionSelector),
    #[clap(about = "Show the active connection")]
    Active,
}

#[derive(Parser, Debug, Clone)]
pub struct CreateConnection {
    #[clap(long, short, help = "Unique display name")]
    pub name: String,
    #[clap(
        long,
        env = "BURSAR_CONNECTION_URL",
        hide_env_values = true,
        help = "postgres:// connection string, stored encrypted"
    )]
    pub url: String,
    #[clap(long, short, default_value = "production", help = "production, staging, development or testing")]
    pub environment: ConnectionEnvironment,
}

#[derive(Parser, Debug, Clone)]
pub struct ConnectionSelector {
    #[clap(help = "Connection ID")]
    pub id: ConnectionId,
}

#[derive(Parser, Debug, Clone)]
pub struct UpdateConnection {
    #[clap(help = "Connection ID")]
    pub id: ConnectionId,
    #[clap(long, short, help = "New display name")]
    pub name: Option<String>,
    #[clap(long, help = "New connection string")]
    pub url: Option<String>,
    #[clap(long, short, help = "New environment")]
    pub environment: Option<ConnectionEnvironment>,
}
