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
use model::connection::ConnectionId;
use model::table::BusinessTable;

#[derive(Parser, Debug, Clone)]
pub struct Opts {
    #[clap(long, short, help = "ID of the connection to switch to")]
    pub target: ConnectionId,

    #[clap(
        long,
        help = "Skip the pre-switch backup. A failed switch can then not be rolled back"
    )]
    pub no_backup: bool,

    #[clap(
        long,
        value_delimiter = ',',
        help = "Comma-separated tables to move, all business tables if unset"
    )]
    pub tables: Option<Vec<BusinessTable>>,

    #[clap(long, help = "Rows per INSERT, defaults to default_batch_size from the configuration")]
    pub batch_size: Option<usize>,

    #[clap(long, help = "Don't compare row counts after the move")]
    pub skip_validation: bool,

    #[clap(long, help = "Compare a digest of every table on top of the row counts")]
    pub verify_checksums: bool,
}
