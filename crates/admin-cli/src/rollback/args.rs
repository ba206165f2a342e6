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

#[derive(Parser, Debug, Clone)]
pub struct Opts {
    #[clap(long, help = "Skip the backup of the connection being left")]
    pub no_backup: bool,

    #[clap(long, help = "Rows per INSERT, defaults to default_batch_size from the configuration")]
    pub batch_size: Option<usize>,

    #[clap(long, help = "Compare a digest of every table on top of the row counts")]
    pub verify_checksums: bool,
}
