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
use switchover::history::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

#[derive(Parser, Debug, Clone)]
pub struct Opts {
    #[clap(long, short, default_value_t = 1, help = "Page to show, starting at 1")]
    pub page: u32,

    #[clap(
        long,
        default_value_t = DEFAULT_PAGE_SIZE,
        value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_PAGE_SIZE)),
        help = "Attempts per page"
    )]
    pub page_size: u32,
}
