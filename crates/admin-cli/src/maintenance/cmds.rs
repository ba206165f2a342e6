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

use serde::Serialize;
use switchover::maintenance::MaintenanceGate;

use crate::cfg::cli_options::OutputFormat;
use crate::errors::CliResult;
use crate::output;

#[derive(Serialize)]
struct MaintenanceStatus {
    enabled: bool,
}

pub async fn status(gate: &MaintenanceGate, format: OutputFormat) -> CliResult<()> {
    let enabled = gate.is_enabled().await?;
    match format {
        OutputFormat::Json => output::print_json(&MaintenanceStatus { enabled }),
        OutputFormat::AsciiTable => {
            println!(
                "Maintenance mode is {}",
                if enabled { "enabled" } else { "disabled" }
            );
            Ok(())
        }
    }
}

pub async fn set(gate: &MaintenanceGate, enabled: bool) -> CliResult<()> {
    if enabled {
        gate.enable().await?;
        println!("Maintenance mode enabled");
    } else {
        gate.disable().await?;
        println!("Maintenance mode disabled");
    }
    Ok(())
}
