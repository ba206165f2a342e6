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

use model::switchover::SwitchOptions;

use super::Opts;
use crate::cfg::runtime::RuntimeContext;
use crate::errors::CliResult;
use crate::switch::cmds::{report, with_switch_lock};

impl Opts {
    /// Rollbacks always move every table and always validate
    pub fn switch_options(&self, default_batch_size: usize) -> SwitchOptions {
        SwitchOptions {
            create_backup: !self.no_backup,
            batch_size: self.batch_size.unwrap_or(default_batch_size),
            verify_checksums: self.verify_checksums,
            ..Default::default()
        }
    }
}

pub async fn rollback(opts: Opts, ctx: &RuntimeContext) -> CliResult<()> {
    let options = opts.switch_options(ctx.config.default_batch_size);
    let actor = ctx.config.actor.as_deref();

    let result = with_switch_lock(&ctx.control_options, async {
        ctx.engine.rollback_last_switch(options, actor).await
    })
    .await?;
    report(result, ctx.config.format)
}
