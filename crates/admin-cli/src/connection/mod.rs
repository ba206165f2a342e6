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

pub mod args;
pub mod cmds;


pub use args::Cmd;

use crate::cfg::dispatch::Dispatch;
use crate::cfg::runtime::RuntimeContext;
use crate::errors::CliResult;

impl Dispatch for Cmd {
    async fn dispatch(self, ctx: RuntimeContext) -> CliResult<()> {
        let registry = ctx.engine.registry();
        let format = ctx.config.format;
        match self {
            Cmd::Create(args) => {
                cmds::create(args, registry, ctx.config.actor.as_deref(), format).await
            }
            Cmd::List => cmds::list(registry, format).await,
            Cmd::Show(args) => cmds::show(args, registry, format).await,
            Cmd::Update(args) => cmds::update(args, registry, format).await,
            Cmd::Delete(args) => cmds::delete(args, registry).await,
            Cmd::Test(args) => cmds::test(args, registry, format).await,
            Cmd::Active => cmds::active(registry, format).await,
        }
    }
}
