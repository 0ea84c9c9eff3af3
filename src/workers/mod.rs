// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 工作器模块
///
/// 驱动调度器周期性 tick 的后台工作器
pub mod scheduler_worker;
pub mod worker;

pub use worker::Worker;
