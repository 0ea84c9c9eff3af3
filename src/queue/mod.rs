// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 队列模块
///
/// 负责发现任务的到期调度、运行登记和关闭时的排空
pub mod run_registry;
pub mod scheduler;
