// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// HTTP请求处理器模块
///
/// 一次性发现、结果查询和任务管理端点
pub mod discovery_handler;
pub mod task_handler;
