// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域模型模块
///
/// - 发现的 URL（discovered_url）：按 (origin, url) 唯一的发现记录
/// - 发现任务（discovery_task）：周期执行的爬取任务
/// - 页面信号（signal）：自动化服务返回的多通道发现信号
pub mod discovered_url;
pub mod discovery_task;
pub mod signal;
