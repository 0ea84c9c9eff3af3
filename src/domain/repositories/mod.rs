// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 仓库接口模块
///
/// 定义发现记录和发现任务的数据访问抽象，由基础设施层实现
pub mod discovered_url_repository;
pub mod discovery_task_repository;
