// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域层模块
///
/// 该模块包含系统的核心业务逻辑，包括：
/// - 领域模型（models）：发现的 URL、发现任务和页面信号
/// - 仓库接口（repositories）：数据持久化抽象接口
/// - 服务（services）：分类、信号聚合、审核闸门和 BFS 爬取控制
pub mod models;
pub mod repositories;
pub mod services;
