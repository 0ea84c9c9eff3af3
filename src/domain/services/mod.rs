// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域服务模块
///
/// 包含的服务：
/// - URL 分类器（url_classifier）：按扩展名和协议把链接分为 normal/media/asset/garbage
/// - 信号聚合器（discovery_aggregator）：合并页面各发现通道的链接并去重
/// - 审核闸门（audit_gate）：批量提交审核，失败时降级为待审
/// - 爬取控制器（crawl_controller）：单次运行的 BFS 主循环
pub mod audit_gate;
pub mod crawl_controller;
pub mod discovery_aggregator;
pub mod url_classifier;
