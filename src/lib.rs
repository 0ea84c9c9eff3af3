// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! discovrs：周期性同源 URL 发现服务
//!
//! 对站点执行有深度和页数上限的 BFS 爬取，从浏览器自动化服务返回的多通道信号中
//! 收集候选 URL，经分类和外部审核后按 (origin, url) 去重入库。

/// 应用程序模块
///
/// 请求校验与用例编排
pub mod application;

/// 配置模块
///
/// 处理应用程序的配置设置和环境变量
pub mod config;

/// 领域模块
///
/// 包含核心业务实体、服务和仓库接口
pub mod domain;

/// 外部协作服务客户端
pub mod engines;

/// 基础设施模块
///
/// 数据库、仓库实现和指标导出
pub mod infrastructure;

/// 表示层模块
///
/// 处理HTTP请求和响应，包括路由和处理器
pub mod presentation;

/// 队列模块
///
/// 任务调度与运行登记
pub mod queue;

/// 工具模块
///
/// 提供通用的工具函数和辅助功能
pub mod utils;

/// 工作器模块
///
/// 后台调度循环
pub mod workers;
