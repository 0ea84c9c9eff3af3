// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 外部协作服务客户端
///
/// - 浏览器自动化服务：逐页采集多通道发现信号
/// - 审核服务：对候选 URL 给出接受或拒绝结论
pub mod audit_client;
pub mod automation_client;
pub mod traits;
