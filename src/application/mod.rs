// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 应用程序模块
///
/// 连接控制面与领域服务：请求 DTO 的校验、缺省值填充和用例编排
pub mod dto;
pub mod use_cases;
