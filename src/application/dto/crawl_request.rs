// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::models::discovered_url::SourceType;

/// 一次性发现请求
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct CrawlRequestDto {
    #[validate(url)]
    pub base_url: String,
    #[validate(range(min = 0, max = 10))]
    pub max_depth: Option<i32>,
    #[validate(range(min = 1))]
    pub max_pages: Option<i32>,
    pub exclude_suffixes: Option<Vec<String>>,
    pub strategy_type: Option<String>,
    pub strategy_contents: Option<String>,
    #[serde(default)]
    pub source_type: SourceType,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// 发现结果查询参数
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct DiscoveredUrlQueryDto {
    pub source_type: SourceType,
    /// 只返回最近出现过的 URL，未指定窗口时取默认窗口
    #[serde(default)]
    pub recent: bool,
    /// 最近窗口（分钟），指定时隐含 `recent`
    #[validate(range(min = 1, max = 10080))]
    pub recent_minutes: Option<i64>,
}
