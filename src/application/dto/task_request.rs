// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::models::discovered_url::SourceType;

/// 创建发现任务请求DTO
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct CreateTaskRequestDto {
    /// 任务名称，全局唯一
    #[validate(length(min = 1, max = 128))]
    pub task_name: String,
    #[validate(url)]
    pub base_url: String,
    #[serde(default)]
    pub source_type: SourceType,
    #[serde(default)]
    pub tags: Vec<String>,
    /// 最大爬取深度，为空时使用全局默认值
    #[validate(range(min = 0, max = 10))]
    pub depth: Option<i32>,
    #[validate(range(min = 1))]
    pub max_pages: Option<i32>,
    pub strategy_type: Option<String>,
    pub strategy_contents: Option<String>,
    pub exclude_suffixes: Option<Vec<String>>,
    /// 执行间隔（秒）
    #[validate(range(min = 1, max = 31_536_000))]
    pub execution_interval: i64,
}

/// 更新发现任务请求DTO，未提供的字段保持不变
#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
pub struct UpdateTaskRequestDto {
    #[validate(length(min = 1, max = 128))]
    pub task_name: Option<String>,
    #[validate(url)]
    pub base_url: Option<String>,
    pub source_type: Option<SourceType>,
    pub tags: Option<Vec<String>>,
    #[validate(range(min = 0, max = 10))]
    pub depth: Option<i32>,
    #[validate(range(min = 1))]
    pub max_pages: Option<i32>,
    pub strategy_type: Option<String>,
    pub strategy_contents: Option<String>,
    pub exclude_suffixes: Option<Vec<String>>,
    #[validate(range(min = 1, max = 31_536_000))]
    pub execution_interval: Option<i64>,
}

/// 任务列表分页参数
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ListTasksQueryDto {
    pub skip: Option<u64>,
    #[validate(range(min = 1, max = 200))]
    pub limit: Option<u64>,
}
