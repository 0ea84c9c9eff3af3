// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, FixedOffset, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use url::Url;
use uuid::Uuid;

use crate::domain::models::discovered_url::SourceType;

/// 任务允许的最大爬取深度
pub const MAX_TASK_DEPTH: i32 = 10;

/// 执行间隔上限（秒），一年
pub const MAX_EXECUTION_INTERVAL_SECS: i64 = 365 * 24 * 3600;

/// 发现任务实体
///
/// 周期性地对同一站点执行一次 BFS 发现。调度器在每次运行结束后推进
/// `next_execution_time`，只有显式重启会把它重置为当前时间。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryTask {
    /// 任务唯一标识符
    pub id: Uuid,
    /// 任务名称，全局唯一
    pub task_name: String,
    /// 爬取入口 URL
    pub base_url: String,
    /// 发现结果的业务来源标签
    pub source_type: SourceType,
    /// 写入发现记录的自由标签
    pub tags: Vec<String>,
    /// 最大爬取深度
    pub depth: i32,
    /// 单次运行最多访问的页面数，为空时使用全局默认值
    pub max_pages: Option<i32>,
    /// 爬取策略类型，透传给自动化服务和审核服务
    pub strategy_type: Option<String>,
    /// 爬取策略内容
    pub strategy_contents: Option<String>,
    /// 不入库的路径后缀
    pub exclude_suffixes: Vec<String>,
    /// 执行间隔（秒）
    pub execution_interval: i64,
    /// 下次执行时间
    pub next_execution_time: Option<DateTime<FixedOffset>>,
    /// 最近一次开始执行的时间
    pub last_execution_time: Option<DateTime<FixedOffset>>,
    /// 是否启用
    pub is_active: bool,
    /// 成功运行次数
    pub success_counts: i64,
    /// 失败运行次数
    pub fail_counts: i64,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>,
}

/// 创建任务所需的参数
#[derive(Debug, Clone)]
pub struct NewDiscoveryTask {
    pub task_name: String,
    pub base_url: String,
    pub source_type: SourceType,
    pub tags: Vec<String>,
    pub depth: i32,
    pub max_pages: Option<i32>,
    pub strategy_type: Option<String>,
    pub strategy_contents: Option<String>,
    pub exclude_suffixes: Vec<String>,
    pub execution_interval: i64,
}

/// 不透明的爬取策略
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlStrategy {
    pub strategy_type: Option<String>,
    pub strategy_contents: Option<String>,
}

/// 任务运行状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskRunState {
    /// 已停用，不会被调度
    Stopped,
    /// 已启用，等待到期
    Idle,
    /// 正在运行
    Running,
}

impl fmt::Display for TaskRunState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TaskRunState::Stopped => write!(f, "stopped"),
            TaskRunState::Idle => write!(f, "idle"),
            TaskRunState::Running => write!(f, "running"),
        }
    }
}

/// 单次运行结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Succeeded,
    Failed,
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RunOutcome::Succeeded => write!(f, "succeeded"),
            RunOutcome::Failed => write!(f, "failed"),
        }
    }
}

/// 领域错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// 验证错误，当输入数据不符合领域规则时发生
    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl DiscoveryTask {
    /// 创建一个新的发现任务
    ///
    /// 新任务立即到期，由调用方触发首次运行
    ///
    /// # 参数
    ///
    /// * `params` - 任务参数
    ///
    /// # 返回值
    ///
    /// * `Ok(DiscoveryTask)` - 通过校验的任务
    /// * `Err(DomainError)` - 参数不合法
    pub fn new(params: NewDiscoveryTask) -> Result<Self, DomainError> {
        let now: DateTime<FixedOffset> = Utc::now().into();
        let task = Self {
            id: Uuid::new_v4(),
            task_name: params.task_name.trim().to_string(),
            base_url: params.base_url.trim().to_string(),
            source_type: params.source_type,
            tags: params.tags,
            depth: params.depth,
            max_pages: params.max_pages,
            strategy_type: params.strategy_type,
            strategy_contents: params.strategy_contents,
            exclude_suffixes: params.exclude_suffixes,
            execution_interval: params.execution_interval,
            next_execution_time: Some(now),
            last_execution_time: None,
            is_active: true,
            success_counts: 0,
            fail_counts: 0,
            created_at: now,
            updated_at: now,
        };
        task.validate()?;
        Ok(task)
    }

    /// 校验领域规则
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.task_name.is_empty() {
            return Err(DomainError::ValidationError(
                "task_name cannot be empty".to_string(),
            ));
        }
        validate_base_url(&self.base_url)?;
        if !(0..=MAX_TASK_DEPTH).contains(&self.depth) {
            return Err(DomainError::ValidationError(format!(
                "depth must be between 0 and {}",
                MAX_TASK_DEPTH
            )));
        }
        if !(1..=MAX_EXECUTION_INTERVAL_SECS).contains(&self.execution_interval) {
            return Err(DomainError::ValidationError(format!(
                "execution_interval must be between 1 and {} seconds",
                MAX_EXECUTION_INTERVAL_SECS
            )));
        }
        if matches!(self.max_pages, Some(pages) if pages <= 0) {
            return Err(DomainError::ValidationError(
                "max_pages must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// 爬取策略
    pub fn strategy(&self) -> CrawlStrategy {
        CrawlStrategy {
            strategy_type: self.strategy_type.clone(),
            strategy_contents: self.strategy_contents.clone(),
        }
    }

    /// 运行结束后的下次执行时间
    ///
    /// 间隔被限制在 `[1, MAX_EXECUTION_INTERVAL_SECS]` 内，绕过校验写入的
    /// 越界值也不会溢出。
    pub fn next_execution_after(&self, completed_at: DateTime<Utc>) -> DateTime<Utc> {
        let interval = self
            .execution_interval
            .clamp(1, MAX_EXECUTION_INTERVAL_SECS);
        TimeDelta::try_seconds(interval)
            .and_then(|delta| completed_at.checked_add_signed(delta))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// 是否到期
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.is_active
            && self
                .next_execution_time
                .map_or(true, |next| next.with_timezone(&Utc) <= now)
    }

    /// 结合运行注册表得到任务状态
    pub fn run_state(&self, running: bool) -> TaskRunState {
        if running {
            TaskRunState::Running
        } else if self.is_active {
            TaskRunState::Idle
        } else {
            TaskRunState::Stopped
        }
    }
}

/// 校验入口 URL：必须是带主机名的 http(s) 地址
pub fn validate_base_url(base_url: &str) -> Result<Url, DomainError> {
    let url = Url::parse(base_url)
        .map_err(|e| DomainError::ValidationError(format!("invalid base_url: {}", e)))?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(DomainError::ValidationError(format!(
            "invalid base_url: {} is not an http(s) address",
            base_url
        )));
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> NewDiscoveryTask {
        NewDiscoveryTask {
            task_name: "docs".to_string(),
            base_url: "https://example.com".to_string(),
            source_type: SourceType::Sitemap,
            tags: vec![],
            depth: 1,
            max_pages: None,
            strategy_type: None,
            strategy_contents: None,
            exclude_suffixes: vec![".js".to_string()],
            execution_interval: 3600,
        }
    }

    #[test]
    fn test_new_task_is_immediately_due() {
        let task = DiscoveryTask::new(params()).unwrap();
        assert!(task.is_active);
        assert!(task.is_due(Utc::now()));
        assert_eq!(task.run_state(false), TaskRunState::Idle);
        assert_eq!(task.run_state(true), TaskRunState::Running);
    }

    #[test]
    fn test_rejects_invalid_parameters() {
        let mut bad_interval = params();
        bad_interval.execution_interval = 0;
        assert!(DiscoveryTask::new(bad_interval).is_err());

        let mut bad_depth = params();
        bad_depth.depth = -1;
        assert!(DiscoveryTask::new(bad_depth).is_err());

        let mut bad_url = params();
        bad_url.base_url = "ftp://example.com".to_string();
        assert!(DiscoveryTask::new(bad_url).is_err());

        let mut blank_name = params();
        blank_name.task_name = "   ".to_string();
        assert!(DiscoveryTask::new(blank_name).is_err());
    }

    #[test]
    fn test_next_execution_advances_by_interval() {
        let task = DiscoveryTask::new(params()).unwrap();
        let completed = Utc::now();
        let next = task.next_execution_after(completed);
        assert_eq!(next - completed, TimeDelta::seconds(3600));
    }

    #[test]
    fn test_rejects_interval_beyond_one_year() {
        let mut huge = params();
        huge.execution_interval = i64::MAX;
        assert!(DiscoveryTask::new(huge).is_err());

        let mut year = params();
        year.execution_interval = MAX_EXECUTION_INTERVAL_SECS;
        assert!(DiscoveryTask::new(year).is_ok());
    }

    #[test]
    fn test_next_execution_never_overflows() {
        let mut task = DiscoveryTask::new(params()).unwrap();
        task.execution_interval = i64::MAX;
        let completed = Utc::now();

        let next = task.next_execution_after(completed);
        assert_eq!(
            next - completed,
            TimeDelta::seconds(MAX_EXECUTION_INTERVAL_SECS)
        );

        task.execution_interval = 3600;
        assert_eq!(
            task.next_execution_after(DateTime::<Utc>::MAX_UTC),
            DateTime::<Utc>::MAX_UTC
        );
    }

    #[test]
    fn test_stopped_task_is_never_due() {
        let mut task = DiscoveryTask::new(params()).unwrap();
        task.is_active = false;
        assert!(!task.is_due(Utc::now()));
        assert_eq!(task.run_state(false), TaskRunState::Stopped);
    }
}
