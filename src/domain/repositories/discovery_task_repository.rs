// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::models::discovery_task::{DiscoveryTask, RunOutcome};
use crate::utils::errors::RepositoryError;

/// 发现任务仓库特质
///
/// 定义任务的增删改查以及调度器使用的到期查询和运行结果记录
#[async_trait]
pub trait DiscoveryTaskRepository: Send + Sync {
    /// 创建新任务，名称重复时返回 `AlreadyExists`
    async fn create(&self, task: &DiscoveryTask) -> Result<DiscoveryTask, RepositoryError>;
    /// 根据ID查找任务
    async fn find_by_id(&self, id: Uuid) -> Result<Option<DiscoveryTask>, RepositoryError>;
    /// 根据名称查找任务
    async fn find_by_name(&self, name: &str) -> Result<Option<DiscoveryTask>, RepositoryError>;
    /// 按创建时间倒序分页列出任务
    async fn list(&self, offset: u64, limit: u64) -> Result<Vec<DiscoveryTask>, RepositoryError>;
    /// 更新任务的可编辑字段
    async fn update(&self, task: &DiscoveryTask) -> Result<DiscoveryTask, RepositoryError>;
    /// 删除任务，返回是否存在
    async fn delete(&self, id: Uuid) -> Result<bool, RepositoryError>;
    /// 启用或停用任务；`next_execution_time` 为 `Some` 时一并重置
    async fn set_active(
        &self,
        id: Uuid,
        is_active: bool,
        next_execution_time: Option<DateTime<Utc>>,
    ) -> Result<(), RepositoryError>;
    /// 查找已启用且到期的任务
    async fn find_due(&self, now: DateTime<Utc>) -> Result<Vec<DiscoveryTask>, RepositoryError>;
    /// 记录运行开始时间
    async fn mark_started(&self, id: Uuid, started_at: DateTime<Utc>)
        -> Result<(), RepositoryError>;
    /// 记录运行结果：对应计数器原子加一，并推进下次执行时间
    async fn record_run_result(
        &self,
        id: Uuid,
        outcome: RunOutcome,
        next_execution_time: DateTime<Utc>,
    ) -> Result<(), RepositoryError>;
}
