// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::Utc;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::application::dto::task_request::{
    CreateTaskRequestDto, ListTasksQueryDto, UpdateTaskRequestDto,
};
use crate::application::dto::task_response::TaskStatusResponseDto;
use crate::config::settings::CrawlerSettings;
use crate::domain::models::discovery_task::{DiscoveryTask, NewDiscoveryTask};
use crate::domain::repositories::discovery_task_repository::DiscoveryTaskRepository;
use crate::queue::scheduler::DiscoveryScheduler;
use crate::utils::errors::{DiscoveryError, RepositoryError};

const DEFAULT_PAGE_SIZE: u64 = 50;

/// 发现任务管理用例
///
/// 负责任务的增删改查和启停。创建与重启会立即触发一次运行，
/// 运行中的任务不允许删除。
pub struct DiscoveryTaskUseCase<R: DiscoveryTaskRepository + 'static> {
    repository: Arc<R>,
    scheduler: Arc<DiscoveryScheduler<R>>,
    crawler: CrawlerSettings,
}

impl<R: DiscoveryTaskRepository + 'static> DiscoveryTaskUseCase<R> {
    pub fn new(
        repository: Arc<R>,
        scheduler: Arc<DiscoveryScheduler<R>>,
        crawler: CrawlerSettings,
    ) -> Self {
        Self {
            repository,
            scheduler,
            crawler,
        }
    }

    /// 创建任务并立即触发首次运行
    ///
    /// # 参数
    ///
    /// * `dto` - 创建请求
    ///
    /// # 返回值
    ///
    /// * `Ok(DiscoveryTask)` - 已创建的任务
    /// * `Err(DiscoveryError::Configuration)` - 参数非法
    /// * `Err(DiscoveryError::Conflict)` - 名称已存在
    pub async fn create(&self, dto: CreateTaskRequestDto) -> Result<DiscoveryTask, DiscoveryError> {
        dto.validate()
            .map_err(|e| DiscoveryError::Configuration(e.to_string()))?;

        let task = DiscoveryTask::new(NewDiscoveryTask {
            task_name: dto.task_name,
            base_url: dto.base_url,
            source_type: dto.source_type,
            tags: dto.tags,
            depth: dto
                .depth
                .unwrap_or(self.crawler.default_max_depth as i32),
            max_pages: dto.max_pages,
            strategy_type: dto.strategy_type,
            strategy_contents: dto.strategy_contents,
            exclude_suffixes: dto
                .exclude_suffixes
                .unwrap_or_else(|| self.crawler.default_exclude_suffixes.clone()),
            execution_interval: dto.execution_interval,
        })?;

        let created = self.repository.create(&task).await.map_err(map_repo_err)?;
        info!(task_id = %created.id, task_name = %created.task_name, "Discovery task created");

        self.scheduler.launch(created.clone());
        Ok(created)
    }

    pub async fn get(&self, id: Uuid) -> Result<DiscoveryTask, DiscoveryError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| DiscoveryError::NotFound(format!("task {}", id)))
    }

    /// 按创建时间倒序分页列出任务
    pub async fn list(&self, query: &ListTasksQueryDto) -> Result<Vec<DiscoveryTask>, DiscoveryError> {
        query
            .validate()
            .map_err(|e| DiscoveryError::Configuration(e.to_string()))?;
        let tasks = self
            .repository
            .list(query.skip.unwrap_or(0), query.limit.unwrap_or(DEFAULT_PAGE_SIZE))
            .await?;
        Ok(tasks)
    }

    /// 部分更新任务，名称唯一性由仓库保证
    pub async fn update(
        &self,
        id: Uuid,
        dto: UpdateTaskRequestDto,
    ) -> Result<DiscoveryTask, DiscoveryError> {
        dto.validate()
            .map_err(|e| DiscoveryError::Configuration(e.to_string()))?;

        let mut task = self.get(id).await?;
        if let Some(task_name) = dto.task_name {
            task.task_name = task_name.trim().to_string();
        }
        if let Some(base_url) = dto.base_url {
            task.base_url = base_url.trim().to_string();
        }
        if let Some(source_type) = dto.source_type {
            task.source_type = source_type;
        }
        if let Some(tags) = dto.tags {
            task.tags = tags;
        }
        if let Some(depth) = dto.depth {
            task.depth = depth;
        }
        if dto.max_pages.is_some() {
            task.max_pages = dto.max_pages;
        }
        if dto.strategy_type.is_some() {
            task.strategy_type = dto.strategy_type;
        }
        if dto.strategy_contents.is_some() {
            task.strategy_contents = dto.strategy_contents;
        }
        if let Some(exclude_suffixes) = dto.exclude_suffixes {
            task.exclude_suffixes = exclude_suffixes;
        }
        if let Some(interval) = dto.execution_interval {
            task.execution_interval = interval;
        }
        task.validate()?;

        self.repository.update(&task).await.map_err(map_repo_err)
    }

    /// 删除任务，运行中的任务返回冲突
    ///
    /// 删除期间占用运行登记，调度器不会在检查与删除之间启动该任务
    pub async fn delete(&self, id: Uuid) -> Result<(), DiscoveryError> {
        let Some(_reservation) = self.scheduler.reserve(id) else {
            return Err(DiscoveryError::Conflict(format!(
                "task {} has a run in flight",
                id
            )));
        };
        if !self.repository.delete(id).await? {
            return Err(DiscoveryError::NotFound(format!("task {}", id)));
        }
        info!(task_id = %id, "Discovery task deleted");
        Ok(())
    }

    /// 启用任务，下次执行时间重置为当前时间并立即触发
    ///
    /// 上一次运行还未结束时，新的运行在它结束后立即开始
    pub async fn start(&self, id: Uuid) -> Result<DiscoveryTask, DiscoveryError> {
        self.get(id).await?;
        self.repository
            .set_active(id, true, Some(Utc::now()))
            .await
            .map_err(map_repo_err)?;
        let scheduled = self.scheduler.restart(id).await.map_err(map_repo_err)?;
        info!(task_id = %id, scheduled, "Discovery task started");
        self.get(id).await
    }

    /// 停用任务；在途运行收到停止信号，不再派发新页面
    pub async fn stop(&self, id: Uuid) -> Result<DiscoveryTask, DiscoveryError> {
        self.get(id).await?;
        self.repository
            .set_active(id, false, None)
            .await
            .map_err(map_repo_err)?;
        let signalled = self.scheduler.signal_stop(id);
        info!(task_id = %id, in_flight = signalled, "Discovery task stopped");
        self.get(id).await
    }

    pub async fn status(&self, id: Uuid) -> Result<TaskStatusResponseDto, DiscoveryError> {
        let task = self.get(id).await?;
        Ok(TaskStatusResponseDto::new(
            &task,
            self.scheduler.is_running(id),
        ))
    }
}

fn map_repo_err(err: RepositoryError) -> DiscoveryError {
    match err {
        RepositoryError::AlreadyExists(name) => {
            DiscoveryError::Conflict(format!("task name '{}' already exists", name))
        }
        RepositoryError::NotFound => DiscoveryError::NotFound("task".to_string()),
        other => DiscoveryError::Persistence(other),
    }
}

#[cfg(test)]
#[path = "task_use_case_test.rs"]
mod tests;
