// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::models::discovery_task::{DiscoveryTask, RunOutcome};
use crate::domain::repositories::discovery_task_repository::DiscoveryTaskRepository;
use crate::infrastructure::database::entities::discovery_task as task_entity;
use crate::utils::errors::RepositoryError;

/// 发现任务仓库实现
///
/// 基于SeaORM实现的任务数据访问层
#[derive(Clone)]
pub struct DiscoveryTaskRepositoryImpl {
    /// 数据库连接
    db: Arc<DatabaseConnection>,
}

impl DiscoveryTaskRepositoryImpl {
    /// 创建新的任务仓库实例
    ///
    /// # 参数
    ///
    /// * `db` - 数据库连接
    ///
    /// # 返回值
    ///
    /// 返回新的任务仓库实例
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

impl From<task_entity::Model> for DiscoveryTask {
    fn from(model: task_entity::Model) -> Self {
        Self {
            id: model.id,
            task_name: model.task_name,
            base_url: model.base_url,
            source_type: model.source_type.parse().unwrap_or_default(),
            tags: serde_json::from_value(model.tags).unwrap_or_default(),
            depth: model.depth,
            max_pages: model.max_pages,
            strategy_type: model.strategy_type,
            strategy_contents: model.strategy_contents,
            exclude_suffixes: serde_json::from_value(model.exclude_suffixes).unwrap_or_default(),
            execution_interval: model.execution_interval,
            next_execution_time: model.next_execution_time,
            last_execution_time: model.last_execution_time,
            is_active: model.is_active,
            success_counts: model.success_counts,
            fail_counts: model.fail_counts,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

impl From<&DiscoveryTask> for task_entity::ActiveModel {
    fn from(task: &DiscoveryTask) -> Self {
        Self {
            id: Set(task.id),
            task_name: Set(task.task_name.clone()),
            base_url: Set(task.base_url.clone()),
            source_type: Set(task.source_type.to_string()),
            tags: Set(serde_json::json!(task.tags)),
            depth: Set(task.depth),
            max_pages: Set(task.max_pages),
            strategy_type: Set(task.strategy_type.clone()),
            strategy_contents: Set(task.strategy_contents.clone()),
            exclude_suffixes: Set(serde_json::json!(task.exclude_suffixes)),
            execution_interval: Set(task.execution_interval),
            next_execution_time: Set(task.next_execution_time),
            last_execution_time: Set(task.last_execution_time),
            is_active: Set(task.is_active),
            success_counts: Set(task.success_counts),
            fail_counts: Set(task.fail_counts),
            created_at: Set(task.created_at),
            updated_at: Set(task.updated_at),
        }
    }
}

fn now_fixed() -> DateTime<FixedOffset> {
    Utc::now().into()
}

#[async_trait]
impl DiscoveryTaskRepository for DiscoveryTaskRepositoryImpl {
    async fn create(&self, task: &DiscoveryTask) -> Result<DiscoveryTask, RepositoryError> {
        if self.find_by_name(&task.task_name).await?.is_some() {
            return Err(RepositoryError::AlreadyExists(task.task_name.clone()));
        }

        let model: task_entity::ActiveModel = task.into();
        let result = model.insert(self.db.as_ref()).await.map_err(|e| {
            // 并发创建同名任务时由唯一索引兜底
            if matches!(
                e.sql_err(),
                Some(sea_orm::SqlErr::UniqueConstraintViolation(_))
            ) {
                RepositoryError::AlreadyExists(task.task_name.clone())
            } else {
                RepositoryError::Database(e)
            }
        })?;

        Ok(result.into())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<DiscoveryTask>, RepositoryError> {
        let model = task_entity::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?;
        Ok(model.map(Into::into))
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<DiscoveryTask>, RepositoryError> {
        let model = task_entity::Entity::find()
            .filter(task_entity::Column::TaskName.eq(name))
            .one(self.db.as_ref())
            .await?;
        Ok(model.map(Into::into))
    }

    async fn list(&self, offset: u64, limit: u64) -> Result<Vec<DiscoveryTask>, RepositoryError> {
        let models = task_entity::Entity::find()
            .order_by_desc(task_entity::Column::CreatedAt)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await?;
        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn update(&self, task: &DiscoveryTask) -> Result<DiscoveryTask, RepositoryError> {
        if let Some(existing) = self.find_by_name(&task.task_name).await? {
            if existing.id != task.id {
                return Err(RepositoryError::AlreadyExists(task.task_name.clone()));
            }
        }

        // 计数器和执行时间由调度器维护，这里只写可编辑字段
        let result = task_entity::Entity::update_many()
            .col_expr(
                task_entity::Column::TaskName,
                Expr::value(task.task_name.clone()),
            )
            .col_expr(
                task_entity::Column::BaseUrl,
                Expr::value(task.base_url.clone()),
            )
            .col_expr(
                task_entity::Column::SourceType,
                Expr::value(task.source_type.to_string()),
            )
            .col_expr(
                task_entity::Column::Tags,
                Expr::value(serde_json::json!(task.tags)),
            )
            .col_expr(task_entity::Column::Depth, Expr::value(task.depth))
            .col_expr(task_entity::Column::MaxPages, Expr::value(task.max_pages))
            .col_expr(
                task_entity::Column::StrategyType,
                Expr::value(task.strategy_type.clone()),
            )
            .col_expr(
                task_entity::Column::StrategyContents,
                Expr::value(task.strategy_contents.clone()),
            )
            .col_expr(
                task_entity::Column::ExcludeSuffixes,
                Expr::value(serde_json::json!(task.exclude_suffixes)),
            )
            .col_expr(
                task_entity::Column::ExecutionInterval,
                Expr::value(task.execution_interval),
            )
            .col_expr(task_entity::Column::UpdatedAt, Expr::value(now_fixed()))
            .filter(task_entity::Column::Id.eq(task.id))
            .exec(self.db.as_ref())
            .await?;

        if result.rows_affected == 0 {
            return Err(RepositoryError::NotFound);
        }

        self.find_by_id(task.id)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, RepositoryError> {
        let result = task_entity::Entity::delete_by_id(id)
            .exec(self.db.as_ref())
            .await?;
        Ok(result.rows_affected > 0)
    }

    async fn set_active(
        &self,
        id: Uuid,
        is_active: bool,
        next_execution_time: Option<DateTime<Utc>>,
    ) -> Result<(), RepositoryError> {
        let mut update = task_entity::Entity::update_many()
            .col_expr(task_entity::Column::IsActive, Expr::value(is_active))
            .col_expr(task_entity::Column::UpdatedAt, Expr::value(now_fixed()));

        if let Some(next) = next_execution_time {
            let next: DateTime<FixedOffset> = next.into();
            update = update.col_expr(task_entity::Column::NextExecutionTime, Expr::value(next));
        }

        let result = update
            .filter(task_entity::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await?;

        if result.rows_affected == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn find_due(&self, now: DateTime<Utc>) -> Result<Vec<DiscoveryTask>, RepositoryError> {
        let now: DateTime<FixedOffset> = now.into();
        let models = task_entity::Entity::find()
            .filter(task_entity::Column::IsActive.eq(true))
            .filter(
                Condition::any()
                    .add(task_entity::Column::NextExecutionTime.is_null())
                    .add(task_entity::Column::NextExecutionTime.lte(now)),
            )
            .order_by_asc(task_entity::Column::NextExecutionTime)
            .all(self.db.as_ref())
            .await?;
        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn mark_started(
        &self,
        id: Uuid,
        started_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let started_at: DateTime<FixedOffset> = started_at.into();
        let result = task_entity::Entity::update_many()
            .col_expr(
                task_entity::Column::LastExecutionTime,
                Expr::value(started_at),
            )
            .col_expr(task_entity::Column::UpdatedAt, Expr::value(now_fixed()))
            .filter(task_entity::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await?;

        if result.rows_affected == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn record_run_result(
        &self,
        id: Uuid,
        outcome: RunOutcome,
        next_execution_time: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let counter = match outcome {
            RunOutcome::Succeeded => task_entity::Column::SuccessCounts,
            RunOutcome::Failed => task_entity::Column::FailCounts,
        };
        let next: DateTime<FixedOffset> = next_execution_time.into();

        let result = task_entity::Entity::update_many()
            .col_expr(counter, Expr::col(counter).add(1))
            .col_expr(task_entity::Column::NextExecutionTime, Expr::value(next))
            .col_expr(task_entity::Column::UpdatedAt, Expr::value(now_fixed()))
            .filter(task_entity::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await?;

        if result.rows_affected == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "discovery_task_repo_impl_test.rs"]
mod tests;
