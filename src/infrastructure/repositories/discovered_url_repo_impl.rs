// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use sea_orm::{
    sea_query::{Expr, OnConflict},
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
    Set,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::models::discovered_url::{
    AuditStatus, DiscoveredUrl, DiscoveryType, SourceType, UpsertOutcome, UrlObservation,
};
use crate::domain::repositories::discovered_url_repository::DiscoveredUrlRepository;
use crate::infrastructure::database::entities::discovered_url as url_entity;
use crate::utils::errors::RepositoryError;

/// 发现记录仓库实现
///
/// upsert 由一条 `INSERT ... ON CONFLICT (origin, url) DO NOTHING` 和一条带
/// `last_seen_at < observed_at` 条件的更新组成，两步各自原子，
/// 因此并发写同一键时只有一方插入成功，`last_seen_at` 只会前进。
#[derive(Clone)]
pub struct DiscoveredUrlRepositoryImpl {
    /// 数据库连接
    db: Arc<DatabaseConnection>,
}

impl DiscoveredUrlRepositoryImpl {
    /// 创建新的发现记录仓库实例
    ///
    /// # 参数
    ///
    /// * `db` - 数据库连接
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

impl From<url_entity::Model> for DiscoveredUrl {
    fn from(model: url_entity::Model) -> Self {
        Self {
            id: model.id,
            origin: model.origin,
            url: model.url,
            url_path: model.url_path,
            discovery_type: model.discovery_type.parse().unwrap_or_default(),
            source_type: model.source_type.parse().unwrap_or_default(),
            tags: serde_json::from_value(model.tags).unwrap_or_default(),
            depth: model.depth,
            discovered_from: model.discovered_from,
            discovery_channel: model.discovery_channel.parse().unwrap_or_default(),
            audit_status: model.audit_status.parse().unwrap_or_default(),
            first_seen_at: model.first_seen_at,
            last_seen_at: model.last_seen_at,
        }
    }
}

impl From<&UrlObservation> for url_entity::ActiveModel {
    fn from(observation: &UrlObservation) -> Self {
        let observed_at: DateTime<FixedOffset> = observation.observed_at.into();
        Self {
            id: Set(Uuid::new_v4()),
            origin: Set(observation.origin.clone()),
            url: Set(observation.url.clone()),
            url_path: Set(observation.url_path.clone()),
            discovery_type: Set(observation.discovery_type.to_string()),
            source_type: Set(observation.source_type.to_string()),
            tags: Set(serde_json::json!(observation.tags)),
            depth: Set(observation.depth),
            discovered_from: Set(observation.discovered_from.clone()),
            discovery_channel: Set(observation.discovery_channel.to_string()),
            audit_status: Set(observation.audit_status.to_string()),
            first_seen_at: Set(observed_at),
            last_seen_at: Set(observed_at),
        }
    }
}

#[async_trait]
impl DiscoveredUrlRepository for DiscoveredUrlRepositoryImpl {
    async fn upsert(&self, observation: &UrlObservation) -> Result<UpsertOutcome, RepositoryError> {
        let model: url_entity::ActiveModel = observation.into();
        let inserted = url_entity::Entity::insert(model)
            .on_conflict(
                OnConflict::columns([url_entity::Column::Origin, url_entity::Column::Url])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(self.db.as_ref())
            .await;

        match inserted {
            Ok(rows) if rows > 0 => return Ok(UpsertOutcome { is_new: true }),
            Ok(_) | Err(DbErr::RecordNotInserted) => {}
            Err(e) => return Err(e.into()),
        }

        let observed_at: DateTime<FixedOffset> = observation.observed_at.into();
        url_entity::Entity::update_many()
            .col_expr(url_entity::Column::LastSeenAt, Expr::value(observed_at))
            .col_expr(
                url_entity::Column::DiscoveryType,
                Expr::value(observation.discovery_type.to_string()),
            )
            .col_expr(
                url_entity::Column::SourceType,
                Expr::value(observation.source_type.to_string()),
            )
            .col_expr(
                url_entity::Column::Tags,
                Expr::value(serde_json::json!(observation.tags)),
            )
            .col_expr(
                url_entity::Column::AuditStatus,
                Expr::value(observation.audit_status.to_string()),
            )
            .filter(url_entity::Column::Origin.eq(observation.origin.as_str()))
            .filter(url_entity::Column::Url.eq(observation.url.as_str()))
            .filter(url_entity::Column::LastSeenAt.lt(observed_at))
            .exec(self.db.as_ref())
            .await?;

        Ok(UpsertOutcome { is_new: false })
    }

    async fn find_by_origin_and_url(
        &self,
        origin: &str,
        url: &str,
    ) -> Result<Option<DiscoveredUrl>, RepositoryError> {
        let model = url_entity::Entity::find()
            .filter(url_entity::Column::Origin.eq(origin))
            .filter(url_entity::Column::Url.eq(url))
            .one(self.db.as_ref())
            .await?;

        Ok(model.map(Into::into))
    }

    async fn find_by_origin(&self, origin: &str) -> Result<Vec<DiscoveredUrl>, RepositoryError> {
        let models = url_entity::Entity::find()
            .filter(url_entity::Column::Origin.eq(origin))
            .order_by_asc(url_entity::Column::Depth)
            .order_by_asc(url_entity::Column::Url)
            .all(self.db.as_ref())
            .await?;

        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn find_by_source_type(
        &self,
        source_type: SourceType,
    ) -> Result<Vec<DiscoveredUrl>, RepositoryError> {
        let models = url_entity::Entity::find()
            .filter(url_entity::Column::SourceType.eq(source_type.to_string()))
            .order_by_asc(url_entity::Column::Origin)
            .order_by_asc(url_entity::Column::Url)
            .all(self.db.as_ref())
            .await?;

        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn find_recent_by_source_type(
        &self,
        source_type: SourceType,
        since: DateTime<Utc>,
    ) -> Result<Vec<DiscoveredUrl>, RepositoryError> {
        let since: DateTime<FixedOffset> = since.into();
        let models = url_entity::Entity::find()
            .filter(url_entity::Column::SourceType.eq(source_type.to_string()))
            .filter(url_entity::Column::LastSeenAt.gte(since))
            .order_by_desc(url_entity::Column::LastSeenAt)
            .all(self.db.as_ref())
            .await?;

        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn find_pending_audit(
        &self,
        origin: &str,
        limit: u64,
    ) -> Result<Vec<DiscoveredUrl>, RepositoryError> {
        let models = url_entity::Entity::find()
            .filter(url_entity::Column::Origin.eq(origin))
            .filter(url_entity::Column::AuditStatus.eq(AuditStatus::Pending.to_string()))
            .filter(url_entity::Column::DiscoveryType.eq(DiscoveryType::Normal.to_string()))
            .order_by_asc(url_entity::Column::FirstSeenAt)
            .limit(limit)
            .all(self.db.as_ref())
            .await?;

        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn update_audit_status(
        &self,
        id: Uuid,
        audit_status: AuditStatus,
        discovery_type: DiscoveryType,
    ) -> Result<(), RepositoryError> {
        let result = url_entity::Entity::update_many()
            .col_expr(
                url_entity::Column::AuditStatus,
                Expr::value(audit_status.to_string()),
            )
            .col_expr(
                url_entity::Column::DiscoveryType,
                Expr::value(discovery_type.to_string()),
            )
            .filter(url_entity::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await?;

        if result.rows_affected == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
