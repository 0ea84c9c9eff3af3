// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::models::discovered_url::{
    AuditStatus, DiscoveredUrl, DiscoveryType, SourceType, UpsertOutcome, UrlObservation,
};
use crate::utils::errors::RepositoryError;

/// 发现记录仓库特质
///
/// (origin, url) 唯一。upsert 对同一键的并发调用是安全且幂等的：
/// 首次写入设置 `first_seen_at`，之后只刷新 `last_seen_at` 等可变字段，
/// 并且 `last_seen_at` 不会回退。
#[async_trait]
pub trait DiscoveredUrlRepository: Send + Sync {
    /// 原子地查找或创建记录
    async fn upsert(&self, observation: &UrlObservation) -> Result<UpsertOutcome, RepositoryError>;
    /// 按键查找
    async fn find_by_origin_and_url(
        &self,
        origin: &str,
        url: &str,
    ) -> Result<Option<DiscoveredUrl>, RepositoryError>;
    /// 查找站点源下的全部记录
    async fn find_by_origin(&self, origin: &str) -> Result<Vec<DiscoveredUrl>, RepositoryError>;
    /// 查找某个业务来源的全部记录
    async fn find_by_source_type(
        &self,
        source_type: SourceType,
    ) -> Result<Vec<DiscoveredUrl>, RepositoryError>;
    /// 查找某个业务来源在 `since` 之后再次出现的记录
    async fn find_recent_by_source_type(
        &self,
        source_type: SourceType,
        since: DateTime<Utc>,
    ) -> Result<Vec<DiscoveredUrl>, RepositoryError>;
    /// 查找站点源下仍待审核的记录
    async fn find_pending_audit(
        &self,
        origin: &str,
        limit: u64,
    ) -> Result<Vec<DiscoveredUrl>, RepositoryError>;
    /// 写回审核结论
    async fn update_audit_status(
        &self,
        id: Uuid,
        audit_status: AuditStatus,
        discovery_type: DiscoveryType,
    ) -> Result<(), RepositoryError>;
}
