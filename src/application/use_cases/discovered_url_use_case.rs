// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{Duration, Utc};
use std::sync::Arc;
use validator::Validate;

use crate::application::dto::crawl_request::DiscoveredUrlQueryDto;
use crate::domain::models::discovered_url::DiscoveredUrl;
use crate::domain::repositories::discovered_url_repository::DiscoveredUrlRepository;
use crate::utils::errors::DiscoveryError;

/// 最近发现窗口的默认长度（分钟）
pub const DEFAULT_RECENT_WINDOW_MINUTES: i64 = 5;

/// 发现结果查询用例
pub struct DiscoveredUrlUseCase<R: DiscoveredUrlRepository> {
    repository: Arc<R>,
}

impl<R: DiscoveredUrlRepository> DiscoveredUrlUseCase<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// 按来源标签列出发现结果，可限定在最近窗口内
    pub async fn list(&self, query: &DiscoveredUrlQueryDto) -> Result<Vec<DiscoveredUrl>, DiscoveryError> {
        query
            .validate()
            .map_err(|e| DiscoveryError::Configuration(e.to_string()))?;

        let window = match (query.recent_minutes, query.recent) {
            (Some(minutes), _) => Some(minutes),
            (None, true) => Some(DEFAULT_RECENT_WINDOW_MINUTES),
            (None, false) => None,
        };

        let urls = match window {
            Some(minutes) => {
                let since = Utc::now() - Duration::minutes(minutes);
                self.repository
                    .find_recent_by_source_type(query.source_type, since)
                    .await?
            }
            None => self.repository.find_by_source_type(query.source_type).await?,
        };
        Ok(urls)
    }
}
