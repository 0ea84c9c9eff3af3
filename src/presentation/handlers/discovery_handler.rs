// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{
    extract::{Extension, Query},
    Json,
};
use std::sync::Arc;

use crate::application::dto::crawl_request::{CrawlRequestDto, DiscoveredUrlQueryDto};
use crate::application::use_cases::discovered_url_use_case::DiscoveredUrlUseCase;
use crate::application::use_cases::discovery_run::DiscoveryRunner;
use crate::domain::models::discovered_url::DiscoveredUrl;
use crate::domain::repositories::discovered_url_repository::DiscoveredUrlRepository;
use crate::domain::services::crawl_controller::CrawlReport;
use crate::presentation::errors::AppError;

/// 一次性发现，同步返回运行汇总
pub async fn crawl_once<R>(
    Extension(runner): Extension<Arc<DiscoveryRunner<R>>>,
    Json(payload): Json<CrawlRequestDto>,
) -> Result<Json<CrawlReport>, AppError>
where
    R: DiscoveredUrlRepository + 'static,
{
    let report = runner.crawl_once(payload).await?;
    Ok(Json(report))
}

/// 按来源标签查询发现结果
pub async fn list_urls<R>(
    Extension(use_case): Extension<Arc<DiscoveredUrlUseCase<R>>>,
    Query(query): Query<DiscoveredUrlQueryDto>,
) -> Result<Json<Vec<DiscoveredUrl>>, AppError>
where
    R: DiscoveredUrlRepository + 'static,
{
    let urls = use_case.list(&query).await?;
    Ok(Json(urls))
}
