// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use metrics::{counter, histogram};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::application::dto::crawl_request::CrawlRequestDto;
use crate::config::settings::CrawlerSettings;
use crate::domain::models::discovery_task::{CrawlStrategy, DiscoveryTask};
use crate::domain::repositories::discovered_url_repository::DiscoveredUrlRepository;
use crate::domain::services::crawl_controller::{CrawlController, CrawlOptions, CrawlReport};
use crate::queue::run_registry::RunContext;
use crate::queue::scheduler::RunExecutor;
use crate::utils::errors::DiscoveryError;

/// 发现运行用例
///
/// 把任务或一次性请求转换成控制器的运行参数，缺省值取自爬取配置
pub struct DiscoveryRunner<R: DiscoveredUrlRepository + 'static> {
    controller: Arc<CrawlController<R>>,
    crawler: CrawlerSettings,
}

impl<R: DiscoveredUrlRepository + 'static> DiscoveryRunner<R> {
    pub fn new(controller: Arc<CrawlController<R>>, crawler: CrawlerSettings) -> Self {
        Self {
            controller,
            crawler,
        }
    }

    /// 任务对应的运行参数
    pub fn options_for_task(&self, task: &DiscoveryTask) -> CrawlOptions {
        CrawlOptions {
            max_depth: task.depth.max(0) as u32,
            max_pages: self.max_pages(task.max_pages),
            exclude_suffixes: task.exclude_suffixes.clone(),
            strategy: task.strategy(),
            source_type: task.source_type,
            tags: task.tags.clone(),
        }
    }

    /// 执行一次性发现，不经过调度器
    ///
    /// # 参数
    ///
    /// * `dto` - 发现请求
    ///
    /// # 返回值
    ///
    /// * `Ok(CrawlReport)` - 运行汇总
    /// * `Err(DiscoveryError)` - 参数非法或运行失败
    #[instrument(skip_all, fields(base_url = %dto.base_url))]
    pub async fn crawl_once(&self, dto: CrawlRequestDto) -> Result<CrawlReport, DiscoveryError> {
        dto.validate()
            .map_err(|e| DiscoveryError::Configuration(e.to_string()))?;

        let options = CrawlOptions {
            max_depth: dto
                .max_depth
                .map(|d| d.max(0) as u32)
                .unwrap_or(self.crawler.default_max_depth),
            max_pages: self.max_pages(dto.max_pages),
            exclude_suffixes: dto
                .exclude_suffixes
                .unwrap_or_else(|| self.crawler.default_exclude_suffixes.clone()),
            strategy: CrawlStrategy {
                strategy_type: dto.strategy_type,
                strategy_contents: dto.strategy_contents,
            },
            source_type: dto.source_type,
            tags: dto.tags,
        };

        let run_id = Uuid::new_v4();
        info!(run_id = %run_id, "One-off discovery requested");

        let timer = Instant::now();
        let stop = AtomicBool::new(false);
        let result = self
            .controller
            .run(run_id, &dto.base_url, &options, &stop)
            .await;

        let label = if result.is_ok() { "succeeded" } else { "failed" };
        counter!("discovery_runs_total", "result" => label).increment(1);
        histogram!("discovery_run_duration_seconds").record(timer.elapsed().as_secs_f64());
        result
    }

    fn max_pages(&self, requested: Option<i32>) -> usize {
        requested
            .map(|pages| pages.max(1) as usize)
            .unwrap_or(self.crawler.default_max_pages)
    }
}

#[async_trait]
impl<R: DiscoveredUrlRepository + 'static> RunExecutor for DiscoveryRunner<R> {
    async fn execute(
        &self,
        task: &DiscoveryTask,
        ctx: &RunContext,
    ) -> Result<CrawlReport, DiscoveryError> {
        let options = self.options_for_task(task);
        self.controller
            .run(ctx.run_id, &task.base_url, &options, &ctx.stop)
            .await
    }
}
