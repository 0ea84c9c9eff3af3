// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::Utc;
use futures::stream::{FuturesUnordered, StreamExt};
use metrics::counter;
use serde::Serialize;
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};
use url::{Origin, Url};
use uuid::Uuid;

use crate::domain::models::discovered_url::{
    AuditStatus, DiscoveryType, SourceType, UrlObservation,
};
use crate::domain::models::discovery_task::{validate_base_url, CrawlStrategy};
use crate::domain::models::signal::{CandidateUrl, DiscoveryChannel};
use crate::domain::repositories::discovered_url_repository::DiscoveredUrlRepository;
use crate::domain::services::audit_gate::{self, AuditContext, AuditGate};
use crate::domain::services::discovery_aggregator::DiscoveryAggregator;
use crate::domain::services::url_classifier::{is_excluded, UrlClassifier};
use crate::engines::traits::{AutomationClient, PageRequest};
use crate::utils::errors::DiscoveryError;
use crate::utils::url_utils::{origin_key, url_path};

/// 单次运行的参数
#[derive(Debug, Clone)]
pub struct CrawlOptions {
    pub max_depth: u32,
    /// 最多派发的页面数
    pub max_pages: usize,
    pub exclude_suffixes: Vec<String>,
    pub strategy: CrawlStrategy,
    pub source_type: SourceType,
    pub tags: Vec<String>,
}

/// 单次运行的汇总
#[derive(Debug, Clone, Default, Serialize)]
pub struct CrawlReport {
    pub run_id: Uuid,
    pub base_url: String,
    /// 已派发访问的页面数，包括失败的页面
    pub visited_count: usize,
    /// 本次运行入库的 URL，按入库顺序
    pub discovered_urls: Vec<String>,
    pub new_urls: usize,
    pub page_failures: usize,
    pub accepted: usize,
    pub rejected: usize,
    pub pending_audit: usize,
    pub audit_failed_batches: usize,
    /// 运行开始时重新提交的历史待审记录数
    pub resubmitted: usize,
    /// 运行因停止信号提前结束
    pub stopped: bool,
}

/// 控制器运行参数
#[derive(Debug, Clone)]
pub struct ControllerSettings {
    /// 并发访问页面数
    pub concurrency: usize,
    pub page_timeout: Duration,
    /// 运行开始时重新提交的待审记录上限
    pub resubmit_limit: u64,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            concurrency: 4,
            page_timeout: Duration::from_secs(30),
            resubmit_limit: 500,
        }
    }
}

/// 按深度分层的待访问队列，总是先取最浅的一层，同层先进先出
struct Frontier {
    levels: Vec<VecDeque<Url>>,
}

impl Frontier {
    fn new(max_depth: u32) -> Self {
        Self {
            levels: vec![VecDeque::new(); max_depth as usize + 1],
        }
    }

    fn push(&mut self, url: Url, depth: u32) {
        if let Some(level) = self.levels.get_mut(depth as usize) {
            level.push_back(url);
        }
    }

    /// 最浅一层非空队列的深度
    fn next_depth(&self) -> Option<u32> {
        self.levels
            .iter()
            .position(|level| !level.is_empty())
            .map(|depth| depth as u32)
    }

    fn pop(&mut self) -> Option<(Url, u32)> {
        self.levels
            .iter_mut()
            .enumerate()
            .find_map(|(depth, level)| level.pop_front().map(|url| (url, depth as u32)))
    }
}

/// 单次运行的可变状态，只由控制器循环修改
struct RunState<'a> {
    run_id: Uuid,
    origin: Origin,
    origin_key: String,
    options: &'a CrawlOptions,
    audit_ctx: AuditContext,
    frontier: Frontier,
    /// 入过队列的页面
    queued: HashSet<String>,
    /// 已交给审核与入库的 URL
    forwarded: HashSet<String>,
    report: CrawlReport,
}

/// BFS 爬取控制器
///
/// 从入口地址开始按层访问同源页面：每个页面交给自动化服务渲染，
/// 返回的信号经聚合器去重、分类器分类，再经审核闸门后入库。
/// 只有 normal 类且未被审核拒绝的 URL 会被继续展开。
///
/// 页面按层派发：某一层还有页面在访问时，不派发更深一层的页面。
/// 这样每个 URL 第一次被转发时的深度就是它的最短路径深度，
/// 与页面完成的先后顺序无关。
///
/// 深度等于 `max_depth` 的页面仍会被访问并计入 `max_pages`，
/// 但其返回的候选不再入库。
///
/// 单个页面失败只计数；自动化服务不可达时中止本次运行。
/// 持久化错误同样会中止运行，已入库的数据保留。
pub struct CrawlController<R: DiscoveredUrlRepository + ?Sized> {
    automation: Arc<dyn AutomationClient>,
    audit_gate: Arc<AuditGate>,
    repository: Arc<R>,
    classifier: UrlClassifier,
    aggregator: DiscoveryAggregator,
    settings: ControllerSettings,
}

impl<R: DiscoveredUrlRepository + ?Sized> CrawlController<R> {
    /// 创建爬取控制器
    ///
    /// # 参数
    ///
    /// * `automation` - 浏览器自动化客户端
    /// * `audit_gate` - 审核闸门
    /// * `repository` - 发现记录仓库
    /// * `classifier` - URL 分类器
    /// * `settings` - 并发、超时等运行参数
    pub fn new(
        automation: Arc<dyn AutomationClient>,
        audit_gate: Arc<AuditGate>,
        repository: Arc<R>,
        classifier: UrlClassifier,
        settings: ControllerSettings,
    ) -> Self {
        Self {
            automation,
            audit_gate,
            repository,
            classifier,
            aggregator: DiscoveryAggregator::new(),
            settings,
        }
    }

    /// 执行一次发现运行
    ///
    /// # 参数
    ///
    /// * `run_id` - 运行标识，用于日志和汇总
    /// * `base_url` - 入口地址
    /// * `options` - 深度、页数、排除后缀等运行参数
    /// * `stop` - 停止信号，置位后不再派发新页面，已派发的页面会完成
    ///
    /// # 返回值
    ///
    /// * `Ok(CrawlReport)` - 运行汇总
    /// * `Err(DiscoveryError)` - 入口地址非法、自动化服务不可达或持久化失败
    #[instrument(skip_all, fields(run_id = %run_id, base_url = %base_url))]
    pub async fn run(
        &self,
        run_id: Uuid,
        base_url: &str,
        options: &CrawlOptions,
        stop: &AtomicBool,
    ) -> Result<CrawlReport, DiscoveryError> {
        let mut seed = validate_base_url(base_url)?;
        seed.set_fragment(None);

        let origin = seed.origin();
        let mut state = RunState {
            run_id,
            origin_key: origin_key(&seed),
            origin,
            options,
            audit_ctx: AuditContext {
                depth: options.max_depth,
                strategy: options.strategy.clone(),
            },
            frontier: Frontier::new(options.max_depth),
            queued: HashSet::new(),
            forwarded: HashSet::new(),
            report: CrawlReport {
                run_id,
                base_url: seed.to_string(),
                ..Default::default()
            },
        };

        info!(
            run_id = %run_id,
            base_url = %seed,
            max_depth = options.max_depth,
            max_pages = options.max_pages,
            "Discovery run started"
        );

        let resubmitted = self
            .audit_gate
            .resubmit_pending(
                self.repository.as_ref(),
                &state.origin_key,
                &state.audit_ctx,
                self.settings.resubmit_limit,
            )
            .await?;
        state.report.resubmitted = resubmitted.submitted;
        state.report.audit_failed_batches += resubmitted.failed_batches;

        let seed_candidate = CandidateUrl {
            url: seed.to_string(),
            channel: DiscoveryChannel::Seed,
            source_page: String::new(),
        };
        self.forward(&mut state, vec![seed_candidate], 0).await?;
        // 入口页即使被审核拒绝或不是 normal 类也要访问
        if state.queued.insert(seed.to_string()) {
            state.frontier.push(seed, 0);
        }

        let mut in_flight = FuturesUnordered::new();
        let concurrency = self.settings.concurrency.max(1);
        // 在途页面所在的层
        let mut level = 0u32;

        loop {
            while in_flight.len() < concurrency
                && state.report.visited_count < options.max_pages
                && !stop.load(Ordering::SeqCst)
            {
                match state.frontier.next_depth() {
                    Some(depth) if in_flight.is_empty() || depth == level => level = depth,
                    _ => break,
                }
                let Some((page_url, depth)) = state.frontier.pop() else {
                    break;
                };
                if depth > options.max_depth {
                    continue;
                }

                state.report.visited_count += 1;
                let automation = Arc::clone(&self.automation);
                let request = PageRequest {
                    url: page_url.to_string(),
                    timeout: self.settings.page_timeout,
                    strategy: options.strategy.clone(),
                };
                in_flight.push(async move {
                    let result = automation.visit(&request).await;
                    (page_url, depth, result)
                });
            }

            let Some((page_url, depth, result)) = in_flight.next().await else {
                break;
            };

            match result {
                Ok(bundle) => {
                    counter!("discovery_pages_visited_total").increment(1);
                    let candidates = self.aggregator.aggregate(&page_url, &state.origin, &bundle);
                    debug!(
                        run_id = %run_id,
                        url = %page_url,
                        depth,
                        candidates = candidates.len(),
                        "Page signals aggregated"
                    );
                    if depth < options.max_depth {
                        self.forward(&mut state, candidates, depth + 1).await?;
                    }
                }
                Err(e) if e.is_unreachable() => {
                    error!(
                        run_id = %run_id,
                        url = %page_url,
                        "Automation service unreachable, aborting run: {}", e
                    );
                    return Err(DiscoveryError::CollaboratorUnreachable(e.to_string()));
                }
                Err(e) => {
                    state.report.page_failures += 1;
                    counter!("discovery_page_failures_total").increment(1);
                    warn!(run_id = %run_id, url = %page_url, depth, "Page visit failed: {}", e);
                }
            }
        }

        state.report.stopped = stop.load(Ordering::SeqCst);
        info!(
            run_id = %run_id,
            visited = state.report.visited_count,
            discovered = state.report.discovered_urls.len(),
            new_urls = state.report.new_urls,
            page_failures = state.report.page_failures,
            stopped = state.report.stopped,
            "Discovery run finished"
        );

        Ok(state.report)
    }

    /// 审核并入库一组同深度的候选，并把可展开的 URL 放入队列
    async fn forward(
        &self,
        state: &mut RunState<'_>,
        candidates: Vec<CandidateUrl>,
        depth: u32,
    ) -> Result<(), DiscoveryError> {
        let mut admitted: Vec<(CandidateUrl, DiscoveryType)> = Vec::new();
        for candidate in candidates {
            if state.forwarded.contains(&candidate.url)
                || is_excluded(&candidate.url, state.options.exclude_suffixes.as_slice())
            {
                continue;
            }
            let discovery_type = self.classifier.classify(&candidate.url);
            if discovery_type == DiscoveryType::Garbage {
                continue;
            }
            state.forwarded.insert(candidate.url.clone());
            admitted.push((candidate, discovery_type));
        }

        if admitted.is_empty() {
            return Ok(());
        }

        let to_audit: Vec<String> = admitted
            .iter()
            .filter(|(_, t)| *t == DiscoveryType::Normal)
            .map(|(c, _)| c.url.clone())
            .collect();
        let outcome = if to_audit.is_empty() {
            Default::default()
        } else {
            self.audit_gate.submit(&to_audit, &state.audit_ctx).await
        };
        state.report.audit_failed_batches += outcome.failed_batches;

        let observed_at = Utc::now();
        for (candidate, discovery_type) in admitted {
            let (audit_status, discovery_type) =
                audit_gate::resolve(outcome.verdicts.get(&candidate.url).copied(), discovery_type);
            match audit_status {
                AuditStatus::Accepted => state.report.accepted += 1,
                AuditStatus::Rejected => state.report.rejected += 1,
                AuditStatus::Pending => state.report.pending_audit += 1,
                AuditStatus::NotRequired => {}
            }

            let observation = UrlObservation {
                origin: state.origin_key.clone(),
                url_path: url_path(&candidate.url),
                url: candidate.url.clone(),
                discovery_type,
                source_type: state.options.source_type,
                tags: state.options.tags.clone(),
                depth: depth as i32,
                discovered_from: Some(candidate.source_page.clone()).filter(|s| !s.is_empty()),
                discovery_channel: candidate.channel,
                audit_status,
                observed_at,
            };

            let upserted = self.repository.upsert(&observation).await.map_err(|e| {
                error!(run_id = %state.run_id, url = %candidate.url, "Persisting URL failed: {}", e);
                DiscoveryError::from(e)
            })?;
            counter!("discovery_urls_upserted_total", "is_new" => upserted.is_new.to_string())
                .increment(1);
            if upserted.is_new {
                state.report.new_urls += 1;
            }
            state.report.discovered_urls.push(candidate.url.clone());

            if discovery_type == DiscoveryType::Normal
                && depth <= state.options.max_depth
                && state.queued.insert(candidate.url.clone())
            {
                if let Ok(url) = Url::parse(&candidate.url) {
                    state.frontier.push(url, depth);
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
#[path = "crawl_controller_test.rs"]
mod tests;
