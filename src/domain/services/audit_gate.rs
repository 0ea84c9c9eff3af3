// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use metrics::counter;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::domain::models::discovered_url::{AuditStatus, DiscoveryType};
use crate::domain::models::discovery_task::CrawlStrategy;
use crate::domain::repositories::discovered_url_repository::DiscoveredUrlRepository;
use crate::engines::traits::{AuditClient, AuditError, AuditRequest, Verdict};
use crate::utils::errors::RepositoryError;
use crate::utils::retry_policy::RetryPolicy;

/// 单次运行内所有审核批次共享的参数
#[derive(Debug, Clone, Default)]
pub struct AuditContext {
    /// 本次运行的最大深度
    pub depth: u32,
    pub strategy: CrawlStrategy,
}

/// 一次提交的审核结果
#[derive(Debug, Clone, Default)]
pub struct AuditOutcome {
    /// 成功批次中返回的逐条结论
    pub verdicts: HashMap<String, Verdict>,
    /// 重试耗尽后放行的批次数
    pub failed_batches: usize,
}

/// 待审记录重新提交的汇总
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResubmitSummary {
    pub submitted: usize,
    pub resolved: usize,
    pub failed_batches: usize,
}

/// 审核闸门
///
/// 把 normal 类候选按批次提交给审核服务。瞬时错误按重试策略退避重试，
/// 重试耗尽的批次不阻断流程，其中的 URL 以 `pending` 状态入库，等下一次运行重新提交。
pub struct AuditGate {
    client: Arc<dyn AuditClient>,
    batch_size: usize,
    retry_policy: RetryPolicy,
}

impl AuditGate {
    /// 创建审核闸门
    ///
    /// # 参数
    ///
    /// * `client` - 审核服务客户端
    /// * `batch_size` - 每批最多提交的 URL 数，0 按 1 处理
    /// * `retry_policy` - 批次级重试策略
    pub fn new(client: Arc<dyn AuditClient>, batch_size: usize, retry_policy: RetryPolicy) -> Self {
        Self {
            client,
            batch_size: batch_size.max(1),
            retry_policy,
        }
    }

    /// 分批提交 URL
    ///
    /// 从不返回错误：失败的批次只计数，对应 URL 在结果中没有结论
    pub async fn submit(&self, urls: &[String], ctx: &AuditContext) -> AuditOutcome {
        let mut outcome = AuditOutcome::default();

        for batch in urls.chunks(self.batch_size) {
            let request = AuditRequest {
                urls: batch.to_vec(),
                depth: ctx.depth,
                strategy_type: ctx.strategy.strategy_type.clone(),
                strategy_contents: ctx.strategy.strategy_contents.clone(),
            };

            let result = self
                .retry_policy
                .retry("audit.submit", AuditError::is_retryable, || {
                    self.client.audit(&request)
                })
                .await;

            match result {
                Ok(response) => {
                    let mut verdicts = response.verdicts;
                    for url in batch {
                        if let Some(verdict) = verdicts.remove(url) {
                            outcome.verdicts.insert(url.clone(), verdict);
                        }
                    }
                    debug!(batch_size = batch.len(), "Audit batch reviewed");
                }
                Err(e) => {
                    outcome.failed_batches += 1;
                    counter!("discovery_audit_batches_failed_total").increment(1);
                    warn!(
                        batch_size = batch.len(),
                        "Audit batch failed, passing URLs through as pending: {}", e
                    );
                }
            }
        }

        outcome
    }

    /// 重新提交某个站点仍处于待审状态的记录，并回写结论
    ///
    /// # 参数
    ///
    /// * `repository` - 发现记录仓库
    /// * `origin` - 站点源
    /// * `ctx` - 审核参数
    /// * `limit` - 本次最多重新提交的记录数
    ///
    /// # 返回值
    ///
    /// * `Ok(ResubmitSummary)` - 提交与回写的计数
    /// * `Err(RepositoryError)` - 读取或回写失败
    pub async fn resubmit_pending<R>(
        &self,
        repository: &R,
        origin: &str,
        ctx: &AuditContext,
        limit: u64,
    ) -> Result<ResubmitSummary, RepositoryError>
    where
        R: DiscoveredUrlRepository + ?Sized,
    {
        if limit == 0 {
            return Ok(ResubmitSummary::default());
        }

        let records = repository.find_pending_audit(origin, limit).await?;
        if records.is_empty() {
            return Ok(ResubmitSummary::default());
        }

        let urls: Vec<String> = records.iter().map(|r| r.url.clone()).collect();
        let outcome = self.submit(&urls, ctx).await;

        let mut resolved = 0;
        for record in &records {
            if let Some(verdict) = outcome.verdicts.get(&record.url) {
                let (status, discovery_type) = resolve(Some(*verdict), DiscoveryType::Normal);
                repository
                    .update_audit_status(record.id, status, discovery_type)
                    .await?;
                resolved += 1;
            }
        }

        debug!(
            origin,
            submitted = records.len(),
            resolved,
            "Pending audit records resubmitted"
        );

        Ok(ResubmitSummary {
            submitted: records.len(),
            resolved,
            failed_batches: outcome.failed_batches,
        })
    }
}

/// 根据审核结论决定入库时的审核状态和分类
///
/// 只有 normal 类需要审核；被拒绝的 URL 重新归类为 garbage，没有结论的保持待审
pub fn resolve(verdict: Option<Verdict>, discovery_type: DiscoveryType) -> (AuditStatus, DiscoveryType) {
    if discovery_type != DiscoveryType::Normal {
        return (AuditStatus::NotRequired, discovery_type);
    }
    match verdict {
        Some(Verdict::Accept) => (AuditStatus::Accepted, DiscoveryType::Normal),
        Some(Verdict::Reject) => (AuditStatus::Rejected, DiscoveryType::Garbage),
        None => (AuditStatus::Pending, DiscoveryType::Normal),
    }
}

#[cfg(test)]
#[path = "audit_gate_test.rs"]
mod tests;
