// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use chrono::Utc;
use metrics::{counter, histogram};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::domain::models::discovery_task::{DiscoveryTask, RunOutcome};
use crate::domain::repositories::discovery_task_repository::DiscoveryTaskRepository;
use crate::domain::services::crawl_controller::CrawlReport;
use crate::queue::run_registry::{RunContext, RunGuard, RunRegistry};
use crate::utils::errors::{DiscoveryError, RepositoryError};

/// 执行单次任务运行的特质
#[async_trait]
pub trait RunExecutor: Send + Sync {
    async fn execute(
        &self,
        task: &DiscoveryTask,
        ctx: &RunContext,
    ) -> Result<CrawlReport, DiscoveryError>;
}

/// 发现任务调度器
///
/// 每次 tick 查询到期任务，经运行注册表登记后各自在独立的 tokio 任务中执行。
/// 运行结束后推进 `next_execution_time` 并累加成功或失败计数。
pub struct DiscoveryScheduler<R: DiscoveryTaskRepository + 'static> {
    /// 任务仓库
    repository: Arc<R>,
    executor: Arc<dyn RunExecutor>,
    registry: Arc<RunRegistry>,
    shutting_down: Arc<AtomicBool>,
}

impl<R: DiscoveryTaskRepository + 'static> DiscoveryScheduler<R> {
    /// 创建调度器
    ///
    /// # 参数
    ///
    /// * `repository` - 任务仓库
    /// * `executor` - 运行执行器
    /// * `registry` - 运行注册表
    pub fn new(
        repository: Arc<R>,
        executor: Arc<dyn RunExecutor>,
        registry: Arc<RunRegistry>,
    ) -> Self {
        Self {
            repository,
            executor,
            registry,
            shutting_down: Arc::new(AtomicBool::new(false)),
        }
    }

    /// 执行一次调度
    ///
    /// # 返回值
    ///
    /// * `Ok(usize)` - 本次启动的运行数
    /// * `Err(RepositoryError)` - 查询到期任务失败
    pub async fn tick(&self) -> Result<usize, RepositoryError> {
        if self.shutting_down.load(Ordering::SeqCst) {
            return Ok(0);
        }

        let due = self.repository.find_due(Utc::now()).await?;
        let mut launched = 0;
        for task in due {
            if self.launch(task) {
                launched += 1;
            }
        }

        if launched > 0 {
            debug!("Scheduler tick launched {} runs", launched);
        }
        Ok(launched)
    }

    /// 启动一次运行；任务已在运行或调度器正在关闭时返回 `false`
    pub fn launch(&self, task: DiscoveryTask) -> bool {
        if self.shutting_down.load(Ordering::SeqCst) {
            return false;
        }

        let Some(ctx) = self.registry.try_begin(task.id) else {
            debug!(task_id = %task.id, "Task already running, skipping");
            return false;
        };

        let task_id = task.id;
        let run_id = ctx.run_id;
        let mut guard = RunGuard::new(self.registry.clone(), task_id, run_id);
        let registry = self.registry.clone();
        let shutting_down = self.shutting_down.clone();
        let repository = self.repository.clone();
        let executor = self.executor.clone();

        let handle = tokio::spawn(async move {
            let mut task = task;
            let mut ctx = ctx;
            loop {
                execute_run(repository.as_ref(), executor.as_ref(), task, ctx).await;
                if shutting_down.load(Ordering::SeqCst) {
                    break;
                }
                // 运行期间收到重启请求时，不释放登记直接开始下一次运行
                let Some(next_ctx) = registry.rearm(task_id, guard.run_id()) else {
                    break;
                };
                guard.rebind(next_ctx.run_id);
                match repository.find_by_id(task_id).await {
                    Ok(Some(fresh)) if fresh.is_active => {
                        info!(
                            task_id = %task_id,
                            run_id = %next_ctx.run_id,
                            "Restart requested during run, launching again"
                        );
                        task = fresh;
                        ctx = next_ctx;
                    }
                    Ok(_) => break,
                    Err(e) => {
                        error!(task_id = %task_id, "Failed to reload task for restart: {}", e);
                        break;
                    }
                }
            }
        });
        self.registry.attach(task_id, run_id, handle);
        true
    }

    /// 显式重启任务
    ///
    /// 任务空闲时立即启动；已有运行在进行时记录重启请求，
    /// 当前运行结束后马上再运行一次。
    ///
    /// # 返回值
    ///
    /// * `Ok(true)` - 已启动或已排队
    /// * `Ok(false)` - 任务已停用或调度器正在关闭
    /// * `Err(RepositoryError::NotFound)` - 任务不存在
    pub async fn restart(&self, task_id: Uuid) -> Result<bool, RepositoryError> {
        let task = self
            .repository
            .find_by_id(task_id)
            .await?
            .ok_or(RepositoryError::NotFound)?;
        if !task.is_active {
            return Ok(false);
        }

        // launch 失败说明登记存在，request_restart 失败说明登记已被注销，
        // 两者交替重试直到其中一个成功
        loop {
            if self.launch(task.clone()) {
                return Ok(true);
            }
            if self.shutting_down.load(Ordering::SeqCst) {
                return Ok(false);
            }
            if self.registry.request_restart(task_id) {
                debug!(task_id = %task_id, "Run in flight, restart queued");
                return Ok(true);
            }
        }
    }

    /// 占用任务的运行登记，持有期间调度器不会启动该任务
    ///
    /// 任务已在运行时返回 `None`
    pub fn reserve(&self, task_id: Uuid) -> Option<RunGuard> {
        self.registry
            .try_begin(task_id)
            .map(|ctx| RunGuard::new(self.registry.clone(), task_id, ctx.run_id))
    }

    /// 向任务当前的运行发出停止信号，返回是否有运行在进行
    pub fn signal_stop(&self, task_id: Uuid) -> bool {
        self.registry.signal_stop(task_id)
    }

    pub fn is_running(&self, task_id: Uuid) -> bool {
        self.registry.is_running(task_id)
    }

    pub fn registry(&self) -> &Arc<RunRegistry> {
        &self.registry
    }

    /// 停止调度并等待在途运行结束
    ///
    /// # 参数
    ///
    /// * `grace` - 最长等待时间，超时后放弃等待
    pub async fn shutdown(&self, grace: Duration) {
        self.shutting_down.store(true, Ordering::SeqCst);
        self.registry.signal_all();

        let handles = self.registry.take_handles();
        if handles.is_empty() {
            return;
        }

        info!("Waiting for {} in-flight runs to drain", handles.len());
        let drain = futures::future::join_all(handles);
        if tokio::time::timeout(grace, drain).await.is_err() {
            warn!(
                "Shutdown grace period of {:?} elapsed with runs still in flight",
                grace
            );
        }
    }
}

#[instrument(skip_all, fields(task_id = %task.id, run_id = %ctx.run_id))]
async fn execute_run<R>(
    repository: &R,
    executor: &dyn RunExecutor,
    task: DiscoveryTask,
    ctx: RunContext,
) where
    R: DiscoveryTaskRepository + ?Sized,
{
    let timer = Instant::now();
    if let Err(e) = repository.mark_started(task.id, Utc::now()).await {
        error!("Failed to record run start: {}", e);
    }

    info!(task_name = %task.task_name, "Task run started");
    let result = executor.execute(&task, &ctx).await;
    let outcome = match &result {
        Ok(report) => {
            info!(
                visited = report.visited_count,
                discovered = report.discovered_urls.len(),
                new_urls = report.new_urls,
                page_failures = report.page_failures,
                "Task run succeeded"
            );
            RunOutcome::Succeeded
        }
        Err(e) => {
            error!("Task run failed: {}", e);
            RunOutcome::Failed
        }
    };

    counter!("discovery_runs_total", "result" => outcome.to_string()).increment(1);
    histogram!("discovery_run_duration_seconds").record(timer.elapsed().as_secs_f64());

    let next = task.next_execution_after(Utc::now());
    if let Err(e) = repository.record_run_result(task.id, outcome, next).await {
        error!("Failed to record run result: {}", e);
    }
}

#[cfg(test)]
#[path = "scheduler_test.rs"]
mod tests;
