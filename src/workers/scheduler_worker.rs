// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::domain::repositories::discovery_task_repository::DiscoveryTaskRepository;
use crate::queue::scheduler::DiscoveryScheduler;
use crate::utils::errors::WorkerError;
use crate::workers::worker::Worker;

/// 调度工作器
///
/// 按固定周期驱动调度器 tick。单次 tick 失败只记录日志，循环继续。
pub struct SchedulerWorker<R>
where
    R: DiscoveryTaskRepository + 'static,
{
    scheduler: Arc<DiscoveryScheduler<R>>,
    tick_interval: Duration,
    shutdown: watch::Receiver<bool>,
}

impl<R> SchedulerWorker<R>
where
    R: DiscoveryTaskRepository + 'static,
{
    /// 创建调度工作器
    ///
    /// # 参数
    ///
    /// * `scheduler` - 调度器
    /// * `tick_interval` - tick 周期
    /// * `shutdown` - 关闭信号，值变为 `true` 时退出循环
    pub fn new(
        scheduler: Arc<DiscoveryScheduler<R>>,
        tick_interval: Duration,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            scheduler,
            tick_interval,
            shutdown,
        }
    }

    /// 启动后台运行
    pub fn start(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            if let Err(e) = self.run().await {
                error!("{} stopped with error: {}", self.name(), e);
            }
        })
    }
}

#[async_trait]
impl<R> Worker for SchedulerWorker<R>
where
    R: DiscoveryTaskRepository + 'static,
{
    async fn run(&self) -> Result<(), WorkerError> {
        info!(
            "{} started, tick interval {:?}",
            self.name(),
            self.tick_interval
        );

        let mut shutdown = self.shutdown.clone();
        let mut interval = tokio::time::interval(self.tick_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = self.scheduler.tick().await {
                        error!("Scheduler tick failed: {}", e);
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("{} received shutdown signal", self.name());
                        return Ok(());
                    }
                }
            }
        }
    }

    fn name(&self) -> &str {
        "SchedulerWorker"
    }
}

#[cfg(test)]
#[path = "scheduler_worker_test.rs"]
mod tests;
