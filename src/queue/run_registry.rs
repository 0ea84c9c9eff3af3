// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use uuid::Uuid;

/// 单次运行的上下文
#[derive(Debug, Clone)]
pub struct RunContext {
    pub run_id: Uuid,
    /// 停止信号，置位后控制器不再派发新页面
    pub stop: Arc<AtomicBool>,
}

impl RunContext {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            stop: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}

struct RunEntry {
    ctx: RunContext,
    handle: Option<JoinHandle<()>>,
    /// 运行结束后需要立即再运行一次
    restart: bool,
}

/// 进程内的运行注册表
///
/// 以任务ID为键记录正在运行的任务。`try_begin` 在同一个分片锁内完成
/// 检查与插入，同一任务同时最多只有一个运行。
#[derive(Default)]
pub struct RunRegistry {
    runs: DashMap<Uuid, RunEntry>,
}

impl RunRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 尝试登记一次运行
    ///
    /// # 返回值
    ///
    /// * `Some(RunContext)` - 登记成功
    /// * `None` - 该任务已有运行在进行
    pub fn try_begin(&self, task_id: Uuid) -> Option<RunContext> {
        match self.runs.entry(task_id) {
            Entry::Occupied(_) => None,
            Entry::Vacant(vacant) => {
                let ctx = RunContext::new();
                vacant.insert(RunEntry {
                    ctx: ctx.clone(),
                    handle: None,
                    restart: false,
                });
                Some(ctx)
            }
        }
    }

    /// 关联运行的后台任务句柄；运行已结束时直接丢弃句柄
    pub fn attach(&self, task_id: Uuid, run_id: Uuid, handle: JoinHandle<()>) {
        if let Some(mut entry) = self.runs.get_mut(&task_id) {
            if entry.ctx.run_id == run_id {
                entry.handle = Some(handle);
            }
        }
    }

    /// 注销运行，只移除 `run_id` 匹配的登记
    pub fn finish(&self, task_id: Uuid, run_id: Uuid) {
        self.runs
            .remove_if(&task_id, |_, entry| entry.ctx.run_id == run_id);
    }

    /// 请求在当前运行结束后再运行一次
    ///
    /// # 返回值
    ///
    /// 该任务是否有运行在进行；为 `false` 时请求未被记录
    pub fn request_restart(&self, task_id: Uuid) -> bool {
        match self.runs.get_mut(&task_id) {
            Some(mut entry) => {
                entry.restart = true;
                true
            }
            None => false,
        }
    }

    /// 运行结束时调用
    ///
    /// 有待处理的重启请求时保留登记并换上新的运行上下文，返回该上下文；
    /// 否则注销运行并返回 `None`。检查与注销在同一个分片锁内完成，
    /// 重启请求不会在两者之间丢失。
    pub fn rearm(&self, task_id: Uuid, run_id: Uuid) -> Option<RunContext> {
        match self.runs.entry(task_id) {
            Entry::Occupied(mut occupied) if occupied.get().ctx.run_id == run_id => {
                if occupied.get().restart {
                    let entry = occupied.get_mut();
                    entry.restart = false;
                    entry.ctx = RunContext::new();
                    Some(entry.ctx.clone())
                } else {
                    occupied.remove();
                    None
                }
            }
            _ => None,
        }
    }

    pub fn is_running(&self, task_id: Uuid) -> bool {
        self.runs.contains_key(&task_id)
    }

    /// 向指定任务的运行发出停止信号
    ///
    /// # 返回值
    ///
    /// 该任务是否有运行在进行
    pub fn signal_stop(&self, task_id: Uuid) -> bool {
        match self.runs.get_mut(&task_id) {
            Some(mut entry) => {
                entry.ctx.stop.store(true, Ordering::SeqCst);
                entry.restart = false;
                true
            }
            None => false,
        }
    }

    /// 向所有运行发出停止信号
    pub fn signal_all(&self) {
        for entry in self.runs.iter() {
            entry.ctx.stop.store(true, Ordering::SeqCst);
        }
    }

    /// 取出所有已关联的句柄，用于关闭时等待
    pub fn take_handles(&self) -> Vec<JoinHandle<()>> {
        self.runs
            .iter_mut()
            .filter_map(|mut entry| entry.handle.take())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }
}

/// 运行结束（包括 panic）时自动注销
pub struct RunGuard {
    registry: Arc<RunRegistry>,
    task_id: Uuid,
    run_id: Uuid,
}

impl RunGuard {
    pub fn new(registry: Arc<RunRegistry>, task_id: Uuid, run_id: Uuid) -> Self {
        Self {
            registry,
            task_id,
            run_id,
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// 登记换成新的运行后改为注销新的运行
    pub fn rebind(&mut self, run_id: Uuid) {
        self.run_id = run_id;
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.registry.finish(self.task_id, self.run_id);
    }
}
