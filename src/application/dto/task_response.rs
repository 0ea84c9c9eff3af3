// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::models::discovery_task::{DiscoveryTask, TaskRunState};

/// 任务运行状态响应DTO
#[derive(Debug, Clone, Serialize)]
pub struct TaskStatusResponseDto {
    pub id: Uuid,
    pub task_name: String,
    pub state: TaskRunState,
    pub is_active: bool,
    pub is_running: bool,
    pub success_counts: i64,
    pub fail_counts: i64,
    pub last_execution_time: Option<DateTime<FixedOffset>>,
    pub next_execution_time: Option<DateTime<FixedOffset>>,
}

impl TaskStatusResponseDto {
    pub fn new(task: &DiscoveryTask, is_running: bool) -> Self {
        Self {
            id: task.id,
            task_name: task.task_name.clone(),
            state: task.run_state(is_running),
            is_active: task.is_active,
            is_running,
            success_counts: task.success_counts,
            fail_counts: task.fail_counts,
            last_execution_time: task.last_execution_time,
            next_execution_time: task.next_execution_time,
        }
    }
}
