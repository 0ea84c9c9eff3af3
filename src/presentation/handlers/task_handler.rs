// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::application::dto::task_request::{
    CreateTaskRequestDto, ListTasksQueryDto, UpdateTaskRequestDto,
};
use crate::application::dto::task_response::TaskStatusResponseDto;
use crate::application::use_cases::task_use_case::DiscoveryTaskUseCase;
use crate::domain::models::discovery_task::DiscoveryTask;
use crate::domain::repositories::discovery_task_repository::DiscoveryTaskRepository;
use crate::presentation::errors::AppError;

type TaskUseCase<R> = Extension<Arc<DiscoveryTaskUseCase<R>>>;

/// 创建发现任务，创建后立即触发首次运行
pub async fn create_task<R>(
    Extension(use_case): TaskUseCase<R>,
    Json(payload): Json<CreateTaskRequestDto>,
) -> Result<(StatusCode, Json<DiscoveryTask>), AppError>
where
    R: DiscoveryTaskRepository + 'static,
{
    let task = use_case.create(payload).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn list_tasks<R>(
    Extension(use_case): TaskUseCase<R>,
    Query(query): Query<ListTasksQueryDto>,
) -> Result<Json<Vec<DiscoveryTask>>, AppError>
where
    R: DiscoveryTaskRepository + 'static,
{
    Ok(Json(use_case.list(&query).await?))
}

pub async fn get_task<R>(
    Extension(use_case): TaskUseCase<R>,
    Path(id): Path<Uuid>,
) -> Result<Json<DiscoveryTask>, AppError>
where
    R: DiscoveryTaskRepository + 'static,
{
    Ok(Json(use_case.get(id).await?))
}

pub async fn update_task<R>(
    Extension(use_case): TaskUseCase<R>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateTaskRequestDto>,
) -> Result<Json<DiscoveryTask>, AppError>
where
    R: DiscoveryTaskRepository + 'static,
{
    Ok(Json(use_case.update(id, payload).await?))
}

/// 删除任务；运行中返回 409
pub async fn delete_task<R>(
    Extension(use_case): TaskUseCase<R>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError>
where
    R: DiscoveryTaskRepository + 'static,
{
    use_case.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn start_task<R>(
    Extension(use_case): TaskUseCase<R>,
    Path(id): Path<Uuid>,
) -> Result<Json<DiscoveryTask>, AppError>
where
    R: DiscoveryTaskRepository + 'static,
{
    Ok(Json(use_case.start(id).await?))
}

pub async fn stop_task<R>(
    Extension(use_case): TaskUseCase<R>,
    Path(id): Path<Uuid>,
) -> Result<Json<DiscoveryTask>, AppError>
where
    R: DiscoveryTaskRepository + 'static,
{
    Ok(Json(use_case.stop(id).await?))
}

pub async fn task_status<R>(
    Extension(use_case): TaskUseCase<R>,
    Path(id): Path<Uuid>,
) -> Result<Json<TaskStatusResponseDto>, AppError>
where
    R: DiscoveryTaskRepository + 'static,
{
    Ok(Json(use_case.status(id).await?))
}
