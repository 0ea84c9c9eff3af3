// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm::DbErr;
use thiserror::Error;

use crate::domain::models::discovery_task::DomainError;

/// 仓库层错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// 数据库错误
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    /// 记录未找到
    #[error("Record not found")]
    NotFound,

    /// 唯一约束冲突
    #[error("Record already exists: {0}")]
    AlreadyExists(String),

    /// 存储中的数据无法映射为领域模型
    #[error("Corrupted record: {0}")]
    Corrupted(String),
}

/// 发现流程错误类型
///
/// 应用层统一的错误分类，表示层据此映射 HTTP 状态码
#[derive(Error, Debug)]
pub enum DiscoveryError {
    /// 参数或配置不合法，同步拒绝，不会进入调度
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// 外部协作服务在重试后仍无法连接
    #[error("Collaborator unreachable: {0}")]
    CollaboratorUnreachable(String),

    /// 持久化失败，对当前运行是致命的
    #[error("Persistence error: {0}")]
    Persistence(#[from] RepositoryError),

    #[error("Not found: {0}")]
    NotFound(String),

    /// 状态冲突，例如名称重复或任务正在运行
    #[error("Conflict: {0}")]
    Conflict(String),
}

impl From<DomainError> for DiscoveryError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::ValidationError(msg) => DiscoveryError::Configuration(msg),
        }
    }
}

/// Worker错误类型
#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("仓库错误: {0}")]
    RepositoryError(String),

    #[error("内部错误: {0}")]
    InternalError(String),
}
