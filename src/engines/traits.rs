// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

use crate::domain::models::discovery_task::CrawlStrategy;
use crate::domain::models::signal::SignalBundle;

/// 自动化服务错误类型
#[derive(Error, Debug)]
pub enum AutomationError {
    /// 单页访问超时
    #[error("Page visit timed out after {0:?}")]
    Timeout(Duration),
    /// 无法建立连接
    #[error("Automation service unreachable: {0}")]
    Unreachable(String),
    /// 服务返回非 2xx 状态
    #[error("Automation service returned {status}: {message}")]
    Service { status: u16, message: String },
    /// 服务报告页面渲染失败
    #[error("Page rendering failed: {0}")]
    Rendering(String),
    /// 响应无法解析
    #[error("Undecodable automation response: {0}")]
    Decode(String),
    /// 其他传输层错误
    #[error("Transport error: {0}")]
    Transport(String),
}

impl AutomationError {
    /// 判断错误是否可重试
    ///
    /// 超时、连接失败和 5xx 属于瞬时错误
    pub fn is_retryable(&self) -> bool {
        match self {
            AutomationError::Timeout(_) | AutomationError::Unreachable(_) => true,
            AutomationError::Service { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// 协作服务是否不可达，不可达会中止整个运行
    pub fn is_unreachable(&self) -> bool {
        matches!(self, AutomationError::Unreachable(_))
    }
}

impl From<reqwest::Error> for AutomationError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() {
            AutomationError::Unreachable(err.to_string())
        } else if err.is_timeout() {
            AutomationError::Timeout(Duration::ZERO)
        } else if err.is_decode() {
            AutomationError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            AutomationError::Service {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else {
            AutomationError::Transport(err.to_string())
        }
    }
}

/// 单页访问请求
#[derive(Debug, Clone)]
pub struct PageRequest {
    /// 目标 URL
    pub url: String,
    /// 单页超时
    pub timeout: Duration,
    /// 透传给服务的爬取策略
    pub strategy: CrawlStrategy,
}

/// 浏览器自动化客户端特质
#[async_trait]
pub trait AutomationClient: Send + Sync {
    /// 访问页面并返回各通道的发现信号
    async fn visit(&self, request: &PageRequest) -> Result<SignalBundle, AutomationError>;
}

/// 审核服务错误类型
#[derive(Error, Debug)]
pub enum AuditError {
    #[error("Audit request timed out")]
    Timeout,
    #[error("Audit service unreachable: {0}")]
    Unreachable(String),
    #[error("Audit service returned {status}: {message}")]
    Service { status: u16, message: String },
    #[error("Undecodable audit response: {0}")]
    Decode(String),
    #[error("Transport error: {0}")]
    Transport(String),
}

impl AuditError {
    /// 判断错误是否可重试
    pub fn is_retryable(&self) -> bool {
        match self {
            AuditError::Timeout | AuditError::Unreachable(_) => true,
            AuditError::Service { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for AuditError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() {
            AuditError::Unreachable(err.to_string())
        } else if err.is_timeout() {
            AuditError::Timeout
        } else if err.is_decode() {
            AuditError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            AuditError::Service {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else {
            AuditError::Transport(err.to_string())
        }
    }
}

/// 审核结论
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Accept,
    Reject,
}

/// 审核请求
#[derive(Debug, Clone, Serialize)]
pub struct AuditRequest {
    pub urls: Vec<String>,
    pub depth: u32,
    pub strategy_type: Option<String>,
    pub strategy_contents: Option<String>,
}

/// 审核响应
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuditResponse {
    pub verdicts: HashMap<String, Verdict>,
}

/// 审核客户端特质
#[async_trait]
pub trait AuditClient: Send + Sync {
    /// 提交一批 URL 并返回逐条结论
    async fn audit(&self, request: &AuditRequest) -> Result<AuditResponse, AuditError>;
}
