// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use serde::Serialize;
use std::time::Instant;
use tracing::debug;

use crate::domain::models::signal::SignalBundle;
use crate::engines::traits::{AutomationClient, AutomationError, PageRequest};
use crate::utils::retry_policy::RetryPolicy;

/// 等待页面网络空闲后再采集信号
const WAIT_FOR_NETWORK_IDLE: &str = "networkidle";

#[derive(Debug, Serialize)]
struct RenderRequest<'a> {
    url: &'a str,
    /// 毫秒
    timeout: u64,
    wait_for: &'a str,
    strategy_type: Option<&'a str>,
    strategy_contents: Option<&'a str>,
}

/// 远程浏览器自动化服务客户端
///
/// 调用 `POST {service_url}/render`，每次尝试都受单页超时约束，
/// 超时、连接失败和 5xx 按重试策略退避重试
pub struct HttpAutomationClient {
    client: reqwest::Client,
    render_url: String,
    retry_policy: RetryPolicy,
}

impl HttpAutomationClient {
    /// 创建自动化服务客户端
    ///
    /// # 参数
    ///
    /// * `service_url` - 服务基础地址
    /// * `retry_policy` - 瞬时错误的重试策略
    pub fn new(service_url: &str, retry_policy: RetryPolicy) -> Self {
        Self {
            client: reqwest::Client::new(),
            render_url: format!("{}/render", service_url.trim_end_matches('/')),
            retry_policy,
        }
    }

    async fn render_once(&self, request: &PageRequest) -> Result<SignalBundle, AutomationError> {
        let body = RenderRequest {
            url: &request.url,
            timeout: request.timeout.as_millis() as u64,
            wait_for: WAIT_FOR_NETWORK_IDLE,
            strategy_type: request.strategy.strategy_type.as_deref(),
            strategy_contents: request.strategy.strategy_contents.as_deref(),
        };

        let bundle = tokio::time::timeout(request.timeout, self.post_render(&body))
            .await
            .map_err(|_| AutomationError::Timeout(request.timeout))?
            .map_err(|e| match e {
                AutomationError::Timeout(_) => AutomationError::Timeout(request.timeout),
                other => other,
            })?;

        if !bundle.success {
            return Err(AutomationError::Rendering(
                bundle
                    .error
                    .unwrap_or_else(|| "service reported failure".to_string()),
            ));
        }
        Ok(bundle)
    }

    async fn post_render(&self, body: &RenderRequest<'_>) -> Result<SignalBundle, AutomationError> {
        let response = self.client.post(&self.render_url).json(body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(AutomationError::Service {
                status: status.as_u16(),
                message,
            });
        }
        let bytes = response.bytes().await?;
        serde_json::from_slice::<SignalBundle>(&bytes)
            .map_err(|e| AutomationError::Decode(e.to_string()))
    }
}

#[async_trait]
impl AutomationClient for HttpAutomationClient {
    async fn visit(&self, request: &PageRequest) -> Result<SignalBundle, AutomationError> {
        let start = Instant::now();
        let result = self
            .retry_policy
            .retry("automation.render", AutomationError::is_retryable, || {
                self.render_once(request)
            })
            .await;

        debug!(
            url = %request.url,
            elapsed_ms = start.elapsed().as_millis() as u64,
            ok = result.is_ok(),
            "Page visit finished"
        );
        result
    }
}

#[cfg(test)]
#[path = "automation_client_test.rs"]
mod tests;
