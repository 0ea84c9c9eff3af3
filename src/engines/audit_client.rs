// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use std::time::Duration;

use crate::engines::traits::{AuditClient, AuditError, AuditRequest, AuditResponse};

/// 审核服务 HTTP 客户端
///
/// 单次请求，不做重试；重试与降级由审核闸门负责
pub struct HttpAuditClient {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl HttpAuditClient {
    pub fn new(url: &str, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.to_string(),
            timeout,
        }
    }
}

#[async_trait]
impl AuditClient for HttpAuditClient {
    async fn audit(&self, request: &AuditRequest) -> Result<AuditResponse, AuditError> {
        let response = self
            .client
            .post(&self.url)
            .timeout(self.timeout)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(AuditError::Service {
                status: status.as_u16(),
                message,
            });
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| AuditError::Decode(e.to_string()))
    }
}
