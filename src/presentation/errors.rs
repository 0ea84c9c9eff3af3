// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

use crate::utils::errors::{DiscoveryError, RepositoryError};

/// 应用错误类型
///
/// 封装所有可能的应用层错误，按错误类别映射 HTTP 状态码
#[derive(Debug)]
pub struct AppError(anyhow::Error);

impl AppError {
    fn status(&self) -> StatusCode {
        if let Some(err) = self.0.downcast_ref::<DiscoveryError>() {
            return match err {
                DiscoveryError::Configuration(_) => StatusCode::BAD_REQUEST,
                DiscoveryError::NotFound(_) => StatusCode::NOT_FOUND,
                DiscoveryError::Conflict(_) => StatusCode::CONFLICT,
                DiscoveryError::CollaboratorUnreachable(_) => StatusCode::BAD_GATEWAY,
                DiscoveryError::Persistence(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
                DiscoveryError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
            };
        }
        if let Some(err) = self.0.downcast_ref::<RepositoryError>() {
            return match err {
                RepositoryError::NotFound => StatusCode::NOT_FOUND,
                RepositoryError::AlreadyExists(_) => StatusCode::CONFLICT,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
        }
        if self.0.downcast_ref::<validator::ValidationErrors>().is_some() {
            return StatusCode::BAD_REQUEST;
        }
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_message = self.0.to_string();
        if status.is_server_error() {
            error!(status = %status, "Request failed: {}", error_message);
        }

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
