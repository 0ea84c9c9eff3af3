// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{
    routing::{get, post},
    Extension, Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::application::use_cases::discovered_url_use_case::DiscoveredUrlUseCase;
use crate::application::use_cases::discovery_run::DiscoveryRunner;
use crate::application::use_cases::task_use_case::DiscoveryTaskUseCase;
use crate::infrastructure::repositories::discovered_url_repo_impl::DiscoveredUrlRepositoryImpl;
use crate::infrastructure::repositories::discovery_task_repo_impl::DiscoveryTaskRepositoryImpl;
use crate::presentation::handlers::{discovery_handler, task_handler};

type UrlRepo = DiscoveredUrlRepositoryImpl;
type TaskRepo = DiscoveryTaskRepositoryImpl;

/// 控制面依赖的用例集合
#[derive(Clone)]
pub struct ApiState {
    pub runner: Arc<DiscoveryRunner<UrlRepo>>,
    pub urls: Arc<DiscoveredUrlUseCase<UrlRepo>>,
    pub tasks: Arc<DiscoveryTaskUseCase<TaskRepo>>,
}

/// 创建应用路由
///
/// # 返回值
///
/// 返回未注入依赖的路由，调用方通过 `Extension` 提供用例
pub fn routes() -> Router {
    let public_routes = Router::new()
        .route("/health", get(health_check))
        .route("/v1/version", get(version));

    let discovery_routes = Router::new()
        .route(
            "/v1/discovery/crawl",
            post(discovery_handler::crawl_once::<UrlRepo>),
        )
        .route(
            "/v1/discovery/urls",
            get(discovery_handler::list_urls::<UrlRepo>),
        );

    let task_routes = Router::new()
        .route(
            "/v1/discovery-tasks",
            post(task_handler::create_task::<TaskRepo>).get(task_handler::list_tasks::<TaskRepo>),
        )
        .route(
            "/v1/discovery-tasks/{id}",
            get(task_handler::get_task::<TaskRepo>)
                .put(task_handler::update_task::<TaskRepo>)
                .delete(task_handler::delete_task::<TaskRepo>),
        )
        .route(
            "/v1/discovery-tasks/{id}/start",
            post(task_handler::start_task::<TaskRepo>),
        )
        .route(
            "/v1/discovery-tasks/{id}/stop",
            post(task_handler::stop_task::<TaskRepo>),
        )
        .route(
            "/v1/discovery-tasks/{id}/status",
            get(task_handler::task_status::<TaskRepo>),
        );

    Router::new()
        .merge(public_routes)
        .merge(discovery_routes)
        .merge(task_routes)
}

/// 注入用例并挂载请求追踪的完整应用
pub fn app(state: ApiState) -> Router {
    routes()
        .layer(Extension(state.runner))
        .layer(Extension(state.urls))
        .layer(Extension(state.tasks))
        .layer(TraceLayer::new_for_http())
}

/// 健康检查端点
///
/// # 返回值
///
/// 返回"OK"字符串
pub async fn health_check() -> &'static str {
    "OK"
}

/// 版本信息端点
pub async fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
