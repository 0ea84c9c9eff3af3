// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum_test::TestServer;
use discovrs::application::use_cases::discovered_url_use_case::DiscoveredUrlUseCase;
use discovrs::application::use_cases::discovery_run::DiscoveryRunner;
use discovrs::application::use_cases::task_use_case::DiscoveryTaskUseCase;
use discovrs::config::settings::{CrawlerSettings, DatabaseSettings};
use discovrs::domain::services::audit_gate::AuditGate;
use discovrs::domain::services::crawl_controller::{ControllerSettings, CrawlController};
use discovrs::domain::services::url_classifier::UrlClassifier;
use discovrs::engines::audit_client::HttpAuditClient;
use discovrs::engines::automation_client::HttpAutomationClient;
use discovrs::infrastructure::database::connection;
use discovrs::infrastructure::repositories::discovered_url_repo_impl::DiscoveredUrlRepositoryImpl;
use discovrs::infrastructure::repositories::discovery_task_repo_impl::DiscoveryTaskRepositoryImpl;
use discovrs::presentation::routes::{self, ApiState};
use discovrs::queue::run_registry::RunRegistry;
use discovrs::queue::scheduler::DiscoveryScheduler;
use discovrs::utils::retry_policy::RetryPolicy;
use migration::{Migrator, MigratorTrait};
use sea_orm::DatabaseConnection;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

#[allow(dead_code)]
pub struct TestApp {
    pub server: TestServer,
    pub db: Arc<DatabaseConnection>,
    pub url_repo: Arc<DiscoveredUrlRepositoryImpl>,
    pub task_repo: Arc<DiscoveryTaskRepositoryImpl>,
    pub scheduler: Arc<DiscoveryScheduler<DiscoveryTaskRepositoryImpl>>,
    pub automation: MockServer,
    pub audit: MockServer,
}

/// 接受全部 URL 的审核服务，路径含 `spam` 的除外
struct AuditResponder;

impl Respond for AuditResponder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body: Value = match serde_json::from_slice(&request.body) {
            Ok(body) => body,
            Err(_) => return ResponseTemplate::new(400),
        };
        let verdicts: serde_json::Map<String, Value> = body["urls"]
            .as_array()
            .map(|urls| {
                urls.iter()
                    .filter_map(|u| u.as_str())
                    .map(|u| {
                        let verdict = if u.contains("spam") { "reject" } else { "accept" };
                        (u.to_string(), json!(verdict))
                    })
                    .collect()
            })
            .unwrap_or_default();
        ResponseTemplate::new(200).set_body_json(json!({ "verdicts": verdicts }))
    }
}

pub fn crawler_settings() -> CrawlerSettings {
    CrawlerSettings {
        default_max_depth: 1,
        default_max_pages: 100,
        default_exclude_suffixes: vec![".js".to_string(), ".css".to_string()],
    }
}

fn fast_retry() -> RetryPolicy {
    let mut policy = RetryPolicy::with_limits(1, Duration::from_millis(5));
    policy.enable_jitter = false;
    policy
}

pub async fn create_test_app() -> TestApp {
    let automation = MockServer::start().await;
    let audit = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/audit"))
        .respond_with(AuditResponder)
        .mount(&audit)
        .await;

    let db_settings = DatabaseSettings {
        url: "sqlite::memory:".to_string(),
        max_connections: None,
        min_connections: None,
        connect_timeout: None,
        idle_timeout: None,
    };
    let db = Arc::new(
        connection::create_pool(&db_settings)
            .await
            .expect("Failed to connect to sqlite"),
    );
    Migrator::up(db.as_ref(), None)
        .await
        .expect("Failed to run migrations");

    let url_repo = Arc::new(DiscoveredUrlRepositoryImpl::new(db.clone()));
    let task_repo = Arc::new(DiscoveryTaskRepositoryImpl::new(db.clone()));

    let gate = AuditGate::new(
        Arc::new(HttpAuditClient::new(
            &format!("{}/audit", audit.uri()),
            Duration::from_secs(5),
        )),
        50,
        fast_retry(),
    );
    let controller = Arc::new(CrawlController::new(
        Arc::new(HttpAutomationClient::new(&automation.uri(), fast_retry())),
        Arc::new(gate),
        url_repo.clone(),
        UrlClassifier::default(),
        ControllerSettings {
            concurrency: 2,
            page_timeout: Duration::from_secs(5),
            resubmit_limit: 100,
        },
    ));
    let runner = Arc::new(DiscoveryRunner::new(controller, crawler_settings()));
    let scheduler = Arc::new(DiscoveryScheduler::new(
        task_repo.clone(),
        runner.clone(),
        Arc::new(RunRegistry::new()),
    ));

    let state = ApiState {
        runner,
        urls: Arc::new(DiscoveredUrlUseCase::new(url_repo.clone())),
        tasks: Arc::new(DiscoveryTaskUseCase::new(
            task_repo.clone(),
            scheduler.clone(),
            crawler_settings(),
        )),
    };
    let server = TestServer::new(routes::app(state)).expect("Failed to start test server");

    TestApp {
        server,
        db,
        url_repo,
        task_repo,
        scheduler,
        automation,
        audit,
    }
}

impl TestApp {
    /// 为页面挂载渲染结果，`anchors` 为页面上的链接
    pub async fn mount_page(&self, url: &str, anchors: &[&str]) {
        Mock::given(method("POST"))
            .and(path("/render"))
            .and(body_partial_json(json!({ "url": url })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "anchors": anchors,
            })))
            .mount(&self.automation)
            .await;
    }

    /// 挂载 A→B、A→C、B→D 的站点
    pub async fn mount_abcd_site(&self) {
        self.mount_page("https://site.test/a", &["/b", "/c"]).await;
        self.mount_page("https://site.test/b", &["/d"]).await;
        self.mount_page("https://site.test/c", &[]).await;
        self.mount_page("https://site.test/d", &[]).await;
    }

    /// 等待任务当前的运行结束
    pub async fn wait_until_idle(&self, task_id: uuid::Uuid) {
        tokio::time::timeout(Duration::from_secs(10), async {
            while self.scheduler.is_running(task_id) {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("run did not finish in time");
    }
}
