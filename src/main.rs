// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, info};

use discovrs::application::use_cases::discovered_url_use_case::DiscoveredUrlUseCase;
use discovrs::application::use_cases::discovery_run::DiscoveryRunner;
use discovrs::application::use_cases::task_use_case::DiscoveryTaskUseCase;
use discovrs::config::settings::Settings;
use discovrs::domain::services::audit_gate::AuditGate;
use discovrs::domain::services::crawl_controller::{ControllerSettings, CrawlController};
use discovrs::engines::audit_client::HttpAuditClient;
use discovrs::engines::automation_client::HttpAutomationClient;
use discovrs::engines::traits::{AuditClient, AutomationClient};
use discovrs::infrastructure::database::connection;
use discovrs::infrastructure::metrics;
use discovrs::infrastructure::repositories::discovered_url_repo_impl::DiscoveredUrlRepositoryImpl;
use discovrs::infrastructure::repositories::discovery_task_repo_impl::DiscoveryTaskRepositoryImpl;
use discovrs::presentation::routes::{self, ApiState};
use discovrs::queue::run_registry::RunRegistry;
use discovrs::queue::scheduler::DiscoveryScheduler;
use discovrs::utils::telemetry;
use discovrs::workers::scheduler_worker::SchedulerWorker;
use migration::{Migrator, MigratorTrait};

/// 主函数
///
/// 应用程序入口点，负责初始化所有组件并启动服务
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize logging
    telemetry::init_telemetry();
    info!("Starting discovrs...");

    // 2. Load configuration
    let settings = Settings::new()?;
    info!("Configuration loaded");

    if settings.metrics.enabled {
        metrics::init_metrics(&settings.metrics.listen_addr)?;
    }

    // 3. Connect to database
    let db = connection::create_pool(&settings.database).await?;
    let db = Arc::new(db);
    info!("Database connection established");

    info!("Running database migrations...");
    Migrator::up(db.as_ref(), None).await?;
    info!("Database migrations applied");

    // 4. Initialize components
    let url_repo = Arc::new(DiscoveredUrlRepositoryImpl::new(db.clone()));
    let task_repo = Arc::new(DiscoveryTaskRepositoryImpl::new(db.clone()));

    let automation: Arc<dyn AutomationClient> = Arc::new(HttpAutomationClient::new(
        &settings.automation.service_url,
        settings.automation.retry_policy(),
    ));
    let audit_client: Arc<dyn AuditClient> = Arc::new(HttpAuditClient::new(
        &settings.audit.url,
        settings.audit.timeout(),
    ));
    let audit_gate = Arc::new(AuditGate::new(
        audit_client,
        settings.audit.batch_size,
        settings.audit.retry_policy(),
    ));

    let controller = Arc::new(CrawlController::new(
        automation,
        audit_gate,
        url_repo.clone(),
        settings.classifier.build_classifier(),
        ControllerSettings {
            concurrency: settings.automation.concurrency,
            page_timeout: settings.automation.page_timeout(),
            resubmit_limit: settings.audit.resubmit_limit,
        },
    ));
    let runner = Arc::new(DiscoveryRunner::new(controller, settings.crawler.clone()));

    // 5. Start scheduler
    let scheduler = Arc::new(DiscoveryScheduler::new(
        task_repo.clone(),
        runner.clone(),
        Arc::new(RunRegistry::new()),
    ));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let worker = SchedulerWorker::new(
        scheduler.clone(),
        Duration::from_secs(settings.scheduler.tick_interval_secs),
        shutdown_rx,
    )
    .start();

    // 6. Start HTTP server
    let state = ApiState {
        runner,
        urls: Arc::new(DiscoveredUrlUseCase::new(url_repo)),
        tasks: Arc::new(DiscoveryTaskUseCase::new(
            task_repo,
            scheduler.clone(),
            settings.crawler.clone(),
        )),
    };

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, routes::app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // 7. Drain
    info!("HTTP server stopped, shutting down scheduler");
    let _ = shutdown_tx.send(true);
    if let Err(e) = worker.await {
        error!("Scheduler worker terminated abnormally: {}", e);
    }
    scheduler
        .shutdown(Duration::from_secs(settings.scheduler.shutdown_grace_secs))
        .await;
    info!("discovrs stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
}
