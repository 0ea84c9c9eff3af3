// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::*;
use crate::domain::models::discovered_url::SourceType;
use crate::domain::models::discovery_task::TaskRunState;
use crate::domain::services::crawl_controller::CrawlReport;
use crate::infrastructure::repositories::discovery_task_repo_impl::DiscoveryTaskRepositoryImpl;
use crate::queue::run_registry::{RunContext, RunRegistry};
use crate::queue::scheduler::RunExecutor;
use async_trait::async_trait;
use migration::{Migrator, MigratorTrait};
use sea_orm::Database;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Semaphore;

/// 在拿到放行许可或收到停止信号之前一直阻塞的执行器
struct HeldExecutor {
    gate: Semaphore,
    calls: AtomicUsize,
    /// 为 `false` 时忽略停止信号，模拟收尾较慢的运行
    honor_stop: bool,
}

impl HeldExecutor {
    fn new() -> Self {
        Self {
            gate: Semaphore::new(0),
            calls: AtomicUsize::new(0),
            honor_stop: true,
        }
    }

    fn draining() -> Self {
        Self {
            honor_stop: false,
            ..Self::new()
        }
    }
}

#[async_trait]
impl RunExecutor for HeldExecutor {
    async fn execute(
        &self,
        _task: &DiscoveryTask,
        ctx: &RunContext,
    ) -> Result<CrawlReport, DiscoveryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        loop {
            if self.honor_stop && ctx.stop.load(Ordering::SeqCst) {
                return Ok(CrawlReport {
                    run_id: ctx.run_id,
                    stopped: true,
                    ..Default::default()
                });
            }
            if let Ok(permit) = self.gate.try_acquire() {
                permit.forget();
                return Ok(CrawlReport {
                    run_id: ctx.run_id,
                    ..Default::default()
                });
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }
}

struct Fixture {
    use_case: DiscoveryTaskUseCase<DiscoveryTaskRepositoryImpl>,
    scheduler: Arc<DiscoveryScheduler<DiscoveryTaskRepositoryImpl>>,
    executor: Arc<HeldExecutor>,
}

async fn setup() -> Fixture {
    setup_with(HeldExecutor::new()).await
}

async fn setup_with(executor: HeldExecutor) -> Fixture {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    let db = Arc::new(db);
    Migrator::up(db.as_ref(), None).await.unwrap();
    let repo = Arc::new(DiscoveryTaskRepositoryImpl::new(db));
    let executor = Arc::new(executor);
    let scheduler = Arc::new(DiscoveryScheduler::new(
        repo.clone(),
        executor.clone(),
        Arc::new(RunRegistry::new()),
    ));
    let crawler = CrawlerSettings {
        default_max_depth: 2,
        default_max_pages: 100,
        default_exclude_suffixes: vec![".js".to_string()],
    };
    Fixture {
        use_case: DiscoveryTaskUseCase::new(repo, scheduler.clone(), crawler),
        scheduler,
        executor,
    }
}

fn create_dto(name: &str) -> CreateTaskRequestDto {
    CreateTaskRequestDto {
        task_name: name.to_string(),
        base_url: "https://example.com".to_string(),
        source_type: SourceType::Sitemap,
        tags: vec!["docs".to_string()],
        depth: None,
        max_pages: None,
        strategy_type: None,
        strategy_contents: None,
        exclude_suffixes: None,
        execution_interval: 600,
    }
}

async fn wait_until_idle(scheduler: &DiscoveryScheduler<DiscoveryTaskRepositoryImpl>, id: Uuid) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while scheduler.is_running(id) {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn test_create_applies_defaults_and_launches_run() {
    let fx = setup().await;

    let task = fx.use_case.create(create_dto("docs")).await.unwrap();

    assert_eq!(task.depth, 2);
    assert_eq!(task.exclude_suffixes, vec![".js".to_string()]);
    assert!(task.is_active);
    assert!(fx.scheduler.is_running(task.id));

    fx.executor.gate.add_permits(1);
    wait_until_idle(&fx.scheduler, task.id).await;
    assert_eq!(fx.executor.calls.load(Ordering::SeqCst), 1);

    let stored = fx.use_case.get(task.id).await.unwrap();
    assert_eq!(stored.success_counts, 1);
}

#[tokio::test]
async fn test_create_rejects_duplicate_name_and_invalid_input() {
    let fx = setup().await;
    fx.use_case.create(create_dto("docs")).await.unwrap();

    let duplicate = fx.use_case.create(create_dto("docs")).await;
    assert!(matches!(duplicate, Err(DiscoveryError::Conflict(_))));

    let mut bad_url = create_dto("other");
    bad_url.base_url = "not a url".to_string();
    assert!(matches!(
        fx.use_case.create(bad_url).await,
        Err(DiscoveryError::Configuration(_))
    ));

    let mut bad_interval = create_dto("third");
    bad_interval.execution_interval = 0;
    assert!(matches!(
        fx.use_case.create(bad_interval).await,
        Err(DiscoveryError::Configuration(_))
    ));

    let mut unbounded_interval = create_dto("fifth");
    unbounded_interval.execution_interval = i64::MAX;
    assert!(matches!(
        fx.use_case.create(unbounded_interval).await,
        Err(DiscoveryError::Configuration(_))
    ));

    let mut ftp = create_dto("fourth");
    ftp.base_url = "ftp://example.com/files".to_string();
    assert!(matches!(
        fx.use_case.create(ftp).await,
        Err(DiscoveryError::Configuration(_))
    ));

    fx.scheduler.shutdown(Duration::from_millis(10)).await;
}

#[tokio::test]
async fn test_delete_running_task_conflicts() {
    let fx = setup().await;
    let task = fx.use_case.create(create_dto("docs")).await.unwrap();

    assert!(matches!(
        fx.use_case.delete(task.id).await,
        Err(DiscoveryError::Conflict(_))
    ));

    fx.executor.gate.add_permits(1);
    wait_until_idle(&fx.scheduler, task.id).await;

    fx.use_case.delete(task.id).await.unwrap();
    assert!(matches!(
        fx.use_case.delete(task.id).await,
        Err(DiscoveryError::NotFound(_))
    ));
    assert!(matches!(
        fx.use_case.get(task.id).await,
        Err(DiscoveryError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_stop_signals_in_flight_run_and_start_relaunches() {
    let fx = setup().await;
    let task = fx.use_case.create(create_dto("docs")).await.unwrap();
    assert!(fx.scheduler.is_running(task.id));

    let stopped = fx.use_case.stop(task.id).await.unwrap();
    assert!(!stopped.is_active);
    wait_until_idle(&fx.scheduler, task.id).await;

    let status = fx.use_case.status(task.id).await.unwrap();
    assert_eq!(status.state, TaskRunState::Stopped);
    assert!(!status.is_running);

    let started = fx.use_case.start(task.id).await.unwrap();
    assert!(started.is_active);
    assert!(fx.scheduler.is_running(task.id));
    tokio::time::timeout(Duration::from_secs(5), async {
        while fx.executor.calls.load(Ordering::SeqCst) < 2 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();

    let status = fx.use_case.status(task.id).await.unwrap();
    assert_eq!(status.state, TaskRunState::Running);

    fx.executor.gate.add_permits(1);
    wait_until_idle(&fx.scheduler, task.id).await;
}

#[tokio::test]
async fn test_start_while_previous_run_drains_runs_again() {
    let fx = setup_with(HeldExecutor::draining()).await;
    let task = fx.use_case.create(create_dto("docs")).await.unwrap();

    fx.use_case.stop(task.id).await.unwrap();
    assert!(fx.scheduler.is_running(task.id));

    let started = fx.use_case.start(task.id).await.unwrap();
    assert!(started.is_active);
    assert_eq!(fx.executor.calls.load(Ordering::SeqCst), 1);

    // 上一次运行结束后立即开始新的运行
    fx.executor.gate.add_permits(1);
    tokio::time::timeout(Duration::from_secs(5), async {
        while fx.executor.calls.load(Ordering::SeqCst) < 2 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();
    assert!(fx.scheduler.is_running(task.id));

    fx.executor.gate.add_permits(1);
    wait_until_idle(&fx.scheduler, task.id).await;
    let stored = fx.use_case.get(task.id).await.unwrap();
    assert_eq!(stored.success_counts, 2);
    assert!(stored.is_active);
}

#[tokio::test]
async fn test_delete_holds_registration_and_releases_it() {
    let fx = setup().await;
    let task = fx.use_case.create(create_dto("docs")).await.unwrap();
    fx.executor.gate.add_permits(1);
    wait_until_idle(&fx.scheduler, task.id).await;

    let reservation = fx.scheduler.reserve(task.id).unwrap();
    assert!(matches!(
        fx.use_case.delete(task.id).await,
        Err(DiscoveryError::Conflict(_))
    ));
    drop(reservation);

    fx.use_case.delete(task.id).await.unwrap();
    assert!(!fx.scheduler.is_running(task.id));
    assert!(fx.scheduler.reserve(task.id).is_some());
}

#[tokio::test]
async fn test_update_changes_fields_and_detects_name_conflict() {
    let fx = setup().await;
    let first = fx.use_case.create(create_dto("first")).await.unwrap();
    fx.use_case.create(create_dto("second")).await.unwrap();

    let updated = fx
        .use_case
        .update(
            first.id,
            UpdateTaskRequestDto {
                depth: Some(4),
                execution_interval: Some(120),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.depth, 4);
    assert_eq!(updated.execution_interval, 120);
    assert_eq!(updated.task_name, "first");

    let conflict = fx
        .use_case
        .update(
            first.id,
            UpdateTaskRequestDto {
                task_name: Some("second".to_string()),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(conflict, Err(DiscoveryError::Conflict(_))));

    let unbounded = fx
        .use_case
        .update(
            first.id,
            UpdateTaskRequestDto {
                execution_interval: Some(i64::MAX),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(unbounded, Err(DiscoveryError::Configuration(_))));

    let missing = fx
        .use_case
        .update(Uuid::new_v4(), UpdateTaskRequestDto::default())
        .await;
    assert!(matches!(missing, Err(DiscoveryError::NotFound(_))));

    fx.scheduler.shutdown(Duration::from_millis(10)).await;
}

#[tokio::test]
async fn test_list_pages_tasks() {
    let fx = setup().await;
    for name in ["a", "b", "c"] {
        fx.use_case.create(create_dto(name)).await.unwrap();
    }

    let page = fx
        .use_case
        .list(&ListTasksQueryDto {
            skip: Some(1),
            limit: Some(1),
        })
        .await
        .unwrap();
    assert_eq!(page.len(), 1);

    let all = fx.use_case.list(&ListTasksQueryDto::default()).await.unwrap();
    assert_eq!(all.len(), 3);

    let too_large = fx
        .use_case
        .list(&ListTasksQueryDto {
            skip: None,
            limit: Some(1000),
        })
        .await;
    assert!(matches!(too_large, Err(DiscoveryError::Configuration(_))));

    fx.scheduler.shutdown(Duration::from_millis(10)).await;
}
