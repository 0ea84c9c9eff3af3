// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::create_test_app;
use discovrs::domain::models::discovered_url::AuditStatus;
use discovrs::domain::models::signal::DiscoveryChannel;
use discovrs::domain::repositories::discovered_url_repository::DiscoveredUrlRepository;
use discovrs::domain::repositories::discovery_task_repository::DiscoveryTaskRepository;
use serde_json::{json, Value};
use uuid::Uuid;

/// 站点 A→B、A→C、B→D，深度上限 1：A、B、C 入库，D 不入库，成功次数加一
#[tokio::test]
async fn test_scheduled_task_discovers_within_depth_bound() {
    let app = create_test_app().await;
    app.mount_abcd_site().await;

    let created: Value = app
        .server
        .post("/v1/discovery-tasks")
        .json(&json!({
            "task_name": "abcd",
            "base_url": "https://site.test/a",
            "depth": 1,
            "execution_interval": 600
        }))
        .await
        .json();
    let id: Uuid = created["id"].as_str().unwrap().parse().unwrap();
    app.wait_until_idle(id).await;

    let mut urls: Vec<String> = app
        .url_repo
        .find_by_origin("https://site.test")
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.url)
        .collect();
    urls.sort();
    assert_eq!(
        urls,
        vec![
            "https://site.test/a".to_string(),
            "https://site.test/b".to_string(),
            "https://site.test/c".to_string(),
        ]
    );

    let seed = app
        .url_repo
        .find_by_origin_and_url("https://site.test", "https://site.test/a")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(seed.depth, 0);
    assert_eq!(seed.discovery_channel, DiscoveryChannel::Seed);
    assert_eq!(seed.audit_status, AuditStatus::Accepted);

    let b = app
        .url_repo
        .find_by_origin_and_url("https://site.test", "https://site.test/b")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(b.depth, 1);
    assert_eq!(b.discovered_from.as_deref(), Some("https://site.test/a"));

    let task = app.task_repo.find_by_id(id).await.unwrap().unwrap();
    assert_eq!(task.success_counts, 1);
    assert_eq!(task.fail_counts, 0);
    assert!(task.last_execution_time.is_some());
    let next = task.next_execution_time.unwrap();
    let started = task.last_execution_time.unwrap();
    assert!(next - started >= chrono::Duration::seconds(600));
}

/// 第二次运行不会产生重复记录，只刷新 last_seen_at
#[tokio::test]
async fn test_restart_keeps_records_unique() {
    let app = create_test_app().await;
    app.mount_abcd_site().await;

    let created: Value = app
        .server
        .post("/v1/discovery-tasks")
        .json(&json!({
            "task_name": "abcd",
            "base_url": "https://site.test/a",
            "depth": 2,
            "execution_interval": 600
        }))
        .await
        .json();
    let id: Uuid = created["id"].as_str().unwrap().parse().unwrap();
    app.wait_until_idle(id).await;

    let first_a = app
        .url_repo
        .find_by_origin_and_url("https://site.test", "https://site.test/a")
        .await
        .unwrap()
        .unwrap();

    app.server
        .post(&format!("/v1/discovery-tasks/{}/start", id))
        .await;
    app.wait_until_idle(id).await;

    let records = app.url_repo.find_by_origin("https://site.test").await.unwrap();
    assert_eq!(records.len(), 4);

    let second_a = app
        .url_repo
        .find_by_origin_and_url("https://site.test", "https://site.test/a")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(second_a.id, first_a.id);
    assert_eq!(second_a.first_seen_at, first_a.first_seen_at);
    assert!(second_a.last_seen_at >= first_a.last_seen_at);

    let task = app.task_repo.find_by_id(id).await.unwrap().unwrap();
    assert_eq!(task.success_counts, 2);
}
