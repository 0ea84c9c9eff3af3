// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::create_test_app;
use axum::http::StatusCode;
use serde_json::{json, Value};
use uuid::Uuid;

fn task_payload(name: &str) -> Value {
    json!({
        "task_name": name,
        "base_url": "https://site.test/a",
        "source_type": "key_page",
        "tags": ["campaign"],
        "depth": 1,
        "execution_interval": 3600
    })
}

/// 测试创建任务返回 201 并立即运行
#[tokio::test]
async fn test_create_task_returns_created() {
    let app = create_test_app().await;
    app.mount_abcd_site().await;

    let response = app
        .server
        .post("/v1/discovery-tasks")
        .json(&task_payload("docs"))
        .await;

    assert_eq!(response.status_code(), StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["task_name"], "docs");
    assert_eq!(body["is_active"], true);
    assert_eq!(body["source_type"], "key_page");

    let id: Uuid = body["id"].as_str().unwrap().parse().unwrap();
    app.wait_until_idle(id).await;

    let status: Value = app
        .server
        .get(&format!("/v1/discovery-tasks/{}/status", id))
        .await
        .json();
    assert_eq!(status["success_counts"], 1);
    assert_eq!(status["is_running"], false);
    assert_eq!(status["state"], "idle");
}

/// 测试重复名称返回 409
#[tokio::test]
async fn test_duplicate_task_name_conflicts() {
    let app = create_test_app().await;
    app.mount_abcd_site().await;

    let first = app
        .server
        .post("/v1/discovery-tasks")
        .json(&task_payload("docs"))
        .await;
    assert_eq!(first.status_code(), StatusCode::CREATED);

    let second = app
        .server
        .post("/v1/discovery-tasks")
        .json(&task_payload("docs"))
        .await;
    assert_eq!(second.status_code(), StatusCode::CONFLICT);
    let body: Value = second.json();
    assert!(body["error"].as_str().unwrap().contains("docs"));
}

/// 测试非法参数返回 400
#[tokio::test]
async fn test_invalid_task_is_rejected() {
    let app = create_test_app().await;

    let mut bad_depth = task_payload("deep");
    bad_depth["depth"] = json!(11);
    let response = app
        .server
        .post("/v1/discovery-tasks")
        .json(&bad_depth)
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    let mut bad_interval = task_payload("fast");
    bad_interval["execution_interval"] = json!(0);
    let response = app
        .server
        .post("/v1/discovery-tasks")
        .json(&bad_interval)
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    let mut bad_url = task_payload("mail");
    bad_url["base_url"] = json!("mailto:someone@site.test");
    let response = app
        .server
        .post("/v1/discovery-tasks")
        .json(&bad_url)
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    let list: Vec<Value> = app.server.get("/v1/discovery-tasks").await.json();
    assert!(list.is_empty());
}

/// 测试不存在的任务返回 404
#[tokio::test]
async fn test_missing_task_returns_not_found() {
    let app = create_test_app().await;
    let id = Uuid::new_v4();

    let response = app
        .server
        .get(&format!("/v1/discovery-tasks/{}", id))
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

    let response = app
        .server
        .post(&format!("/v1/discovery-tasks/{}/start", id))
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

    let response = app
        .server
        .delete(&format!("/v1/discovery-tasks/{}", id))
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

/// 测试运行中的任务不能删除，结束后可以删除
#[tokio::test]
async fn test_delete_running_task_conflicts() {
    let app = create_test_app().await;
    // 页面响应延迟，保证删除请求到达时运行仍在进行
    wiremock::Mock::given(wiremock::matchers::method("POST"))
        .and(wiremock::matchers::path("/render"))
        .respond_with(
            wiremock::ResponseTemplate::new(200)
                .set_body_json(json!({ "success": true }))
                .set_delay(std::time::Duration::from_millis(500)),
        )
        .mount(&app.automation)
        .await;

    let created: Value = app
        .server
        .post("/v1/discovery-tasks")
        .json(&task_payload("slow"))
        .await
        .json();
    let id: Uuid = created["id"].as_str().unwrap().parse().unwrap();

    let response = app
        .server
        .delete(&format!("/v1/discovery-tasks/{}", id))
        .await;
    assert_eq!(response.status_code(), StatusCode::CONFLICT);

    app.wait_until_idle(id).await;
    let response = app
        .server
        .delete(&format!("/v1/discovery-tasks/{}", id))
        .await;
    assert_eq!(response.status_code(), StatusCode::NO_CONTENT);
}

/// 测试停用与重新启用
#[tokio::test]
async fn test_stop_and_start_task() {
    let app = create_test_app().await;
    app.mount_abcd_site().await;

    let created: Value = app
        .server
        .post("/v1/discovery-tasks")
        .json(&task_payload("docs"))
        .await
        .json();
    let id: Uuid = created["id"].as_str().unwrap().parse().unwrap();
    app.wait_until_idle(id).await;

    let stopped: Value = app
        .server
        .post(&format!("/v1/discovery-tasks/{}/stop", id))
        .await
        .json();
    assert_eq!(stopped["is_active"], false);

    let status: Value = app
        .server
        .get(&format!("/v1/discovery-tasks/{}/status", id))
        .await
        .json();
    assert_eq!(status["state"], "stopped");

    let started = app
        .server
        .post(&format!("/v1/discovery-tasks/{}/start", id))
        .await;
    assert_eq!(started.status_code(), StatusCode::OK);
    let started: Value = started.json();
    assert_eq!(started["is_active"], true);

    app.wait_until_idle(id).await;
    let status: Value = app
        .server
        .get(&format!("/v1/discovery-tasks/{}/status", id))
        .await
        .json();
    assert_eq!(status["success_counts"], 2);
}

/// 测试部分更新与名称唯一性
#[tokio::test]
async fn test_update_task() {
    let app = create_test_app().await;
    app.mount_abcd_site().await;

    let first: Value = app
        .server
        .post("/v1/discovery-tasks")
        .json(&task_payload("first"))
        .await
        .json();
    app.server
        .post("/v1/discovery-tasks")
        .json(&task_payload("second"))
        .await;
    let id = first["id"].as_str().unwrap();

    let updated = app
        .server
        .put(&format!("/v1/discovery-tasks/{}", id))
        .json(&json!({ "execution_interval": 120, "tags": ["renamed"] }))
        .await;
    assert_eq!(updated.status_code(), StatusCode::OK);
    let updated: Value = updated.json();
    assert_eq!(updated["execution_interval"], 120);
    assert_eq!(updated["tags"], json!(["renamed"]));
    assert_eq!(updated["task_name"], "first");

    let conflict = app
        .server
        .put(&format!("/v1/discovery-tasks/{}", id))
        .json(&json!({ "task_name": "second" }))
        .await;
    assert_eq!(conflict.status_code(), StatusCode::CONFLICT);

    let list: Vec<Value> = app
        .server
        .get("/v1/discovery-tasks")
        .add_query_param("limit", 1)
        .await
        .json();
    assert_eq!(list.len(), 1);
}

#[tokio::test]
async fn test_health_and_version() {
    let app = create_test_app().await;

    let health = app.server.get("/health").await;
    assert_eq!(health.status_code(), StatusCode::OK);
    assert_eq!(health.text(), "OK");

    let version = app.server.get("/v1/version").await;
    assert_eq!(version.text(), env!("CARGO_PKG_VERSION"));
}
