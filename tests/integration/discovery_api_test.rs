// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::create_test_app;
use axum::http::StatusCode;
use serde_json::{json, Value};

/// 测试一次性发现返回运行汇总并入库
#[tokio::test]
async fn test_crawl_once_returns_report() {
    let app = create_test_app().await;
    app.mount_abcd_site().await;

    let response = app
        .server
        .post("/v1/discovery/crawl")
        .json(&json!({
            "base_url": "https://site.test/a",
            "max_depth": 1,
            "source_type": "sitemap",
            "tags": ["one-off"]
        }))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let report: Value = response.json();
    assert_eq!(report["visited_count"], 3);
    assert_eq!(report["new_urls"], 3);
    assert_eq!(report["page_failures"], 0);
    assert_eq!(report["accepted"], 3);
    assert_eq!(report["stopped"], false);

    let mut discovered: Vec<String> = report["discovered_urls"]
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u.as_str().unwrap().to_string())
        .collect();
    discovered.sort();
    assert_eq!(
        discovered,
        vec![
            "https://site.test/a".to_string(),
            "https://site.test/b".to_string(),
            "https://site.test/c".to_string(),
        ]
    );
}

/// 测试审核拒绝的链接以 garbage 入库且不被访问
#[tokio::test]
async fn test_crawl_once_records_rejected_links_as_garbage() {
    let app = create_test_app().await;
    app.mount_page("https://site.test/", &["/spam-offer", "/about"])
        .await;
    app.mount_page("https://site.test/about", &[]).await;

    let report: Value = app
        .server
        .post("/v1/discovery/crawl")
        .json(&json!({ "base_url": "https://site.test/", "max_depth": 2 }))
        .await
        .json();
    assert_eq!(report["rejected"], 1);
    assert_eq!(report["visited_count"], 2);

    let urls: Vec<Value> = app
        .server
        .get("/v1/discovery/urls")
        .add_query_param("source_type", "sitemap")
        .await
        .json();
    let spam = urls
        .iter()
        .find(|u| u["url"] == "https://site.test/spam-offer")
        .unwrap();
    assert_eq!(spam["discovery_type"], "garbage");
    assert_eq!(spam["audit_status"], "rejected");
}

/// 测试非法请求返回 400
#[tokio::test]
async fn test_crawl_once_rejects_invalid_request() {
    let app = create_test_app().await;

    let response = app
        .server
        .post("/v1/discovery/crawl")
        .json(&json!({ "base_url": "not a url" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    let response = app
        .server
        .post("/v1/discovery/crawl")
        .json(&json!({ "base_url": "https://site.test/", "max_depth": 42 }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert!(body["error"].is_string());
}

/// 测试按来源标签与最近窗口查询
#[tokio::test]
async fn test_list_urls_filters_by_source_type_and_window() {
    let app = create_test_app().await;
    app.mount_abcd_site().await;

    app.server
        .post("/v1/discovery/crawl")
        .json(&json!({
            "base_url": "https://site.test/a",
            "max_depth": 1,
            "source_type": "key_page"
        }))
        .await;

    let key_pages: Vec<Value> = app
        .server
        .get("/v1/discovery/urls")
        .add_query_param("source_type", "key_page")
        .await
        .json();
    assert_eq!(key_pages.len(), 3);

    let recent: Vec<Value> = app
        .server
        .get("/v1/discovery/urls")
        .add_query_param("source_type", "key_page")
        .add_query_param("recent", true)
        .await
        .json();
    assert_eq!(recent.len(), 3);

    let sitemap: Vec<Value> = app
        .server
        .get("/v1/discovery/urls")
        .add_query_param("source_type", "sitemap")
        .await
        .json();
    assert!(sitemap.is_empty());

    let response = app
        .server
        .get("/v1/discovery/urls")
        .add_query_param("source_type", "key_page")
        .add_query_param("recent_minutes", 0)
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}
