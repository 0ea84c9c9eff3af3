// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{Duration, Utc};
use discovrs::domain::models::discovered_url::{
    AuditStatus, DiscoveryType, SourceType, UrlObservation,
};
use discovrs::domain::models::signal::DiscoveryChannel;
use discovrs::domain::repositories::discovered_url_repository::DiscoveredUrlRepository;
use discovrs::infrastructure::repositories::discovered_url_repo_impl::DiscoveredUrlRepositoryImpl;
use discovrs::utils::errors::RepositoryError;
use migration::{Migrator, MigratorTrait};
use sea_orm::Database;
use std::sync::Arc;
use uuid::Uuid;

async fn setup_repo() -> DiscoveredUrlRepositoryImpl {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    let db = Arc::new(db);
    Migrator::up(db.as_ref(), None).await.unwrap();
    DiscoveredUrlRepositoryImpl::new(db)
}

fn observation(url: &str, observed_at: chrono::DateTime<Utc>) -> UrlObservation {
    UrlObservation {
        origin: "https://example.com".to_string(),
        url: url.to_string(),
        url_path: url.trim_start_matches("https://example.com").to_string(),
        discovery_type: DiscoveryType::Normal,
        source_type: SourceType::Sitemap,
        tags: vec!["first".to_string()],
        depth: 1,
        discovered_from: Some("https://example.com/".to_string()),
        discovery_channel: DiscoveryChannel::DomAnchor,
        audit_status: AuditStatus::Pending,
        observed_at,
    }
}

/// 两次写入同一键只产生一条记录，first_seen 取首次，last_seen 取后一次
#[tokio::test]
async fn test_upsert_is_idempotent() {
    let repo = setup_repo().await;
    let t0 = Utc::now() - Duration::minutes(10);
    let t1 = Utc::now();

    let first = repo
        .upsert(&observation("https://example.com/about", t0))
        .await
        .unwrap();
    assert!(first.is_new);

    let mut again = observation("https://example.com/about", t1);
    again.tags = vec!["second".to_string()];
    again.audit_status = AuditStatus::Accepted;
    again.depth = 3;
    let second = repo.upsert(&again).await.unwrap();
    assert!(!second.is_new);

    let records = repo.find_by_origin("https://example.com").await.unwrap();
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.first_seen_at.timestamp(), t0.timestamp());
    assert_eq!(record.last_seen_at.timestamp(), t1.timestamp());
    assert_eq!(record.tags, vec!["second".to_string()]);
    assert_eq!(record.audit_status, AuditStatus::Accepted);
    // 首次发现时的深度与来源页面保持不变
    assert_eq!(record.depth, 1);
}

/// 较旧的观察不会让 last_seen 回退
#[tokio::test]
async fn test_stale_observation_does_not_rewind_last_seen() {
    let repo = setup_repo().await;
    let newer = Utc::now();
    let older = newer - Duration::hours(1);

    repo.upsert(&observation("https://example.com/a", newer))
        .await
        .unwrap();
    let mut stale = observation("https://example.com/a", older);
    stale.audit_status = AuditStatus::Rejected;
    let outcome = repo.upsert(&stale).await.unwrap();
    assert!(!outcome.is_new);

    let record = repo
        .find_by_origin_and_url("https://example.com", "https://example.com/a")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.last_seen_at.timestamp(), newer.timestamp());
    assert_eq!(record.audit_status, AuditStatus::Pending);
}

#[tokio::test]
async fn test_recent_window_by_source_type() {
    let repo = setup_repo().await;
    let now = Utc::now();

    repo.upsert(&observation("https://example.com/old", now - Duration::hours(2)))
        .await
        .unwrap();
    repo.upsert(&observation("https://example.com/new", now))
        .await
        .unwrap();
    let mut key_page = observation("https://example.com/key", now);
    key_page.source_type = SourceType::KeyPage;
    repo.upsert(&key_page).await.unwrap();

    let all = repo.find_by_source_type(SourceType::Sitemap).await.unwrap();
    assert_eq!(all.len(), 2);

    let recent = repo
        .find_recent_by_source_type(SourceType::Sitemap, now - Duration::minutes(5))
        .await
        .unwrap();
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].url, "https://example.com/new");
}

#[tokio::test]
async fn test_pending_audit_and_status_update() {
    let repo = setup_repo().await;
    let now = Utc::now();

    repo.upsert(&observation("https://example.com/p1", now - Duration::minutes(2)))
        .await
        .unwrap();
    repo.upsert(&observation("https://example.com/p2", now))
        .await
        .unwrap();
    let mut media = observation("https://example.com/logo.png", now);
    media.discovery_type = DiscoveryType::Media;
    media.audit_status = AuditStatus::NotRequired;
    repo.upsert(&media).await.unwrap();

    let pending = repo
        .find_pending_audit("https://example.com", 10)
        .await
        .unwrap();
    assert_eq!(
        pending.iter().map(|r| r.url.as_str()).collect::<Vec<_>>(),
        vec!["https://example.com/p1", "https://example.com/p2"]
    );

    repo.update_audit_status(pending[0].id, AuditStatus::Rejected, DiscoveryType::Garbage)
        .await
        .unwrap();
    let remaining = repo
        .find_pending_audit("https://example.com", 10)
        .await
        .unwrap();
    assert_eq!(remaining.len(), 1);

    let rejected = repo
        .find_by_origin_and_url("https://example.com", "https://example.com/p1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(rejected.discovery_type, DiscoveryType::Garbage);

    let missing = repo
        .update_audit_status(Uuid::new_v4(), AuditStatus::Accepted, DiscoveryType::Normal)
        .await;
    assert!(matches!(missing, Err(RepositoryError::NotFound)));
}
