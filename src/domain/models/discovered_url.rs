// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::domain::models::signal::DiscoveryChannel;

/// 发现的 URL 记录
///
/// 以 (origin, url) 为唯一标识。`first_seen_at` 只在首次写入时设置，
/// `last_seen_at` 在每次重新观察到时刷新，且不会回退。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveredUrl {
    /// 记录唯一标识符
    pub id: Uuid,
    /// 所属站点源，形如 `https://example.com`
    pub origin: String,
    /// 去除片段后的绝对 URL
    pub url: String,
    /// URL 路径部分
    pub url_path: String,
    /// URL 分类
    pub discovery_type: DiscoveryType,
    /// 业务来源标签
    pub source_type: SourceType,
    /// 自由标签
    pub tags: Vec<String>,
    /// 首次发现时的 BFS 深度
    pub depth: i32,
    /// 发现该 URL 的页面，入口 URL 为空
    pub discovered_from: Option<String>,
    /// 发现通道
    pub discovery_channel: DiscoveryChannel,
    /// 审核状态
    pub audit_status: AuditStatus,
    /// 首次发现时间
    pub first_seen_at: DateTime<FixedOffset>,
    /// 最近一次发现时间
    pub last_seen_at: DateTime<FixedOffset>,
}

/// URL 分类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DiscoveryType {
    /// 普通页面，可继续展开
    #[default]
    Normal,
    /// 图片、音视频、文档等媒体资源
    Media,
    /// 脚本、样式、字体等静态资源
    Asset,
    /// 无效链接或审核拒绝的链接
    Garbage,
}

impl fmt::Display for DiscoveryType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DiscoveryType::Normal => write!(f, "normal"),
            DiscoveryType::Media => write!(f, "media"),
            DiscoveryType::Asset => write!(f, "asset"),
            DiscoveryType::Garbage => write!(f, "garbage"),
        }
    }
}

impl FromStr for DiscoveryType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "normal" => Ok(DiscoveryType::Normal),
            "media" => Ok(DiscoveryType::Media),
            "asset" => Ok(DiscoveryType::Asset),
            "garbage" => Ok(DiscoveryType::Garbage),
            _ => Err(()),
        }
    }
}

/// 业务来源标签
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    /// 全站地图类发现
    #[default]
    Sitemap,
    /// 关键页面类发现
    KeyPage,
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SourceType::Sitemap => write!(f, "sitemap"),
            SourceType::KeyPage => write!(f, "key_page"),
        }
    }
}

impl FromStr for SourceType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sitemap" => Ok(SourceType::Sitemap),
            "key_page" => Ok(SourceType::KeyPage),
            _ => Err(()),
        }
    }
}

/// 审核状态
///
/// NotRequired → 非 normal 分类不送审；
/// Pending → 审核服务不可用或未给出结论，下次运行时重新提交；
/// Accepted / Rejected → 审核结论
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AuditStatus {
    #[default]
    NotRequired,
    Pending,
    Accepted,
    Rejected,
}

impl fmt::Display for AuditStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AuditStatus::NotRequired => write!(f, "not_required"),
            AuditStatus::Pending => write!(f, "pending"),
            AuditStatus::Accepted => write!(f, "accepted"),
            AuditStatus::Rejected => write!(f, "rejected"),
        }
    }
}

impl FromStr for AuditStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not_required" => Ok(AuditStatus::NotRequired),
            "pending" => Ok(AuditStatus::Pending),
            "accepted" => Ok(AuditStatus::Accepted),
            "rejected" => Ok(AuditStatus::Rejected),
            _ => Err(()),
        }
    }
}

/// 一次 URL 观察
///
/// upsert 的输入：键为 (origin, url)，其余字段在记录已存在时用于刷新
#[derive(Debug, Clone)]
pub struct UrlObservation {
    pub origin: String,
    pub url: String,
    pub url_path: String,
    pub discovery_type: DiscoveryType,
    pub source_type: SourceType,
    pub tags: Vec<String>,
    pub depth: i32,
    pub discovered_from: Option<String>,
    pub discovery_channel: DiscoveryChannel,
    pub audit_status: AuditStatus,
    /// 观察时间
    pub observed_at: DateTime<Utc>,
}

/// upsert 结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpsertOutcome {
    /// 是否为首次写入
    pub is_new: bool,
}
