// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 发现通道
///
/// 标识候选 URL 的来源。同一 URL 被多个通道报告时，保留置信度最高的通道。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DiscoveryChannel {
    /// 爬取入口 URL
    Seed,
    /// 页面 DOM 中的 `<a href>`
    #[default]
    DomAnchor,
    /// 单页应用的路由跳转事件
    SpaNavigation,
    /// 页面发出的网络请求
    NetworkCapture,
    /// 重定向目标
    Redirect,
    /// Performance API 记录的资源
    PerformanceResource,
    /// 交互（点击、滚动）后新出现的链接
    PostInteraction,
    /// 页面文本中的正则匹配
    TextScan,
}

impl DiscoveryChannel {
    /// 通道置信度，数值越大越可信
    pub fn confidence(&self) -> u8 {
        match self {
            DiscoveryChannel::Seed => 8,
            DiscoveryChannel::DomAnchor => 7,
            DiscoveryChannel::SpaNavigation => 6,
            DiscoveryChannel::NetworkCapture => 5,
            DiscoveryChannel::Redirect => 4,
            DiscoveryChannel::PerformanceResource => 3,
            DiscoveryChannel::PostInteraction => 2,
            DiscoveryChannel::TextScan => 1,
        }
    }
}

impl fmt::Display for DiscoveryChannel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DiscoveryChannel::Seed => write!(f, "seed"),
            DiscoveryChannel::DomAnchor => write!(f, "dom_anchor"),
            DiscoveryChannel::SpaNavigation => write!(f, "spa_navigation"),
            DiscoveryChannel::NetworkCapture => write!(f, "network_capture"),
            DiscoveryChannel::Redirect => write!(f, "redirect"),
            DiscoveryChannel::PerformanceResource => write!(f, "performance_resource"),
            DiscoveryChannel::PostInteraction => write!(f, "post_interaction"),
            DiscoveryChannel::TextScan => write!(f, "text_scan"),
        }
    }
}

impl FromStr for DiscoveryChannel {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "seed" => Ok(DiscoveryChannel::Seed),
            "dom_anchor" => Ok(DiscoveryChannel::DomAnchor),
            "spa_navigation" => Ok(DiscoveryChannel::SpaNavigation),
            "network_capture" => Ok(DiscoveryChannel::NetworkCapture),
            "redirect" => Ok(DiscoveryChannel::Redirect),
            "performance_resource" => Ok(DiscoveryChannel::PerformanceResource),
            "post_interaction" => Ok(DiscoveryChannel::PostInteraction),
            "text_scan" => Ok(DiscoveryChannel::TextScan),
            _ => Err(()),
        }
    }
}

/// 页面信号包
///
/// 自动化服务对单个页面的访问结果。形状固定，缺失的通道按空处理。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalBundle {
    /// 页面是否成功渲染
    pub success: bool,
    /// 渲染失败原因
    pub error: Option<String>,
    pub anchors: Vec<String>,
    pub navigation_events: Vec<String>,
    pub network_requests: Vec<String>,
    pub redirects: Vec<String>,
    pub performance_resources: Vec<String>,
    pub post_interaction_links: Vec<String>,
    /// 页面可见文本（或原始 HTML），用于正则扫描
    pub page_text: String,
}

impl Default for SignalBundle {
    fn default() -> Self {
        Self {
            success: true,
            error: None,
            anchors: Vec::new(),
            navigation_events: Vec::new(),
            network_requests: Vec::new(),
            redirects: Vec::new(),
            performance_resources: Vec::new(),
            post_interaction_links: Vec::new(),
            page_text: String::new(),
        }
    }
}

impl SignalBundle {
    /// 列表型通道，按置信度从高到低排列
    pub fn list_channels(&self) -> [(DiscoveryChannel, &[String]); 6] {
        [
            (DiscoveryChannel::DomAnchor, self.anchors.as_slice()),
            (DiscoveryChannel::SpaNavigation, self.navigation_events.as_slice()),
            (DiscoveryChannel::NetworkCapture, self.network_requests.as_slice()),
            (DiscoveryChannel::Redirect, self.redirects.as_slice()),
            (
                DiscoveryChannel::PerformanceResource,
                self.performance_resources.as_slice(),
            ),
            (
                DiscoveryChannel::PostInteraction,
                self.post_interaction_links.as_slice(),
            ),
        ]
    }
}

/// 候选 URL
///
/// 聚合后的单个发现结果，`url` 已是去除片段的绝对地址
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CandidateUrl {
    pub url: String,
    pub channel: DiscoveryChannel,
    /// 发现该 URL 的页面
    pub source_page: String,
}

impl CandidateUrl {
    pub fn confidence(&self) -> u8 {
        self.channel.confidence()
    }
}
