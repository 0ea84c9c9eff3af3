// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use url::{Origin, Url};

use crate::domain::models::signal::{CandidateUrl, DiscoveryChannel, SignalBundle};
use crate::utils::url_utils::normalize_url;

static HREF_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"href=["']([^"']+)["']"#).expect("valid href pattern"));
static SRC_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"src=["']([^"']+)["']"#).expect("valid src pattern"));
static ABSOLUTE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(https?://[^\s<>"']+)"#).expect("valid absolute url pattern"));
static ROOT_RELATIVE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?:^|[\s"'(=])(/[a-zA-Z0-9\-_/]+(?:\?[^\s<>"']*)?)"#)
        .expect("valid root relative pattern")
});

/// 发现信号聚合器
///
/// 将单个页面多个通道上报的链接合并为去重后的候选集合：
/// - 相对地址先按页面地址解析，片段和 `utm_*` 参数被去除
/// - 同一地址被多个通道上报时，保留置信度最高的通道
/// - 非同源地址在返回前丢弃
///
/// 输出按通道置信度降序，同一置信度内保持首次出现的顺序。
#[derive(Debug, Clone, Default)]
pub struct DiscoveryAggregator;

impl DiscoveryAggregator {
    pub fn new() -> Self {
        Self
    }

    /// 聚合单个页面的信号
    ///
    /// # 参数
    ///
    /// * `page_url` - 被访问页面的地址，用于解析相对链接
    /// * `origin` - 本次爬取允许的唯一站点源
    /// * `bundle` - 自动化服务返回的信号包
    ///
    /// # 返回值
    ///
    /// 去重后的同源候选 URL 列表
    pub fn aggregate(
        &self,
        page_url: &Url,
        origin: &Origin,
        bundle: &SignalBundle,
    ) -> Vec<CandidateUrl> {
        let mut merged: Vec<CandidateUrl> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        let text_links = extract_text_links(&bundle.page_text);
        let signals = bundle
            .list_channels()
            .into_iter()
            .flat_map(|(channel, urls)| urls.iter().map(move |raw| (channel, raw.as_str())))
            .chain(
                text_links
                    .iter()
                    .map(|raw| (DiscoveryChannel::TextScan, raw.as_str())),
            );

        for (channel, raw) in signals {
            let Some(url) = normalize_url(page_url, raw) else {
                continue;
            };
            if url.origin() != *origin {
                continue;
            }

            let key = url.to_string();
            match index.get(&key) {
                Some(&position) => {
                    if channel.confidence() > merged[position].confidence() {
                        merged[position].channel = channel;
                    }
                }
                None => {
                    index.insert(key.clone(), merged.len());
                    merged.push(CandidateUrl {
                        url: key,
                        channel,
                        source_page: page_url.to_string(),
                    });
                }
            }
        }

        merged.sort_by(|a, b| b.confidence().cmp(&a.confidence()));
        merged
    }
}

/// 从页面文本中提取链接
///
/// 匹配 `href=`/`src=` 属性、绝对 http(s) 地址以及以 `/` 开头的站内路径
pub fn extract_text_links(text: &str) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }

    let mut links = Vec::new();
    for pattern in [&*HREF_PATTERN, &*SRC_PATTERN, &*ABSOLUTE_PATTERN, &*ROOT_RELATIVE_PATTERN] {
        for captures in pattern.captures_iter(text) {
            if let Some(link) = captures.get(1) {
                links.push(link.as_str().to_string());
            }
        }
    }
    links
}
