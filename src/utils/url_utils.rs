// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use url::{ParseError, Url};

/// 追踪参数前缀，规范化时移除
const TRACKING_PARAM_PREFIX: &str = "utm_";

/// 将可能为相对路径的URL转换为绝对路径URL
pub fn resolve_url(base_url: &Url, path: &str) -> Result<Url, ParseError> {
    base_url.join(path)
}

/// 规范化候选链接
///
/// 相对地址基于 `base_url` 解析，去掉片段和 `utm_*` 追踪参数。
/// 空链接、纯片段链接以及非 http(s) 地址返回 `None`。
pub fn normalize_url(base_url: &Url, raw: &str) -> Option<Url> {
    let raw = raw.trim();
    if raw.is_empty() || raw.starts_with('#') {
        return None;
    }

    let mut url = resolve_url(base_url, raw).ok()?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return None;
    }

    url.set_fragment(None);
    strip_tracking_params(&mut url);
    Some(url)
}

fn strip_tracking_params(url: &mut Url) {
    if url.query().is_none() {
        return;
    }

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !key.starts_with(TRACKING_PARAM_PREFIX))
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    if kept.is_empty() {
        url.set_query(None);
    } else if kept.len() != url.query_pairs().count() {
        url.query_pairs_mut().clear().extend_pairs(kept);
    }
}

/// 站点源的字符串形式，形如 `https://example.com:8443`
pub fn origin_key(url: &Url) -> String {
    url.origin().ascii_serialization()
}

/// URL 的路径部分，没有路径时为 `/`
pub fn url_path(url: &str) -> String {
    match Url::parse(url) {
        Ok(parsed) if !parsed.path().is_empty() => parsed.path().to_string(),
        _ => "/".to_string(),
    }
}
