// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use once_cell::sync::Lazy;
use url::Url;

use crate::domain::models::discovered_url::DiscoveryType;

/// 默认的资源类后缀
pub const DEFAULT_ASSET_SUFFIXES: &[&str] = &[
    ".js", ".mjs", ".css", ".woff", ".woff2", ".ttf", ".eot", ".otf", ".map",
];

/// 默认的媒体类后缀
pub const DEFAULT_MEDIA_SUFFIXES: &[&str] = &[
    ".png", ".jpg", ".jpeg", ".gif", ".webp", ".svg", ".ico", ".bmp", ".avif", ".mp4", ".webm",
    ".mp3", ".wav", ".ogg", ".pdf", ".zip",
];

static DEFAULT_CLASSIFIER: Lazy<UrlClassifier> = Lazy::new(UrlClassifier::default);

/// URL 分类器
///
/// 纯函数式的规则分类，按顺序匹配，首个命中的规则生效：
/// 1. 非 http(s) 协议 → garbage
/// 2. 最后一段路径的扩展名属于资源类 → asset
/// 3. 扩展名属于媒体类 → media
/// 4. 其他 → normal
///
/// 相对地址按路径分类。扩展名比较忽略大小写、查询串和片段。
#[derive(Debug, Clone)]
pub struct UrlClassifier {
    asset_suffixes: Vec<String>,
    media_suffixes: Vec<String>,
}

impl Default for UrlClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_ASSET_SUFFIXES, DEFAULT_MEDIA_SUFFIXES)
    }
}

impl UrlClassifier {
    /// 使用给定的后缀集合创建分类器
    ///
    /// 后缀统一转为小写并补齐前导 `.`
    pub fn new<A: AsRef<str>, M: AsRef<str>>(asset_suffixes: &[A], media_suffixes: &[M]) -> Self {
        Self {
            asset_suffixes: asset_suffixes.iter().filter_map(normalize_suffix).collect(),
            media_suffixes: media_suffixes.iter().filter_map(normalize_suffix).collect(),
        }
    }

    /// 对原始 URL 字符串分类
    pub fn classify(&self, raw: &str) -> DiscoveryType {
        let raw = raw.trim();
        if raw.is_empty() {
            return DiscoveryType::Garbage;
        }

        if let Some(scheme) = scheme_of(raw) {
            if scheme != "http" && scheme != "https" {
                return DiscoveryType::Garbage;
            }
        }

        match extension_of(&path_of(raw)) {
            Some(ext) if self.asset_suffixes.contains(&ext) => DiscoveryType::Asset,
            Some(ext) if self.media_suffixes.contains(&ext) => DiscoveryType::Media,
            _ => DiscoveryType::Normal,
        }
    }
}

/// 使用默认规则分类
pub fn classify(raw: &str) -> DiscoveryType {
    DEFAULT_CLASSIFIER.classify(raw)
}

/// 路径是否以排除后缀之一结尾（忽略大小写）
pub fn is_excluded<S: AsRef<str>>(raw: &str, exclude_suffixes: &[S]) -> bool {
    if exclude_suffixes.is_empty() {
        return false;
    }
    let path = path_of(raw.trim()).to_ascii_lowercase();
    exclude_suffixes.iter().any(|suffix| {
        let suffix = suffix.as_ref().trim();
        !suffix.is_empty() && path.ends_with(&suffix.to_ascii_lowercase())
    })
}

fn normalize_suffix<S: AsRef<str>>(suffix: &S) -> Option<String> {
    let suffix = suffix.as_ref().trim().to_ascii_lowercase();
    if suffix.is_empty() || suffix == "." {
        None
    } else if suffix.starts_with('.') {
        Some(suffix)
    } else {
        Some(format!(".{}", suffix))
    }
}

/// RFC 3986 scheme：字母开头，后接字母、数字、`+`、`-`、`.`，以 `:` 结束
fn scheme_of(raw: &str) -> Option<String> {
    let (candidate, _) = raw.split_once(':')?;
    let mut chars = candidate.chars();
    let first = chars.next()?;
    if !first.is_ascii_alphabetic() {
        return None;
    }
    if chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.')) {
        Some(candidate.to_ascii_lowercase())
    } else {
        None
    }
}

fn path_of(raw: &str) -> String {
    if let Ok(url) = Url::parse(raw) {
        if url.has_host() {
            return url.path().to_string();
        }
    }
    let end = raw.find(['?', '#']).unwrap_or(raw.len());
    raw[..end].to_string()
}

fn extension_of(path: &str) -> Option<String> {
    let segment = path.rsplit('/').next()?;
    let (stem, ext) = segment.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(format!(".{}", ext.to_ascii_lowercase()))
}
