// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::time::Duration;

use crate::domain::services::url_classifier::{
    UrlClassifier, DEFAULT_ASSET_SUFFIXES, DEFAULT_MEDIA_SUFFIXES,
};
use crate::utils::retry_policy::RetryPolicy;

/// 应用程序配置设置
///
/// 包含数据库、服务器、外部协作服务、爬取边界、调度和指标等所有配置项
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// 数据库配置
    pub database: DatabaseSettings,
    /// 服务器配置
    pub server: ServerSettings,
    /// 浏览器自动化服务配置
    pub automation: AutomationSettings,
    /// 审核服务配置
    pub audit: AuditSettings,
    /// 爬取默认边界
    pub crawler: CrawlerSettings,
    /// URL 分类规则
    pub classifier: ClassifierSettings,
    /// 调度器配置
    pub scheduler: SchedulerSettings,
    /// 指标导出配置
    pub metrics: MetricsSettings,
}

/// 数据库配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    /// 数据库连接URL
    pub url: String,
    /// 最大连接数
    pub max_connections: Option<u32>,
    /// 最小连接数
    pub min_connections: Option<u32>,
    /// 连接超时时间（秒）
    pub connect_timeout: Option<u64>,
    /// 空闲连接超时时间（秒）
    pub idle_timeout: Option<u64>,
}

/// 服务器配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    /// 服务器监听主机地址
    pub host: String,
    /// 服务器监听端口
    pub port: u16,
}

/// 浏览器自动化服务配置
#[derive(Debug, Clone, Deserialize)]
pub struct AutomationSettings {
    /// 服务基础地址，渲染接口为 `{service_url}/render`
    pub service_url: String,
    /// 单页访问超时（秒）
    pub page_timeout_secs: u64,
    /// 单次运行内并发访问的页面数
    pub concurrency: usize,
    /// 瞬时错误的最大重试次数
    pub max_retries: u32,
    /// 首次重试退避（毫秒）
    pub initial_backoff_ms: u64,
}

impl AutomationSettings {
    pub fn page_timeout(&self) -> Duration {
        Duration::from_secs(self.page_timeout_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::with_limits(
            self.max_retries,
            Duration::from_millis(self.initial_backoff_ms),
        )
    }
}

/// 审核服务配置
#[derive(Debug, Clone, Deserialize)]
pub struct AuditSettings {
    /// 审核接口地址
    pub url: String,
    /// 每批提交的 URL 数量上限
    pub batch_size: usize,
    /// 单次请求超时（秒）
    pub timeout_secs: u64,
    /// 瞬时错误的最大重试次数
    pub max_retries: u32,
    /// 首次重试退避（毫秒）
    pub initial_backoff_ms: u64,
    /// 每次运行开始时重新提交的待审核记录上限
    pub resubmit_limit: u64,
}

impl AuditSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::with_limits(
            self.max_retries,
            Duration::from_millis(self.initial_backoff_ms),
        )
    }
}

/// 爬取默认边界，任务或请求未指定时使用
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerSettings {
    pub default_max_depth: u32,
    pub default_max_pages: usize,
    pub default_exclude_suffixes: Vec<String>,
}

/// URL 分类规则
#[derive(Debug, Clone, Deserialize)]
pub struct ClassifierSettings {
    /// 资源类后缀（脚本、样式、字体等）
    pub asset_suffixes: Vec<String>,
    /// 媒体类后缀（图片、音视频、文档等）
    pub media_suffixes: Vec<String>,
}

impl ClassifierSettings {
    /// 根据配置构建分类器
    pub fn build_classifier(&self) -> UrlClassifier {
        UrlClassifier::new(self.asset_suffixes.as_slice(), self.media_suffixes.as_slice())
    }
}

/// 调度器配置
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerSettings {
    /// 轮询间隔（秒）
    pub tick_interval_secs: u64,
    /// 停机时等待进行中运行结束的最长时间（秒）
    pub shutdown_grace_secs: u64,
}

/// 指标导出配置
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsSettings {
    /// 是否启用 Prometheus 导出
    pub enabled: bool,
    /// 导出监听地址
    pub listen_addr: String,
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 依次加载内置默认值、`config/default`、`config/{APP_ENVIRONMENT}` 和
    /// `DISCOVRS__` 前缀的环境变量，后者覆盖前者
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载的配置
    /// * `Err(ConfigError)` - 配置加载失败
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        let builder = Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("database.url", "sqlite::memory:")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 1)?
            .set_default("database.connect_timeout", 10)?
            .set_default("database.idle_timeout", 300)?
            .set_default("automation.service_url", "http://localhost:8000")?
            .set_default("automation.page_timeout_secs", 30)?
            .set_default("automation.concurrency", 4)?
            .set_default("automation.max_retries", 2)?
            .set_default("automation.initial_backoff_ms", 500)?
            .set_default("audit.url", "http://localhost:8001/audit")?
            .set_default("audit.batch_size", 50)?
            .set_default("audit.timeout_secs", 300)?
            .set_default("audit.max_retries", 2)?
            .set_default("audit.initial_backoff_ms", 1000)?
            .set_default("audit.resubmit_limit", 500)?
            .set_default("crawler.default_max_depth", 3)?
            .set_default("crawler.default_max_pages", 1000)?
            .set_default("crawler.default_exclude_suffixes", vec![".js", ".css"])?
            .set_default(
                "classifier.asset_suffixes",
                DEFAULT_ASSET_SUFFIXES.to_vec(),
            )?
            .set_default(
                "classifier.media_suffixes",
                DEFAULT_MEDIA_SUFFIXES.to_vec(),
            )?
            .set_default("scheduler.tick_interval_secs", 10)?
            .set_default("scheduler.shutdown_grace_secs", 30)?
            .set_default("metrics.enabled", true)?
            .set_default("metrics.listen_addr", "0.0.0.0:9000")?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(
                Environment::with_prefix("DISCOVRS")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("crawler.default_exclude_suffixes")
                    .with_list_parse_key("classifier.asset_suffixes")
                    .with_list_parse_key("classifier.media_suffixes")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }
}

#[cfg(test)]
#[path = "settings_test.rs"]
mod tests;
