// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use metrics::{describe_counter, describe_histogram, Unit};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::{info, warn};

/// 安装 Prometheus 导出器并登记发现流程的指标
///
/// 端口被占用时只记录警告，指标宏退化为空操作
///
/// # 参数
///
/// * `listen_addr` - 导出器监听地址，如 `0.0.0.0:9000`
///
/// # 返回值
///
/// * `Ok(())` - 地址合法（导出器可能因端口占用未启动）
/// * `Err(AddrParseError)` - 地址无法解析
pub fn init_metrics(listen_addr: &str) -> Result<(), std::net::AddrParseError> {
    let addr: SocketAddr = listen_addr.parse()?;

    if let Err(e) = PrometheusBuilder::new().with_http_listener(addr).install() {
        warn!(
            "Failed to install Prometheus recorder: {}. This might happen if the port is already in use.",
            e
        );
        return Ok(());
    }

    describe_metrics();
    info!("Metrics exporter listening on {}", addr);
    Ok(())
}

fn describe_metrics() {
    describe_counter!(
        "discovery_pages_visited_total",
        "Pages rendered successfully by the automation service"
    );
    describe_counter!(
        "discovery_page_failures_total",
        "Page visits that failed after retries"
    );
    describe_counter!(
        "discovery_audit_batches_failed_total",
        "Audit batches passed through as pending after retries"
    );
    describe_counter!(
        "discovery_urls_upserted_total",
        "URL observations written, labelled by is_new"
    );
    describe_counter!(
        "discovery_runs_total",
        "Finished discovery runs, labelled by result"
    );
    describe_histogram!(
        "discovery_run_duration_seconds",
        Unit::Seconds,
        "Wall time of a discovery run"
    );
}
