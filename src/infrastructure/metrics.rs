// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::MetricsSettings;
use metrics::{describe_counter, describe_histogram, Unit};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::{info, warn};

/// 派发的活动执行数
pub const CAMPAIGN_RUNS_DISPATCHED: &str = "campaign_runs_dispatched_total";
/// 结束的活动执行数，按 outcome 标签区分
pub const CAMPAIGN_RUNS: &str = "campaign_runs_total";
pub const CAMPAIGN_EMAILS_SENT: &str = "campaign_emails_sent_total";
pub const CAMPAIGN_EMAILS_FAILED: &str = "campaign_emails_failed_total";
pub const CAMPAIGN_RUN_DURATION: &str = "campaign_run_duration_seconds";

/// 安装 Prometheus 导出器并注册指标说明
pub fn init_metrics(settings: &MetricsSettings) {
    if !settings.enabled {
        info!("Metrics exporter disabled");
        return;
    }

    let addr: SocketAddr = match settings.listen_addr.parse() {
        Ok(addr) => addr,
        Err(e) => {
            warn!(
                "Invalid metrics listen address '{}': {}",
                settings.listen_addr, e
            );
            return;
        }
    };

    // Ignore error if address is already in use (for development/testing)
    if let Err(e) = PrometheusBuilder::new().with_http_listener(addr).install() {
        warn!("Failed to install Prometheus recorder: {}. This might happen if the port is already in use.", e);
        return;
    }

    describe_counter!(
        CAMPAIGN_RUNS_DISPATCHED,
        "Campaign executions dispatched by the scheduler or run-now requests"
    );
    describe_counter!(CAMPAIGN_RUNS, "Finished campaign executions by outcome");
    describe_counter!(CAMPAIGN_EMAILS_SENT, "Campaign emails delivered to the sender");
    describe_counter!(CAMPAIGN_EMAILS_FAILED, "Campaign emails rejected by the sender");
    describe_histogram!(
        CAMPAIGN_RUN_DURATION,
        Unit::Seconds,
        "Wall time of a single campaign execution"
    );

    info!("Metrics exporter listening on {}", addr);
}
