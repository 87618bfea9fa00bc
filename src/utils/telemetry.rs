// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// 默认日志过滤规则，`RUST_LOG` 未设置时使用
pub const DEFAULT_LOG_FILTER: &str = "info,crmrs=debug,sqlx=warn";

/// 初始化日志订阅器
///
/// 设置 `CRMRS_LOG_FORMAT=json` 时输出 JSON 格式日志
pub fn init_telemetry() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let json = std::env::var("CRMRS_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
