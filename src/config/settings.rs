// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;
use std::time::Duration;

/// 应用程序配置设置
///
/// 包含数据库、服务器、调度器、SMTP 和指标等所有配置项
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// 数据库配置
    pub database: DatabaseSettings,
    /// 服务器配置
    pub server: ServerSettings,
    /// 调度器配置
    pub scheduler: SchedulerSettings,
    /// SMTP 配置
    pub smtp: SmtpSettings,
    /// 指标配置
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

/// 调度器配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerSettings {
    /// 两次扫描之间的间隔（秒），至少为 1
    pub tick_interval_secs: u64,
    /// 启动后是否立即执行第一次扫描
    pub run_on_startup: bool,
    /// 处于 running 超过该时长（秒）的活动在启动时被视为中断
    pub stuck_running_timeout_secs: u64,
}

impl SchedulerSettings {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_secs)
    }

    pub fn stuck_running_timeout(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.stuck_running_timeout_secs as i64)
    }
}

/// SMTP 配置设置
///
/// host、user、password、from 任一缺失时只记录日志，不真正发送
#[derive(Debug, Clone, Deserialize)]
pub struct SmtpSettings {
    pub host: Option<String>,
    pub port: u16,
    pub user: Option<String>,
    pub password: Option<String>,
    /// 发件人地址
    pub from: Option<String>,
}

impl SmtpSettings {
    pub fn is_configured(&self) -> bool {
        [&self.host, &self.user, &self.password, &self.from]
            .iter()
            .all(|v| v.as_deref().is_some_and(|s| !s.is_empty()))
    }
}

/// 指标配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsSettings {
    /// 是否启用 Prometheus 导出
    pub enabled: bool,
    /// 导出器监听地址
    pub listen_addr: String,
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 依次叠加默认值、`config/default`、`config/{APP_ENVIRONMENT}` 和
    /// `CRMRS__` 前缀的环境变量
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载的配置
    /// * `Err(ConfigError)` - 配置加载失败或取值无效
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        let builder = Self::defaults()?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::with_prefix("CRMRS").separator("__"));

        Self::from_builder(builder)
    }

    /// 只包含默认值的构建器
    pub fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("database.url", "sqlite://crmrs.db?mode=rwc")?
            .set_default("database.max_connections", 20)?
            .set_default("database.min_connections", 2)?
            .set_default("database.connect_timeout", 10)?
            .set_default("database.idle_timeout", 300)?
            .set_default("scheduler.tick_interval_secs", 60)?
            .set_default("scheduler.run_on_startup", true)?
            .set_default("scheduler.stuck_running_timeout_secs", 3600)?
            .set_default("smtp.port", 587)?
            .set_default("metrics.enabled", true)?
            .set_default("metrics.listen_addr", "0.0.0.0:9000")
    }

    /// 构建、反序列化并校验
    pub fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.scheduler.tick_interval_secs == 0 {
            return Err(ConfigError::Message(
                "scheduler.tick_interval_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "settings_test.rs"]
mod tests;
