// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 仓库接口模块
///
/// 该模块定义了领域层的仓库接口，遵循依赖倒置原则。
/// 具体实现由基础设施层提供：
/// - 活动仓库（campaign_repository）：活动的持久化、到期查询与原子状态切换
/// - 投递日志仓库（campaign_log_repository）：每个收件人的发送记录与统计
/// - 后台作业仓库（background_job_repository）：异步作业的审计与进度
/// - 联系人、模板、受众、通知仓库：执行器依赖的外部协作者
pub mod audience_repository;
pub mod background_job_repository;
pub mod campaign_log_repository;
pub mod campaign_repository;
pub mod contact_repository;
pub mod email_template_repository;
pub mod notification_repository;
