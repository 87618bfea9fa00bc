// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域模型模块
///
/// 该模块定义了系统的核心业务实体，包括：
/// - 营销活动（campaign）：定时或周期性的批量邮件发送
/// - 投递日志（campaign_log）：每个收件人一次发送尝试的记录
/// - 后台作业（background_job）：异步工作单元的审计与进度
/// - 联系人、受众、邮件模板与通知
pub mod audience;
pub mod background_job;
pub mod campaign;
pub mod campaign_log;
pub mod contact;
pub mod email_template;
pub mod notification;
