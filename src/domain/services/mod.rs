// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域服务模块
///
/// - 模板渲染（template_renderer）：`{{key}}` 变量替换
/// - 邮件发送（email_service）：发送接口，具体传输由基础设施层实现
/// - 通知（notification_service）：活动完成通知
pub mod email_service;
pub mod notification_service;
pub mod template_renderer;
