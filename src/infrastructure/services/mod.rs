// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 基础设施服务模块
///
/// 提供领域服务接口的具体实现，目前为 SMTP 与仅日志两种邮件发送器
pub mod email_service_impl;
