// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// HTTP请求处理器模块
///
/// 每个处理器负责一类资源的请求，租户身份由请求头提取
pub mod campaign_handler;
pub mod job_handler;
