// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 请求提取器模块
///
/// 从请求头中解析租户身份
pub mod tenant;
