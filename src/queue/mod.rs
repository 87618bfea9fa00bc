// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 队列模块
///
/// 提供活动调度功能：周期性扫描到期活动并派发执行
pub mod scheduler;
