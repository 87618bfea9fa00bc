// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 工作器模块
///
/// 活动执行器与后台任务生命周期管理
pub mod campaign_worker;
pub mod manager;

pub use campaign_worker::CampaignExecutor;
