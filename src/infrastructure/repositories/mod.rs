// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 仓库实现模块
///
/// 基于SeaORM的领域仓库接口实现
pub mod audience_repo_impl;
pub mod background_job_repo_impl;
pub mod campaign_log_repo_impl;
pub mod campaign_repo_impl;
pub mod contact_repo_impl;
pub mod email_template_repo_impl;
pub mod notification_repo_impl;
