// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::background_job::BackgroundJobLog;
use serde::Serialize;

/// 作业列表响应DTO
#[derive(Debug, Serialize)]
pub struct JobListResponseDto {
    pub jobs: Vec<BackgroundJobLog>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
}
