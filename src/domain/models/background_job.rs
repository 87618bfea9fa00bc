// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// 后台作业日志
///
/// 记录一个异步工作单元（CSV 导入、单次活动执行等）的审计与进度信息。
/// 只由创建它的组件更新。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackgroundJobLog {
    pub id: Uuid,
    pub job_type: JobType,
    pub organization_id: Uuid,
    /// 关联对象ID，例如活动ID
    pub reference_id: Option<Uuid>,
    pub status: JobStatus,
    pub total_records: Option<i32>,
    pub processed_records: Option<i32>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 作业类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    CsvImport,
    #[default]
    CampaignRun,
    CampaignScheduler,
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            JobType::CsvImport => write!(f, "csv_import"),
            JobType::CampaignRun => write!(f, "campaign_run"),
            JobType::CampaignScheduler => write!(f, "campaign_scheduler"),
        }
    }
}

impl FromStr for JobType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "csv_import" => Ok(JobType::CsvImport),
            "campaign_run" => Ok(JobType::CampaignRun),
            "campaign_scheduler" => Ok(JobType::CampaignScheduler),
            _ => Err(()),
        }
    }
}

/// 作业状态
///
/// Queued → Running → Success/Failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    #[default]
    Queued,
    Running,
    Success,
    Failed,
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            JobStatus::Queued => write!(f, "queued"),
            JobStatus::Running => write!(f, "running"),
            JobStatus::Success => write!(f, "success"),
            JobStatus::Failed => write!(f, "failed"),
        }
    }
}

impl FromStr for JobStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "queued" => Ok(JobStatus::Queued),
            "running" => Ok(JobStatus::Running),
            "success" => Ok(JobStatus::Success),
            "failed" => Ok(JobStatus::Failed),
            _ => Err(()),
        }
    }
}

impl BackgroundJobLog {
    /// 为一次活动执行创建排队中的作业
    pub fn campaign_run(organization_id: Uuid, campaign_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            job_type: JobType::CampaignRun,
            organization_id,
            reference_id: Some(campaign_id),
            status: JobStatus::Queued,
            total_records: None,
            processed_records: None,
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }
}
