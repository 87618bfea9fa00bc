// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::campaign::Campaign;
use crate::domain::models::campaign_log::{CampaignLog, DeliveryStatus};
use crate::domain::use_cases::create_campaign::CreateCampaignCommand;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;
use validator::Validate;

/// 列表接口的默认每页数量
pub const DEFAULT_PAGE_LIMIT: u64 = 20;
/// 日志接口的默认每页数量
pub const DEFAULT_LOG_PAGE_LIMIT: u64 = 50;
const MAX_PAGE_LIMIT: u64 = 100;

/// 创建活动请求DTO
///
/// 必填字段缺失时不在反序列化阶段拒绝，交给用例返回统一的校验信息
#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct CreateCampaignRequestDto {
    #[serde(default)]
    #[validate(length(max = 255))]
    pub name: String,
    pub template_id: Option<Uuid>,
    #[serde(default)]
    pub audience_ids: Vec<Uuid>,
    pub contact_id: Option<Uuid>,
    /// once | recurring
    #[serde(default)]
    pub schedule_type: String,
    /// 缺省为当前时间
    pub scheduled_at: Option<DateTime<Utc>>,
    /// daily | weekly | monthly
    pub recurrence: Option<String>,
    pub recurrence_day_of_week: Option<i32>,
    pub recurrence_day_of_month: Option<i32>,
    /// HH:MM
    pub recurrence_time: Option<String>,
    /// 以草稿创建，不参与调度
    #[serde(default)]
    pub draft: bool,
}

impl CreateCampaignRequestDto {
    /// 转换为用例命令
    ///
    /// # 参数
    ///
    /// * `organization_id` - 请求所属组织
    /// * `created_by` - 请求用户
    pub fn into_command(self, organization_id: Uuid, created_by: Uuid) -> CreateCampaignCommand {
        CreateCampaignCommand {
            organization_id,
            created_by,
            name: self.name,
            template_id: self.template_id,
            audience_ids: self.audience_ids,
            contact_id: self.contact_id,
            schedule_type: self.schedule_type,
            scheduled_at: self.scheduled_at.unwrap_or_else(Utc::now),
            recurrence: self.recurrence,
            recurrence_day_of_week: self.recurrence_day_of_week,
            recurrence_day_of_month: self.recurrence_day_of_month,
            recurrence_time: self.recurrence_time,
            draft: self.draft,
        }
    }
}

/// 更新活动请求DTO，只允许修改名称与调度时间
#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct UpdateCampaignRequestDto {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    pub scheduled_at: Option<DateTime<Utc>>,
}

/// 分页查询参数
#[derive(Debug, Default, Clone, Copy, Deserialize)]
pub struct PageQueryDto {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl PageQueryDto {
    /// 页码，小于 1 时取 1
    pub fn page(&self) -> u64 {
        match self.page {
            Some(page) if page >= 1 => page as u64,
            _ => 1,
        }
    }

    /// 每页数量，超出 1..=100 时取默认值
    pub fn limit_or(&self, default: u64) -> u64 {
        match self.limit {
            Some(limit) if (1..=MAX_PAGE_LIMIT as i64).contains(&limit) => limit as u64,
            _ => default,
        }
    }
}

/// 活动列表查询参数
#[derive(Debug, Default, Deserialize)]
pub struct ListCampaignsQueryDto {
    pub status: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl ListCampaignsQueryDto {
    pub fn paging(&self) -> PageQueryDto {
        PageQueryDto {
            page: self.page,
            limit: self.limit,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CampaignResponseDto {
    pub message: &'static str,
    pub campaign: Campaign,
}

#[derive(Debug, Serialize)]
pub struct MessageResponseDto {
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct CampaignListResponseDto {
    pub campaigns: Vec<Campaign>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
}

#[derive(Debug, Serialize)]
pub struct CampaignLogsResponseDto {
    pub logs: Vec<CampaignLog>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    /// 各投递状态的数量，缺失的状态计为 0
    pub stats: BTreeMap<String, u64>,
}

impl CampaignLogsResponseDto {
    pub fn new(
        logs: Vec<CampaignLog>,
        total: u64,
        page: u64,
        limit: u64,
        stats: HashMap<DeliveryStatus, u64>,
    ) -> Self {
        let stats = [
            DeliveryStatus::Queued,
            DeliveryStatus::Sent,
            DeliveryStatus::Failed,
        ]
        .into_iter()
        .map(|status| {
            let count = stats.get(&status).copied().unwrap_or(0);
            (status.to_string(), count)
        })
        .collect();

        Self {
            logs,
            total,
            page,
            limit,
            stats,
        }
    }
}

/// 手动执行的响应
#[derive(Debug, Serialize)]
pub struct RunCampaignResponseDto {
    pub message: &'static str,
    pub campaign_id: Uuid,
    pub job_id: Uuid,
}
