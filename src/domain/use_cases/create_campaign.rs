// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::campaign::{
    Campaign, CampaignStatus, DomainError, Recurrence, ScheduleType,
};
use crate::domain::repositories::audience_repository::AudienceRepository;
use crate::domain::repositories::campaign_repository::{CampaignRepository, RepositoryError};
use crate::domain::repositories::contact_repository::ContactRepository;
use crate::domain::repositories::email_template_repository::EmailTemplateRepository;
use chrono::{DateTime, NaiveTime, Utc};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// 创建活动的输入
#[derive(Debug, Clone, Default)]
pub struct CreateCampaignCommand {
    pub organization_id: Uuid,
    pub created_by: Uuid,
    pub name: String,
    pub template_id: Option<Uuid>,
    pub audience_ids: Vec<Uuid>,
    pub contact_id: Option<Uuid>,
    pub schedule_type: String,
    pub scheduled_at: DateTime<Utc>,
    pub recurrence: Option<String>,
    pub recurrence_day_of_week: Option<i32>,
    pub recurrence_day_of_month: Option<i32>,
    /// `HH:MM`
    pub recurrence_time: Option<String>,
    pub draft: bool,
}

/// 创建活动错误
#[derive(Error, Debug)]
pub enum CreateCampaignError {
    #[error(transparent)]
    Invalid(#[from] DomainError),
    /// 引用的模板、受众或联系人不存在于该组织
    #[error("{0}")]
    NotFound(String),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

pub struct CreateCampaignUseCase<C, T, A, K>
where
    C: CampaignRepository,
    T: EmailTemplateRepository,
    A: AudienceRepository,
    K: ContactRepository,
{
    campaign_repo: Arc<C>,
    template_repo: Arc<T>,
    audience_repo: Arc<A>,
    contact_repo: Arc<K>,
}

impl<C, T, A, K> CreateCampaignUseCase<C, T, A, K>
where
    C: CampaignRepository,
    T: EmailTemplateRepository,
    A: AudienceRepository,
    K: ContactRepository,
{
    pub fn new(
        campaign_repo: Arc<C>,
        template_repo: Arc<T>,
        audience_repo: Arc<A>,
        contact_repo: Arc<K>,
    ) -> Self {
        Self {
            campaign_repo,
            template_repo,
            audience_repo,
            contact_repo,
        }
    }

    /// 校验并创建活动
    ///
    /// 校验顺序：必填字段 → 调度类型 → 收件人互斥 → 模板/受众/联系人存在性
    /// → 周期设置 → 发送时刻格式。
    pub async fn execute(
        &self,
        command: CreateCampaignCommand,
    ) -> Result<Campaign, CreateCampaignError> {
        let template_id = match command.template_id {
            Some(id) if !command.name.trim().is_empty() && !command.schedule_type.is_empty() => id,
            _ => {
                return Err(validation(
                    "Name, template_id, and schedule_type are required",
                ))
            }
        };

        let schedule_type: ScheduleType = command.schedule_type.parse()?;

        let has_audiences = !command.audience_ids.is_empty();
        if has_audiences == command.contact_id.is_some() {
            return Err(validation(
                "Must provide either audience_ids or contact_id, not both",
            ));
        }

        let org = command.organization_id;
        if self.template_repo.find_by_id(template_id, org).await?.is_none() {
            return Err(CreateCampaignError::NotFound(
                "Email template not found".to_string(),
            ));
        }

        for audience_id in &command.audience_ids {
            if self.audience_repo.find_by_id(*audience_id, org).await?.is_none() {
                return Err(CreateCampaignError::NotFound(format!(
                    "Audience not found: {}",
                    audience_id
                )));
            }
        }

        if let Some(contact_id) = command.contact_id {
            if self.contact_repo.find_by_id(contact_id, org).await?.is_none() {
                return Err(CreateCampaignError::NotFound(
                    "Contact not found".to_string(),
                ));
            }
        }

        let recurrence = match schedule_type {
            ScheduleType::Recurring => {
                let raw = command.recurrence.as_deref().ok_or_else(|| {
                    validation("recurrence is required for recurring campaigns")
                })?;
                let recurrence: Recurrence = raw.parse()?;
                match recurrence {
                    Recurrence::Weekly if command.recurrence_day_of_week.is_none() => {
                        return Err(validation(
                            "recurrence_day_of_week is required for weekly campaigns",
                        ))
                    }
                    Recurrence::Monthly if command.recurrence_day_of_month.is_none() => {
                        return Err(validation(
                            "recurrence_day_of_month is required for monthly campaigns",
                        ))
                    }
                    _ => {}
                }
                Some(recurrence)
            }
            ScheduleType::Once => None,
        };

        if let Some(day) = command.recurrence_day_of_week {
            if !(0..=6).contains(&day) {
                return Err(validation("recurrence_day_of_week must be between 0 and 6"));
            }
        }
        if let Some(day) = command.recurrence_day_of_month {
            if !(1..=31).contains(&day) {
                return Err(validation("recurrence_day_of_month must be between 1 and 31"));
            }
        }

        let recurrence_time = command
            .recurrence_time
            .as_deref()
            .map(|raw| NaiveTime::parse_from_str(raw, "%H:%M"))
            .transpose()
            .map_err(|_| validation("Invalid recurrence_time format. Use HH:MM"))?;

        let now = Utc::now();
        let campaign = Campaign {
            id: Uuid::new_v4(),
            organization_id: Some(org),
            name: command.name.trim().to_string(),
            template_id,
            audience_ids: command.audience_ids,
            contact_id: command.contact_id,
            schedule_type,
            scheduled_at: command.scheduled_at,
            recurrence,
            recurrence_day_of_week: command.recurrence_day_of_week,
            recurrence_day_of_month: command.recurrence_day_of_month,
            recurrence_time,
            last_run_at: None,
            status: if command.draft {
                CampaignStatus::Draft
            } else {
                CampaignStatus::Scheduled
            },
            created_by: command.created_by,
            created_at: now,
            updated_at: now,
        };

        Ok(self.campaign_repo.create(&campaign).await?)
    }
}

fn validation(message: &str) -> CreateCampaignError {
    CreateCampaignError::Invalid(DomainError::ValidationError(message.to_string()))
}
