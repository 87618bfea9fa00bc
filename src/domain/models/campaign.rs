// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Datelike, Duration, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// 营销活动实体
///
/// 一次（或周期性）的批量邮件发送任务。目标要么是单个联系人，
/// 要么是一个或多个受众，两者互斥，在创建时校验。
/// 模板不做快照，发送时实时读取。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    /// 活动唯一标识符
    pub id: Uuid,
    /// 所属组织ID，租户隔离边界；为空的活动永远不会被调度
    pub organization_id: Option<Uuid>,
    /// 活动名称
    pub name: String,
    /// 邮件模板ID
    pub template_id: Uuid,
    /// 目标受众ID列表
    pub audience_ids: Vec<Uuid>,
    /// 目标联系人ID（与受众互斥）
    pub contact_id: Option<Uuid>,
    /// 调度类型
    pub schedule_type: ScheduleType,
    /// 首次（或唯一一次）到期时间
    pub scheduled_at: DateTime<Utc>,
    /// 重复周期，仅周期性活动使用
    pub recurrence: Option<Recurrence>,
    /// 每周的第几天（0 = 周日 … 6 = 周六）
    pub recurrence_day_of_week: Option<i32>,
    /// 每月的第几天（1–31）
    pub recurrence_day_of_month: Option<i32>,
    /// 发送时刻，仅存储，不参与到期判断
    pub recurrence_time: Option<NaiveTime>,
    /// 最近一次成功执行的时间
    pub last_run_at: Option<DateTime<Utc>>,
    /// 活动状态
    pub status: CampaignStatus,
    /// 创建者ID，执行完成后的通知接收人
    pub created_by: Uuid,
    /// 创建时间
    pub created_at: DateTime<Utc>,
    /// 更新时间，每次状态写入时刷新
    pub updated_at: DateTime<Utc>,
}

/// 调度类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleType {
    /// 只执行一次
    #[default]
    Once,
    /// 按周期重复执行
    Recurring,
}

impl fmt::Display for ScheduleType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ScheduleType::Once => write!(f, "once"),
            ScheduleType::Recurring => write!(f, "recurring"),
        }
    }
}

impl FromStr for ScheduleType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "once" => Ok(ScheduleType::Once),
            "recurring" => Ok(ScheduleType::Recurring),
            other => Err(DomainError::ValidationError(format!(
                "schedule_type must be 'once' or 'recurring', got '{}'",
                other
            ))),
        }
    }
}

/// 重复周期
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recurrence {
    Daily,
    Weekly,
    Monthly,
}

impl fmt::Display for Recurrence {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Recurrence::Daily => write!(f, "daily"),
            Recurrence::Weekly => write!(f, "weekly"),
            Recurrence::Monthly => write!(f, "monthly"),
        }
    }
}

impl FromStr for Recurrence {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" => Ok(Recurrence::Daily),
            "weekly" => Ok(Recurrence::Weekly),
            "monthly" => Ok(Recurrence::Monthly),
            other => Err(DomainError::ValidationError(format!(
                "recurrence must be 'daily', 'weekly', or 'monthly', got '{}'",
                other
            ))),
        }
    }
}

/// 活动状态
///
/// 状态转换：
/// Draft → Scheduled → Running → Completed/Failed/Scheduled（周期性）
/// Scheduled/Running → Paused → Scheduled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CampaignStatus {
    /// 草稿，不会被调度
    Draft,
    /// 等待调度
    #[default]
    Scheduled,
    /// 执行中
    Running,
    /// 已暂停，阻止后续调度，但不会中断正在进行的执行
    Paused,
    /// 已完成
    Completed,
    /// 已失败
    Failed,
}

impl fmt::Display for CampaignStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CampaignStatus::Draft => write!(f, "draft"),
            CampaignStatus::Scheduled => write!(f, "scheduled"),
            CampaignStatus::Running => write!(f, "running"),
            CampaignStatus::Paused => write!(f, "paused"),
            CampaignStatus::Completed => write!(f, "completed"),
            CampaignStatus::Failed => write!(f, "failed"),
        }
    }
}

impl FromStr for CampaignStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(CampaignStatus::Draft),
            "scheduled" => Ok(CampaignStatus::Scheduled),
            "running" => Ok(CampaignStatus::Running),
            "paused" => Ok(CampaignStatus::Paused),
            "completed" => Ok(CampaignStatus::Completed),
            "failed" => Ok(CampaignStatus::Failed),
            other => Err(DomainError::ValidationError(format!(
                "unknown campaign status '{}'",
                other
            ))),
        }
    }
}

/// 领域错误类型
#[derive(Error, Debug)]
pub enum DomainError {
    /// 无效的状态转换
    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),

    /// 验证错误
    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl Campaign {
    /// 组织ID是否有效（非空且非 nil UUID）
    pub fn valid_organization_id(&self) -> Option<Uuid> {
        self.organization_id.filter(|id| !id.is_nil())
    }

    /// 一次性活动是否已经执行过
    pub fn already_ran_once(&self) -> bool {
        self.schedule_type == ScheduleType::Once && self.last_run_at.is_some()
    }

    /// 判断周期性活动在 `now` 时刻是否应当执行
    ///
    /// - 从未执行：`now` 晚于 `scheduled_at`
    /// - 每日：距上次执行至少 24 小时
    /// - 每周：当天星期与 `recurrence_day_of_week` 相同，且距上次执行至少 7 天
    /// - 每月：当天日期与 `recurrence_day_of_month` 相同，且距上次执行至少 28 天
    ///
    /// 缺少周期或对应日期字段时不执行。`recurrence_time` 不参与判断。
    pub fn is_recurrence_due(&self, now: DateTime<Utc>) -> bool {
        let Some(last_run) = self.last_run_at else {
            return now > self.scheduled_at;
        };

        let elapsed = now - last_run;
        match self.recurrence {
            Some(Recurrence::Daily) => elapsed >= Duration::hours(24),
            Some(Recurrence::Weekly) => match self.recurrence_day_of_week {
                Some(day) => {
                    now.weekday().num_days_from_sunday() as i32 == day
                        && elapsed >= Duration::days(7)
                }
                None => false,
            },
            Some(Recurrence::Monthly) => match self.recurrence_day_of_month {
                Some(day) => now.day() as i32 == day && elapsed >= Duration::days(28),
                None => false,
            },
            None => false,
        }
    }

    /// 执行结束后的下一个状态：一次性活动完成，周期性活动回到待调度
    pub fn status_after_run(&self) -> CampaignStatus {
        match self.schedule_type {
            ScheduleType::Once => CampaignStatus::Completed,
            ScheduleType::Recurring => CampaignStatus::Scheduled,
        }
    }

    /// 暂停活动
    pub fn pause(&mut self) -> Result<(), DomainError> {
        match self.status {
            CampaignStatus::Scheduled | CampaignStatus::Running => {
                self.status = CampaignStatus::Paused;
                self.updated_at = Utc::now();
                Ok(())
            }
            _ => Err(DomainError::InvalidStateTransition(
                "Can only pause scheduled or running campaigns".to_string(),
            )),
        }
    }

    /// 恢复已暂停的活动，草稿也经由此处发布
    pub fn resume(&mut self) -> Result<(), DomainError> {
        match self.status {
            CampaignStatus::Paused | CampaignStatus::Draft => {
                self.status = CampaignStatus::Scheduled;
                self.updated_at = Utc::now();
                Ok(())
            }
            _ => Err(DomainError::InvalidStateTransition(
                "Can only resume paused or draft campaigns".to_string(),
            )),
        }
    }

    /// 是否允许修改名称或调度时间
    pub fn ensure_editable(&self) -> Result<(), DomainError> {
        match self.status {
            CampaignStatus::Draft | CampaignStatus::Scheduled => Ok(()),
            _ => Err(DomainError::InvalidStateTransition(
                "Cannot update a campaign that is running, paused, or completed".to_string(),
            )),
        }
    }

    /// 是否允许删除，执行中的活动不可删除
    pub fn ensure_deletable(&self) -> Result<(), DomainError> {
        if self.status == CampaignStatus::Running {
            return Err(DomainError::InvalidStateTransition(
                "Cannot delete a running campaign. Pause it first.".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "campaign_test.rs"]
mod tests;
