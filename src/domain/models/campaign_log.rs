// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// 投递日志实体
///
/// 每个 (活动, 收件人) 的一次发送尝试对应一行。发送前以 `Queued`
/// 创建，发送后转为 `Sent` 或 `Failed`，此后不再变化。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignLog {
    pub id: Uuid,
    pub campaign_id: Uuid,
    pub contact_id: Uuid,
    /// 收件人邮箱
    pub recipient_email: String,
    /// 实际发送的主题（变量替换后）
    pub subject: String,
    pub status: DeliveryStatus,
    pub error_message: Option<String>,
    /// 发送成功的时间
    pub sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// 投递状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    #[default]
    Queued,
    Sent,
    Failed,
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DeliveryStatus::Queued => write!(f, "queued"),
            DeliveryStatus::Sent => write!(f, "sent"),
            DeliveryStatus::Failed => write!(f, "failed"),
        }
    }
}

impl FromStr for DeliveryStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "queued" => Ok(DeliveryStatus::Queued),
            "sent" => Ok(DeliveryStatus::Sent),
            "failed" => Ok(DeliveryStatus::Failed),
            _ => Err(()),
        }
    }
}

impl CampaignLog {
    /// 为一次发送尝试创建排队中的日志
    pub fn queued(
        campaign_id: Uuid,
        contact_id: Uuid,
        recipient_email: String,
        subject: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            campaign_id,
            contact_id,
            recipient_email,
            subject,
            status: DeliveryStatus::Queued,
            error_message: None,
            sent_at: None,
            created_at: Utc::now(),
        }
    }
}
