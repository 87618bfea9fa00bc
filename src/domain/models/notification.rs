// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 站内通知
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub user_id: Uuid,
    pub notification_type: String,
    pub title: String,
    pub message: String,
    pub related_campaign_id: Option<Uuid>,
    pub is_read: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// 活动发送完成通知
    pub fn campaign_sent(
        organization_id: Uuid,
        user_id: Uuid,
        campaign_id: Uuid,
        recipient_count: usize,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            organization_id,
            user_id,
            notification_type: "campaign_sent".to_string(),
            title: "Campaign Sent Successfully".to_string(),
            message: format!(
                "Your campaign has been sent to {} recipients",
                recipient_count
            ),
            related_campaign_id: Some(campaign_id),
            is_read: false,
            read_at: None,
            created_at: Utc::now(),
        }
    }
}
