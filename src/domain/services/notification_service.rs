// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::notification::Notification;
use crate::domain::repositories::notification_repository::NotificationRepository;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

/// 通知接收端特质
///
/// 尽力而为：实现方自行吞掉错误，不向调用方传播。
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// 通知活动创建者发送完成
    async fn notify_campaign_sent(
        &self,
        organization_id: Uuid,
        user_id: Uuid,
        campaign_id: Uuid,
        recipient_count: usize,
    );
}

/// 基于通知表的通知服务
pub struct NotificationService<R: NotificationRepository> {
    repo: Arc<R>,
}

impl<R: NotificationRepository> NotificationService<R> {
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl<R: NotificationRepository> NotificationSink for NotificationService<R> {
    async fn notify_campaign_sent(
        &self,
        organization_id: Uuid,
        user_id: Uuid,
        campaign_id: Uuid,
        recipient_count: usize,
    ) {
        let notification =
            Notification::campaign_sent(organization_id, user_id, campaign_id, recipient_count);
        if let Err(e) = self.repo.create(&notification).await {
            warn!(
                "Failed to store campaign_sent notification for campaign {}: {}",
                campaign_id, e
            );
        }
    }
}
