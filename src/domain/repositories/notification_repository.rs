// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::campaign_repository::RepositoryError;
use crate::domain::models::notification::Notification;
use async_trait::async_trait;
use uuid::Uuid;

/// 通知仓库特质
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn create(&self, notification: &Notification) -> Result<Notification, RepositoryError>;
    /// 分页查询用户通知，按创建时间倒序
    async fn find_by_user(
        &self,
        organization_id: Uuid,
        user_id: Uuid,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<Notification>, u64), RepositoryError>;
}
