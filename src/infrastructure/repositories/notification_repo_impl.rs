// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::notification::Notification;
use crate::domain::repositories::campaign_repository::RepositoryError;
use crate::domain::repositories::notification_repository::NotificationRepository;
use crate::infrastructure::database::entities::notification as notification_entity;
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use std::sync::Arc;
use uuid::Uuid;

/// 通知仓库实现
#[derive(Clone)]
pub struct NotificationRepositoryImpl {
    db: Arc<DatabaseConnection>,
}

impl NotificationRepositoryImpl {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

impl From<notification_entity::Model> for Notification {
    fn from(model: notification_entity::Model) -> Self {
        Self {
            id: model.id,
            organization_id: model.organization_id,
            user_id: model.user_id,
            notification_type: model.notification_type,
            title: model.title,
            message: model.message,
            related_campaign_id: model.related_campaign_id,
            is_read: model.is_read,
            read_at: model.read_at.map(|t| t.with_timezone(&Utc)),
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl From<Notification> for notification_entity::ActiveModel {
    fn from(notification: Notification) -> Self {
        Self {
            id: Set(notification.id),
            organization_id: Set(notification.organization_id),
            user_id: Set(notification.user_id),
            notification_type: Set(notification.notification_type),
            title: Set(notification.title),
            message: Set(notification.message),
            related_campaign_id: Set(notification.related_campaign_id),
            is_read: Set(notification.is_read),
            read_at: Set(notification.read_at.map(Into::into)),
            created_at: Set(notification.created_at.into()),
        }
    }
}

#[async_trait]
impl NotificationRepository for NotificationRepositoryImpl {
    async fn create(&self, notification: &Notification) -> Result<Notification, RepositoryError> {
        let model: notification_entity::ActiveModel = notification.clone().into();
        let inserted = model.insert(self.db.as_ref()).await?;
        Ok(inserted.into())
    }

    async fn find_by_user(
        &self,
        organization_id: Uuid,
        user_id: Uuid,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<Notification>, u64), RepositoryError> {
        let paginator = notification_entity::Entity::find()
            .filter(notification_entity::Column::OrganizationId.eq(organization_id))
            .filter(notification_entity::Column::UserId.eq(user_id))
            .order_by_desc(notification_entity::Column::CreatedAt)
            .paginate(self.db.as_ref(), limit.max(1));

        let total = paginator.num_items().await?;
        let models = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((models.into_iter().map(Into::into).collect(), total))
    }
}
