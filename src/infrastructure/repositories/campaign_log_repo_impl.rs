// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::campaign_log::{CampaignLog, DeliveryStatus};
use crate::domain::repositories::campaign_log_repository::CampaignLogRepository;
use crate::domain::repositories::campaign_repository::RepositoryError;
use crate::infrastructure::database::entities::campaign_log as campaign_log_entity;
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// 投递日志仓库实现
#[derive(Clone)]
pub struct CampaignLogRepositoryImpl {
    db: Arc<DatabaseConnection>,
}

impl CampaignLogRepositoryImpl {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

impl From<campaign_log_entity::Model> for CampaignLog {
    fn from(model: campaign_log_entity::Model) -> Self {
        Self {
            id: model.id,
            campaign_id: model.campaign_id,
            contact_id: model.contact_id,
            recipient_email: model.recipient_email,
            subject: model.subject,
            status: model.status.parse().unwrap_or_default(),
            error_message: model.error_message,
            sent_at: model.sent_at.map(|t| t.with_timezone(&Utc)),
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl From<CampaignLog> for campaign_log_entity::ActiveModel {
    fn from(log: CampaignLog) -> Self {
        Self {
            id: Set(log.id),
            campaign_id: Set(log.campaign_id),
            contact_id: Set(log.contact_id),
            recipient_email: Set(log.recipient_email),
            subject: Set(log.subject),
            status: Set(log.status.to_string()),
            error_message: Set(log.error_message),
            sent_at: Set(log.sent_at.map(Into::into)),
            created_at: Set(log.created_at.into()),
        }
    }
}

#[async_trait]
impl CampaignLogRepository for CampaignLogRepositoryImpl {
    async fn create(&self, log: &CampaignLog) -> Result<CampaignLog, RepositoryError> {
        let model: campaign_log_entity::ActiveModel = log.clone().into();
        let inserted = model.insert(self.db.as_ref()).await?;
        Ok(inserted.into())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<CampaignLog>, RepositoryError> {
        let model = campaign_log_entity::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?;

        Ok(model.map(Into::into))
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: DeliveryStatus,
        error_message: Option<String>,
    ) -> Result<(), RepositoryError> {
        let sent_at: Option<DateTime<FixedOffset>> =
            (status == DeliveryStatus::Sent).then(|| Utc::now().into());

        // Only queued logs may be finalized
        let result = campaign_log_entity::Entity::update_many()
            .col_expr(
                campaign_log_entity::Column::Status,
                Expr::value(status.to_string()),
            )
            .col_expr(
                campaign_log_entity::Column::ErrorMessage,
                Expr::value(error_message),
            )
            .col_expr(campaign_log_entity::Column::SentAt, Expr::value(sent_at))
            .filter(campaign_log_entity::Column::Id.eq(id))
            .filter(campaign_log_entity::Column::Status.eq(DeliveryStatus::Queued.to_string()))
            .exec(self.db.as_ref())
            .await?;

        if result.rows_affected == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn find_by_campaign(
        &self,
        campaign_id: Uuid,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<CampaignLog>, u64), RepositoryError> {
        let paginator = campaign_log_entity::Entity::find()
            .filter(campaign_log_entity::Column::CampaignId.eq(campaign_id))
            .order_by_desc(campaign_log_entity::Column::CreatedAt)
            .paginate(self.db.as_ref(), limit.max(1));

        let total = paginator.num_items().await?;
        let models = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((models.into_iter().map(Into::into).collect(), total))
    }

    async fn stats_by_campaign(
        &self,
        campaign_id: Uuid,
    ) -> Result<HashMap<DeliveryStatus, u64>, RepositoryError> {
        let rows = campaign_log_entity::Entity::find()
            .select_only()
            .column(campaign_log_entity::Column::Status)
            .column_as(campaign_log_entity::Column::Id.count(), "count")
            .filter(campaign_log_entity::Column::CampaignId.eq(campaign_id))
            .group_by(campaign_log_entity::Column::Status)
            .into_tuple::<(String, i64)>()
            .all(self.db.as_ref())
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(status, count)| {
                status
                    .parse::<DeliveryStatus>()
                    .ok()
                    .map(|s| (s, count as u64))
            })
            .collect())
    }
}
