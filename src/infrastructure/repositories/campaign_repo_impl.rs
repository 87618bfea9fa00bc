// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::domain::models::campaign::{Campaign, CampaignStatus, ScheduleType};
use crate::domain::repositories::campaign_repository::{
    CampaignQueryParams, CampaignRepository, RepositoryError, StuckCampaignReset,
};
use crate::infrastructure::database::entities::{
    audience_contact as audience_contact_entity, campaign as campaign_entity,
};
use async_trait::async_trait;
use chrono::{DateTime, Duration, FixedOffset, NaiveTime, Utc};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use std::sync::Arc;
use uuid::Uuid;

/// 活动仓库实现
///
/// 基于SeaORM实现的活动数据访问层
#[derive(Clone)]
pub struct CampaignRepositoryImpl {
    /// 数据库连接
    db: Arc<DatabaseConnection>,
}

impl CampaignRepositoryImpl {
    /// 创建新的活动仓库实例
    ///
    /// # 参数
    ///
    /// * `db` - 数据库连接
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// 按ID改写状态列，没有命中任何行时返回 `NotFound`
    async fn set_status(&self, id: Uuid, status: CampaignStatus) -> Result<(), RepositoryError> {
        let result = campaign_entity::Entity::update_many()
            .col_expr(
                campaign_entity::Column::Status,
                Expr::value(status.to_string()),
            )
            .col_expr(campaign_entity::Column::UpdatedAt, Expr::value(now_fixed()))
            .filter(campaign_entity::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await?;

        if result.rows_affected == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

fn now_fixed() -> DateTime<FixedOffset> {
    Utc::now().into()
}

/// 组织ID非空且非 nil UUID
fn has_organization() -> Condition {
    Condition::all()
        .add(campaign_entity::Column::OrganizationId.is_not_null())
        .add(campaign_entity::Column::OrganizationId.ne(Uuid::nil()))
}

impl From<campaign_entity::Model> for Campaign {
    fn from(model: campaign_entity::Model) -> Self {
        Self {
            id: model.id,
            organization_id: model.organization_id,
            name: model.name,
            template_id: model.template_id,
            audience_ids: serde_json::from_value(model.audience_ids).unwrap_or_default(),
            contact_id: model.contact_id,
            schedule_type: model.schedule_type.parse().unwrap_or_default(),
            scheduled_at: model.scheduled_at.with_timezone(&Utc),
            recurrence: model.recurrence.and_then(|r| r.parse().ok()),
            recurrence_day_of_week: model.recurrence_day_of_week,
            recurrence_day_of_month: model.recurrence_day_of_month,
            recurrence_time: model
                .recurrence_time
                .and_then(|t| NaiveTime::parse_from_str(&t, "%H:%M").ok()),
            last_run_at: model.last_run_at.map(|t| t.with_timezone(&Utc)),
            status: model.status.parse().unwrap_or_default(),
            created_by: model.created_by,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

impl From<Campaign> for campaign_entity::ActiveModel {
    fn from(campaign: Campaign) -> Self {
        Self {
            id: Set(campaign.id),
            organization_id: Set(campaign.organization_id),
            name: Set(campaign.name),
            template_id: Set(campaign.template_id),
            audience_ids: Set(serde_json::json!(campaign.audience_ids)),
            contact_id: Set(campaign.contact_id),
            schedule_type: Set(campaign.schedule_type.to_string()),
            scheduled_at: Set(campaign.scheduled_at.into()),
            recurrence: Set(campaign.recurrence.map(|r| r.to_string())),
            recurrence_day_of_week: Set(campaign.recurrence_day_of_week),
            recurrence_day_of_month: Set(campaign.recurrence_day_of_month),
            recurrence_time: Set(campaign.recurrence_time.map(|t| t.format("%H:%M").to_string())),
            last_run_at: Set(campaign.last_run_at.map(Into::into)),
            status: Set(campaign.status.to_string()),
            created_by: Set(campaign.created_by),
            created_at: Set(campaign.created_at.into()),
            updated_at: Set(campaign.updated_at.into()),
        }
    }
}

#[async_trait]
impl CampaignRepository for CampaignRepositoryImpl {
    async fn create(&self, campaign: &Campaign) -> Result<Campaign, RepositoryError> {
        let model: campaign_entity::ActiveModel = campaign.clone().into();
        let inserted = model.insert(self.db.as_ref()).await?;
        Ok(inserted.into())
    }

    async fn find_by_id(
        &self,
        id: Uuid,
        organization_id: Uuid,
    ) -> Result<Option<Campaign>, RepositoryError> {
        let model = campaign_entity::Entity::find_by_id(id)
            .filter(campaign_entity::Column::OrganizationId.eq(organization_id))
            .one(self.db.as_ref())
            .await?;

        Ok(model.map(Into::into))
    }

    async fn find_by_id_unscoped(&self, id: Uuid) -> Result<Option<Campaign>, RepositoryError> {
        let model = campaign_entity::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?;

        Ok(model.map(Into::into))
    }

    async fn find_all_by_org(
        &self,
        params: CampaignQueryParams,
    ) -> Result<(Vec<Campaign>, u64), RepositoryError> {
        let mut query = campaign_entity::Entity::find()
            .filter(campaign_entity::Column::OrganizationId.eq(params.organization_id));

        if let Some(status) = params.status {
            query = query.filter(campaign_entity::Column::Status.eq(status.to_string()));
        }

        let paginator = query
            .order_by_desc(campaign_entity::Column::CreatedAt)
            .paginate(self.db.as_ref(), params.limit.max(1));

        let total = paginator.num_items().await?;
        let models = paginator
            .fetch_page(params.page.saturating_sub(1))
            .await?;

        Ok((models.into_iter().map(Into::into).collect(), total))
    }

    async fn update(&self, campaign: &Campaign) -> Result<Campaign, RepositoryError> {
        let organization_id = campaign
            .organization_id
            .ok_or(RepositoryError::NotFound)?;
        let scheduled_at: DateTime<FixedOffset> = campaign.scheduled_at.into();

        // Only the editable columns; status and last_run_at belong to the executor
        let result = campaign_entity::Entity::update_many()
            .col_expr(
                campaign_entity::Column::Name,
                Expr::value(campaign.name.clone()),
            )
            .col_expr(campaign_entity::Column::ScheduledAt, Expr::value(scheduled_at))
            .col_expr(campaign_entity::Column::UpdatedAt, Expr::value(now_fixed()))
            .filter(campaign_entity::Column::Id.eq(campaign.id))
            .filter(campaign_entity::Column::OrganizationId.eq(organization_id))
            .filter(campaign_entity::Column::Status.is_in([
                CampaignStatus::Draft.to_string(),
                CampaignStatus::Scheduled.to_string(),
            ]))
            .exec(self.db.as_ref())
            .await?;

        let current = self
            .find_by_id(campaign.id, organization_id)
            .await?
            .ok_or(RepositoryError::NotFound)?;
        if result.rows_affected == 0 {
            return Err(RepositoryError::Conflict(format!(
                "Cannot update a campaign that is {}",
                current.status
            )));
        }
        Ok(current)
    }

    async fn update_status(&self, id: Uuid, status: CampaignStatus) -> Result<(), RepositoryError> {
        self.set_status(id, status).await
    }

    async fn transition_status(
        &self,
        id: Uuid,
        from: CampaignStatus,
        to: CampaignStatus,
    ) -> Result<bool, RepositoryError> {
        let result = campaign_entity::Entity::update_many()
            .col_expr(campaign_entity::Column::Status, Expr::value(to.to_string()))
            .col_expr(campaign_entity::Column::UpdatedAt, Expr::value(now_fixed()))
            .filter(campaign_entity::Column::Id.eq(id))
            .filter(campaign_entity::Column::Status.eq(from.to_string()))
            .exec(self.db.as_ref())
            .await?;

        Ok(result.rows_affected == 1)
    }

    async fn update_last_run_at(
        &self,
        id: Uuid,
        last_run_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let last_run_at: DateTime<FixedOffset> = last_run_at.into();
        let result = campaign_entity::Entity::update_many()
            .col_expr(campaign_entity::Column::LastRunAt, Expr::value(last_run_at))
            .col_expr(campaign_entity::Column::UpdatedAt, Expr::value(now_fixed()))
            .filter(campaign_entity::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await?;

        if result.rows_affected == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn finish_run(
        &self,
        id: Uuid,
        last_run_at: DateTime<Utc>,
        status: CampaignStatus,
    ) -> Result<(), RepositoryError> {
        let txn = self.db.begin().await?;
        let last_run_at: DateTime<FixedOffset> = last_run_at.into();

        let result = campaign_entity::Entity::update_many()
            .col_expr(campaign_entity::Column::LastRunAt, Expr::value(last_run_at))
            .col_expr(campaign_entity::Column::UpdatedAt, Expr::value(now_fixed()))
            .filter(campaign_entity::Column::Id.eq(id))
            .exec(&txn)
            .await?;
        if result.rows_affected == 0 {
            return Err(RepositoryError::NotFound);
        }

        // A pause issued mid-run wins over the post-run status
        campaign_entity::Entity::update_many()
            .col_expr(
                campaign_entity::Column::Status,
                Expr::value(status.to_string()),
            )
            .filter(campaign_entity::Column::Id.eq(id))
            .filter(campaign_entity::Column::Status.eq(CampaignStatus::Running.to_string()))
            .exec(&txn)
            .await?;

        txn.commit().await?;
        Ok(())
    }

    async fn delete(&self, id: Uuid, organization_id: Uuid) -> Result<(), RepositoryError> {
        let result = campaign_entity::Entity::delete_many()
            .filter(campaign_entity::Column::Id.eq(id))
            .filter(campaign_entity::Column::OrganizationId.eq(organization_id))
            .filter(campaign_entity::Column::Status.ne(CampaignStatus::Running.to_string()))
            .exec(self.db.as_ref())
            .await?;

        if result.rows_affected == 0 {
            return match self.find_by_id(id, organization_id).await? {
                Some(_) => Err(RepositoryError::Conflict(
                    "Cannot delete a running campaign. Pause it first.".to_string(),
                )),
                None => Err(RepositoryError::NotFound),
            };
        }
        Ok(())
    }

    async fn find_due_once_campaigns(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<Campaign>, RepositoryError> {
        let now: DateTime<FixedOffset> = now.into();
        let models = campaign_entity::Entity::find()
            .filter(campaign_entity::Column::ScheduleType.eq(ScheduleType::Once.to_string()))
            .filter(campaign_entity::Column::Status.eq(CampaignStatus::Scheduled.to_string()))
            .filter(campaign_entity::Column::ScheduledAt.lte(now))
            .filter(campaign_entity::Column::LastRunAt.is_null())
            .filter(has_organization())
            .order_by_asc(campaign_entity::Column::ScheduledAt)
            .all(self.db.as_ref())
            .await?;

        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn find_active_recurring_campaigns(&self) -> Result<Vec<Campaign>, RepositoryError> {
        let models = campaign_entity::Entity::find()
            .filter(campaign_entity::Column::ScheduleType.eq(ScheduleType::Recurring.to_string()))
            .filter(campaign_entity::Column::Status.is_in([
                CampaignStatus::Scheduled.to_string(),
                CampaignStatus::Running.to_string(),
            ]))
            .filter(has_organization())
            .all(self.db.as_ref())
            .await?;

        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn get_recipient_contact_ids(
        &self,
        campaign: &Campaign,
    ) -> Result<Vec<Uuid>, RepositoryError> {
        if let Some(contact_id) = campaign.contact_id {
            return Ok(vec![contact_id]);
        }
        if campaign.audience_ids.is_empty() {
            return Ok(Vec::new());
        }

        let ids = audience_contact_entity::Entity::find()
            .select_only()
            .column(audience_contact_entity::Column::ContactId)
            .distinct()
            .filter(
                audience_contact_entity::Column::AudienceId
                    .is_in(campaign.audience_ids.iter().copied()),
            )
            .into_tuple::<Uuid>()
            .all(self.db.as_ref())
            .await?;

        Ok(ids)
    }

    async fn try_mark_running(&self, id: Uuid) -> Result<bool, RepositoryError> {
        let result = campaign_entity::Entity::update_many()
            .col_expr(
                campaign_entity::Column::Status,
                Expr::value(CampaignStatus::Running.to_string()),
            )
            .col_expr(campaign_entity::Column::UpdatedAt, Expr::value(now_fixed()))
            .filter(campaign_entity::Column::Id.eq(id))
            .filter(campaign_entity::Column::Status.eq(CampaignStatus::Scheduled.to_string()))
            .filter(
                Condition::any()
                    .add(
                        campaign_entity::Column::ScheduleType
                            .eq(ScheduleType::Recurring.to_string()),
                    )
                    .add(campaign_entity::Column::LastRunAt.is_null()),
            )
            .exec(self.db.as_ref())
            .await?;

        Ok(result.rows_affected == 1)
    }

    async fn reset_stuck_running(
        &self,
        older_than: Duration,
    ) -> Result<(StuckCampaignReset, Vec<Uuid>), RepositoryError> {
        let cutoff: DateTime<FixedOffset> = (Utc::now() - older_than).into();
        let stuck = campaign_entity::Entity::find()
            .filter(campaign_entity::Column::Status.eq(CampaignStatus::Running.to_string()))
            .filter(campaign_entity::Column::UpdatedAt.lt(cutoff))
            .all(self.db.as_ref())
            .await?;

        let (recurring, once): (Vec<_>, Vec<_>) = stuck
            .iter()
            .partition(|m| m.schedule_type == ScheduleType::Recurring.to_string());

        let mut reset = StuckCampaignReset::default();
        for (ids, status) in [
            (recurring, CampaignStatus::Scheduled),
            (once, CampaignStatus::Failed),
        ] {
            if ids.is_empty() {
                continue;
            }
            let result = campaign_entity::Entity::update_many()
                .col_expr(
                    campaign_entity::Column::Status,
                    Expr::value(status.to_string()),
                )
                .col_expr(campaign_entity::Column::UpdatedAt, Expr::value(now_fixed()))
                .filter(campaign_entity::Column::Id.is_in(ids.iter().map(|m| m.id)))
                .filter(campaign_entity::Column::Status.eq(CampaignStatus::Running.to_string()))
                .exec(self.db.as_ref())
                .await?;

            match status {
                CampaignStatus::Scheduled => reset.rescheduled = result.rows_affected,
                _ => reset.failed = result.rows_affected,
            }
        }

        Ok((reset, stuck.into_iter().map(|m| m.id).collect()))
    }
}
