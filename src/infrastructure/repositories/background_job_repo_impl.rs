// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::background_job::{BackgroundJobLog, JobStatus, JobType};
use crate::domain::repositories::background_job_repository::BackgroundJobRepository;
use crate::domain::repositories::campaign_repository::RepositoryError;
use crate::infrastructure::database::entities::background_job_log as job_entity;
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use std::sync::Arc;
use uuid::Uuid;

/// 后台作业仓库实现
#[derive(Clone)]
pub struct BackgroundJobRepositoryImpl {
    db: Arc<DatabaseConnection>,
}

impl BackgroundJobRepositoryImpl {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

fn now_fixed() -> DateTime<FixedOffset> {
    Utc::now().into()
}

impl From<job_entity::Model> for BackgroundJobLog {
    fn from(model: job_entity::Model) -> Self {
        Self {
            id: model.id,
            job_type: model.job_type.parse().unwrap_or(JobType::CampaignRun),
            organization_id: model.organization_id,
            reference_id: model.reference_id,
            status: model.status.parse().unwrap_or(JobStatus::Queued),
            total_records: model.total_records,
            processed_records: model.processed_records,
            error_message: model.error_message,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

impl From<BackgroundJobLog> for job_entity::ActiveModel {
    fn from(job: BackgroundJobLog) -> Self {
        Self {
            id: Set(job.id),
            job_type: Set(job.job_type.to_string()),
            organization_id: Set(job.organization_id),
            reference_id: Set(job.reference_id),
            status: Set(job.status.to_string()),
            total_records: Set(job.total_records),
            processed_records: Set(job.processed_records),
            error_message: Set(job.error_message),
            created_at: Set(job.created_at.into()),
            updated_at: Set(job.updated_at.into()),
        }
    }
}

#[async_trait]
impl BackgroundJobRepository for BackgroundJobRepositoryImpl {
    async fn create(&self, job: &BackgroundJobLog) -> Result<BackgroundJobLog, RepositoryError> {
        let model: job_entity::ActiveModel = job.clone().into();
        let inserted = model.insert(self.db.as_ref()).await?;
        Ok(inserted.into())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<BackgroundJobLog>, RepositoryError> {
        let model = job_entity::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?;

        Ok(model.map(Into::into))
    }

    async fn update(&self, job: &BackgroundJobLog) -> Result<BackgroundJobLog, RepositoryError> {
        let mut model: job_entity::ActiveModel = job.clone().into();
        model.updated_at = Set(now_fixed());

        match model.update(self.db.as_ref()).await {
            Ok(updated) => Ok(updated.into()),
            Err(DbErr::RecordNotUpdated) => Err(RepositoryError::NotFound),
            Err(e) => Err(e.into()),
        }
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: JobStatus,
        error_message: Option<String>,
    ) -> Result<(), RepositoryError> {
        let mut update = job_entity::Entity::update_many()
            .col_expr(job_entity::Column::Status, Expr::value(status.to_string()))
            .col_expr(job_entity::Column::UpdatedAt, Expr::value(now_fixed()));

        if error_message.is_some() {
            update = update.col_expr(job_entity::Column::ErrorMessage, Expr::value(error_message));
        }

        let result = update
            .filter(job_entity::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await?;

        if result.rows_affected == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn update_progress(&self, id: Uuid, processed: i32) -> Result<(), RepositoryError> {
        let result = job_entity::Entity::update_many()
            .col_expr(job_entity::Column::ProcessedRecords, Expr::value(processed))
            .col_expr(job_entity::Column::UpdatedAt, Expr::value(now_fixed()))
            .filter(job_entity::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await?;

        if result.rows_affected == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn find_by_type(
        &self,
        job_type: JobType,
        status: Option<JobStatus>,
    ) -> Result<Vec<BackgroundJobLog>, RepositoryError> {
        let mut query =
            job_entity::Entity::find().filter(job_entity::Column::JobType.eq(job_type.to_string()));

        if let Some(status) = status {
            query = query.filter(job_entity::Column::Status.eq(status.to_string()));
        }

        let models = query
            .order_by_desc(job_entity::Column::CreatedAt)
            .all(self.db.as_ref())
            .await?;

        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn find_by_org(
        &self,
        organization_id: Uuid,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<BackgroundJobLog>, u64), RepositoryError> {
        let paginator = job_entity::Entity::find()
            .filter(job_entity::Column::OrganizationId.eq(organization_id))
            .order_by_desc(job_entity::Column::CreatedAt)
            .paginate(self.db.as_ref(), limit.max(1));

        let total = paginator.num_items().await?;
        let models = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((models.into_iter().map(Into::into).collect(), total))
    }

    async fn fail_unfinished_for_references(
        &self,
        job_type: JobType,
        reference_ids: &[Uuid],
        error_message: &str,
    ) -> Result<u64, RepositoryError> {
        if reference_ids.is_empty() {
            return Ok(0);
        }

        let result = job_entity::Entity::update_many()
            .col_expr(
                job_entity::Column::Status,
                Expr::value(JobStatus::Failed.to_string()),
            )
            .col_expr(
                job_entity::Column::ErrorMessage,
                Expr::value(error_message.to_string()),
            )
            .col_expr(job_entity::Column::UpdatedAt, Expr::value(now_fixed()))
            .filter(job_entity::Column::JobType.eq(job_type.to_string()))
            .filter(job_entity::Column::ReferenceId.is_in(reference_ids.iter().copied()))
            .filter(job_entity::Column::Status.is_in([
                JobStatus::Queued.to_string(),
                JobStatus::Running.to_string(),
            ]))
            .exec(self.db.as_ref())
            .await?;

        Ok(result.rows_affected)
    }
}
