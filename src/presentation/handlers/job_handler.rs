// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{
    extract::{Extension, Path, Query},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    application::dto::{
        campaign_request::{PageQueryDto, DEFAULT_PAGE_LIMIT},
        job_response::JobListResponseDto,
    },
    domain::repositories::background_job_repository::BackgroundJobRepository,
    presentation::{errors::AppError, extractors::tenant::OrgId},
};

/// 获取后台作业，其他组织的作业视为不存在
pub async fn get_job<J>(
    Extension(job_repo): Extension<Arc<J>>,
    OrgId(organization_id): OrgId,
    Path(job_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError>
where
    J: BackgroundJobRepository + 'static,
{
    let job = job_repo
        .find_by_id(job_id)
        .await?
        .filter(|job| job.organization_id == organization_id)
        .ok_or_else(|| AppError::not_found("Job not found"))?;

    Ok(Json(job))
}

/// 分页列出组织内的后台作业
pub async fn list_jobs<J>(
    Extension(job_repo): Extension<Arc<J>>,
    OrgId(organization_id): OrgId,
    Query(paging): Query<PageQueryDto>,
) -> Result<impl IntoResponse, AppError>
where
    J: BackgroundJobRepository + 'static,
{
    let page = paging.page();
    let limit = paging.limit_or(DEFAULT_PAGE_LIMIT);
    let (jobs, total) = job_repo.find_by_org(organization_id, page, limit).await?;

    Ok(Json(JobListResponseDto {
        jobs,
        total,
        page,
        limit,
    }))
}
