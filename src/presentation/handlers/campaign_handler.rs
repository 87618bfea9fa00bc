// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::{
    application::dto::campaign_request::{
        CampaignListResponseDto, CampaignLogsResponseDto, CampaignResponseDto,
        CreateCampaignRequestDto, ListCampaignsQueryDto, MessageResponseDto, PageQueryDto,
        RunCampaignResponseDto, UpdateCampaignRequestDto, DEFAULT_LOG_PAGE_LIMIT,
        DEFAULT_PAGE_LIMIT,
    },
    domain::{
        models::campaign::{Campaign, CampaignStatus, DomainError},
        repositories::{
            audience_repository::AudienceRepository,
            campaign_log_repository::CampaignLogRepository,
            campaign_repository::{CampaignQueryParams, CampaignRepository},
            contact_repository::ContactRepository,
            email_template_repository::EmailTemplateRepository,
        },
        use_cases::create_campaign::CreateCampaignUseCase,
    },
    presentation::{
        errors::AppError,
        extractors::tenant::{OrgId, UserId},
    },
    workers::campaign_worker::CampaignExecutor,
};

async fn load_campaign<C>(repo: &C, id: Uuid, organization_id: Uuid) -> Result<Campaign, AppError>
where
    C: CampaignRepository,
{
    repo.find_by_id(id, organization_id)
        .await?
        .ok_or_else(|| AppError::not_found("Campaign not found"))
}

/// 以读取时的状态为条件写入新状态
///
/// 读取之后状态已被执行器或其他请求改变时返回 409，不覆盖新状态
async fn apply_transition<C>(
    repo: &C,
    campaign: &Campaign,
    read_status: CampaignStatus,
    organization_id: Uuid,
) -> Result<(), AppError>
where
    C: CampaignRepository,
{
    if repo
        .transition_status(campaign.id, read_status, campaign.status)
        .await?
    {
        return Ok(());
    }

    let current = load_campaign(repo, campaign.id, organization_id).await?;
    Err(DomainError::InvalidStateTransition(format!(
        "Campaign status changed to {}",
        current.status
    ))
    .into())
}

/// 创建活动
pub async fn create_campaign<C, T, A, K>(
    Extension(campaign_repo): Extension<Arc<C>>,
    Extension(template_repo): Extension<Arc<T>>,
    Extension(audience_repo): Extension<Arc<A>>,
    Extension(contact_repo): Extension<Arc<K>>,
    OrgId(organization_id): OrgId,
    UserId(user_id): UserId,
    Json(payload): Json<CreateCampaignRequestDto>,
) -> Result<impl IntoResponse, AppError>
where
    C: CampaignRepository + 'static,
    T: EmailTemplateRepository + 'static,
    A: AudienceRepository + 'static,
    K: ContactRepository + 'static,
{
    payload.validate()?;

    let use_case =
        CreateCampaignUseCase::new(campaign_repo, template_repo, audience_repo, contact_repo);
    let campaign = use_case
        .execute(payload.into_command(organization_id, user_id))
        .await?;

    info!(
        "Campaign {} created for organization {}",
        campaign.id, organization_id
    );
    Ok((
        StatusCode::CREATED,
        Json(CampaignResponseDto {
            message: "Campaign created successfully",
            campaign,
        }),
    ))
}

/// 分页列出活动，可按状态过滤
pub async fn list_campaigns<C>(
    Extension(campaign_repo): Extension<Arc<C>>,
    OrgId(organization_id): OrgId,
    Query(query): Query<ListCampaignsQueryDto>,
) -> Result<impl IntoResponse, AppError>
where
    C: CampaignRepository + 'static,
{
    let status = match query.status.as_deref() {
        None | Some("") => None,
        Some(raw) => Some(raw.parse::<CampaignStatus>()?),
    };
    let paging = query.paging();
    let page = paging.page();
    let limit = paging.limit_or(DEFAULT_PAGE_LIMIT);

    let (campaigns, total) = campaign_repo
        .find_all_by_org(CampaignQueryParams {
            organization_id,
            status,
            page,
            limit,
        })
        .await?;

    Ok(Json(CampaignListResponseDto {
        campaigns,
        total,
        page,
        limit,
    }))
}

/// 获取单个活动
pub async fn get_campaign<C>(
    Extension(campaign_repo): Extension<Arc<C>>,
    OrgId(organization_id): OrgId,
    Path(campaign_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError>
where
    C: CampaignRepository + 'static,
{
    let campaign = load_campaign(campaign_repo.as_ref(), campaign_id, organization_id).await?;
    Ok(Json(campaign))
}

/// 修改活动名称或调度时间，仅限草稿与待调度的活动
pub async fn update_campaign<C>(
    Extension(campaign_repo): Extension<Arc<C>>,
    OrgId(organization_id): OrgId,
    Path(campaign_id): Path<Uuid>,
    Json(payload): Json<UpdateCampaignRequestDto>,
) -> Result<impl IntoResponse, AppError>
where
    C: CampaignRepository + 'static,
{
    let mut campaign =
        load_campaign(campaign_repo.as_ref(), campaign_id, organization_id).await?;
    campaign.ensure_editable()?;
    payload.validate()?;

    if let Some(name) = payload.name {
        let name = name.trim();
        if name.is_empty() {
            return Err(DomainError::ValidationError("Name cannot be empty".to_string()).into());
        }
        campaign.name = name.to_string();
    }
    if let Some(scheduled_at) = payload.scheduled_at {
        campaign.scheduled_at = scheduled_at;
    }

    let campaign = campaign_repo.update(&campaign).await?;
    Ok(Json(CampaignResponseDto {
        message: "Campaign updated successfully",
        campaign,
    }))
}

/// 删除活动，执行中的活动需先暂停
pub async fn delete_campaign<C>(
    Extension(campaign_repo): Extension<Arc<C>>,
    OrgId(organization_id): OrgId,
    Path(campaign_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError>
where
    C: CampaignRepository + 'static,
{
    let campaign = load_campaign(campaign_repo.as_ref(), campaign_id, organization_id).await?;
    campaign.ensure_deletable()?;

    campaign_repo.delete(campaign_id, organization_id).await?;
    info!("Campaign {} deleted", campaign_id);

    Ok(Json(MessageResponseDto {
        message: "Campaign deleted successfully",
    }))
}

/// 暂停活动
///
/// 对执行中的活动只阻止后续调度，本次执行结束后保持暂停
pub async fn pause_campaign<C>(
    Extension(campaign_repo): Extension<Arc<C>>,
    OrgId(organization_id): OrgId,
    Path(campaign_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError>
where
    C: CampaignRepository + 'static,
{
    let mut campaign =
        load_campaign(campaign_repo.as_ref(), campaign_id, organization_id).await?;
    let read_status = campaign.status;
    campaign.pause()?;
    apply_transition(campaign_repo.as_ref(), &campaign, read_status, organization_id).await?;

    Ok(Json(MessageResponseDto {
        message: "Campaign paused successfully",
    }))
}

/// 恢复已暂停的活动，或发布草稿
pub async fn resume_campaign<C>(
    Extension(campaign_repo): Extension<Arc<C>>,
    OrgId(organization_id): OrgId,
    Path(campaign_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError>
where
    C: CampaignRepository + 'static,
{
    let mut campaign =
        load_campaign(campaign_repo.as_ref(), campaign_id, organization_id).await?;
    let read_status = campaign.status;
    campaign.resume()?;
    apply_transition(campaign_repo.as_ref(), &campaign, read_status, organization_id).await?;

    Ok(Json(MessageResponseDto {
        message: "Campaign resumed successfully",
    }))
}

/// 立即执行活动
///
/// 与调度器相同：创建作业并派发执行器，不等待发送完成
pub async fn run_campaign<C>(
    Extension(campaign_repo): Extension<Arc<C>>,
    Extension(executor): Extension<Arc<CampaignExecutor>>,
    OrgId(organization_id): OrgId,
    Path(campaign_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError>
where
    C: CampaignRepository + 'static,
{
    let campaign = load_campaign(campaign_repo.as_ref(), campaign_id, organization_id).await?;

    if campaign.already_ran_once() {
        return Err(DomainError::InvalidStateTransition(
            "One-time campaign already executed".to_string(),
        )
        .into());
    }
    if campaign.status != CampaignStatus::Scheduled {
        return Err(DomainError::InvalidStateTransition(format!(
            "Can only run scheduled campaigns, campaign is {}",
            campaign.status
        ))
        .into());
    }

    let run = executor.dispatch(organization_id, campaign_id).await?;
    info!(
        "Manual run of campaign {} dispatched as job {}",
        campaign_id, run.job_id
    );

    Ok((
        StatusCode::ACCEPTED,
        Json(RunCampaignResponseDto {
            message: "Campaign run dispatched",
            campaign_id,
            job_id: run.job_id,
        }),
    ))
}

/// 分页获取活动投递日志及统计
pub async fn get_campaign_logs<C, L>(
    Extension(campaign_repo): Extension<Arc<C>>,
    Extension(log_repo): Extension<Arc<L>>,
    OrgId(organization_id): OrgId,
    Path(campaign_id): Path<Uuid>,
    Query(paging): Query<PageQueryDto>,
) -> Result<impl IntoResponse, AppError>
where
    C: CampaignRepository + 'static,
    L: CampaignLogRepository + 'static,
{
    load_campaign(campaign_repo.as_ref(), campaign_id, organization_id).await?;

    let page = paging.page();
    let limit = paging.limit_or(DEFAULT_LOG_PAGE_LIMIT);
    let (logs, total) = log_repo.find_by_campaign(campaign_id, page, limit).await?;
    let stats = log_repo.stats_by_campaign(campaign_id).await?;

    Ok(Json(CampaignLogsResponseDto::new(
        logs, total, page, limit, stats,
    )))
}
