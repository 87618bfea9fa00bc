// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::infrastructure::repositories::{
    audience_repo_impl::AudienceRepositoryImpl,
    background_job_repo_impl::BackgroundJobRepositoryImpl,
    campaign_log_repo_impl::CampaignLogRepositoryImpl, campaign_repo_impl::CampaignRepositoryImpl,
    contact_repo_impl::ContactRepositoryImpl,
    email_template_repo_impl::EmailTemplateRepositoryImpl,
};
use crate::presentation::handlers::{campaign_handler, job_handler};
use crate::workers::campaign_worker::CampaignExecutor;
use axum::{
    routing::{get, post},
    Extension, Router,
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// 创建应用路由
///
/// # 返回值
///
/// 返回未挂载依赖的路由，依赖由 [`app`] 通过 `Extension` 注入
pub fn routes() -> Router {
    let public_routes = Router::new()
        .route("/health", get(health_check))
        .route("/v1/version", get(version));

    let campaign_routes = Router::new()
        .route(
            "/v1/campaigns",
            post(
                campaign_handler::create_campaign::<
                    CampaignRepositoryImpl,
                    EmailTemplateRepositoryImpl,
                    AudienceRepositoryImpl,
                    ContactRepositoryImpl,
                >,
            )
            .get(campaign_handler::list_campaigns::<CampaignRepositoryImpl>),
        )
        .route(
            "/v1/campaigns/{id}",
            get(campaign_handler::get_campaign::<CampaignRepositoryImpl>)
                .put(campaign_handler::update_campaign::<CampaignRepositoryImpl>)
                .delete(campaign_handler::delete_campaign::<CampaignRepositoryImpl>),
        )
        .route(
            "/v1/campaigns/{id}/pause",
            post(campaign_handler::pause_campaign::<CampaignRepositoryImpl>),
        )
        .route(
            "/v1/campaigns/{id}/resume",
            post(campaign_handler::resume_campaign::<CampaignRepositoryImpl>),
        )
        .route(
            "/v1/campaigns/{id}/run",
            post(campaign_handler::run_campaign::<CampaignRepositoryImpl>),
        )
        .route(
            "/v1/campaigns/{id}/logs",
            get(campaign_handler::get_campaign_logs::<
                CampaignRepositoryImpl,
                CampaignLogRepositoryImpl,
            >),
        );

    let job_routes = Router::new()
        .route(
            "/v1/jobs",
            get(job_handler::list_jobs::<BackgroundJobRepositoryImpl>),
        )
        .route(
            "/v1/jobs/{id}",
            get(job_handler::get_job::<BackgroundJobRepositoryImpl>),
        );

    Router::new()
        .merge(public_routes)
        .merge(campaign_routes)
        .merge(job_routes)
}

/// 创建挂载了仓库与执行器的完整应用
///
/// # 参数
///
/// * `db` - 数据库连接
/// * `executor` - 手动执行活动时使用的执行器
pub fn app(db: Arc<DatabaseConnection>, executor: Arc<CampaignExecutor>) -> Router {
    routes()
        .layer(Extension(Arc::new(CampaignRepositoryImpl::new(db.clone()))))
        .layer(Extension(Arc::new(CampaignLogRepositoryImpl::new(
            db.clone(),
        ))))
        .layer(Extension(Arc::new(BackgroundJobRepositoryImpl::new(
            db.clone(),
        ))))
        .layer(Extension(Arc::new(EmailTemplateRepositoryImpl::new(
            db.clone(),
        ))))
        .layer(Extension(Arc::new(AudienceRepositoryImpl::new(db.clone()))))
        .layer(Extension(Arc::new(ContactRepositoryImpl::new(db))))
        .layer(Extension(executor))
        .layer(TraceLayer::new_for_http())
}

/// 健康检查端点
///
/// # 返回值
///
/// 返回"OK"字符串
pub async fn health_check() -> &'static str {
    "OK"
}

/// 版本信息端点
///
/// # 返回值
///
/// 返回应用版本号
pub async fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
