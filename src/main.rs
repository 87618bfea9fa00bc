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

use crmrs::config::settings::Settings;
use crmrs::domain::repositories::{
    background_job_repository::BackgroundJobRepository,
    campaign_log_repository::CampaignLogRepository, campaign_repository::CampaignRepository,
    contact_repository::ContactRepository, email_template_repository::EmailTemplateRepository,
};
use crmrs::domain::services::notification_service::{NotificationService, NotificationSink};
use crmrs::infrastructure::database::connection;
use crmrs::infrastructure::metrics;
use crmrs::infrastructure::repositories::{
    background_job_repo_impl::BackgroundJobRepositoryImpl,
    campaign_log_repo_impl::CampaignLogRepositoryImpl, campaign_repo_impl::CampaignRepositoryImpl,
    contact_repo_impl::ContactRepositoryImpl,
    email_template_repo_impl::EmailTemplateRepositoryImpl,
    notification_repo_impl::NotificationRepositoryImpl,
};
use crmrs::infrastructure::services::email_service_impl::build_email_sender;
use crmrs::presentation::routes;
use crmrs::queue::scheduler::CampaignScheduler;
use crmrs::utils::telemetry;
use crmrs::workers::campaign_worker::CampaignExecutor;
use crmrs::workers::manager::WorkerManager;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

/// 主函数
///
/// 应用程序入口点，负责初始化所有组件并启动服务
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize logging
    telemetry::init_telemetry();
    info!("Starting crmrs...");

    // 2. Load configuration
    let settings = Settings::new()?;
    info!("Configuration loaded");

    // 3. Connect to database and run migrations
    let db = Arc::new(connection::connect_and_migrate(&settings.database).await?);
    info!("Database connection established");

    // Initialize Prometheus Metrics
    metrics::init_metrics(&settings.metrics);

    // 4. Initialize Components
    let campaign_repo: Arc<dyn CampaignRepository> =
        Arc::new(CampaignRepositoryImpl::new(db.clone()));
    let log_repo: Arc<dyn CampaignLogRepository> =
        Arc::new(CampaignLogRepositoryImpl::new(db.clone()));
    let job_repo: Arc<dyn BackgroundJobRepository> =
        Arc::new(BackgroundJobRepositoryImpl::new(db.clone()));
    let template_repo: Arc<dyn EmailTemplateRepository> =
        Arc::new(EmailTemplateRepositoryImpl::new(db.clone()));
    let contact_repo: Arc<dyn ContactRepository> =
        Arc::new(ContactRepositoryImpl::new(db.clone()));
    let notifier: Arc<dyn NotificationSink> = Arc::new(NotificationService::new(Arc::new(
        NotificationRepositoryImpl::new(db.clone()),
    )));
    let email_sender = build_email_sender(&settings.smtp);

    let executor = Arc::new(CampaignExecutor::new(
        campaign_repo.clone(),
        log_repo,
        job_repo.clone(),
        template_repo,
        contact_repo,
        email_sender,
        notifier,
    ));

    // 5. Start Workers
    let scheduler = Arc::new(CampaignScheduler::new(
        campaign_repo,
        job_repo,
        executor.clone(),
        settings.scheduler.clone(),
    ));
    let mut worker_manager = WorkerManager::new(scheduler);
    worker_manager.start_workers().await;

    // 6. Start HTTP server
    let app = routes::app(db, executor);

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { worker_manager.wait_for_shutdown().await })
        .await?;

    info!("Server stopped");
    Ok(())
}
