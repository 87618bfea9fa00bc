// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::background_job::{BackgroundJobLog, JobStatus};
use crate::domain::models::campaign::CampaignStatus;
use crate::domain::models::campaign_log::{CampaignLog, DeliveryStatus};
use crate::domain::repositories::background_job_repository::BackgroundJobRepository;
use crate::domain::repositories::campaign_log_repository::CampaignLogRepository;
use crate::domain::repositories::campaign_repository::{CampaignRepository, RepositoryError};
use crate::domain::repositories::contact_repository::ContactRepository;
use crate::domain::repositories::email_template_repository::EmailTemplateRepository;
use crate::domain::services::email_service::EmailSender;
use crate::domain::services::notification_service::NotificationSink;
use crate::domain::services::template_renderer::TemplateRenderer;
use crate::infrastructure::metrics::{
    CAMPAIGN_EMAILS_FAILED, CAMPAIGN_EMAILS_SENT, CAMPAIGN_RUNS, CAMPAIGN_RUNS_DISPATCHED,
    CAMPAIGN_RUN_DURATION,
};
use chrono::Utc;
use metrics::{counter, histogram};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

/// 活动执行错误
///
/// 前四种是守卫失败，在本地处理后以对应信息结束作业；
/// 仓库错误会中止当前步骤
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    InvalidState(String),
    #[error("No recipients found")]
    NoRecipients,
    #[error("Campaign is already running")]
    AlreadyRunning,
    /// 加载模板、收件人或联系人失败，活动已被标记为失败
    #[error("{0}")]
    StepFailed(&'static str, #[source] RepositoryError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl ExecutionError {
    fn outcome(&self) -> &'static str {
        match self {
            ExecutionError::NotFound(_) => "not_found",
            ExecutionError::InvalidState(_) => "invalid_state",
            ExecutionError::NoRecipients => "no_recipients",
            ExecutionError::AlreadyRunning => "already_running",
            ExecutionError::StepFailed(..) | ExecutionError::Repository(_) => "error",
        }
    }
}

/// 一次执行的统计
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// 加载到的联系人数
    pub total: usize,
    pub sent: usize,
    pub failed: usize,
    /// 没有邮箱而被略过的联系人
    pub skipped: usize,
}

/// 已派发的执行
pub struct DispatchedRun {
    pub campaign_id: Uuid,
    pub job_id: Uuid,
    pub handle: JoinHandle<Result<RunSummary, ExecutionError>>,
}

/// 活动执行器
///
/// 端到端地运行一次活动：守卫检查、原子地切换到 running、逐个收件人
/// 渲染并发送、写入投递日志、更新活动状态、发出完成通知。
/// 所有协作方在构造时注入。
pub struct CampaignExecutor {
    campaigns: Arc<dyn CampaignRepository>,
    logs: Arc<dyn CampaignLogRepository>,
    jobs: Arc<dyn BackgroundJobRepository>,
    templates: Arc<dyn EmailTemplateRepository>,
    contacts: Arc<dyn ContactRepository>,
    email_sender: Arc<dyn EmailSender>,
    notifier: Arc<dyn NotificationSink>,
}

impl CampaignExecutor {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        campaigns: Arc<dyn CampaignRepository>,
        logs: Arc<dyn CampaignLogRepository>,
        jobs: Arc<dyn BackgroundJobRepository>,
        templates: Arc<dyn EmailTemplateRepository>,
        contacts: Arc<dyn ContactRepository>,
        email_sender: Arc<dyn EmailSender>,
        notifier: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            campaigns,
            logs,
            jobs,
            templates,
            contacts,
            email_sender,
            notifier,
        }
    }

    /// 创建 campaign_run 作业并在后台任务中执行
    ///
    /// 只等待作业写入，不等待执行完成
    ///
    /// # 参数
    ///
    /// * `organization_id` - 活动所属组织，写入作业记录
    /// * `campaign_id` - 活动ID
    ///
    /// # 返回值
    ///
    /// * `Ok(DispatchedRun)` - 作业ID与执行任务句柄
    /// * `Err(RepositoryError)` - 作业创建失败，未派发
    pub async fn dispatch(
        self: &Arc<Self>,
        organization_id: Uuid,
        campaign_id: Uuid,
    ) -> Result<DispatchedRun, RepositoryError> {
        let job = self
            .jobs
            .create(&BackgroundJobLog::campaign_run(organization_id, campaign_id))
            .await?;

        let executor = Arc::clone(self);
        let job_id = job.id;
        let span = info_span!("campaign_run", %campaign_id, %job_id);
        let handle = tokio::spawn(
            async move { executor.execute(campaign_id, job_id).await }.instrument(span),
        );

        counter!(CAMPAIGN_RUNS_DISPATCHED).increment(1);
        Ok(DispatchedRun {
            campaign_id,
            job_id,
            handle,
        })
    }

    /// 执行一次活动并结束对应作业
    ///
    /// 成功时作业标记为 success；任何错误都把作业标记为 failed，
    /// 错误信息即作业的 error_message
    pub async fn execute(
        &self,
        campaign_id: Uuid,
        job_id: Uuid,
    ) -> Result<RunSummary, ExecutionError> {
        let started = Instant::now();
        let result = self.run(campaign_id, job_id).await;

        let finalize = match &result {
            Ok(summary) => {
                info!(
                    "Campaign {} completed: {} emails sent, {} failed",
                    campaign_id, summary.sent, summary.failed
                );
                self.jobs.update_status(job_id, JobStatus::Success, None).await
            }
            Err(e) => {
                match e {
                    ExecutionError::StepFailed(..) | ExecutionError::Repository(_) => {
                        error!("Campaign {} run failed: {:?}", campaign_id, e)
                    }
                    _ => info!("Campaign {} run skipped: {}", campaign_id, e),
                }
                self.jobs
                    .update_status(job_id, JobStatus::Failed, Some(e.to_string()))
                    .await
            }
        };
        if let Err(e) = finalize {
            error!("Failed to finalize job {}: {}", job_id, e);
        }

        let outcome = match &result {
            Ok(_) => "success",
            Err(e) => e.outcome(),
        };
        counter!(CAMPAIGN_RUNS, "outcome" => outcome).increment(1);
        histogram!(CAMPAIGN_RUN_DURATION).record(started.elapsed().as_secs_f64());

        result
    }

    async fn run(&self, campaign_id: Uuid, job_id: Uuid) -> Result<RunSummary, ExecutionError> {
        self.jobs
            .update_status(job_id, JobStatus::Running, None)
            .await?;

        // Scheduler context, no tenant filter
        let campaign = self
            .campaigns
            .find_by_id_unscoped(campaign_id)
            .await?
            .ok_or_else(|| ExecutionError::NotFound("Campaign not found".to_string()))?;

        if campaign.status == CampaignStatus::Completed {
            return Err(ExecutionError::InvalidState(
                "Campaign already completed".to_string(),
            ));
        }

        let Some(organization_id) = campaign.valid_organization_id() else {
            warn!("Campaign {} has an empty organization_id", campaign_id);
            return Err(ExecutionError::InvalidState(
                "Invalid organization_id".to_string(),
            ));
        };

        if campaign.already_ran_once() {
            // Self-heal: a once campaign that has run is completed
            self.campaigns
                .transition_status(campaign_id, campaign.status, CampaignStatus::Completed)
                .await?;
            return Err(ExecutionError::InvalidState(
                "One-time campaign already executed".to_string(),
            ));
        }

        match campaign.status {
            CampaignStatus::Scheduled => {}
            CampaignStatus::Running => return Err(ExecutionError::AlreadyRunning),
            other => {
                return Err(ExecutionError::InvalidState(format!(
                    "Campaign is {}",
                    other
                )))
            }
        }

        if !self.campaigns.try_mark_running(campaign_id).await? {
            return Err(ExecutionError::AlreadyRunning);
        }
        debug!("Campaign {} marked running", campaign_id);

        let template = match self
            .templates
            .find_by_id(campaign.template_id, organization_id)
            .await
        {
            Ok(Some(template)) => template,
            Ok(None) => {
                self.mark_campaign_failed(campaign_id).await;
                return Err(ExecutionError::NotFound("Template not found".to_string()));
            }
            Err(e) => {
                self.mark_campaign_failed(campaign_id).await;
                return Err(ExecutionError::StepFailed("Failed to load template", e));
            }
        };

        let contact_ids = match self.campaigns.get_recipient_contact_ids(&campaign).await {
            Ok(ids) => ids,
            Err(e) => {
                self.mark_campaign_failed(campaign_id).await;
                return Err(ExecutionError::StepFailed("Failed to get recipients", e));
            }
        };

        if contact_ids.is_empty() {
            // An empty audience is not a campaign failure; a pause issued meanwhile wins
            if !self
                .campaigns
                .transition_status(campaign_id, CampaignStatus::Running, CampaignStatus::Completed)
                .await?
            {
                debug!("Campaign {} left running state before completion", campaign_id);
            }
            return Err(ExecutionError::NoRecipients);
        }

        let contacts = match self.contacts.find_by_ids(&contact_ids, organization_id).await {
            Ok(contacts) => contacts,
            Err(e) => {
                self.mark_campaign_failed(campaign_id).await;
                return Err(ExecutionError::StepFailed(
                    "Failed to fetch contact details",
                    e,
                ));
            }
        };

        if let Some(mut job) = self.jobs.find_by_id(job_id).await? {
            job.total_records = Some(contacts.len() as i32);
            self.jobs.update(&job).await?;
        }

        let mut summary = RunSummary {
            total: contacts.len(),
            ..Default::default()
        };

        for contact in &contacts {
            if contact.email.trim().is_empty() {
                debug!("Contact {} has no email, omitted", contact.id);
                summary.skipped += 1;
                continue;
            }

            let rendered = TemplateRenderer::render(&template, contact);
            let log = self
                .logs
                .create(&CampaignLog::queued(
                    campaign_id,
                    contact.id,
                    contact.email.clone(),
                    rendered.subject.clone(),
                ))
                .await?;

            match self
                .email_sender
                .send(
                    &contact.email,
                    &rendered.subject,
                    &rendered.html_body,
                    &rendered.plain_text_body,
                )
                .await
            {
                Ok(()) => {
                    self.logs
                        .update_status(log.id, DeliveryStatus::Sent, None)
                        .await?;
                    summary.sent += 1;
                    counter!(CAMPAIGN_EMAILS_SENT).increment(1);
                }
                Err(e) => {
                    warn!("Failed to send campaign email to {}: {}", contact.email, e);
                    self.logs
                        .update_status(log.id, DeliveryStatus::Failed, Some(e.0))
                        .await?;
                    summary.failed += 1;
                    counter!(CAMPAIGN_EMAILS_FAILED).increment(1);
                }
            }
        }

        self.jobs
            .update_progress(job_id, summary.sent as i32)
            .await?;

        self.campaigns
            .finish_run(campaign_id, Utc::now(), campaign.status_after_run())
            .await?;

        self.notifier
            .notify_campaign_sent(organization_id, campaign.created_by, campaign_id, summary.sent)
            .await;

        Ok(summary)
    }

    async fn mark_campaign_failed(&self, campaign_id: Uuid) {
        match self
            .campaigns
            .transition_status(campaign_id, CampaignStatus::Running, CampaignStatus::Failed)
            .await
        {
            Ok(true) => {}
            Ok(false) => debug!("Campaign {} left running state before failing", campaign_id),
            Err(e) => error!("Failed to mark campaign {} as failed: {}", campaign_id, e),
        }
    }
}
