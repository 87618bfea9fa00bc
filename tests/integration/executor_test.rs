// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::TestContext;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use crmrs::domain::models::background_job::JobStatus;
use crmrs::domain::models::campaign::{Campaign, CampaignStatus, Recurrence, ScheduleType};
use crmrs::domain::models::campaign_log::DeliveryStatus;
use crmrs::domain::models::email_template::EmailTemplate;
use crmrs::domain::repositories::background_job_repository::BackgroundJobRepository;
use crmrs::domain::repositories::campaign_log_repository::CampaignLogRepository;
use crmrs::domain::repositories::campaign_repository::{
    CampaignQueryParams, CampaignRepository, RepositoryError, StuckCampaignReset,
};
use crmrs::domain::repositories::email_template_repository::EmailTemplateRepository;
use crmrs::domain::services::email_service::{EmailError, EmailSender};
use crmrs::infrastructure::repositories::campaign_repo_impl::CampaignRepositoryImpl;
use crmrs::workers::campaign_worker::{CampaignExecutor, ExecutionError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use uuid::Uuid;

/// 单个收件人发送失败不会中断其余收件人，发送计数等于 sent 日志数
#[tokio::test]
async fn test_partial_failure_is_isolated() {
    let ctx = TestContext::new().await;
    let template = ctx.seed_template().await;

    let mut contacts = Vec::new();
    for i in 1..=5 {
        contacts.push(
            ctx.seed_contact(&format!("Agent{}", i), &format!("agent{}@x.com", i))
                .await,
        );
    }
    let members: Vec<_> = contacts.iter().collect();
    let audience = ctx.seed_audience(&members).await;
    ctx.sender.fail_for("agent2@x.com");

    let mut campaign = ctx.once_campaign(&template);
    campaign.audience_ids = vec![audience.id];
    let campaign = ctx.save(campaign).await;

    let run = ctx.executor.dispatch(ctx.org, campaign.id).await.unwrap();
    let job_id = run.job_id;
    let summary = run.handle.await.unwrap().unwrap();
    assert_eq!(summary.total, 5);
    assert_eq!(summary.sent, 4);
    assert_eq!(summary.failed, 1);

    let mut attempted = ctx.sender.attempts();
    attempted.sort();
    assert_eq!(attempted.len(), 5);
    assert_eq!(attempted[4], "agent5@x.com");

    let stats = ctx.logs.stats_by_campaign(campaign.id).await.unwrap();
    assert_eq!(stats.get(&DeliveryStatus::Sent), Some(&4));
    assert_eq!(stats.get(&DeliveryStatus::Failed), Some(&1));
    assert_eq!(stats.get(&DeliveryStatus::Queued), None);

    let (logs, _) = ctx.logs.find_by_campaign(campaign.id, 1, 50).await.unwrap();
    let failed = logs
        .iter()
        .find(|log| log.status == DeliveryStatus::Failed)
        .unwrap();
    assert_eq!(failed.recipient_email, "agent2@x.com");
    assert!(failed
        .error_message
        .as_deref()
        .unwrap()
        .contains("mailbox unavailable"));
    assert!(failed.sent_at.is_none());

    let job = ctx.jobs.find_by_id(job_id).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Success);
    assert_eq!(job.processed_records, Some(4));
    assert_eq!(job.total_records, Some(5));

    assert_eq!(
        ctx.reload(campaign.id).await.status,
        CampaignStatus::Completed
    );
    assert_eq!(ctx.notifier.notifications()[0].3, 4);
}

/// 同时属于两个受众的联系人只收到一封邮件
#[tokio::test]
async fn test_overlapping_audiences_are_deduplicated() {
    let ctx = TestContext::new().await;
    let template = ctx.seed_template().await;
    let x = ctx.seed_contact("Xavier", "x@x.com").await;
    let y = ctx.seed_contact("Yara", "y@x.com").await;
    let z = ctx.seed_contact("Zed", "z@x.com").await;
    let first = ctx.seed_audience(&[&x, &y]).await;
    let second = ctx.seed_audience(&[&y, &z]).await;

    let mut campaign = ctx.once_campaign(&template);
    campaign.audience_ids = vec![first.id, second.id];
    let campaign = ctx.save(campaign).await;

    let mut recipients = ctx
        .campaigns
        .get_recipient_contact_ids(&campaign)
        .await
        .unwrap();
    recipients.sort();
    let mut expected = vec![x.id, y.id, z.id];
    expected.sort();
    assert_eq!(recipients, expected);

    let run = ctx.executor.dispatch(ctx.org, campaign.id).await.unwrap();
    let summary = run.handle.await.unwrap().unwrap();
    assert_eq!(summary.sent, 3);

    let mut sent = ctx.sender.sent_to();
    sent.sort();
    assert_eq!(sent, vec!["x@x.com", "y@x.com", "z@x.com"]);
}

#[tokio::test]
async fn test_contacts_without_email_are_omitted() {
    let ctx = TestContext::new().await;
    let template = ctx.seed_template().await;
    let with_email = ctx.seed_contact("Gail", "g@x.com").await;
    let without_email = ctx.seed_contact("Hank", "").await;
    let audience = ctx.seed_audience(&[&with_email, &without_email]).await;

    let mut campaign = ctx.once_campaign(&template);
    campaign.audience_ids = vec![audience.id];
    let campaign = ctx.save(campaign).await;

    let run = ctx.executor.dispatch(ctx.org, campaign.id).await.unwrap();
    let summary = run.handle.await.unwrap().unwrap();
    assert_eq!(summary.total, 2);
    assert_eq!(summary.sent, 1);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.failed, 0);

    let (_, total) = ctx.logs.find_by_campaign(campaign.id, 1, 50).await.unwrap();
    assert_eq!(total, 1);
}

/// 并发的状态切换中只有一个调用能把活动置为 running
#[tokio::test]
async fn test_only_one_concurrent_transition_to_running_wins() {
    let ctx = TestContext::new().await;
    let template = ctx.seed_template().await;
    let campaign = ctx.save(ctx.once_campaign(&template)).await;

    let mut handles = Vec::new();
    for _ in 0..8 {
        let repo = ctx.campaigns.clone();
        let id = campaign.id;
        handles.push(tokio::spawn(async move {
            repo.try_mark_running(id).await.unwrap()
        }));
    }

    let mut winners = 0;
    for handle in handles {
        if handle.await.unwrap() {
            winners += 1;
        }
    }
    assert_eq!(winners, 1);
    assert_eq!(ctx.reload(campaign.id).await.status, CampaignStatus::Running);
}

/// 重复派发同一个一次性活动只发送一次
#[tokio::test]
async fn test_duplicate_dispatch_sends_once() {
    let ctx = TestContext::new().await;
    let template = ctx.seed_template().await;
    let contact = ctx.seed_contact("Ivy", "i@x.com").await;

    let mut campaign = ctx.once_campaign(&template);
    campaign.contact_id = Some(contact.id);
    let campaign = ctx.save(campaign).await;

    let mut runs = Vec::new();
    for _ in 0..4 {
        runs.push(ctx.executor.dispatch(ctx.org, campaign.id).await.unwrap());
    }

    let mut succeeded = 0;
    let mut failed_jobs = 0;
    for run in runs {
        match run.handle.await.unwrap() {
            Ok(summary) => {
                assert_eq!(summary.sent, 1);
                succeeded += 1;
            }
            Err(e) => {
                assert!(matches!(
                    e,
                    ExecutionError::AlreadyRunning | ExecutionError::InvalidState(_)
                ));
                let job = ctx.jobs.find_by_id(run.job_id).await.unwrap().unwrap();
                assert_eq!(job.status, JobStatus::Failed);
                failed_jobs += 1;
            }
        }
    }

    assert_eq!(succeeded, 1);
    assert_eq!(failed_jobs, 3);
    assert_eq!(ctx.sender.sent().len(), 1);
    let (_, total) = ctx.logs.find_by_campaign(campaign.id, 1, 50).await.unwrap();
    assert_eq!(total, 1);
}

/// 模板在活动所属组织中不存在时活动失败
#[tokio::test]
async fn test_missing_template_fails_campaign() {
    let ctx = TestContext::new().await;
    let contact = ctx.seed_contact("Jill", "j@x.com").await;
    let foreign_template = ctx
        .templates
        .create(&EmailTemplate::new(
            Uuid::new_v4(),
            ctx.user,
            "Other org",
            "Hi",
            "<p>Hi</p>",
            "Hi",
        ))
        .await
        .unwrap();

    let mut campaign = ctx.once_campaign(&foreign_template);
    campaign.contact_id = Some(contact.id);
    let campaign = ctx.save(campaign).await;

    let run = ctx.executor.dispatch(ctx.org, campaign.id).await.unwrap();
    let job_id = run.job_id;
    let result = run.handle.await.unwrap();
    assert!(matches!(result, Err(ExecutionError::NotFound(ref m)) if m == "Template not found"));

    assert_eq!(ctx.reload(campaign.id).await.status, CampaignStatus::Failed);
    let job = ctx.jobs.find_by_id(job_id).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    assert_eq!(job.error_message.as_deref(), Some("Template not found"));
    assert!(ctx.sender.attempts().is_empty());
}

/// 已执行过但状态不一致的一次性活动被修正为 completed
#[tokio::test]
async fn test_executed_one_shot_campaign_self_heals() {
    let ctx = TestContext::new().await;
    let template = ctx.seed_template().await;
    let contact = ctx.seed_contact("Kim", "k@x.com").await;

    let mut campaign = ctx.once_campaign(&template);
    campaign.contact_id = Some(contact.id);
    campaign.last_run_at = Some(Utc::now() - Duration::hours(1));
    let campaign = ctx.save(campaign).await;

    let run = ctx.executor.dispatch(ctx.org, campaign.id).await.unwrap();
    let job_id = run.job_id;
    let result = run.handle.await.unwrap();
    assert!(
        matches!(result, Err(ExecutionError::InvalidState(ref m)) if m == "One-time campaign already executed")
    );

    assert_eq!(
        ctx.reload(campaign.id).await.status,
        CampaignStatus::Completed
    );
    let job = ctx.jobs.find_by_id(job_id).await.unwrap().unwrap();
    assert_eq!(
        job.error_message.as_deref(),
        Some("One-time campaign already executed")
    );
    assert!(ctx.sender.attempts().is_empty());
}

#[tokio::test]
async fn test_guard_failures_finalize_job() {
    let ctx = TestContext::new().await;
    let template = ctx.seed_template().await;

    let run = ctx.executor.dispatch(ctx.org, Uuid::new_v4()).await.unwrap();
    let job_id = run.job_id;
    assert!(matches!(
        run.handle.await.unwrap(),
        Err(ExecutionError::NotFound(_))
    ));
    let job = ctx.jobs.find_by_id(job_id).await.unwrap().unwrap();
    assert_eq!(job.error_message.as_deref(), Some("Campaign not found"));

    let mut draft = ctx.once_campaign(&template);
    draft.status = CampaignStatus::Draft;
    let draft = ctx.save(draft).await;
    let run = ctx.executor.dispatch(ctx.org, draft.id).await.unwrap();
    let job_id = run.job_id;
    assert!(run.handle.await.unwrap().is_err());
    let job = ctx.jobs.find_by_id(job_id).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    assert_eq!(job.error_message.as_deref(), Some("Campaign is draft"));
    assert_eq!(ctx.reload(draft.id).await.status, CampaignStatus::Draft);

    let mut completed = ctx.once_campaign(&template);
    completed.status = CampaignStatus::Completed;
    let completed = ctx.save(completed).await;
    let run = ctx.executor.dispatch(ctx.org, completed.id).await.unwrap();
    let job_id = run.job_id;
    assert!(run.handle.await.unwrap().is_err());
    let job = ctx.jobs.find_by_id(job_id).await.unwrap().unwrap();
    assert_eq!(
        job.error_message.as_deref(),
        Some("Campaign already completed")
    );
}

/// 执行期间暂停活动的发送器，模拟在发送过程中收到的暂停请求
struct PausingEmailSender {
    target: OnceLock<(Arc<CampaignRepositoryImpl>, Uuid)>,
    sent: AtomicUsize,
}

#[async_trait]
impl EmailSender for PausingEmailSender {
    async fn send(&self, _to: &str, _subject: &str, _html: &str, _text: &str) -> Result<(), EmailError> {
        if let Some((campaigns, campaign_id)) = self.target.get() {
            campaigns
                .update_status(*campaign_id, CampaignStatus::Paused)
                .await
                .map_err(|e| EmailError(e.to_string()))?;
        }
        self.sent.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// 执行中被暂停的周期性活动在本次执行结束后保持暂停
#[tokio::test]
async fn test_pause_during_run_is_preserved() {
    let sender = Arc::new(PausingEmailSender {
        target: OnceLock::new(),
        sent: AtomicUsize::new(0),
    });
    let ctx = TestContext::with_sender(sender.clone()).await;
    let template = ctx.seed_template().await;
    let first = ctx.seed_contact("Lee", "l@x.com").await;
    let second = ctx.seed_contact("Mia", "m@x.com").await;
    let audience = ctx.seed_audience(&[&first, &second]).await;

    let mut campaign = ctx.once_campaign(&template);
    campaign.schedule_type = ScheduleType::Recurring;
    campaign.recurrence = Some(Recurrence::Daily);
    campaign.audience_ids = vec![audience.id];
    let campaign = ctx.save(campaign).await;
    assert!(sender
        .target
        .set((ctx.campaigns.clone(), campaign.id))
        .is_ok());

    let run = ctx.executor.dispatch(ctx.org, campaign.id).await.unwrap();
    let summary = run.handle.await.unwrap().unwrap();

    // The pause does not interrupt the in-flight run
    assert_eq!(summary.sent, 2);
    assert_eq!(sender.sent.load(Ordering::SeqCst), 2);

    let reloaded = ctx.reload(campaign.id).await;
    assert_eq!(reloaded.status, CampaignStatus::Paused);
    assert!(reloaded.last_run_at.is_some());

    let runs = ctx.scheduler().tick().await.unwrap();
    assert!(runs.is_empty());
}

/// 解析收件人时把活动暂停，模拟在执行窗口内到达的暂停请求
struct PauseOnRecipientsRepository {
    inner: Arc<CampaignRepositoryImpl>,
}

#[async_trait]
impl CampaignRepository for PauseOnRecipientsRepository {
    async fn create(&self, campaign: &Campaign) -> Result<Campaign, RepositoryError> {
        self.inner.create(campaign).await
    }

    async fn find_by_id(
        &self,
        id: Uuid,
        organization_id: Uuid,
    ) -> Result<Option<Campaign>, RepositoryError> {
        self.inner.find_by_id(id, organization_id).await
    }

    async fn find_by_id_unscoped(&self, id: Uuid) -> Result<Option<Campaign>, RepositoryError> {
        self.inner.find_by_id_unscoped(id).await
    }

    async fn find_all_by_org(
        &self,
        params: CampaignQueryParams,
    ) -> Result<(Vec<Campaign>, u64), RepositoryError> {
        self.inner.find_all_by_org(params).await
    }

    async fn update(&self, campaign: &Campaign) -> Result<Campaign, RepositoryError> {
        self.inner.update(campaign).await
    }

    async fn update_status(&self, id: Uuid, status: CampaignStatus) -> Result<(), RepositoryError> {
        self.inner.update_status(id, status).await
    }

    async fn transition_status(
        &self,
        id: Uuid,
        from: CampaignStatus,
        to: CampaignStatus,
    ) -> Result<bool, RepositoryError> {
        self.inner.transition_status(id, from, to).await
    }

    async fn update_last_run_at(
        &self,
        id: Uuid,
        last_run_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        self.inner.update_last_run_at(id, last_run_at).await
    }

    async fn finish_run(
        &self,
        id: Uuid,
        last_run_at: DateTime<Utc>,
        status: CampaignStatus,
    ) -> Result<(), RepositoryError> {
        self.inner.finish_run(id, last_run_at, status).await
    }

    async fn delete(&self, id: Uuid, organization_id: Uuid) -> Result<(), RepositoryError> {
        self.inner.delete(id, organization_id).await
    }

    async fn find_due_once_campaigns(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<Campaign>, RepositoryError> {
        self.inner.find_due_once_campaigns(now).await
    }

    async fn find_active_recurring_campaigns(&self) -> Result<Vec<Campaign>, RepositoryError> {
        self.inner.find_active_recurring_campaigns().await
    }

    async fn get_recipient_contact_ids(
        &self,
        campaign: &Campaign,
    ) -> Result<Vec<Uuid>, RepositoryError> {
        self.inner
            .transition_status(campaign.id, CampaignStatus::Running, CampaignStatus::Paused)
            .await?;
        self.inner.get_recipient_contact_ids(campaign).await
    }

    async fn try_mark_running(&self, id: Uuid) -> Result<bool, RepositoryError> {
        self.inner.try_mark_running(id).await
    }

    async fn reset_stuck_running(
        &self,
        older_than: Duration,
    ) -> Result<(StuckCampaignReset, Vec<Uuid>), RepositoryError> {
        self.inner.reset_stuck_running(older_than).await
    }
}

/// 收件人为空时，执行期间的暂停不会被 completed 覆盖
#[tokio::test]
async fn test_pause_survives_empty_recipient_run() {
    let ctx = TestContext::new().await;
    let template = ctx.seed_template().await;
    let audience = ctx.seed_audience(&[]).await;

    let mut campaign = ctx.once_campaign(&template);
    campaign.audience_ids = vec![audience.id];
    let campaign = ctx.save(campaign).await;

    let executor = Arc::new(CampaignExecutor::new(
        Arc::new(PauseOnRecipientsRepository {
            inner: ctx.campaigns.clone(),
        }),
        ctx.logs.clone(),
        ctx.jobs.clone(),
        ctx.templates.clone(),
        ctx.contacts.clone(),
        ctx.sender.clone(),
        ctx.notifier.clone(),
    ));

    let run = executor.dispatch(ctx.org, campaign.id).await.unwrap();
    let job_id = run.job_id;
    assert!(matches!(
        run.handle.await.unwrap(),
        Err(ExecutionError::NoRecipients)
    ));

    assert_eq!(ctx.reload(campaign.id).await.status, CampaignStatus::Paused);
    let job = ctx.jobs.find_by_id(job_id).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    assert_eq!(job.error_message.as_deref(), Some("No recipients found"));
    assert!(ctx.sender.attempts().is_empty());
}
