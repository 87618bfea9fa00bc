// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{at, TestContext};
use chrono::{Duration, Utc};
use crmrs::domain::models::background_job::{BackgroundJobLog, JobStatus};
use crmrs::domain::models::campaign::{CampaignStatus, Recurrence, ScheduleType};
use crmrs::domain::models::campaign_log::DeliveryStatus;
use crmrs::domain::repositories::background_job_repository::BackgroundJobRepository;
use crmrs::domain::repositories::campaign_log_repository::CampaignLogRepository;
use crmrs::domain::repositories::campaign_repository::{
    CampaignRepository, RepositoryError, StuckCampaignReset,
};
use crmrs::workers::campaign_worker::{DispatchedRun, ExecutionError};

async fn join_all(runs: Vec<DispatchedRun>) {
    for run in runs {
        let _ = run.handle.await.expect("campaign run panicked");
    }
}

/// 一次性活动只执行一次：首次扫描发送，后续扫描不再派发
#[tokio::test]
async fn test_one_shot_campaign_sends_once_and_completes() {
    let ctx = TestContext::new().await;
    let template = ctx.seed_template().await;
    let alice = ctx.seed_contact("Alice", "a@x.com").await;

    let mut campaign = ctx.once_campaign(&template);
    campaign.scheduled_at = at("2024-01-01T00:00:00Z");
    campaign.contact_id = Some(alice.id);
    let campaign = ctx.save(campaign).await;

    let scheduler = ctx.scheduler();
    let mut runs = scheduler.tick_at(at("2024-01-01T00:01:00Z")).await.unwrap();
    assert_eq!(runs.len(), 1);
    let run = runs.remove(0);
    assert_eq!(run.campaign_id, campaign.id);
    let job_id = run.job_id;
    let summary = run.handle.await.unwrap().unwrap();
    assert_eq!(summary.sent, 1);
    assert_eq!(summary.failed, 0);

    let (logs, total) = ctx.logs.find_by_campaign(campaign.id, 1, 50).await.unwrap();
    assert_eq!(total, 1);
    assert_eq!(logs[0].status, DeliveryStatus::Sent);
    assert_eq!(logs[0].subject, "Hi Alice");
    assert_eq!(logs[0].recipient_email, "a@x.com");
    assert!(logs[0].sent_at.is_some());

    let sent = ctx.sender.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].html_body, "<p>Alice</p>");

    let reloaded = ctx.reload(campaign.id).await;
    assert_eq!(reloaded.status, CampaignStatus::Completed);
    assert!(reloaded.last_run_at.is_some());

    let job = ctx.jobs.find_by_id(job_id).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Success);
    assert_eq!(job.total_records, Some(1));
    assert_eq!(job.processed_records, Some(1));

    assert_eq!(
        ctx.notifier.notifications(),
        vec![(ctx.org, ctx.user, campaign.id, 1)]
    );

    for minute in 2..5 {
        let tick = at(&format!("2024-01-01T00:0{}:00Z", minute));
        let runs = scheduler.tick_at(tick).await.unwrap();
        assert!(runs.is_empty());
    }
    let (_, total) = ctx.logs.find_by_campaign(campaign.id, 1, 50).await.unwrap();
    assert_eq!(total, 1);
    assert_eq!(ctx.sender.sent().len(), 1);
}

#[tokio::test]
async fn test_one_shot_campaign_waits_for_scheduled_at() {
    let ctx = TestContext::new().await;
    let template = ctx.seed_template().await;
    let contact = ctx.seed_contact("Bob", "b@x.com").await;

    let mut campaign = ctx.once_campaign(&template);
    campaign.scheduled_at = at("2024-01-01T00:00:00Z");
    campaign.contact_id = Some(contact.id);
    ctx.save(campaign).await;

    let runs = ctx
        .scheduler()
        .tick_at(at("2023-12-31T23:59:00Z"))
        .await
        .unwrap();
    assert!(runs.is_empty());
}

/// 每日活动在距上次执行满 24 小时之前不会再次派发
#[tokio::test]
async fn test_daily_campaign_respects_window() {
    let ctx = TestContext::new().await;
    let template = ctx.seed_template().await;
    let contact = ctx.seed_contact("Carol", "c@x.com").await;

    let last_run = at("2024-03-01T09:00:00Z");
    let mut campaign = ctx.once_campaign(&template);
    campaign.schedule_type = ScheduleType::Recurring;
    campaign.recurrence = Some(Recurrence::Daily);
    campaign.scheduled_at = last_run - Duration::days(1);
    campaign.last_run_at = Some(last_run);
    campaign.contact_id = Some(contact.id);
    let campaign = ctx.save(campaign).await;

    let scheduler = ctx.scheduler();
    let runs = scheduler
        .tick_at(last_run + Duration::hours(23) + Duration::minutes(59))
        .await
        .unwrap();
    assert!(runs.is_empty());

    let runs = scheduler
        .tick_at(last_run + Duration::hours(24))
        .await
        .unwrap();
    assert_eq!(runs.len(), 1);
    join_all(runs).await;

    let reloaded = ctx.reload(campaign.id).await;
    assert_eq!(reloaded.status, CampaignStatus::Scheduled);
    assert!(reloaded.last_run_at.unwrap() > last_run);
    assert_eq!(ctx.sender.sent_to(), vec!["c@x.com".to_string()]);
}

/// 每周活动只在配置的星期几执行，与距上次执行的时长无关
#[tokio::test]
async fn test_weekly_campaign_runs_only_on_configured_day() {
    let ctx = TestContext::new().await;
    let template = ctx.seed_template().await;
    let contact = ctx.seed_contact("Dan", "d@x.com").await;

    let mut campaign = ctx.once_campaign(&template);
    campaign.schedule_type = ScheduleType::Recurring;
    campaign.recurrence = Some(Recurrence::Weekly);
    campaign.recurrence_day_of_week = Some(2);
    campaign.scheduled_at = at("2023-10-01T00:00:00Z");
    campaign.last_run_at = Some(at("2023-11-01T00:00:00Z"));
    campaign.contact_id = Some(contact.id);
    ctx.save(campaign).await;

    let scheduler = ctx.scheduler();
    // 2024-01-01 is a Monday
    let runs = scheduler.tick_at(at("2024-01-01T12:00:00Z")).await.unwrap();
    assert!(runs.is_empty());
    let runs = scheduler.tick_at(at("2024-01-03T12:00:00Z")).await.unwrap();
    assert!(runs.is_empty());

    let runs = scheduler.tick_at(at("2024-01-02T12:00:00Z")).await.unwrap();
    assert_eq!(runs.len(), 1);
    join_all(runs).await;
}

#[tokio::test]
async fn test_monthly_campaign_runs_only_on_configured_day() {
    let ctx = TestContext::new().await;
    let template = ctx.seed_template().await;
    let contact = ctx.seed_contact("Eve", "e@x.com").await;

    let mut campaign = ctx.once_campaign(&template);
    campaign.schedule_type = ScheduleType::Recurring;
    campaign.recurrence = Some(Recurrence::Monthly);
    campaign.recurrence_day_of_month = Some(15);
    campaign.scheduled_at = at("2023-10-01T00:00:00Z");
    campaign.last_run_at = Some(at("2023-12-15T08:00:00Z"));
    campaign.contact_id = Some(contact.id);
    ctx.save(campaign).await;

    let scheduler = ctx.scheduler();
    let runs = scheduler.tick_at(at("2024-01-14T08:00:00Z")).await.unwrap();
    assert!(runs.is_empty());

    let runs = scheduler.tick_at(at("2024-01-15T08:00:00Z")).await.unwrap();
    assert_eq!(runs.len(), 1);
    join_all(runs).await;
}

/// 收件人为空的活动以 completed 结束，作业失败，之后不再派发
#[tokio::test]
async fn test_empty_audience_completes_campaign_without_retry() {
    let ctx = TestContext::new().await;
    let template = ctx.seed_template().await;
    let audience = ctx.seed_audience(&[]).await;

    let mut campaign = ctx.once_campaign(&template);
    campaign.audience_ids = vec![audience.id];
    let campaign = ctx.save(campaign).await;

    let scheduler = ctx.scheduler();
    let mut runs = scheduler.tick().await.unwrap();
    assert_eq!(runs.len(), 1);
    let run = runs.remove(0);
    let job_id = run.job_id;
    let result = run.handle.await.unwrap();
    assert!(matches!(result, Err(ExecutionError::NoRecipients)));

    let reloaded = ctx.reload(campaign.id).await;
    assert_eq!(reloaded.status, CampaignStatus::Completed);

    let job = ctx.jobs.find_by_id(job_id).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    assert_eq!(job.error_message.as_deref(), Some("No recipients found"));

    let runs = scheduler.tick().await.unwrap();
    assert!(runs.is_empty());
    assert!(ctx.notifier.notifications().is_empty());
}

#[tokio::test]
async fn test_inactive_and_orphaned_campaigns_are_not_dispatched() {
    let ctx = TestContext::new().await;
    let template = ctx.seed_template().await;
    let contact = ctx.seed_contact("Fay", "f@x.com").await;

    for status in [
        CampaignStatus::Draft,
        CampaignStatus::Paused,
        CampaignStatus::Failed,
    ] {
        let mut campaign = ctx.once_campaign(&template);
        campaign.status = status;
        campaign.contact_id = Some(contact.id);
        ctx.save(campaign).await;
    }

    let mut paused_daily = ctx.once_campaign(&template);
    paused_daily.schedule_type = ScheduleType::Recurring;
    paused_daily.recurrence = Some(Recurrence::Daily);
    paused_daily.status = CampaignStatus::Paused;
    paused_daily.contact_id = Some(contact.id);
    ctx.save(paused_daily).await;

    let mut orphan = ctx.once_campaign(&template);
    orphan.organization_id = None;
    orphan.contact_id = Some(contact.id);
    ctx.save(orphan).await;

    let runs = ctx.scheduler().tick().await.unwrap();
    assert!(runs.is_empty());
    assert!(ctx.sender.attempts().is_empty());
}

/// 启动对账：超时的 running 活动被复位，其未结束的作业标记为中断
#[tokio::test]
async fn test_reconcile_resets_stuck_running_campaigns() {
    let ctx = TestContext::new().await;
    let template = ctx.seed_template().await;
    let stale = Utc::now() - Duration::hours(2);

    let mut stuck_once = ctx.once_campaign(&template);
    stuck_once.status = CampaignStatus::Running;
    stuck_once.updated_at = stale;
    let stuck_once = ctx.save(stuck_once).await;

    let mut stuck_daily = ctx.once_campaign(&template);
    stuck_daily.schedule_type = ScheduleType::Recurring;
    stuck_daily.recurrence = Some(Recurrence::Daily);
    stuck_daily.status = CampaignStatus::Running;
    stuck_daily.updated_at = stale;
    let stuck_daily = ctx.save(stuck_daily).await;

    let mut active = ctx.once_campaign(&template);
    active.status = CampaignStatus::Running;
    let active = ctx.save(active).await;

    let mut job = BackgroundJobLog::campaign_run(ctx.org, stuck_once.id);
    job.status = JobStatus::Running;
    let job = ctx.jobs.create(&job).await.unwrap();

    let reset = ctx.scheduler().reconcile_stuck_campaigns().await.unwrap();
    assert_eq!(
        reset,
        StuckCampaignReset {
            rescheduled: 1,
            failed: 1,
        }
    );

    assert_eq!(
        ctx.reload(stuck_once.id).await.status,
        CampaignStatus::Failed
    );
    assert_eq!(
        ctx.reload(stuck_daily.id).await.status,
        CampaignStatus::Scheduled
    );
    assert_eq!(ctx.reload(active.id).await.status, CampaignStatus::Running);

    let job = ctx.jobs.find_by_id(job.id).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    assert_eq!(job.error_message.as_deref(), Some("Campaign run interrupted"));
}

/// 执行前读取的活动在执行后提交编辑，不会回退状态或导致二次发送
#[tokio::test]
async fn test_edit_from_stale_read_does_not_rearm_campaign() {
    let ctx = TestContext::new().await;
    let template = ctx.seed_template().await;
    let alice = ctx.seed_contact("Alice", "a@x.com").await;

    let mut campaign = ctx.once_campaign(&template);
    campaign.scheduled_at = at("2024-01-01T00:00:00Z");
    campaign.contact_id = Some(alice.id);
    let campaign = ctx.save(campaign).await;

    let mut stale = ctx
        .campaigns
        .find_by_id(campaign.id, ctx.org)
        .await
        .unwrap()
        .unwrap();
    assert!(stale.ensure_editable().is_ok());

    let scheduler = ctx.scheduler();
    let runs = scheduler.tick_at(at("2024-01-01T00:01:00Z")).await.unwrap();
    assert_eq!(runs.len(), 1);
    join_all(runs).await;

    stale.name = "Edited late".to_string();
    let result = ctx.campaigns.update(&stale).await;
    assert!(matches!(result, Err(RepositoryError::Conflict(_))));

    let reloaded = ctx.reload(campaign.id).await;
    assert_eq!(reloaded.status, CampaignStatus::Completed);
    assert!(reloaded.last_run_at.is_some());
    assert_eq!(reloaded.name, campaign.name);

    let runs = scheduler.tick_at(at("2024-01-01T00:02:00Z")).await.unwrap();
    assert!(runs.is_empty());
    assert_eq!(ctx.sender.sent().len(), 1);
}

/// 从未执行的周期性活动只经由周期规则派发，同一轮扫描不会重复创建作业
#[tokio::test]
async fn test_never_run_recurring_campaign_is_dispatched_once_per_tick() {
    let ctx = TestContext::new().await;
    let template = ctx.seed_template().await;
    let contact = ctx.seed_contact("Dana", "d@x.com").await;

    let start = at("2024-04-01T12:00:00Z");
    let mut campaign = ctx.once_campaign(&template);
    campaign.schedule_type = ScheduleType::Recurring;
    campaign.recurrence = Some(Recurrence::Daily);
    campaign.scheduled_at = start;
    campaign.contact_id = Some(contact.id);
    let campaign = ctx.save(campaign).await;

    assert!(ctx
        .campaigns
        .find_due_once_campaigns(start + Duration::minutes(5))
        .await
        .unwrap()
        .is_empty());

    let scheduler = ctx.scheduler();
    let runs = scheduler.tick_at(start).await.unwrap();
    assert!(runs.is_empty());

    let runs = scheduler
        .tick_at(start + Duration::minutes(1))
        .await
        .unwrap();
    assert_eq!(runs.len(), 1);
    join_all(runs).await;

    let (jobs, total) = ctx.jobs.find_by_org(ctx.org, 1, 20).await.unwrap();
    assert_eq!(total, 1);
    assert_eq!(jobs[0].status, JobStatus::Success);
    assert_eq!(ctx.reload(campaign.id).await.status, CampaignStatus::Scheduled);
    assert_eq!(ctx.sender.sent().len(), 1);
}
