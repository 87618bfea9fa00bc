// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::SchedulerSettings;
use crate::domain::models::background_job::JobType;
use crate::domain::models::campaign::{Campaign, CampaignStatus};
use crate::domain::repositories::background_job_repository::BackgroundJobRepository;
use crate::domain::repositories::campaign_repository::{
    CampaignRepository, RepositoryError, StuckCampaignReset,
};
use crate::workers::campaign_worker::{CampaignExecutor, DispatchedRun};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, info_span, warn, Instrument};

/// 调度器错误
#[derive(Error, Debug)]
pub enum SchedulerError {
    #[error("Failed to find due campaigns: {0}")]
    DueCampaigns(#[source] RepositoryError),
    #[error("Failed to find recurring campaigns: {0}")]
    RecurringCampaigns(#[source] RepositoryError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// 活动调度器
///
/// 按固定间隔扫描到期的一次性活动和满足周期条件的周期性活动，
/// 为每个活动创建作业并派发执行器，不等待执行完成
pub struct CampaignScheduler {
    campaigns: Arc<dyn CampaignRepository>,
    jobs: Arc<dyn BackgroundJobRepository>,
    executor: Arc<CampaignExecutor>,
    settings: SchedulerSettings,
}

impl CampaignScheduler {
    /// 创建新的活动调度器实例
    ///
    /// # 参数
    ///
    /// * `campaigns` - 活动仓库
    /// * `jobs` - 后台作业仓库
    /// * `executor` - 活动执行器
    /// * `settings` - 调度器配置
    pub fn new(
        campaigns: Arc<dyn CampaignRepository>,
        jobs: Arc<dyn BackgroundJobRepository>,
        executor: Arc<CampaignExecutor>,
        settings: SchedulerSettings,
    ) -> Self {
        Self {
            campaigns,
            jobs,
            executor,
            settings,
        }
    }

    /// 启动调度器后台任务
    ///
    /// # 返回值
    ///
    /// 返回后台任务的句柄
    pub fn start(self: Arc<Self>) -> JoinHandle<()> {
        let period = self.settings.tick_interval();
        let run_on_startup = self.settings.run_on_startup;

        tokio::spawn(async move {
            let mut interval = interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            // The first tick completes immediately
            if !run_on_startup {
                interval.tick().await;
            }

            info!("Campaign scheduler started, ticking every {:?}", period);
            loop {
                interval.tick().await;

                let span = info_span!("scheduler_tick");
                match self.tick().instrument(span).await {
                    Ok(dispatched) => {
                        debug!("Scheduler tick dispatched {} campaigns", dispatched.len())
                    }
                    Err(e) => error!("Scheduler tick failed: {}", e),
                }
            }
        })
    }

    /// 以当前时间执行一次扫描
    pub async fn tick(&self) -> Result<Vec<DispatchedRun>, SchedulerError> {
        self.tick_at(Utc::now()).await
    }

    /// 以给定时间执行一次扫描
    ///
    /// 扫描在所有符合条件的活动派发完成后返回，返回的句柄可用于等待执行结果
    pub async fn tick_at(&self, now: DateTime<Utc>) -> Result<Vec<DispatchedRun>, SchedulerError> {
        debug!("Running campaign scheduler at {}", now);
        let mut dispatched = Vec::new();

        let due = self
            .campaigns
            .find_due_once_campaigns(now)
            .await
            .map_err(SchedulerError::DueCampaigns)?;

        for campaign in &due {
            // The due query already excludes these
            if campaign.already_ran_once() {
                info!(
                    "Skipping already-completed one-time campaign: {}",
                    campaign.id
                );
                continue;
            }
            if let Some(run) = self.dispatch(campaign).await {
                dispatched.push(run);
            }
        }

        let recurring = self
            .campaigns
            .find_active_recurring_campaigns()
            .await
            .map_err(SchedulerError::RecurringCampaigns)?;

        for campaign in &recurring {
            if campaign.status == CampaignStatus::Completed {
                info!("Skipping completed recurring campaign: {}", campaign.id);
                continue;
            }
            if !campaign.is_recurrence_due(now) {
                continue;
            }
            if let Some(run) = self.dispatch(campaign).await {
                dispatched.push(run);
            }
        }

        if !dispatched.is_empty() {
            info!("Campaign scheduler dispatched {} runs", dispatched.len());
        }
        Ok(dispatched)
    }

    async fn dispatch(&self, campaign: &Campaign) -> Option<DispatchedRun> {
        let Some(organization_id) = campaign.valid_organization_id() else {
            warn!(
                "Skipping campaign with empty organization_id: {}",
                campaign.id
            );
            return None;
        };

        match self.executor.dispatch(organization_id, campaign.id).await {
            Ok(run) => Some(run),
            Err(e) => {
                error!("Error creating job for campaign {}: {}", campaign.id, e);
                None
            }
        }
    }

    /// 启动对账
    ///
    /// 把长时间停留在 running 的活动复位：周期性活动回到 scheduled，
    /// 一次性活动标记为 failed（不自动重试）；其未结束的 campaign_run 作业标记为失败
    pub async fn reconcile_stuck_campaigns(&self) -> Result<StuckCampaignReset, SchedulerError> {
        let (reset, campaign_ids) = self
            .campaigns
            .reset_stuck_running(self.settings.stuck_running_timeout())
            .await?;

        if campaign_ids.is_empty() {
            return Ok(reset);
        }

        let failed_jobs = self
            .jobs
            .fail_unfinished_for_references(
                JobType::CampaignRun,
                &campaign_ids,
                "Campaign run interrupted",
            )
            .await?;

        warn!(
            "Reset {} stuck campaigns ({} rescheduled, {} failed), {} jobs marked interrupted",
            campaign_ids.len(),
            reset.rescheduled,
            reset.failed,
            failed_jobs
        );
        Ok(reset)
    }
}
