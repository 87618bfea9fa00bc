// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::campaign::{Campaign, CampaignStatus};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sea_orm::DbErr;
use thiserror::Error;
use uuid::Uuid;

/// 仓库错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// 数据库错误
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
    /// 记录未找到
    #[error("Record not found")]
    NotFound,
    /// 记录存在，但当前状态不允许本次写入
    #[error("{0}")]
    Conflict(String),
}

/// 活动列表查询参数
#[derive(Debug, Clone)]
pub struct CampaignQueryParams {
    pub organization_id: Uuid,
    pub status: Option<CampaignStatus>,
    /// 页码，从 1 开始
    pub page: u64,
    pub limit: u64,
}

/// 启动对账的结果
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StuckCampaignReset {
    /// 周期性活动，已放回待调度
    pub rescheduled: u64,
    /// 一次性活动，已标记失败
    pub failed: u64,
}

/// 活动仓库特质
///
/// 执行期间活动行的 `status` 与 `last_run_at` 只能经由此接口修改。
#[async_trait]
pub trait CampaignRepository: Send + Sync {
    /// 创建活动
    async fn create(&self, campaign: &Campaign) -> Result<Campaign, RepositoryError>;
    /// 在组织范围内按ID查找
    async fn find_by_id(
        &self,
        id: Uuid,
        organization_id: Uuid,
    ) -> Result<Option<Campaign>, RepositoryError>;
    /// 不带租户过滤按ID查找（调度器上下文）
    async fn find_by_id_unscoped(&self, id: Uuid) -> Result<Option<Campaign>, RepositoryError>;
    /// 分页列出组织内的活动，按创建时间倒序
    async fn find_all_by_org(
        &self,
        params: CampaignQueryParams,
    ) -> Result<(Vec<Campaign>, u64), RepositoryError>;
    /// 写入可编辑字段（名称、调度时间）
    ///
    /// 只在活动仍为 draft 或 scheduled 时生效，不会改动 status 与 last_run_at。
    /// 行存在但状态已变化时返回 `Conflict`。
    async fn update(&self, campaign: &Campaign) -> Result<Campaign, RepositoryError>;
    /// 只更新状态
    async fn update_status(&self, id: Uuid, status: CampaignStatus) -> Result<(), RepositoryError>;
    /// 仅当活动当前状态为 `from` 时改为 `to`，返回是否写入
    async fn transition_status(
        &self,
        id: Uuid,
        from: CampaignStatus,
        to: CampaignStatus,
    ) -> Result<bool, RepositoryError>;
    /// 只更新最近执行时间
    async fn update_last_run_at(
        &self,
        id: Uuid,
        last_run_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError>;
    /// 执行结束时写入最近执行时间；活动仍处于 running 时才写入新状态，
    /// 执行期间被暂停的活动保持暂停
    async fn finish_run(
        &self,
        id: Uuid,
        last_run_at: DateTime<Utc>,
        status: CampaignStatus,
    ) -> Result<(), RepositoryError>;
    /// 在组织范围内删除，执行中的活动返回 `Conflict`
    async fn delete(&self, id: Uuid, organization_id: Uuid) -> Result<(), RepositoryError>;
    /// 查找到期的一次性活动：
    /// status = scheduled，scheduled_at <= now，last_run_at 为空，organization_id 非空
    async fn find_due_once_campaigns(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<Campaign>, RepositoryError>;
    /// 查找活跃的周期性活动：status ∈ {scheduled, running}，organization_id 非空
    async fn find_active_recurring_campaigns(&self) -> Result<Vec<Campaign>, RepositoryError>;
    /// 解析活动的收件人联系人ID（去重）
    async fn get_recipient_contact_ids(
        &self,
        campaign: &Campaign,
    ) -> Result<Vec<Uuid>, RepositoryError>;
    /// 原子地把活动从 scheduled 切换为 running
    ///
    /// 一次性活动还要求 last_run_at 为空。恰好影响一行时返回 `true`，
    /// 并发的多个调用中只有一个会成功。
    async fn try_mark_running(&self, id: Uuid) -> Result<bool, RepositoryError>;
    /// 把更新时间早于 `older_than` 之前、仍处于 running 的活动复位
    async fn reset_stuck_running(
        &self,
        older_than: Duration,
    ) -> Result<(StuckCampaignReset, Vec<Uuid>), RepositoryError>;
}
