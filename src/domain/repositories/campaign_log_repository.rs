// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::campaign_repository::RepositoryError;
use crate::domain::models::campaign_log::{CampaignLog, DeliveryStatus};
use async_trait::async_trait;
use std::collections::HashMap;
use uuid::Uuid;

/// 投递日志仓库特质
///
/// 日志只追加、只终结一次：queued → sent | failed。
#[async_trait]
pub trait CampaignLogRepository: Send + Sync {
    /// 插入一条 queued 日志
    async fn create(&self, log: &CampaignLog) -> Result<CampaignLog, RepositoryError>;
    /// 按ID查找
    async fn find_by_id(&self, id: Uuid) -> Result<Option<CampaignLog>, RepositoryError>;
    /// 终结日志状态，成功时写入发送时间
    ///
    /// 只作用于仍处于 queued 的日志，已终结的日志返回 `NotFound`。
    async fn update_status(
        &self,
        id: Uuid,
        status: DeliveryStatus,
        error_message: Option<String>,
    ) -> Result<(), RepositoryError>;
    /// 分页查询活动日志，按创建时间倒序
    async fn find_by_campaign(
        &self,
        campaign_id: Uuid,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<CampaignLog>, u64), RepositoryError>;
    /// 按状态统计活动日志数量
    async fn stats_by_campaign(
        &self,
        campaign_id: Uuid,
    ) -> Result<HashMap<DeliveryStatus, u64>, RepositoryError>;
}
