// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::campaign_repository::RepositoryError;
use crate::domain::models::background_job::{BackgroundJobLog, JobStatus, JobType};
use async_trait::async_trait;
use uuid::Uuid;

/// 后台作业仓库特质
#[async_trait]
pub trait BackgroundJobRepository: Send + Sync {
    async fn create(&self, job: &BackgroundJobLog) -> Result<BackgroundJobLog, RepositoryError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<BackgroundJobLog>, RepositoryError>;
    async fn update(&self, job: &BackgroundJobLog) -> Result<BackgroundJobLog, RepositoryError>;
    /// 更新状态，可附带错误信息
    async fn update_status(
        &self,
        id: Uuid,
        status: JobStatus,
        error_message: Option<String>,
    ) -> Result<(), RepositoryError>;
    /// 更新已处理记录数
    async fn update_progress(&self, id: Uuid, processed: i32) -> Result<(), RepositoryError>;
    /// 按类型（及可选状态）查询，按创建时间倒序
    async fn find_by_type(
        &self,
        job_type: JobType,
        status: Option<JobStatus>,
    ) -> Result<Vec<BackgroundJobLog>, RepositoryError>;
    /// 分页查询组织内的作业
    async fn find_by_org(
        &self,
        organization_id: Uuid,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<BackgroundJobLog>, u64), RepositoryError>;
    /// 把关联到指定对象、仍未结束的作业标记为失败
    async fn fail_unfinished_for_references(
        &self,
        job_type: JobType,
        reference_ids: &[Uuid],
        error_message: &str,
    ) -> Result<u64, RepositoryError>;
}
