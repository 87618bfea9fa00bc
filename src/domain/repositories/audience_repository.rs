// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::campaign_repository::RepositoryError;
use crate::domain::models::audience::Audience;
use async_trait::async_trait;
use uuid::Uuid;

/// 受众仓库特质
#[async_trait]
pub trait AudienceRepository: Send + Sync {
    async fn create(&self, audience: &Audience) -> Result<Audience, RepositoryError>;
    async fn find_by_id(
        &self,
        id: Uuid,
        organization_id: Uuid,
    ) -> Result<Option<Audience>, RepositoryError>;
    /// 添加成员，已存在的 (audience, contact) 对被跳过；返回新增数量
    async fn add_contacts(
        &self,
        audience_id: Uuid,
        contact_ids: &[Uuid],
    ) -> Result<u64, RepositoryError>;
    /// 任一受众中的联系人ID，去重
    async fn contact_ids_for_audiences(
        &self,
        audience_ids: &[Uuid],
    ) -> Result<Vec<Uuid>, RepositoryError>;
}
