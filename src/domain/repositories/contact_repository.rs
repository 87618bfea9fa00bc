// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::campaign_repository::RepositoryError;
use crate::domain::models::contact::Contact;
use async_trait::async_trait;
use uuid::Uuid;

/// 联系人仓库特质
#[async_trait]
pub trait ContactRepository: Send + Sync {
    async fn create(&self, contact: &Contact) -> Result<Contact, RepositoryError>;
    async fn find_by_id(
        &self,
        id: Uuid,
        organization_id: Uuid,
    ) -> Result<Option<Contact>, RepositoryError>;
    /// 批量加载组织内的联系人，不存在的ID被忽略
    async fn find_by_ids(
        &self,
        ids: &[Uuid],
        organization_id: Uuid,
    ) -> Result<Vec<Contact>, RepositoryError>;
}
