// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::campaign_repository::RepositoryError;
use crate::domain::models::email_template::EmailTemplate;
use async_trait::async_trait;
use uuid::Uuid;

/// 邮件模板仓库特质
#[async_trait]
pub trait EmailTemplateRepository: Send + Sync {
    async fn create(&self, template: &EmailTemplate) -> Result<EmailTemplate, RepositoryError>;
    async fn find_by_id(
        &self,
        id: Uuid,
        organization_id: Uuid,
    ) -> Result<Option<EmailTemplate>, RepositoryError>;
}
