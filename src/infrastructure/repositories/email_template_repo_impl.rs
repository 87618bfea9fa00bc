// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::email_template::EmailTemplate;
use crate::domain::repositories::campaign_repository::RepositoryError;
use crate::domain::repositories::email_template_repository::EmailTemplateRepository;
use crate::infrastructure::database::entities::email_template as template_entity;
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use std::sync::Arc;
use uuid::Uuid;

/// 邮件模板仓库实现
#[derive(Clone)]
pub struct EmailTemplateRepositoryImpl {
    db: Arc<DatabaseConnection>,
}

impl EmailTemplateRepositoryImpl {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

impl From<template_entity::Model> for EmailTemplate {
    fn from(model: template_entity::Model) -> Self {
        Self {
            id: model.id,
            organization_id: model.organization_id,
            name: model.name,
            subject: model.subject,
            html_body: model.html_body,
            plain_text_body: model.plain_text_body,
            created_by: model.created_by,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

impl From<EmailTemplate> for template_entity::ActiveModel {
    fn from(template: EmailTemplate) -> Self {
        Self {
            id: Set(template.id),
            organization_id: Set(template.organization_id),
            name: Set(template.name),
            subject: Set(template.subject),
            html_body: Set(template.html_body),
            plain_text_body: Set(template.plain_text_body),
            created_by: Set(template.created_by),
            created_at: Set(template.created_at.into()),
            updated_at: Set(template.updated_at.into()),
        }
    }
}

#[async_trait]
impl EmailTemplateRepository for EmailTemplateRepositoryImpl {
    async fn create(&self, template: &EmailTemplate) -> Result<EmailTemplate, RepositoryError> {
        let model: template_entity::ActiveModel = template.clone().into();
        let inserted = model.insert(self.db.as_ref()).await?;
        Ok(inserted.into())
    }

    async fn find_by_id(
        &self,
        id: Uuid,
        organization_id: Uuid,
    ) -> Result<Option<EmailTemplate>, RepositoryError> {
        let model = template_entity::Entity::find_by_id(id)
            .filter(template_entity::Column::OrganizationId.eq(organization_id))
            .one(self.db.as_ref())
            .await?;

        Ok(model.map(Into::into))
    }
}
