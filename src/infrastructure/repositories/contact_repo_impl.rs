// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::contact::Contact;
use crate::domain::repositories::campaign_repository::RepositoryError;
use crate::domain::repositories::contact_repository::ContactRepository;
use crate::infrastructure::database::entities::contact as contact_entity;
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use std::sync::Arc;
use uuid::Uuid;

/// 联系人仓库实现
#[derive(Clone)]
pub struct ContactRepositoryImpl {
    db: Arc<DatabaseConnection>,
}

impl ContactRepositoryImpl {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

impl From<contact_entity::Model> for Contact {
    fn from(model: contact_entity::Model) -> Self {
        Self {
            id: model.id,
            organization_id: model.organization_id,
            created_by: model.created_by,
            first_name: model.first_name,
            last_name: model.last_name,
            email: model.email,
            phone: model.phone,
            is_active: model.is_active,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

impl From<Contact> for contact_entity::ActiveModel {
    fn from(contact: Contact) -> Self {
        Self {
            id: Set(contact.id),
            organization_id: Set(contact.organization_id),
            created_by: Set(contact.created_by),
            first_name: Set(contact.first_name),
            last_name: Set(contact.last_name),
            email: Set(contact.email),
            phone: Set(contact.phone),
            is_active: Set(contact.is_active),
            created_at: Set(contact.created_at.into()),
            updated_at: Set(contact.updated_at.into()),
        }
    }
}

#[async_trait]
impl ContactRepository for ContactRepositoryImpl {
    async fn create(&self, contact: &Contact) -> Result<Contact, RepositoryError> {
        let model: contact_entity::ActiveModel = contact.clone().into();
        let inserted = model.insert(self.db.as_ref()).await?;
        Ok(inserted.into())
    }

    async fn find_by_id(
        &self,
        id: Uuid,
        organization_id: Uuid,
    ) -> Result<Option<Contact>, RepositoryError> {
        let model = contact_entity::Entity::find_by_id(id)
            .filter(contact_entity::Column::OrganizationId.eq(organization_id))
            .one(self.db.as_ref())
            .await?;

        Ok(model.map(Into::into))
    }

    async fn find_by_ids(
        &self,
        ids: &[Uuid],
        organization_id: Uuid,
    ) -> Result<Vec<Contact>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let models = contact_entity::Entity::find()
            .filter(contact_entity::Column::Id.is_in(ids.iter().copied()))
            .filter(contact_entity::Column::OrganizationId.eq(organization_id))
            .all(self.db.as_ref())
            .await?;

        Ok(models.into_iter().map(Into::into).collect())
    }
}
