// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::audience::Audience;
use crate::domain::repositories::audience_repository::AudienceRepository;
use crate::domain::repositories::campaign_repository::RepositoryError;
use crate::infrastructure::database::entities::{
    audience as audience_entity, audience_contact as audience_contact_entity,
};
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QuerySelect, Set,
};
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

/// 受众仓库实现，同时管理 audience_contact 关联表
#[derive(Clone)]
pub struct AudienceRepositoryImpl {
    db: Arc<DatabaseConnection>,
}

impl AudienceRepositoryImpl {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

impl From<audience_entity::Model> for Audience {
    fn from(model: audience_entity::Model) -> Self {
        Self {
            id: model.id,
            organization_id: model.organization_id,
            name: model.name,
            description: model.description,
            created_by: model.created_by,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl From<Audience> for audience_entity::ActiveModel {
    fn from(audience: Audience) -> Self {
        Self {
            id: Set(audience.id),
            organization_id: Set(audience.organization_id),
            name: Set(audience.name),
            description: Set(audience.description),
            created_by: Set(audience.created_by),
            created_at: Set(audience.created_at.into()),
        }
    }
}

#[async_trait]
impl AudienceRepository for AudienceRepositoryImpl {
    async fn create(&self, audience: &Audience) -> Result<Audience, RepositoryError> {
        let model: audience_entity::ActiveModel = audience.clone().into();
        let inserted = model.insert(self.db.as_ref()).await?;
        Ok(inserted.into())
    }

    async fn find_by_id(
        &self,
        id: Uuid,
        organization_id: Uuid,
    ) -> Result<Option<Audience>, RepositoryError> {
        let model = audience_entity::Entity::find_by_id(id)
            .filter(audience_entity::Column::OrganizationId.eq(organization_id))
            .one(self.db.as_ref())
            .await?;

        Ok(model.map(Into::into))
    }

    async fn add_contacts(
        &self,
        audience_id: Uuid,
        contact_ids: &[Uuid],
    ) -> Result<u64, RepositoryError> {
        if contact_ids.is_empty() {
            return Ok(0);
        }

        let existing: HashSet<Uuid> = audience_contact_entity::Entity::find()
            .select_only()
            .column(audience_contact_entity::Column::ContactId)
            .filter(audience_contact_entity::Column::AudienceId.eq(audience_id))
            .filter(audience_contact_entity::Column::ContactId.is_in(contact_ids.iter().copied()))
            .into_tuple::<Uuid>()
            .all(self.db.as_ref())
            .await?
            .into_iter()
            .collect();

        let added_at: DateTime<FixedOffset> = Utc::now().into();
        let mut seen = HashSet::new();
        let rows: Vec<audience_contact_entity::ActiveModel> = contact_ids
            .iter()
            .copied()
            .filter(|id| !existing.contains(id) && seen.insert(*id))
            .map(|contact_id| audience_contact_entity::ActiveModel {
                id: Set(Uuid::new_v4()),
                audience_id: Set(audience_id),
                contact_id: Set(contact_id),
                added_at: Set(added_at),
            })
            .collect();

        let added = rows.len() as u64;
        if added > 0 {
            audience_contact_entity::Entity::insert_many(rows)
                .exec(self.db.as_ref())
                .await?;
        }
        Ok(added)
    }

    async fn contact_ids_for_audiences(
        &self,
        audience_ids: &[Uuid],
    ) -> Result<Vec<Uuid>, RepositoryError> {
        if audience_ids.is_empty() {
            return Ok(Vec::new());
        }

        let ids = audience_contact_entity::Entity::find()
            .select_only()
            .column(audience_contact_entity::Column::ContactId)
            .distinct()
            .filter(audience_contact_entity::Column::AudienceId.is_in(audience_ids.iter().copied()))
            .into_tuple::<Uuid>()
            .all(self.db.as_ref())
            .await?;

        Ok(ids)
    }
}
