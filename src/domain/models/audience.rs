// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 受众
///
/// 组织范围内的联系人分组，成员关系保存在 `audience_contact` 关联表中，
/// (audience_id, contact_id) 唯一。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Audience {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Audience {
    pub fn new(organization_id: Uuid, created_by: Uuid, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            organization_id,
            name: name.into(),
            description: None,
            created_by,
            created_at: Utc::now(),
        }
    }
}
