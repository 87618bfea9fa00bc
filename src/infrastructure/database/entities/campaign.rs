// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm::entity::prelude::*;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "campaign")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub organization_id: Option<Uuid>,
    pub name: String,
    pub template_id: Uuid,
    /// JSON 数组形式的受众ID
    pub audience_ids: Json,
    pub contact_id: Option<Uuid>,
    pub schedule_type: String,
    pub scheduled_at: ChronoDateTimeWithTimeZone,
    pub recurrence: Option<String>,
    pub recurrence_day_of_week: Option<i32>,
    pub recurrence_day_of_month: Option<i32>,
    /// HH:MM
    pub recurrence_time: Option<String>,
    pub last_run_at: Option<ChronoDateTimeWithTimeZone>,
    pub status: String,
    pub created_by: Uuid,
    pub created_at: ChronoDateTimeWithTimeZone,
    pub updated_at: ChronoDateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::campaign_log::Entity")]
    CampaignLog,
}

impl Related<super::campaign_log::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CampaignLog.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
