// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 邮件模板
///
/// 主题、HTML 正文和纯文本正文都可以包含 `{{key}}` 占位符。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailTemplate {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub name: String,
    pub subject: String,
    pub html_body: String,
    pub plain_text_body: String,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EmailTemplate {
    pub fn new(
        organization_id: Uuid,
        created_by: Uuid,
        name: impl Into<String>,
        subject: impl Into<String>,
        html_body: impl Into<String>,
        plain_text_body: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            organization_id,
            name: name.into(),
            subject: subject.into(),
            html_body: html_body.into(),
            plain_text_body: plain_text_body.into(),
            created_by,
            created_at: now,
            updated_at: now,
        }
    }
}
