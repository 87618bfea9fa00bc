// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use uuid::Uuid;

pub const ORGANIZATION_ID_HEADER: &str = "X-Organization-Id";
pub const USER_ID_HEADER: &str = "X-User-Id";

/// 当前请求的组织ID，所有查询都以此为租户边界
#[derive(Debug, Clone, Copy)]
pub struct OrgId(pub Uuid);

/// 当前请求的用户ID
#[derive(Debug, Clone, Copy)]
pub struct UserId(pub Uuid);

fn uuid_header(parts: &Parts, name: &'static str) -> Result<Uuid, Response> {
    parts
        .headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| Uuid::parse_str(value.trim()).ok())
        .filter(|id| !id.is_nil())
        .ok_or_else(|| {
            let body = Json(json!({ "error": format!("Missing or invalid {} header", name) }));
            (StatusCode::BAD_REQUEST, body).into_response()
        })
}

impl<S> FromRequestParts<S> for OrgId
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        uuid_header(parts, ORGANIZATION_ID_HEADER).map(OrgId)
    }
}

impl<S> FromRequestParts<S> for UserId
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        uuid_header(parts, USER_ID_HEADER).map(UserId)
    }
}
