// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use validator::ValidationErrors;

use crate::domain::models::campaign::DomainError;
use crate::domain::repositories::campaign_repository::RepositoryError;
use crate::domain::use_cases::create_campaign::CreateCampaignError;

/// 处理器直接产生的请求错误
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    BadRequest(String),
}

/// 应用错误类型
///
/// 封装所有可能的应用层错误，按错误类型映射为 HTTP 状态码
#[derive(Debug)]
pub struct AppError(anyhow::Error);

impl AppError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self(ApiError::NotFound(message.into()).into())
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self(ApiError::BadRequest(message.into()).into())
    }

    fn status_and_message(&self) -> (StatusCode, String) {
        if let Some(err) = self.0.downcast_ref::<ApiError>() {
            return match err {
                ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
                ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            };
        }
        if let Some(err) = self.0.downcast_ref::<DomainError>() {
            return domain_status(err);
        }
        if let Some(err) = self.0.downcast_ref::<RepositoryError>() {
            return repository_status(err);
        }
        if let Some(err) = self.0.downcast_ref::<CreateCampaignError>() {
            return match err {
                CreateCampaignError::Invalid(e) => domain_status(e),
                CreateCampaignError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
                CreateCampaignError::Repository(e) => repository_status(e),
            };
        }
        if let Some(err) = self.0.downcast_ref::<ValidationErrors>() {
            return (StatusCode::BAD_REQUEST, format!("Validation error: {}", err));
        }

        (StatusCode::INTERNAL_SERVER_ERROR, self.0.to_string())
    }
}

fn domain_status(err: &DomainError) -> (StatusCode, String) {
    match err {
        DomainError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
        DomainError::InvalidStateTransition(msg) => (StatusCode::CONFLICT, msg.clone()),
    }
}

fn repository_status(err: &RepositoryError) -> (StatusCode, String) {
    match err {
        RepositoryError::NotFound => (StatusCode::NOT_FOUND, err.to_string()),
        RepositoryError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
        RepositoryError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = self.status_and_message();

        if status.is_server_error() {
            tracing::error!("Request failed: {:?}", self.0);
        }

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
