use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use log::error;
use serde::Serialize;
use thiserror::Error;

use crate::shared::pagination::Pagination;

/// Response envelope shared by every endpoint. `data` and `pagination` are
/// omitted from the JSON body when absent.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}

pub fn success<T: Serialize>(
    message: impl Into<String>,
    data: T,
    status: StatusCode,
) -> (StatusCode, Json<ApiResponse<T>>) {
    (
        status,
        Json(ApiResponse {
            message: message.into(),
            data: Some(data),
            pagination: None,
        }),
    )
}

pub fn success_message(message: impl Into<String>) -> (StatusCode, Json<ApiResponse<()>>) {
    (
        StatusCode::OK,
        Json(ApiResponse {
            message: message.into(),
            data: None,
            pagination: None,
        }),
    )
}

pub fn success_paginated<T: Serialize>(
    message: impl Into<String>,
    data: T,
    pagination: Pagination,
) -> (StatusCode, Json<ApiResponse<T>>) {
    (
        StatusCode::OK,
        Json(ApiResponse {
            message: message.into(),
            data: Some(data),
            pagination: Some(pagination),
        }),
    )
}

/// Error surface of the REST handlers. The taxonomy is deliberately flat:
/// entity absence, malformed input, and everything the persistence layer
/// reports, with the underlying message passed through verbatim.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Database(#[from] diesel::result::Error),
    #[error("database pool error: {0}")]
    Pool(#[from] diesel::r2d2::PoolError),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Database(_) | ApiError::Pool(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("{}", self);
        }
        let body = ApiResponse::<()> {
            message: self.to_string(),
            data: None,
            pagination: None,
        };
        (status, Json(body)).into_response()
    }
}
