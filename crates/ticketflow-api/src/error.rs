// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Maps domain errors onto HTTP status codes and a uniform JSON error body.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;
use thiserror::Error;
use ticketflow_approval::ApprovalError;
use ticketflow_core::{BrokerError, StoreError};
use ticketflow_ingest::IngestError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("not found")]
    NotFound,

    #[error("approval already decided")]
    AlreadyDecided,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Broker(#[from] BrokerError),
}

impl From<IngestError> for ApiError {
    fn from(e: IngestError) -> Self {
        match e {
            IngestError::Store(e) => ApiError::Store(e),
            IngestError::Broker(e) => ApiError::Broker(e),
        }
    }
}

impl From<ApprovalError> for ApiError {
    fn from(e: ApprovalError) -> Self {
        match e {
            ApprovalError::Store(e) => ApiError::Store(e),
            ApprovalError::AlreadyDecided => ApiError::AlreadyDecided,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "invalid_request", msg.clone()),
            ApiError::NotFound => (StatusCode::NOT_FOUND, "not_found", self.to_string()),
            ApiError::AlreadyDecided => (StatusCode::CONFLICT, "already_decided", self.to_string()),
            ApiError::Store(StoreError::NotFound) => {
                (StatusCode::NOT_FOUND, "not_found", "not found".to_string())
            }
            ApiError::Store(StoreError::AlreadyExists) => {
                (StatusCode::CONFLICT, "already_exists", self.to_string())
            }
            ApiError::Store(StoreError::VersionConflict { .. }) => {
                (StatusCode::CONFLICT, "version_conflict", self.to_string())
            }
            ApiError::Store(_) | ApiError::Broker(_) => {
                tracing::error!(error = %self, "request_failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "internal server error".to_string(),
                )
            }
        };
        (status, Json(json!({ "error": { "code": code, "message": message } }))).into_response()
    }
}
