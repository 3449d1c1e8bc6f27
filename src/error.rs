use std::fmt::Display;

use axum::{
    extract::multipart::MultipartRejection,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

/// Notice shown for any failure the user cannot act on.
pub const GENERIC_FAILURE: &str = "เกิดข้อผิดพลาด กรุณาลองใหม่อีกครั้ง";

pub const LOGIN_ROUTE: &str = "/login";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: &'static str,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("validation failed")]
    Validation(Vec<FieldError>),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("session required")]
    Unauthenticated,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Conflict(&'static str),

    /// Carries the label the submit control shows while busy.
    #[error("submission already in progress")]
    SubmissionInFlight(&'static str),

    #[error(transparent)]
    Service(#[from] anyhow::Error),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::InvalidCredentials | AppError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) | AppError::SubmissionInFlight(_) => StatusCode::CONFLICT,
            AppError::Service(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            AppError::Validation(fields) => {
                tracing::warn!(?fields, "validation failed");
                json!({ "error": self.to_string(), "status": status.as_u16(), "fields": fields })
            }
            AppError::Unauthenticated => {
                json!({ "error": self.to_string(), "status": status.as_u16(), "redirect_to": LOGIN_ROUTE })
            }
            AppError::SubmissionInFlight(label) => {
                json!({ "error": self.to_string(), "status": status.as_u16(), "submit_label": label })
            }
            AppError::Service(e) => {
                tracing::error!(error = %format!("{e:#}"), "request failed");
                json!({ "error": GENERIC_FAILURE, "status": status.as_u16() })
            }
            _ => json!({ "error": self.to_string(), "status": status.as_u16() }),
        };
        (status, Json(body)).into_response()
    }
}

fn bad_request_part(field: &'static str, message: &'static str, detail: impl Display) -> AppError {
    tracing::warn!(field, error = %detail, "request rejected by extractor");
    AppError::Validation(vec![FieldError { field, message }])
}

impl From<JsonRejection> for AppError {
    fn from(r: JsonRejection) -> Self {
        let message = match &r {
            JsonRejection::MissingJsonContentType(_) => "expected application/json",
            JsonRejection::JsonSyntaxError(_) => "malformed JSON",
            JsonRejection::JsonDataError(_) => "missing or invalid field",
            _ => "unreadable request body",
        };
        bad_request_part("body", message, r.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(r: QueryRejection) -> Self {
        bad_request_part("query", "invalid query parameters", r.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(r: PathRejection) -> Self {
        bad_request_part("path", "invalid path parameter", r.body_text())
    }
}

impl From<MultipartRejection> for AppError {
    fn from(r: MultipartRejection) -> Self {
        bad_request_part("body", "expected multipart/form-data", r.body_text())
    }
}
