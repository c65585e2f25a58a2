//! Application errors and their mapping to HTTP responses.
//!
//! Every layer error converts into [`AppError`]. Handlers never pick status
//! codes themselves: they hand the error to the [`ErrorTaxonomy`] built once
//! in `main` and shared as `web::Data`.

use crate::render::RenderError;
use crate::storage::StorageError;
use actix_web::error::InternalError;
use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse};
use common::model::case::CaseStatus;
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("temp file not found: {0}")]
    TempFileNotFound(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("invalid or expired signature")]
    InvalidSignature,

    #[error("case is already accepted")]
    AlreadyAccepted,

    #[error("case has been processed further (status: {0})")]
    ProcessedFurther(CaseStatus),

    #[error("case is not accepted (status: {0})")]
    NotAccepted(CaseStatus),

    #[error("document is signed and can no longer change")]
    DocumentSigned,

    #[error("bad template syntax: {0}")]
    BadTemplate(String),

    #[error("operation timed out")]
    Timeout,

    #[error(transparent)]
    Storage(StorageError),

    #[error(transparent)]
    Render(RenderError),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Internal(String),
}

impl From<StorageError> for AppError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::TempNotFound(key) => AppError::TempFileNotFound(key),
            StorageError::NotFound(key) => AppError::NotFound(format!("object '{}'", key)),
            StorageError::InvalidKey(msg) => AppError::BadRequest(msg),
            other => AppError::Storage(other),
        }
    }
}

impl From<RenderError> for AppError {
    fn from(e: RenderError) -> Self {
        match e {
            RenderError::BadTemplate(msg) => AppError::BadTemplate(msg),
            other => AppError::Render(other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    BadRequest,
    TempFileNotFound,
    InvalidSignature,
    NotFound,
    AlreadyAccepted,
    ProcessedFurther,
    NotAccepted,
    DocumentSigned,
    BadTemplate,
    Timeout,
    Internal,
}

impl ErrorKind {
    const ALL: [ErrorKind; 11] = [
        ErrorKind::BadRequest,
        ErrorKind::TempFileNotFound,
        ErrorKind::InvalidSignature,
        ErrorKind::NotFound,
        ErrorKind::AlreadyAccepted,
        ErrorKind::ProcessedFurther,
        ErrorKind::NotAccepted,
        ErrorKind::DocumentSigned,
        ErrorKind::BadTemplate,
        ErrorKind::Timeout,
        ErrorKind::Internal,
    ];

    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "bad_request",
            ErrorKind::TempFileNotFound => "temp_file_not_found",
            ErrorKind::InvalidSignature => "invalid_signature",
            ErrorKind::NotFound => "not_found",
            ErrorKind::AlreadyAccepted => "already_accepted",
            ErrorKind::ProcessedFurther => "processed_further",
            ErrorKind::NotAccepted => "not_accepted",
            ErrorKind::DocumentSigned => "document_signed",
            ErrorKind::BadTemplate => "bad_template",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Internal => "internal",
        }
    }

    fn default_status(self) -> StatusCode {
        match self {
            ErrorKind::BadRequest | ErrorKind::TempFileNotFound => StatusCode::BAD_REQUEST,
            ErrorKind::InvalidSignature => StatusCode::FORBIDDEN,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::AlreadyAccepted
            | ErrorKind::ProcessedFurther
            | ErrorKind::NotAccepted
            | ErrorKind::DocumentSigned => StatusCode::CONFLICT,
            ErrorKind::BadTemplate => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::BadRequest(_) => ErrorKind::BadRequest,
            AppError::TempFileNotFound(_) => ErrorKind::TempFileNotFound,
            AppError::NotFound(_) => ErrorKind::NotFound,
            AppError::InvalidSignature => ErrorKind::InvalidSignature,
            AppError::AlreadyAccepted => ErrorKind::AlreadyAccepted,
            AppError::ProcessedFurther(_) => ErrorKind::ProcessedFurther,
            AppError::NotAccepted(_) => ErrorKind::NotAccepted,
            AppError::DocumentSigned => ErrorKind::DocumentSigned,
            AppError::BadTemplate(_) => ErrorKind::BadTemplate,
            AppError::Timeout => ErrorKind::Timeout,
            AppError::Storage(_)
            | AppError::Render(_)
            | AppError::Database(_)
            | AppError::Io(_)
            | AppError::Json(_)
            | AppError::Internal(_) => ErrorKind::Internal,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
}

/// Immutable mapping from error kind to HTTP status.
#[derive(Debug, Clone)]
pub struct ErrorTaxonomy {
    statuses: HashMap<ErrorKind, StatusCode>,
}

impl Default for ErrorTaxonomy {
    fn default() -> Self {
        Self {
            statuses: ErrorKind::ALL
                .into_iter()
                .map(|kind| (kind, kind.default_status()))
                .collect(),
        }
    }
}

impl ErrorTaxonomy {
    pub fn status(&self, kind: ErrorKind) -> StatusCode {
        self.statuses
            .get(&kind)
            .copied()
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Builds the response for an error. Server faults are logged with their
    /// detail and answered with a generic message.
    pub fn respond(&self, err: &AppError) -> HttpResponse {
        let kind = err.kind();
        let status = self.status(kind);
        let message = if kind == ErrorKind::Internal {
            log::error!("request failed: {}", err);
            "internal server error".to_string()
        } else {
            if status.is_server_error() {
                log::warn!("request failed: {}", err);
            } else {
                log::debug!("request rejected: {}", err);
            }
            err.to_string()
        };
        HttpResponse::build(status).json(ErrorBody {
            error: kind.code(),
            message,
        })
    }
}

fn bad_request_body(err: impl std::fmt::Display) -> HttpResponse {
    HttpResponse::BadRequest().json(ErrorBody {
        error: ErrorKind::BadRequest.code(),
        message: err.to_string(),
    })
}

/// JSON extractor settings answering malformed bodies in the error format.
pub fn json_config(limit: usize) -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(limit)
        .error_handler(|err, _req| {
            let response = bad_request_body(&err);
            InternalError::from_response(err, response).into()
        })
}

pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| {
        let response = bad_request_body(&err);
        InternalError::from_response(err, response).into()
    })
}
