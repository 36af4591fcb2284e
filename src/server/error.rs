//! HTTP status mapping for crate errors.

use crate::error::{CommandError, Error, IoError, ModelError, SessionError, StorageError};
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Session(SessionError::NotFound { .. })
            | Self::Storage(StorageError::DocumentNotFound { .. }) => StatusCode::NOT_FOUND,
            Self::Session(SessionError::Busy | SessionError::Cancelled) => StatusCode::CONFLICT,
            Self::Session(SessionError::EmptyMessage)
            | Self::Io(IoError::UnsupportedFormat { .. } | IoError::EmptyDocument { .. })
            | Self::Storage(StorageError::DuplicateDocument { .. })
            | Self::Command(CommandError::InvalidArgument(_)) => StatusCode::BAD_REQUEST,
            Self::Model(ModelError::RateLimited(_)) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Model(_) | Self::Embedding(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({ "error": self.to_string() }))
    }
}
