//! HTTP error responses for web adapter.

use askama::Template;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

use crate::domain::error::JournalError;

#[derive(Debug)]
pub struct WebError {
    pub status: StatusCode,
    pub message: String,
}

impl WebError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

pub fn status_from_error(err: &JournalError) -> StatusCode {
    match err {
        JournalError::UnknownAccount { .. } | JournalError::UnknownTrade { .. } => {
            StatusCode::NOT_FOUND
        }
        JournalError::InvalidTrade { .. } | JournalError::InvalidAccount { .. } => {
            StatusCode::BAD_REQUEST
        }
        JournalError::DuplicateAccount { .. } => StatusCode::CONFLICT,
        JournalError::Mirror { .. } => StatusCode::BAD_GATEWAY,
        JournalError::Storage { .. }
        | JournalError::StorageQuery { .. }
        | JournalError::ConfigParse { .. }
        | JournalError::ConfigMissing { .. }
        | JournalError::ConfigInvalid { .. }
        | JournalError::Report { .. }
        | JournalError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<JournalError> for WebError {
    fn from(err: JournalError) -> Self {
        let status = status_from_error(&err);
        if status.is_server_error() {
            tracing::error!(error = %err, "request failed");
        }
        Self::new(status, err.to_string())
    }
}

impl From<askama::Error> for WebError {
    fn from(err: askama::Error) -> Self {
        tracing::error!(error = %err, "template rendering failed");
        Self::internal(format!("template error: {err}"))
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let content = super::templates::ErrorTemplate {
            message: &self.message,
            status: self.status.as_u16(),
        }
        .render();
        let page = content.and_then(|content| {
            super::templates::PageTemplate {
                title: "Error",
                content: &content,
            }
            .render()
        });
        match page {
            Ok(html) => (self.status, Html(html)).into_response(),
            Err(_) => (self.status, self.message).into_response(),
        }
    }
}
