//! Request errors for the public directory.
//!
//! Handlers return `Result<T, AppError>`. Visitor store failures are
//! reported to Sentry; a missing provider is an ordinary 404.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use appy_link_core::ProviderId;

use crate::services::client_store::ClientStoreError;

#[derive(Debug, Error)]
pub enum AppError {
    /// No active provider has this id.
    #[error("provider {0} is not listed")]
    ProviderNotFound(ProviderId),

    /// Saving the visitor's favorites or compare tray failed.
    #[error(transparent)]
    ClientStore(#[from] ClientStoreError),
}

impl AppError {
    const fn status(&self) -> StatusCode {
        match self {
            Self::ProviderNotFound(_) => StatusCode::NOT_FOUND,
            Self::ClientStore(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    const fn public_message(&self) -> &'static str {
        match self {
            Self::ProviderNotFound(_) => "That provider is not listed in the directory.",
            Self::ClientStore(_) => "Something went wrong saving your selection. Please try again.",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(error = %self, sentry_event_id = %event_id, "Request error");
        } else {
            tracing::debug!(error = %self, "Request rejected");
        }

        (status, self.public_message()).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

/// Record a visitor action so it shows up in the trail of later Sentry reports.
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_owned()),
        message: Some(message.to_owned()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    for &(key, value) in data.unwrap_or_default() {
        breadcrumb
            .data
            .insert(key.to_owned(), serde_json::Value::String(value.to_owned()));
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_provider_is_not_found() {
        let err = AppError::ProviderNotFound(ProviderId::new(42));
        assert_eq!(err.to_string(), "provider 42 is not listed");
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_store_failure_hides_details() {
        let err = AppError::from(ClientStoreError::new("connection reset by peer"));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.public_message().contains("connection reset"));
    }
}
