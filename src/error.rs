use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use std::io;
use tracing::{error, warn};

/// Custom error type for github_circleci_trigger operations
#[derive(Debug, thiserror::Error)]
pub enum TriggerError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Request origin {0} is not within the allowed hook address blocks")]
    ForbiddenOrigin(String),

    #[error("Webhook validation failed: {0}")]
    WebhookValidationFailed(String),

    #[error("Invalid webhook payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),

    #[error("Invalid form-encoded delivery: {0}")]
    InvalidFormPayload(#[from] serde_urlencoded::de::Error),

    #[error("Pull request #{0} has no head repository")]
    MissingHeadRepository(u64),

    #[error("Unsupported ref: {0}")]
    UnsupportedRef(String),

    #[error("Invalid hook address block '{block}': {message}")]
    InvalidHookBlock { block: String, message: String },

    #[error("Failed to fetch hook address blocks: {0}")]
    HookBlocksFetchFailed(#[source] reqwest::Error),

    #[error("CircleCI build trigger failed: {0}")]
    BuildTriggerFailed(#[source] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
}

impl TriggerError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            TriggerError::ForbiddenOrigin(_) => StatusCode::FORBIDDEN,
            TriggerError::WebhookValidationFailed(_)
            | TriggerError::InvalidPayload(_)
            | TriggerError::InvalidFormPayload(_)
            | TriggerError::MissingHeadRepository(_) => StatusCode::BAD_REQUEST,
            TriggerError::ConfigError(_)
            | TriggerError::UnsupportedRef(_)
            | TriggerError::InvalidHookBlock { .. }
            | TriggerError::HookBlocksFetchFailed(_)
            | TriggerError::BuildTriggerFailed(_)
            | TriggerError::IoError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for TriggerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("{}", self);
        } else {
            warn!("{}", self);
        }
        (status, self.to_string()).into_response()
    }
}

/// Helper type for Results that use TriggerError
pub type Result<T> = std::result::Result<T, TriggerError>;
