pub mod api;
pub mod circleci;
pub mod config;
pub mod error;
pub mod github;
pub mod ip_guard;
pub mod logging;
pub mod utils;
pub mod webhook;

use chrono::{DateTime, Utc};
use std::sync::Arc;

pub use config::TriggerConfig;
use error::{Result, TriggerError};

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

pub struct AppState {
    pub config: TriggerConfig,
    pub http: reqwest::Client,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Builds the shared state, including the outbound HTTP client used for
    /// both the GitHub meta API and CircleCI.
    pub fn new(config: TriggerConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| TriggerError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            config,
            http,
            started_at: Utc::now(),
        })
    }
}

pub type SharedState = Arc<AppState>;
