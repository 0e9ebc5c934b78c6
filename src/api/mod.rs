//! API module for all HTTP handlers

pub mod handlers;
pub mod webhook;

use axum::{Router, middleware, routing};

use crate::SharedState;
use crate::ip_guard::ip_check;

// Re-export handlers
pub use handlers::{WEBHOOK_PATH, root};
pub use webhook::{PING_REPLY, handle_webhook};

/// Builds the router. Every route sits behind the IP origin guard.
pub fn create_app(state: SharedState) -> Router {
    Router::new()
        .route("/", routing::get(root))
        .route(WEBHOOK_PATH, routing::post(handle_webhook))
        .layer(middleware::from_fn_with_state(state.clone(), ip_check))
        .with_state(state)
}
