//! Webhook handler for GitHub ping, pull_request and push events

use axum::{
    body::Bytes,
    extract::State as AxumState,
    http::{HeaderMap, StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use tracing::{debug, info};

use crate::SharedState;
use crate::circleci::{TriggerOutcome, circleci_new_build, log_ignored};
use crate::error::{Result, TriggerError};
use crate::utils::{EVENT_HEADER, SIGNATURE_HEADER, verify_github_signature};
use crate::webhook::{
    BuildPayload, PingEvent, PullRequestEvent, PushEvent, SourceEvent, WebhookEvent,
    delivery_json, parse_webhook_event, pull_request_should_build, push_should_build,
};

pub const PING_REPLY: &str = "The impossible exists only until we find a way to make it possible";

/// Handles the GitHub webhook POST request.
pub async fn handle_webhook(
    AxumState(state): AxumState<SharedState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response> {
    let event_type = headers
        .get(EVENT_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            TriggerError::WebhookValidationFailed(format!("missing {} header", EVENT_HEADER))
        })?;

    if let Some(secret) = state.config.webhook_secret.as_deref() {
        let signature = headers
            .get(SIGNATURE_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                TriggerError::WebhookValidationFailed(format!("missing {} header", SIGNATURE_HEADER))
            })?;
        if !verify_github_signature(secret, &body, signature) {
            return Err(TriggerError::WebhookValidationFailed(
                "invalid signature".to_string(),
            ));
        }
    }

    // The signature covers the raw body, whatever its encoding
    let content_type = headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok());
    let json = delivery_json(content_type, &body)?;

    let Some(event) = parse_webhook_event(event_type, &json)? else {
        debug!("Ignoring unsupported {:?} event", event_type);
        return Ok(StatusCode::NO_CONTENT.into_response());
    };

    match event {
        WebhookEvent::Ping(ping) => Ok(on_ping(ping)),
        WebhookEvent::PullRequest(event) => on_pull_request(&state, event).await,
        WebhookEvent::Push(event) => on_push(&state, event).await,
    }
}

fn on_ping(ping: PingEvent) -> Response {
    info!(
        "Ping received (hook_id: {:?}, zen: {:?})",
        ping.hook_id, ping.zen
    );
    (StatusCode::OK, PING_REPLY).into_response()
}

async fn on_pull_request(state: &SharedState, event: PullRequestEvent) -> Result<Response> {
    let source_event = SourceEvent::PullRequest {
        action: event.action.clone(),
        number: event.number,
    };

    if !pull_request_should_build(&event.action) {
        match BuildPayload::from_pull_request(&event) {
            Ok(payload) => log_ignored(&source_event, &payload),
            Err(_) => info!(
                status = "ignored",
                action = "circleci_new_build",
                source_event = %source_event,
                "Build not triggered, head repository is gone"
            ),
        }
        return Ok(StatusCode::NO_CONTENT.into_response());
    }

    let payload = BuildPayload::from_pull_request(&event)?;
    trigger_build(state, &source_event, &payload).await
}

async fn on_push(state: &SharedState, event: PushEvent) -> Result<Response> {
    let payload = BuildPayload::from_push(&event)?;
    let source_event = SourceEvent::Push;

    // Only pushes to the build branch or of tags are considered
    if !push_should_build(&payload, &state.config.build_branch) {
        log_ignored(&source_event, &payload);
        return Ok(StatusCode::NO_CONTENT.into_response());
    }

    trigger_build(state, &source_event, &payload).await
}

async fn trigger_build(
    state: &SharedState,
    source_event: &SourceEvent,
    payload: &BuildPayload,
) -> Result<Response> {
    let status = match circleci_new_build(&state.http, &state.config, source_event, payload).await? {
        TriggerOutcome::Triggered => StatusCode::OK,
        TriggerOutcome::Skipped => StatusCode::NO_CONTENT,
    };
    Ok(status.into_response())
}
