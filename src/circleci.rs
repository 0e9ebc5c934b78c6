//! CircleCI build trigger

use serde::Serialize;
use tracing::{error, info};

use crate::config::TriggerConfig;
use crate::error::{Result, TriggerError};
use crate::webhook::{BuildPayload, SourceEvent};

#[derive(Debug, Serialize)]
struct BuildParameters<'a> {
    #[serde(rename = "SLICER_REPO_NAME")]
    repo: &'a str,
    #[serde(rename = "SLICER_REPO_BRANCH")]
    branch: &'a str,
    #[serde(rename = "SLICER_REPO_TAG")]
    tag: &'a str,
    #[serde(rename = "SLICER_REPO_REVISION")]
    revision: &'a str,
}

#[derive(Debug, Serialize)]
struct NewBuildRequest<'a> {
    build_parameters: BuildParameters<'a>,
}

impl<'a> From<&'a BuildPayload> for NewBuildRequest<'a> {
    fn from(payload: &'a BuildPayload) -> Self {
        Self {
            build_parameters: BuildParameters {
                repo: &payload.repo,
                branch: &payload.branch,
                tag: &payload.tag,
                revision: &payload.revision,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    Triggered,
    /// CircleCI credentials are not configured, nothing was sent.
    Skipped,
}

pub fn log_ignored(source_event: &SourceEvent, payload: &BuildPayload) {
    info!(
        status = "ignored",
        action = "circleci_new_build",
        source_event = %source_event,
        repo = %payload.repo,
        branch = %payload.branch,
        tag = %payload.tag,
        revision = %payload.revision,
        "Build not triggered"
    );
}

/// Starts a new build of the configured CircleCI project with `payload` as
/// build parameters.
pub async fn circleci_new_build(
    client: &reqwest::Client,
    config: &TriggerConfig,
    source_event: &SourceEvent,
    payload: &BuildPayload,
) -> Result<TriggerOutcome> {
    info!(
        status = "triggered",
        action = "circleci_new_build",
        source_event = %source_event,
        repo = %payload.repo,
        branch = %payload.branch,
        tag = %payload.tag,
        revision = %payload.revision,
        "Triggering build"
    );

    let Some(token) = config.circleci_token.as_deref() else {
        error!("CIRCLECI_TOKEN is not set");
        return Ok(TriggerOutcome::Skipped);
    };
    let Some(repo) = config.circleci_repo.as_deref() else {
        error!("CIRCLECI_REPO is not set");
        return Ok(TriggerOutcome::Skipped);
    };

    let api_url = format!(
        "{}/api/v1.1/project/github/{}",
        config.circleci_api_url.trim_end_matches('/'),
        repo
    );

    client
        .post(&api_url)
        .query(&[("circle-token", token)])
        .json(&NewBuildRequest::from(payload))
        .send()
        .await
        .and_then(|response| response.error_for_status())
        .map_err(TriggerError::BuildTriggerFailed)?;

    info!("CircleCI build started for {} ({})", repo, payload.revision);
    Ok(TriggerOutcome::Triggered)
}
