//! Webhook related structures

use serde::Deserialize;
use std::borrow::Cow;
use std::fmt;

use crate::error::{Result, TriggerError};

const HEADS_PREFIX: &str = "refs/heads/";
const TAGS_PREFIX: &str = "refs/tags/";
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

#[derive(Debug, Clone, Deserialize)]
pub struct Repository {
    pub full_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PingEvent {
    pub zen: Option<String>,
    pub hook_id: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestHead {
    #[serde(rename = "ref")]
    pub branch: String,
    pub sha: String,
    /// Null when the fork the pull request came from has been deleted.
    pub repo: Option<Repository>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PullRequest {
    pub head: PullRequestHead,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestEvent {
    pub action: String,
    pub number: u64,
    pub pull_request: PullRequest,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PushEvent {
    #[serde(rename = "ref")]
    pub git_ref: String,
    pub base_ref: Option<String>,
    pub after: String,
    pub repository: Repository,
}

/// A decoded webhook delivery for one of the supported event types.
#[derive(Debug, Clone)]
pub enum WebhookEvent {
    Ping(PingEvent),
    PullRequest(PullRequestEvent),
    Push(PushEvent),
}

/// Form-encoded deliveries carry the JSON document in a `payload` field.
#[derive(Debug, Deserialize)]
struct FormDelivery {
    payload: String,
}

/// Returns the JSON document of a delivery. Hooks configured with the
/// `application/x-www-form-urlencoded` content type wrap it in a `payload`
/// form field, every other content type is taken as raw JSON.
pub fn delivery_json<'a>(content_type: Option<&str>, body: &'a [u8]) -> Result<Cow<'a, [u8]>> {
    let is_form = content_type
        .and_then(|v| v.split(';').next())
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case(FORM_CONTENT_TYPE));
    if !is_form {
        return Ok(Cow::Borrowed(body));
    }

    let form: FormDelivery = serde_urlencoded::from_bytes(body)?;
    Ok(Cow::Owned(form.payload.into_bytes()))
}

/// Decodes `body` according to the `X-GitHub-Event` header value.
/// Returns `Ok(None)` for event types this service does not handle.
pub fn parse_webhook_event(event_type: &str, body: &[u8]) -> Result<Option<WebhookEvent>> {
    let event = match event_type {
        "ping" => WebhookEvent::Ping(serde_json::from_slice(body)?),
        "pull_request" => WebhookEvent::PullRequest(serde_json::from_slice(body)?),
        "push" => WebhookEvent::Push(serde_json::from_slice(body)?),
        _ => return Ok(None),
    };
    Ok(Some(event))
}

/// Build parameters handed to CircleCI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildPayload {
    pub repo: String,
    pub branch: String,
    pub tag: String,
    pub revision: String,
}

impl BuildPayload {
    pub fn from_pull_request(event: &PullRequestEvent) -> Result<Self> {
        let head = &event.pull_request.head;
        let repo = head
            .repo
            .as_ref()
            .ok_or(TriggerError::MissingHeadRepository(event.number))?;
        Ok(Self {
            repo: repo.full_name.clone(),
            branch: head.branch.clone(),
            tag: String::new(),
            revision: head.sha.clone(),
        })
    }

    /// Extracts repo, branch and tag from a push.
    ///
    /// Tag pushes take their branch from `base_ref`, which GitHub leaves null
    /// when the tagged commit is not the head of any branch.
    pub fn from_push(event: &PushEvent) -> Result<Self> {
        let (branch, tag) = if let Some(tag) = event.git_ref.strip_prefix(TAGS_PREFIX) {
            let branch = event
                .base_ref
                .as_deref()
                .map(|base| base.strip_prefix(HEADS_PREFIX).unwrap_or(base))
                .unwrap_or_default();
            (branch, tag)
        } else if let Some(branch) = event.git_ref.strip_prefix(HEADS_PREFIX) {
            (branch, "")
        } else {
            return Err(TriggerError::UnsupportedRef(event.git_ref.clone()));
        };

        Ok(Self {
            repo: event.repository.full_name.clone(),
            branch: branch.to_string(),
            tag: tag.to_string(),
            revision: event.after.clone(),
        })
    }

    pub fn has_tag(&self) -> bool {
        !self.tag.is_empty()
    }
}

/// Only pushes to the build branch or pushes of tags are built.
pub fn push_should_build(payload: &BuildPayload, build_branch: &str) -> bool {
    payload.branch == build_branch || payload.has_tag()
}

pub fn pull_request_should_build(action: &str) -> bool {
    matches!(action, "opened" | "edited")
}

/// Which delivery a build payload came from, for log records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceEvent {
    Push,
    PullRequest { action: String, number: u64 },
}

impl fmt::Display for SourceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceEvent::Push => write!(f, "type=push"),
            SourceEvent::PullRequest { action, number } => {
                write!(f, "type=pull_request action={} number={}", action, number)
            }
        }
    }
}
