//! GitHub meta API client

use serde::Deserialize;
use tracing::debug;

use crate::error::{Result, TriggerError};

/// Subset of `GET /meta` this service cares about.
#[derive(Debug, Deserialize)]
pub struct GithubMeta {
    pub hooks: Vec<String>,
}

/// Fetches the address blocks GitHub delivers webhooks from.
pub async fn fetch_hook_blocks(client: &reqwest::Client, api_url: &str) -> Result<Vec<String>> {
    let url = format!("{}/meta", api_url.trim_end_matches('/'));
    debug!("Fetching hook address blocks from {}", url);

    let meta: GithubMeta = client
        .get(&url)
        .header("Accept", "application/vnd.github+json")
        .send()
        .await
        .and_then(|response| response.error_for_status())
        .map_err(TriggerError::HookBlocksFetchFailed)?
        .json()
        .await
        .map_err(TriggerError::HookBlocksFetchFailed)?;

    Ok(meta.hooks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_fetch_hook_blocks() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/meta"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "verifiable_password_authentication": true,
                "hooks": ["192.30.252.0/22", "185.199.108.0/22"],
                "web": ["192.30.252.0/22"]
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let blocks = fetch_hook_blocks(&reqwest::Client::new(), &mock_server.uri())
            .await
            .unwrap();
        assert_eq!(blocks, vec!["192.30.252.0/22", "185.199.108.0/22"]);
    }

    #[tokio::test]
    async fn test_fetch_hook_blocks_error_status() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/meta"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&mock_server)
            .await;

        let result = fetch_hook_blocks(&reqwest::Client::new(), &mock_server.uri()).await;
        assert!(matches!(result, Err(TriggerError::HookBlocksFetchFailed(_))));
    }

    #[tokio::test]
    async fn test_fetch_hook_blocks_unexpected_body() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/meta"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"web": []})))
            .mount(&mock_server)
            .await;

        let result = fetch_hook_blocks(&reqwest::Client::new(), &mock_server.uri()).await;
        assert!(matches!(result, Err(TriggerError::HookBlocksFetchFailed(_))));
    }
}
