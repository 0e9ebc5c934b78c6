//! Process-wide configuration, read from the environment once at startup.

use ipnet::IpNet;
use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Result, TriggerError};

pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:8888";
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";
pub const DEFAULT_CIRCLECI_API_URL: &str = "https://circleci.com";
pub const DEFAULT_BUILD_BRANCH: &str = "master";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

#[derive(Clone)]
pub struct TriggerConfig {
    pub webhook_secret: Option<String>,
    pub circleci_token: Option<String>,
    pub circleci_repo: Option<String>,
    /// Single GitHub Enterprise host or block replacing the `/meta` hook blocks.
    pub ghe_address: Option<IpNet>,
    pub disable_ip_check: bool,
    /// Take the origin from `X-Forwarded-For`. Only safe behind a proxy that
    /// overwrites the header.
    pub trust_forwarded_for: bool,
    pub debug: bool,
    pub bind_address: String,
    pub github_api_url: String,
    pub circleci_api_url: String,
    pub build_branch: String,
    pub http_timeout: Duration,
    pub log_dir: Option<PathBuf>,
}

impl TriggerConfig {
    /// Reads the configuration from process environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    /// Empty values are treated the same as unset ones.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let ghe_address = get("GHE_ADDRESS")
            .map(|address| parse_hook_block(&address))
            .transpose()?;

        let http_timeout = match get("HTTP_TIMEOUT_SECS") {
            Some(secs) => secs.trim().parse::<u64>().map_err(|e| {
                TriggerError::ConfigError(format!("Invalid HTTP_TIMEOUT_SECS '{}': {}", secs, e))
            })?,
            None => DEFAULT_HTTP_TIMEOUT_SECS,
        };

        Ok(Self {
            webhook_secret: get("GITHUB_WEBHOOK_SECRET"),
            circleci_token: get("CIRCLECI_TOKEN"),
            circleci_repo: get("CIRCLECI_REPO"),
            ghe_address,
            disable_ip_check: parse_flag("DISABLE_IP_CHECK", get("DISABLE_IP_CHECK"))?,
            trust_forwarded_for: parse_flag(
                "TRUST_FORWARDED_FOR",
                get("TRUST_FORWARDED_FOR"),
            )?,
            debug: parse_flag("FLASK_DEBUG", get("FLASK_DEBUG"))?,
            bind_address: get("BIND_ADDRESS").unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string()),
            github_api_url: get("GITHUB_API_URL")
                .unwrap_or_else(|| DEFAULT_GITHUB_API_URL.to_string()),
            circleci_api_url: get("CIRCLECI_API_URL")
                .unwrap_or_else(|| DEFAULT_CIRCLECI_API_URL.to_string()),
            build_branch: get("BUILD_BRANCH").unwrap_or_else(|| DEFAULT_BUILD_BRANCH.to_string()),
            http_timeout: Duration::from_secs(http_timeout),
            log_dir: get("LOG_DIR").map(PathBuf::from),
        })
    }
}

/// Parses a hook block given either as CIDR (`192.30.252.0/22`) or as a bare address.
pub fn parse_hook_block(block: &str) -> Result<IpNet> {
    let block = block.trim();
    if let Ok(net) = block.parse::<IpNet>() {
        return Ok(net);
    }
    let address = block
        .parse::<IpAddr>()
        .map_err(|e| TriggerError::InvalidHookBlock {
            block: block.to_string(),
            message: e.to_string(),
        })?;
    let prefix_len = if address.is_ipv4() { 32 } else { 128 };
    IpNet::new(address, prefix_len).map_err(|e| TriggerError::InvalidHookBlock {
        block: block.to_string(),
        message: e.to_string(),
    })
}

fn parse_flag(name: &str, value: Option<String>) -> Result<bool> {
    let Some(value) = value else {
        return Ok(false);
    };
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(TriggerError::ConfigError(format!(
            "{} must be a boolean flag, got '{}'",
            name, other
        ))),
    }
}
