use axum::{
    extract::{ConnectInfo, Request, State as AxumState},
    middleware::Next,
    response::Response,
};
use ipnet::IpNet;
use std::net::{IpAddr, SocketAddr};
use tracing::debug;

use crate::SharedState;
use crate::config::parse_hook_block;
use crate::error::{Result, TriggerError};
use crate::github::fetch_hook_blocks;

const LOOPBACK_BLOCKS: [&str; 2] = ["127.0.0.0/8", "::1/128"];

/// Address blocks allowed to call the service
#[derive(Debug, Clone, Default)]
pub struct HookBlocks {
    blocks: Vec<IpNet>,
}

impl HookBlocks {
    pub fn new(blocks: Vec<IpNet>) -> Self {
        Self { blocks }
    }

    pub fn parse<S: AsRef<str>>(blocks: &[S]) -> Result<Self> {
        let blocks = blocks
            .iter()
            .map(|block| parse_hook_block(block.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { blocks })
    }

    pub fn with_loopback(mut self) -> Self {
        for block in LOOPBACK_BLOCKS {
            if let Ok(net) = block.parse() {
                self.blocks.push(net);
            }
        }
        self
    }

    /// Returns true if `ip` falls within at least one block.
    pub fn contains(&self, ip: IpAddr) -> bool {
        let ip = ip.to_canonical();
        self.blocks.iter().any(|block| block.contains(&ip))
    }
}

/// Resolves the blocks for one request: the configured override when present,
/// otherwise a fresh copy of GitHub's published `hooks` blocks.
pub async fn resolve_hook_blocks(state: &SharedState) -> Result<HookBlocks> {
    let config = &state.config;
    let blocks = match config.ghe_address {
        Some(address) => HookBlocks::new(vec![address]),
        None => {
            let hooks = fetch_hook_blocks(&state.http, &config.github_api_url).await?;
            HookBlocks::parse(hooks.as_slice())?
        }
    };

    // Support debugging
    if config.debug {
        Ok(blocks.with_loopback())
    } else {
        Ok(blocks)
    }
}

/// The address the request originates from.
///
/// With `trust_forwarded_for` set and an `X-Forwarded-For` header present, the
/// first hop is the origin and an unparsable hop yields `None`. Otherwise the
/// TCP peer is the origin.
pub fn request_ip(request: &Request, trust_forwarded_for: bool) -> Option<IpAddr> {
    if trust_forwarded_for {
        if let Some(forwarded) = request.headers().get("X-Forwarded-For") {
            return forwarded
                .to_str()
                .ok()
                .and_then(|v| v.split(',').next())
                .and_then(|first| first.trim().parse::<IpAddr>().ok());
        }
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
}

/// Middleware rejecting requests that do not come from a GitHub hook address.
pub async fn ip_check(
    AxumState(state): AxumState<SharedState>,
    request: Request,
    next: Next,
) -> Result<Response> {
    if state.config.disable_ip_check {
        return Ok(next.run(request).await);
    }

    let Some(ip) = request_ip(&request, state.config.trust_forwarded_for) else {
        return Err(TriggerError::ForbiddenOrigin("unknown".to_string()));
    };

    let blocks = resolve_hook_blocks(&state).await?;
    if !blocks.contains(ip) {
        return Err(TriggerError::ForbiddenOrigin(ip.to_string()));
    }

    debug!("Request from {} admitted", ip);
    Ok(next.run(request).await)
}
