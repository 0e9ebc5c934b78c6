use github_circleci_trigger::api::create_app;
use github_circleci_trigger::error::Result;
use github_circleci_trigger::{AppState, TriggerConfig, logging};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info, warn};

async fn run(config: TriggerConfig) -> Result<()> {
    if config.webhook_secret.is_none() {
        warn!("GITHUB_WEBHOOK_SECRET is not set, webhook signatures will not be verified");
    }
    if config.disable_ip_check {
        warn!("DISABLE_IP_CHECK is set, requests are accepted from any address");
    } else if let Some(address) = config.ghe_address {
        info!("Accepting hooks from GHE_ADDRESS {}", address);
    }
    if config.trust_forwarded_for && !config.disable_ip_check {
        info!("Taking the request origin from X-Forwarded-For");
    }

    let bind_address = config.bind_address.clone();
    let state = Arc::new(AppState::new(config)?);
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    info!("Listening on {}", bind_address);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    let config = match TriggerConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    let _log_guard = match logging::setup_logging(&config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run(config).await {
        error!("Server error: {}", e);
        std::process::exit(1);
    }
}
