mod error;
mod routes;
mod store;

use std::sync::Arc;

use anyhow::Result;
use hardball_core::clock::{Clock, SystemClock};
use hardball_core::config::HardballConfig;
use hardball_core::llm::LlmService;

use crate::store::SessionStore;

pub struct AppState {
    pub config: HardballConfig,
    pub llm: LlmService,
    pub sessions: SessionStore,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    pub fn new(config: HardballConfig, llm: LlmService, clock: Arc<dyn Clock>) -> Self {
        // Finished sessions stay viewable for one more countdown's worth of time.
        let sessions = SessionStore::new(config.simulation.duration() * 2);
        Self {
            config,
            llm,
            sessions,
            clock,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("hardball_web=info,tower_http=info")),
        )
        .init();

    let config = match HardballConfig::load(Some(&std::env::current_dir()?)) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!("failed to load config, using defaults: {e}");
            HardballConfig::default_config()
        }
    };

    let llm = LlmService::from_config(&config.llm)?;
    tracing::info!(
        provider = llm.provider_name(),
        model = llm.model(),
        duration_secs = config.simulation.duration_secs,
        "counterpart backend ready"
    );

    let addr = format!("{}:{}", config.web.host, config.web.port);
    let state = Arc::new(AppState::new(config, llm, Arc::new(SystemClock)));

    let app = routes::router()
        .with_state(state)
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .layer(tower_http::cors::CorsLayer::permissive());

    tracing::info!("hardball-web listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
