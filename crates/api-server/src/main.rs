use std::net::SocketAddr;
use std::sync::Arc;

use api_server::http::{self, AppState};
use shared::assistant::TurnProcessor;
use shared::config::{ApiConfig, load_dotenv};
use shared::llm::{ExtractionClient, LlmGatewayConfig, OpenRouterGateway, assistant_system_prompt};
use shared::repos::Store;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    if let Err(err) = load_dotenv() {
        eprintln!("{err}");
        std::process::exit(1);
    }

    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| {
            "api_server=debug,shared=info,axum=info,tower_http=info".to_string()
        }))
        .json()
        .flatten_event(true)
        .with_current_span(true)
        .init();

    let config = match ApiConfig::from_env() {
        Ok(cfg) => cfg,
        Err(err) => {
            error!("failed to read config: {err}");
            std::process::exit(1);
        }
    };

    let assistant = match build_assistant(&config) {
        Ok(assistant) => assistant,
        Err(err) => {
            error!("failed to configure language model gateway: {err}");
            std::process::exit(1);
        }
    };
    if assistant.is_none() {
        warn!("LLM_API_KEY is not set; assistant requests will be rejected");
    }

    let store = match Store::connect(&config.database_url, config.database_max_connections).await {
        Ok(store) => store,
        Err(err) => {
            error!("failed to connect to postgres: {err}");
            std::process::exit(1);
        }
    };

    let migrator = match sqlx::migrate::Migrator::new(config.migrations_dir.clone()).await {
        Ok(migrator) => migrator,
        Err(err) => {
            error!("failed to load migrations: {err}");
            std::process::exit(1);
        }
    };

    if let Err(err) = migrator.run(store.pool()).await {
        error!("failed to run migrations: {err}");
        std::process::exit(1);
    }

    let app = http::build_router(AppState { store, assistant });

    let addr: SocketAddr = match config.bind_addr.parse() {
        Ok(addr) => addr,
        Err(err) => {
            error!("invalid API_BIND_ADDR {}: {err}", config.bind_addr);
            std::process::exit(1);
        }
    };

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            error!("failed to bind {addr}: {err}");
            std::process::exit(1);
        }
    };

    info!(
        "api server listening on {}",
        listener.local_addr().unwrap_or(addr)
    );
    if let Err(err) = axum::serve(listener, app).await {
        error!("server stopped: {err}");
        std::process::exit(1);
    }
}

fn build_assistant(
    config: &ApiConfig,
) -> Result<Option<TurnProcessor>, shared::llm::LlmGatewayConfigError> {
    let Some(gateway_config) = LlmGatewayConfig::from_env()? else {
        return Ok(None);
    };
    info!(model = %gateway_config.model, "language model gateway configured");

    let gateway = OpenRouterGateway::new(gateway_config)?;
    let extraction = ExtractionClient::new(
        Arc::new(gateway),
        assistant_system_prompt(&config.assistant_shop_name),
    );
    Ok(Some(TurnProcessor::new(extraction)))
}
