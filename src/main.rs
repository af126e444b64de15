use school_nexus_api::{app, config, database::seed, AppState};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up JWT_SECRET, OPENAI_API_KEY, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("school_nexus_api=info,tower_http=info")),
        )
        .init();

    // Initialize configuration (this loads the config singleton)
    let config = config::config().clone();
    tracing::info!("Starting School Nexus API in {:?} mode", config.environment);

    let port = config.server.port;
    let state = AppState::new(config);

    if state.config.seed.enabled {
        let loaded = seed::load_sample_data(&state.store, state.config.security.bcrypt_cost).await?;
        tracing::info!(records = loaded, "sample data loaded");
    }

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("School Nexus API listening on http://{}", bind_addr);

    axum::serve(listener, app(state)).await?;
    Ok(())
}
