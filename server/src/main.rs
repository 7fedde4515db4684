use axum::Router;
use dotenvy::dotenv;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use transit_validator_server::config::Config;
use transit_validator_server::routes::create_routes;
use transit_validator_server::state::AppState;
use transit_validator_server::store::SqliteStore;
use transit_validator_server::validation::Validator;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env()?;

    let store = SqliteStore::open(&config.data_dir).await.map_err(|e| {
        tracing::error!(error = %e, data_dir = %config.data_dir.display(), "Failed to open ticket database");
        e
    })?;

    let state = AppState::new(Validator::new(store));
    let app: Router = create_routes(state, &config);

    let listener = TcpListener::bind(config.bind_addr).await?;
    tracing::info!("🚌 Ticket validator running at http://{}", config.bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
