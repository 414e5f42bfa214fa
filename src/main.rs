use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use courtside::config::ServerConfig;
use courtside::hub::{
    self, GameRepository, HubRegistry, InMemoryGameRepository, PostgresGameRepository,
};
use courtside::shared::AppState;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "courtside=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting courtside live game server");

    let config = ServerConfig::from_env();

    let game_repository: Arc<dyn GameRepository + Send + Sync> = match &config.database_url {
        Some(database_url) => {
            let pool = sqlx::PgPool::connect(database_url)
                .await
                .expect("Failed to connect to database");
            info!("Using PostgreSQL game repository");
            Arc::new(PostgresGameRepository::new(pool))
        }
        None => {
            info!("DATABASE_URL not set, using in-memory game repository");
            Arc::new(InMemoryGameRepository::new())
        }
    };

    let registry = HubRegistry::new(game_repository, config.hub.clone());
    let app_state = AppState::new(registry);

    let app = Router::new()
        .route("/", get(|| async { "courtside" }))
        .route("/games/:pin/start", post(hub::start_game))
        .route("/games/:pin/end", post(hub::end_game))
        .route("/games/:pin/keep", get(hub::keep_game))
        .route("/games/:pin/watch", get(hub::watch_game))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("Failed to bind listener");
    info!(bind_addr = %config.bind_addr, "Server running");
    axum::serve(listener, app).await.expect("Server error");
}
