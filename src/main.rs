// src/main.rs

use std::sync::Arc;
use std::time::Duration;

use dotenvy::dotenv;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use trivia_master::{
    auth::{IdentityProvider, MemoryIdentityProvider, PgIdentityProvider},
    config::Config,
    quiz::QuizRegistry,
    routes,
    state::AppState,
    stats::StatsRepository,
    store::{AggregateStore, MemoryAggregateStore, PgAggregateStore},
    trivia::{OpenTriviaClient, TriviaRepository, TriviaSource},
};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenv().ok();

    // Load configuration from environment
    let config = Config::from_env().expect("Invalid configuration");

    let file_appender = tracing_appender::rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    // Initialize Tracing (Logging)
    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    let (identity, store): (Arc<dyn IdentityProvider>, Arc<dyn AggregateStore>) =
        match &config.database_url {
            Some(database_url) => {
                let pool = connect_with_retry(database_url).await;

                tracing::info!("Running migrations...");
                sqlx::migrate!("./migrations")
                    .run(&pool)
                    .await
                    .expect("Failed to run database migrations");
                tracing::info!("Migrations applied successfully.");

                (
                    Arc::new(PgIdentityProvider::new(pool.clone())),
                    Arc::new(PgAggregateStore::new(pool)),
                )
            }
            None => {
                tracing::warn!("DATABASE_URL not set; accounts and stats are kept in memory only");
                (
                    Arc::new(MemoryIdentityProvider::new()),
                    Arc::new(MemoryAggregateStore::new()),
                )
            }
        };

    let trivia_client =
        OpenTriviaClient::new(config.trivia_api_url.clone()).expect("Failed to build HTTP client");
    let source: Arc<dyn TriviaSource> = Arc::new(TriviaRepository::new(trivia_client));
    tracing::info!("Trivia questions served from {}", config.trivia_api_url);

    // Create AppState
    let state = AppState {
        config: config.clone(),
        identity,
        stats: StatsRepository::new(store),
        quizzes: Arc::new(QuizRegistry::new(source)),
    };

    // Create the Axum application router
    let app = routes::create_router(state);

    tracing::info!("Listening on {}", config.listen_addr);
    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .expect("Failed to bind listen address");

    // Start the server
    axum::serve(listener, app).await.expect("Server error");
}

/// Initialize Database Pool with Retry
async fn connect_with_retry(database_url: &str) -> PgPool {
    let mut retry_count = 0;
    loop {
        match PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(database_url)
            .await
        {
            Ok(pool) => {
                tracing::info!("Database connected...");
                return pool;
            }
            Err(e) => {
                retry_count += 1;
                if retry_count > 5 {
                    panic!("Failed to connect to database after 5 retries: {}", e);
                }
                tracing::warn!("Database not ready, retrying in 2s... (Attempt {})", retry_count);
                tokio::time::sleep(Duration::from_secs(2)).await;
            }
        }
    }
}
