use library_app::{
    adapters::in_memory::InMemoryLibraryStore,
    adapters::postgres::{
        PostgresBookRepository, PostgresLoanHistoryRepository, PostgresUserRepository,
    },
    api::{create_router, handlers::AppState},
    application::library::ServiceDependencies,
    config::AppConfig,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // .env is optional
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "library_app=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env().expect("Invalid configuration");

    let service_deps = match &config.database_url {
        Some(database_url) => {
            tracing::info!(
                max_connections = config.database_max_connections,
                "Connecting to PostgreSQL"
            );

            let pool = sqlx::postgres::PgPoolOptions::new()
                .max_connections(config.database_max_connections)
                .connect(database_url)
                .await
                .expect("Failed to connect to database");

            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .expect("Failed to run migrations");

            ServiceDependencies {
                user_repository: Arc::new(PostgresUserRepository::new(pool.clone())),
                book_repository: Arc::new(PostgresBookRepository::new(pool.clone())),
                loan_history_repository: Arc::new(PostgresLoanHistoryRepository::new(pool)),
            }
        }
        None => {
            tracing::warn!("DATABASE_URL is not set, using in-memory store");
            let store = Arc::new(InMemoryLibraryStore::new());
            ServiceDependencies {
                user_repository: store.clone(),
                book_repository: store.clone(),
                loan_history_repository: store,
            }
        }
    };

    // Create application state
    let app_state = Arc::new(AppState { service_deps });

    // Create router
    let app = create_router(app_state);

    let addr = config.listen_addr().expect("Invalid listen address");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Server listening on {}", addr);

    // Start server
    axum::serve(listener, app)
        .await
        .expect("Failed to start server");
}
