use vellum::config::Config;
use vellum::state::{AppState, DocumentStore};
use vellum::{db, routes};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();
    if let Err(e) = dotenvy::dotenv() {
        tracing::debug!(error = %e, "no .env loaded");
    }

    let config = Config::from_env();
    let documents = match config.database_url.as_deref() {
        Some(url) => DocumentStore::Postgres(
            db::init_pool(url, config.db_max_connections)
                .await
                .expect("database init failed"),
        ),
        None => {
            tracing::warn!("DATABASE_URL not set; documents are kept in memory");
            DocumentStore::memory()
        }
    };
    let store = documents.kind();
    let state = AppState::new(documents);

    let app = routes::app(state, config.save_body_limit_bytes);
    let port = config.port;
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind");

    tracing::info!(%port, store, "vellum listening");
    axum::serve(listener, app).await.expect("server failed");
}
