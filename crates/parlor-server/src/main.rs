use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Router,
    extract::{State, WebSocketUpgrade},
    response::IntoResponse,
    routing::get,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use parlor_db::{DEFAULT_POOL_SIZE, Database};
use parlor_gateway::connection;
use parlor_gateway::dispatcher::Dispatcher;
use parlor_gateway::registry::{AppState, AppStateInner};
use parlor_gateway::routes;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "parlor_server=debug,parlor_gateway=debug,parlor_db=debug,parlor_game=debug,tower_http=debug".into()
            }),
        )
        .init();

    // Config
    let db_path = std::env::var("PARLOR_DB_PATH").unwrap_or_else(|_| "parlor.db".into());
    let pool_size: usize = std::env::var("PARLOR_POOL_SIZE")
        .map(|v| v.parse())
        .unwrap_or(Ok(DEFAULT_POOL_SIZE))?;
    let host = std::env::var("PARLOR_HOST").unwrap_or_else(|_| "127.0.0.1".into());
    let port: u16 = std::env::var("PARLOR_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()?;

    // Init database
    let db = Database::open(&PathBuf::from(&db_path), pool_size)?;

    // Shared state
    let dispatcher = Dispatcher::new();
    let state: AppState = Arc::new(AppStateInner { db, dispatcher });

    // Routes
    let app = Router::new()
        .route("/users", get(routes::list_users).post(routes::create_user))
        .route("/gateway", get(ws_upgrade))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Parlor server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn ws_upgrade(State(state): State<AppState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| connection::handle_connection(socket, state))
}
