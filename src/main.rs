// Server-rendered blog backend: sessions, articles, comments, likes.

use std::net::SocketAddr;

use inkpost::{make_router, run_app};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "inkpost=info,sqlx=warn".into()),
        )
        .init();
    let addr = SocketAddr::from(([127, 0, 0, 1], 3000));
    let router = make_router();
    tracing::info!("server started on {}", addr);
    if let Err(error) = run_app(router, addr).await {
        tracing::error!("server error: {}", error);
    }
}
