mod authentication;
mod data_formats;
mod db_helpers;
mod errors;
mod handlers;
mod models;

use anyhow::Context;
pub use anyhow::Result;
use axum::http::StatusCode;
use axum::{routing::*, Extension, Json, Router};
use axum_sessions::{async_session::MemoryStore, SessionLayer};
use rand::RngCore;
use sqlx::{migrate::MigrateDatabase, Sqlite, SqlitePool};
use std::{net::SocketAddr, sync::Arc, time::Duration};

pub use authentication::SessionUser;
pub use data_formats::*;
use handlers::*;

pub type JsonResponse<T> = (StatusCode, Json<T>);

const SESSION_TTL: Duration = Duration::from_secs(60 * 60);

pub async fn run_app(app: Router, address: SocketAddr) -> Result<()> {
    let db = init_db().await?;
    let app = with_state(app, db);
    axum::Server::bind(&address)
        .serve(app.into_make_service())
        .await?;
    Ok(())
}

/// Attaches the injected database handle and the cookie-session layer. The
/// pool travels as an `Extension`, never as module state, so tests can hand
/// each server its own database.
pub fn with_state(app: Router, db: SqlitePool) -> Router {
    let mut secret = [0u8; 64];
    rand::thread_rng().fill_bytes(&mut secret);
    let session_layer = SessionLayer::new(MemoryStore::new(), &secret)
        .with_cookie_name("blog.sid")
        .with_session_ttl(Some(SESSION_TTL))
        .with_secure(false);
    app.layer(Extension(Arc::new(db))).layer(session_layer)
}

pub async fn init_db() -> Result<SqlitePool> {
    let db_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    init_db_at(&db_url).await
}

pub async fn init_db_at(db_url: &str) -> Result<SqlitePool> {
    if !Sqlite::database_exists(db_url).await.unwrap_or(false) {
        tracing::info!("creating database {}", db_url);
        Sqlite::create_database(db_url)
            .await
            .context("Failed to create database")?;
    }
    let pool = SqlitePool::connect(db_url).await?;
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;
    Ok(pool)
}

pub fn make_router() -> Router {
    Router::new()
        .route("/", get(home))
        .route("/check_health", get(alive))
        .route("/add_user", get(add_user_page).post(register_user))
        .route("/check-username", get(check_username))
        .route("/check-email", get(check_email))
        .route("/login", get(login_page).post(login_user))
        .route("/logout", post(logout_user))
        .route("/session-info", get(session_info))
        .route("/profile", get(profile_page))
        .route("/profile/settings", get(settings_page).post(update_settings))
        .route("/profile/check-password", get(check_password))
        .route(
            "/profile/new_article",
            get(new_article_page).post(create_article),
        )
        .route("/profile/article/publish/:article_id", post(publish_article))
        .route(
            "/profile/article/edit/:article_id",
            get(edit_article_page).post(edit_article),
        )
        .route(
            "/profile/article/:article_id",
            get(article_page).delete(delete_article),
        )
        .route("/profile/article/:article_id/comment", post(add_comment))
        .route("/reader", get(reader_page))
        .route("/article/like/:article_id", post(like_article))
        .fallback(not_found)
}
