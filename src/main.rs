use axum::{
    Router,
    routing::{get, post},
};
use sqlx::SqlitePool;
use std::net::SocketAddr;
use tower_http::cors::{Any, CorsLayer};

use crate::services::token_service::TokenService;

mod api;
mod config;
mod db;
mod models;
mod services;
#[cfg(test)]
mod tests;

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub tokens: TokenService,
}

pub fn create_router(state: AppState) -> Router {
    // Create a CORS layer
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // build our application with routes
    Router::new()
        .route("/api/register", post(api::auth::register))
        .route("/api/admin", post(api::auth::register_admin))
        .route("/api/login", post(api::auth::login))
        .route("/api/logout", get(api::auth::logout))
        .route("/api/users", get(api::user::get_users))
        .route("/api/users/:username", get(api::user::get_user))
        .layer(cors)
        .with_state(state)
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let config = config::Config::from_env();

    // Initialize database
    let pool = db::create_db_pool(&config.database_url).await;

    let state = AppState {
        pool,
        tokens: TokenService::new(&config.secret_key),
    };

    // Create the router
    let app = create_router(state);

    // run it with hyper
    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
