use axum::{
    Json,
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;

use crate::AppState;
use crate::api::deny_response;
use crate::models::jwt::SessionTokens;
use crate::models::user::Role;
use crate::services::auth_service::{AuthError, AuthRequirement, AuthService, verify_auth};
use crate::services::cookie_service::CookieService;

#[derive(Deserialize)]
pub struct RegisterRequest {
    username: String,
    email: String,
    password: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    email: String,
    password: String,
}

pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Response, AuthError> {
    register_with_role(state, payload, Role::Regular).await
}

pub async fn register_admin(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Response, AuthError> {
    register_with_role(state, payload, Role::Admin).await
}

async fn register_with_role(
    state: AppState,
    payload: RegisterRequest,
    role: Role,
) -> Result<Response, AuthError> {
    let auth_service = AuthService::new(state.pool, state.tokens);
    let user = auth_service
        .register(&payload.username, &payload.email, &payload.password, role)
        .await?;

    tracing::info!(username = %user.username, role = ?user.role, "user registered");
    Ok(Json(json!({ "data": { "message": "User added successfully" } })).into_response())
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Response, AuthError> {
    let auth_service = AuthService::new(state.pool, state.tokens);
    let (user, pair) = auth_service.login(&payload.email, &payload.password).await?;

    tracing::info!(username = %user.username, "user logged in");
    let headers = CookieService::set_auth_cookies(&pair);
    let body = Json(json!({
        "data": {
            "accessToken": pair.access_token,
            "refreshToken": pair.refresh_token,
        }
    }));
    Ok((headers, body).into_response())
}

/// Terminates the session: the stored refresh token is cleared so it can
/// never mint another access token, then both cookies are expired.
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, AuthError> {
    let session = SessionTokens::from_headers(&headers);
    let Some(refresh_token) = session.refresh_token.clone() else {
        return Err(AuthError::MissingRefreshToken);
    };

    let verdict = verify_auth(&session, &AuthRequirement::Simple, &state.tokens);
    if !verdict.allowed {
        return Ok(deny_response(&verdict));
    }

    let auth_service = AuthService::new(state.pool, state.tokens);
    let user = auth_service.logout(&refresh_token).await?;

    tracing::info!(username = %user.username, "user logged out");
    Ok((
        CookieService::clear_auth_cookies(),
        Json(json!({ "data": { "message": "User logged out" } })),
    )
        .into_response())
}
