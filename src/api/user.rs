use axum::{
    extract::{Path, State},
    http::HeaderMap,
    response::Response,
};
use serde::Serialize;

use crate::AppState;
use crate::api::{data_response, deny_response};
use crate::models::jwt::SessionTokens;
use crate::models::user::{Role, User};
use crate::services::auth_service::{AuthError, AuthRequirement, verify_auth};

#[derive(Serialize)]
pub struct UserResponse {
    username: String,
    email: String,
    role: Role,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }
}

/// Admin-only listing of every registered user.
pub async fn get_users(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, AuthError> {
    let session = SessionTokens::from_headers(&headers);
    let verdict = verify_auth(&session, &AuthRequirement::Admin, &state.tokens);
    if !verdict.allowed {
        return Ok(deny_response(&verdict));
    }

    let users = User::find_all(&state.pool).await?;
    let data: Vec<UserResponse> = users.iter().map(UserResponse::from).collect();
    Ok(data_response(data, &verdict))
}

/// A user may fetch their own record; admins may fetch anyone's.
pub async fn get_user(
    State(state): State<AppState>,
    Path(username): Path<String>,
    headers: HeaderMap,
) -> Result<Response, AuthError> {
    let session = SessionTokens::from_headers(&headers);

    let mut verdict = verify_auth(
        &session,
        &AuthRequirement::User {
            username: username.clone(),
        },
        &state.tokens,
    );
    if !verdict.allowed {
        let admin_verdict = verify_auth(&session, &AuthRequirement::Admin, &state.tokens);
        if !admin_verdict.allowed {
            return Ok(deny_response(&verdict));
        }
        verdict = admin_verdict;
    }

    let user = User::find_by_username(&state.pool, &username)
        .await?
        .ok_or(AuthError::UserNotFound)?;

    Ok(data_response(UserResponse::from(&user), &verdict))
}
