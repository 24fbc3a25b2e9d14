// HTTP boundary glue: translates verdicts and auth errors into responses and
// merges the renewed-token side channel into successful JSON bodies.
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Value, json};

use crate::services::auth_service::{AuthError, Verdict};
use crate::services::cookie_service::CookieService;
use crate::services::token_service::TokenError;

pub mod auth;
pub mod user;

/// Wraps handler data as `{"data": ...}`. When the verdict carries a renewed
/// access token, the response also sets the replacement cookie and announces
/// it via `refreshedTokenMessage` so clients re-store the token.
pub(crate) fn data_response<T: Serialize>(data: T, verdict: &Verdict) -> Response {
    let mut body = json!({ "data": data });

    if let Some(refreshed) = &verdict.refreshed {
        body["refreshedTokenMessage"] = Value::String(refreshed.message.clone());
        let headers = CookieService::refreshed_access_cookie(&refreshed.access_token);
        return (headers, Json(body)).into_response();
    }

    Json(body).into_response()
}

/// A denied verdict always maps to 401 with the engine's cause verbatim.
pub(crate) fn deny_response(verdict: &Verdict) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "error": verdict.cause })),
    )
        .into_response()
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = match &self {
            AuthError::InvalidCredentials
            | AuthError::UserNotFound
            | AuthError::UsernameTaken
            | AuthError::EmailTaken
            | AuthError::InvalidField(_)
            | AuthError::MissingRefreshToken => StatusCode::BAD_REQUEST,
            AuthError::Token(TokenError::Expired) | AuthError::Token(TokenError::Malformed(_)) => {
                StatusCode::UNAUTHORIZED
            }
            AuthError::Database(_) | AuthError::PasswordHash => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
