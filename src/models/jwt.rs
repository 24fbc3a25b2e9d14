// src/models/jwt.rs
use axum::http::HeaderMap;
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::models::user::{Role, User};
use crate::services::cookie_service::CookieService;

pub const ACCESS_TOKEN_HOURS: i64 = 1;
pub const REFRESH_TOKEN_DAYS: i64 = 7;

/// Identity claims carried by both access and refresh tokens.
///
/// The identity fields are optional on purpose: a token can decode
/// successfully and still lack username/email/role, and the decision engine
/// must be able to see that state to report "Token is missing information".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub iat: i64, // issued at
    pub exp: i64, // expiration time
}

#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// The (accessToken, refreshToken) cookie pair as read from a request.
/// Either half may be absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionTokens {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
}

impl SessionTokens {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        CookieService::extract_session(headers)
    }
}

impl Claims {
    /// Access-token claims for a user, valid for one hour.
    pub fn access(user: &User) -> Self {
        Self::for_user(user, Duration::hours(ACCESS_TOKEN_HOURS))
    }

    /// Refresh-token claims for a user, valid for seven days.
    pub fn refresh(user: &User) -> Self {
        Self::for_user(user, Duration::days(REFRESH_TOKEN_DAYS))
    }

    fn for_user(user: &User, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            username: Some(user.username.clone()),
            email: Some(user.email.clone()),
            role: Some(user.role),
            id: Some(user.id.to_string()),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        }
    }

    /// Same identity, fresh one-hour expiry window. Used when minting a
    /// replacement access token from still-valid refresh claims.
    pub fn renewed_access(&self) -> Self {
        let now = Utc::now();
        Self {
            username: self.username.clone(),
            email: self.email.clone(),
            role: self.role,
            id: self.id.clone(),
            iat: now.timestamp(),
            exp: (now + Duration::hours(ACCESS_TOKEN_HOURS)).timestamp(),
        }
    }

    /// True when username, email and role are all present and non-empty.
    pub fn has_identity(&self) -> bool {
        fn present(field: &Option<String>) -> bool {
            field.as_deref().is_some_and(|value| !value.is_empty())
        }
        present(&self.username) && present(&self.email) && self.role.is_some()
    }

    /// True when both claim sets name the same user (username, email, role).
    pub fn same_identity(&self, other: &Self) -> bool {
        self.username == other.username && self.email == other.email && self.role == other.role
    }
}
