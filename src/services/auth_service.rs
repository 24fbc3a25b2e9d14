// src/services/auth_service.rs
//
// The authorization core: a pure predicate over the request's token pair and
// a declared requirement. Every protected handler calls `verify_auth` before
// touching data; the credential-store flows (register/login/logout) live in
// `AuthService` below and are the only code that touches the user table.
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::models::jwt::{Claims, SessionTokens, TokenPair};
use crate::models::user::{Role, User};
use crate::services::token_service::{TokenError, TokenService};

/// Notice delivered alongside a renewed access token so clients know to
/// re-store it before their next request.
pub const REFRESHED_TOKEN_MESSAGE: &str =
    "your token has been refreshed. Remember to copy the new one in the headers of subsequent calls";

/// What a caller must prove before a handler proceeds.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthRequirement {
    /// Any internally consistent, unexpired session.
    Simple,
    /// Session must belong to this exact username.
    User { username: String },
    /// Session role must be Admin.
    Admin,
    /// Session email must be one of the listed group members.
    Group { emails: Vec<String> },
}

/// Access token minted on the renewal path, to be propagated back to the
/// caller as a cookie plus a body notice.
#[derive(Debug, Clone, PartialEq)]
pub struct RefreshedToken {
    pub access_token: String,
    pub message: String,
}

/// Outcome of an authorization check. Never an error: denials are data.
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub allowed: bool,
    pub cause: String,
    pub refreshed: Option<RefreshedToken>,
}

impl Verdict {
    fn allow() -> Self {
        Self {
            allowed: true,
            cause: "authorized".to_string(),
            refreshed: None,
        }
    }

    fn deny(cause: impl Into<String>) -> Self {
        Self {
            allowed: false,
            cause: cause.into(),
            refreshed: None,
        }
    }
}

/// The authorization predicate.
///
/// Decodes the access token first, then the refresh token. An expired token
/// on either side diverts to the renewal path, which re-checks the refresh
/// token on its own and, when the requirement holds, mints a fresh one-hour
/// access token. Malformed tokens deny with the raw codec error name.
/// Denials carry no side channel; only a renewal-path allow does.
#[instrument(skip_all, fields(requirement = ?requirement))]
pub fn verify_auth(
    session: &SessionTokens,
    requirement: &AuthRequirement,
    tokens: &TokenService,
) -> Verdict {
    let (Some(access), Some(refresh)) = (&session.access_token, &session.refresh_token) else {
        return Verdict::deny("Unauthorized");
    };

    let access_claims = match tokens.verify(access) {
        Ok(claims) => claims,
        Err(TokenError::Expired) => return renew(refresh, requirement, tokens),
        Err(TokenError::Malformed(name)) => return Verdict::deny(name),
    };
    let refresh_claims = match tokens.verify(refresh) {
        Ok(claims) => claims,
        Err(TokenError::Expired) => return renew(refresh, requirement, tokens),
        Err(TokenError::Malformed(name)) => return Verdict::deny(name),
    };

    if !access_claims.has_identity() || !refresh_claims.has_identity() {
        return Verdict::deny("Token is missing information");
    }
    if !access_claims.same_identity(&refresh_claims) {
        return Verdict::deny("Mismatched users");
    }

    evaluate(requirement, &access_claims)
}

/// Renewal path: the access token no longer counts, only the refresh token's
/// claims are consulted. Both tokens expired means the session is dead.
fn renew(refresh: &str, requirement: &AuthRequirement, tokens: &TokenService) -> Verdict {
    debug!("access token expired, falling back to refresh token");

    let claims = match tokens.verify(refresh) {
        Ok(claims) => claims,
        Err(TokenError::Expired) => return Verdict::deny("Perform login again"),
        Err(TokenError::Malformed(name)) => return Verdict::deny(name),
    };
    if !claims.has_identity() {
        return Verdict::deny("Token is missing information");
    }

    let mut verdict = evaluate(requirement, &claims);
    if verdict.allowed {
        match tokens.issue(&claims.renewed_access()) {
            Ok(access_token) => {
                verdict.refreshed = Some(RefreshedToken {
                    access_token,
                    message: REFRESHED_TOKEN_MESSAGE.to_string(),
                });
            }
            Err(err) => return Verdict::deny(err.to_string()),
        }
    }
    verdict
}

fn evaluate(requirement: &AuthRequirement, claims: &Claims) -> Verdict {
    let satisfied = match requirement {
        AuthRequirement::Simple => true,
        AuthRequirement::User { username } => claims.username.as_deref() == Some(username),
        AuthRequirement::Admin => claims.role == Some(Role::Admin),
        AuthRequirement::Group { emails } => claims
            .email
            .as_deref()
            .is_some_and(|email| emails.iter().any(|member| member == email)),
    };

    if satisfied {
        Verdict::allow()
    } else {
        Verdict::deny("Unauthorized")
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("wrong credentials")]
    InvalidCredentials,
    #[error("user not found")]
    UserNotFound,
    #[error("username is already taken")]
    UsernameTaken,
    #[error("email is already registered")]
    EmailTaken,
    #[error("invalid {0}")]
    InvalidField(&'static str),
    #[error("no refresh token cookie")]
    MissingRefreshToken,
    #[error("failed to hash password")]
    PasswordHash,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Token(#[from] TokenError),
}

/// Register/login/logout flows against the credential store. The decision
/// engine above never goes through here.
#[derive(Clone)]
pub struct AuthService {
    pool: SqlitePool,
    tokens: TokenService,
}

impl AuthService {
    pub fn new(pool: SqlitePool, tokens: TokenService) -> Self {
        Self { pool, tokens }
    }

    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
        role: Role,
    ) -> Result<User, AuthError> {
        if username.trim().is_empty() {
            return Err(AuthError::InvalidField("username"));
        }
        if password.is_empty() {
            return Err(AuthError::InvalidField("password"));
        }
        if !is_plausible_email(email) {
            return Err(AuthError::InvalidField("email"));
        }
        if User::find_by_username(&self.pool, username).await?.is_some() {
            return Err(AuthError::UsernameTaken);
        }
        if User::find_by_email(&self.pool, email).await?.is_some() {
            return Err(AuthError::EmailTaken);
        }

        let password_hash =
            bcrypt::hash(password, bcrypt::DEFAULT_COST).map_err(|_| AuthError::PasswordHash)?;
        let user = User::create(&self.pool, username, email, &password_hash, role).await?;
        Ok(user)
    }

    /// Issues a fresh session pair and persists the refresh token on the user
    /// record so logout can invalidate it server-side.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<(User, TokenPair), AuthError> {
        let user = User::find_by_email(&self.pool, email)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let password_matches =
            bcrypt::verify(password, &user.password_hash).map_err(|_| AuthError::PasswordHash)?;
        if !password_matches {
            return Err(AuthError::InvalidCredentials);
        }

        let pair = TokenPair {
            access_token: self.tokens.issue(&Claims::access(&user))?,
            refresh_token: self.tokens.issue(&Claims::refresh(&user))?,
        };
        User::store_refresh_token(&self.pool, user.id, &pair.refresh_token).await?;

        Ok((user, pair))
    }

    /// Terminates the session owning this refresh token.
    pub async fn logout(&self, refresh_token: &str) -> Result<User, AuthError> {
        let user = User::find_by_refresh_token(&self.pool, refresh_token)
            .await?
            .ok_or(AuthError::UserNotFound)?;
        User::clear_refresh_token(&self.pool, user.id).await?;
        Ok(user)
    }
}

fn is_plausible_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}
