// src/services/token_service.rs
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use thiserror::Error;
use tracing::instrument;

use crate::models::jwt::Claims;

/// Why a token failed verification. The two kinds drive different recovery
/// paths: `Expired` feeds the refresh fallback, `Malformed` is fatal for the
/// request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("TokenExpiredError")]
    Expired,
    /// Carries the raw jsonwebtoken error-kind identifier, surfaced verbatim
    /// as the denial cause.
    #[error("{0}")]
    Malformed(String),
}

/// Signs and verifies claims tokens with the process-wide HS256 secret.
#[derive(Clone)]
pub struct TokenService {
    enc_key: EncodingKey,
    dec_key: DecodingKey,
}

impl TokenService {
    pub fn new(secret_key: &str) -> Self {
        Self {
            enc_key: EncodingKey::from_secret(secret_key.as_bytes()),
            dec_key: DecodingKey::from_secret(secret_key.as_bytes()),
        }
    }

    /// Serialize and sign a claims set. Pure computation, no side effects.
    #[instrument(skip(self))]
    pub fn issue(&self, claims: &Claims) -> Result<String, TokenError> {
        encode(&Header::default(), claims, &self.enc_key)
            .map_err(|err| TokenError::Malformed(kind_name(err.kind())))
    }

    /// Decode and validate a token. Expiry is checked with zero leeway so
    /// `now >= exp` always reads as expired.
    #[instrument(skip(self, token))]
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        decode::<Claims>(token, &self.dec_key, &validation)
            .map(|data| data.claims)
            .map_err(|err| match err.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                kind => TokenError::Malformed(kind_name(kind)),
            })
    }
}

fn kind_name(kind: &ErrorKind) -> String {
    match kind {
        ErrorKind::InvalidToken => "InvalidToken".to_string(),
        ErrorKind::InvalidSignature => "InvalidSignature".to_string(),
        ErrorKind::InvalidAlgorithm => "InvalidAlgorithm".to_string(),
        ErrorKind::MissingRequiredClaim(claim) => format!("MissingRequiredClaim({claim})"),
        other => format!("{other:?}"),
    }
}
