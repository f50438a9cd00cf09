use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::warn;

use super::{claims::Claims, jwt::JwtKeys};

/// Why the guard refused a request. All variants answer 403 with an empty
/// body; they differ only in what gets logged.
#[derive(Debug, thiserror::Error)]
pub enum GuardRejection {
    #[error("missing Authorization header")]
    NoHeader,
    #[error("malformed Authorization header")]
    MalformedHeader,
    #[error("invalid or expired token: {0}")]
    InvalidToken(#[source] jsonwebtoken::errors::Error),
}

impl GuardRejection {
    pub fn reason(&self) -> &'static str {
        match self {
            GuardRejection::NoHeader => "missing_header",
            GuardRejection::MalformedHeader => "malformed_header",
            GuardRejection::InvalidToken(_) => "invalid_token",
        }
    }
}

impl IntoResponse for GuardRejection {
    fn into_response(self) -> Response {
        StatusCode::FORBIDDEN.into_response()
    }
}

/// Expects exactly `Bearer <token>`; the scheme is matched case-insensitively.
fn bearer_token(value: &str) -> Option<&str> {
    let mut parts = value.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(token), None) if scheme.eq_ignore_ascii_case("Bearer") => Some(token),
        _ => None,
    }
}

/// Validates the bearer credential on a request and returns its claims.
pub fn authorize(headers: &HeaderMap, keys: &JwtKeys) -> Result<Claims, GuardRejection> {
    let header = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or(GuardRejection::NoHeader)?;

    let token = bearer_token(header).ok_or(GuardRejection::MalformedHeader)?;

    keys.verify(token).map_err(GuardRejection::InvalidToken)
}

/// Extracts and validates the bearer token, yielding the decoded claims.
/// Handlers taking this argument never run for unauthenticated requests.
pub struct AuthUser(pub Claims);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    Arc<JwtKeys>: FromRef<S>,
{
    type Rejection = GuardRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = Arc::<JwtKeys>::from_ref(state);
        match authorize(&parts.headers, &keys) {
            Ok(claims) => Ok(AuthUser(claims)),
            Err(rejection) => {
                match &rejection {
                    GuardRejection::InvalidToken(e) => {
                        warn!(reason = rejection.reason(), error = %e, path = %parts.uri.path(), "access denied")
                    }
                    _ => warn!(reason = rejection.reason(), path = %parts.uri.path(), "access denied"),
                }
                Err(rejection)
            }
        }
    }
}
