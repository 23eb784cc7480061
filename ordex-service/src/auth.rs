//! Delegated token validation.
//!
//! The service never inspects token cryptography itself: the bearer header
//! is forwarded to the external authentication service, whose `/validate`
//! endpoint answers with the identity claims. Handlers receive the identity
//! through an axum extractor, so there is no ambient authentication state.

use axum::extract::{FromRef, FromRequestParts};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use serde::{Deserialize, Serialize};
use tracing::warn;

use ordex_core::metrics::{MetricStatus, MetricsLog, RequestId};

use crate::error::ApiError;

/// Claims of a validated credential.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Identity {
    pub username: String,
    #[serde(default)]
    pub org: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
}

/// Authentication failures at the HTTP boundary.
#[derive(Debug)]
pub enum AuthError {
    /// No Authorization header on the request.
    MissingHeader,

    /// The authorization scheme is not "Bearer".
    InvalidScheme,

    /// The authentication service rejected the token.
    InvalidToken,

    /// The authentication service could not be reached.
    Unavailable(String),
}

impl AuthError {
    /// Short tag recorded in the metrics log.
    pub fn metric_detail(&self) -> &'static str {
        match self {
            AuthError::MissingHeader => "missing_token",
            AuthError::InvalidScheme => "invalid_header",
            AuthError::InvalidToken => "invalid_token",
            AuthError::Unavailable(_) => "auth_service_unavailable",
        }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::MissingHeader => write!(f, "authorization required"),
            AuthError::InvalidScheme => write!(f, "invalid authorization header"),
            AuthError::InvalidToken => write!(f, "invalid token"),
            AuthError::Unavailable(msg) => write!(f, "authorization service unavailable: {msg}"),
        }
    }
}

impl std::error::Error for AuthError {}

/// Adapter over the external authentication service.
#[derive(Clone)]
pub struct AuthGateway {
    client: reqwest::Client,
    base_url: String,
}

impl AuthGateway {
    /// `client` carries the bounded outbound timeout shared by every
    /// external call the service makes.
    pub fn new(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Validate the full Authorization header value by delegation.
    ///
    /// A non-200 answer means the token was rejected; a transport failure
    /// (or timeout) is the distinct "service unavailable" condition.
    pub async fn validate(&self, authorization: &str) -> Result<Identity, AuthError> {
        let response = self
            .client
            .post(format!("{}/validate", self.base_url))
            .header(AUTHORIZATION, authorization)
            .send()
            .await
            .map_err(|err| AuthError::Unavailable(err.to_string()))?;

        if !response.status().is_success() {
            return Err(AuthError::InvalidToken);
        }

        response
            .json::<Identity>()
            .await
            .map_err(|err| AuthError::Unavailable(err.to_string()))
    }
}

/// Check the header carries a bearer credential before delegating.
fn require_bearer(authorization: &str) -> Result<(), AuthError> {
    let mut parts = authorization.splitn(2, ' ');
    let scheme = parts.next().unwrap_or("");
    if !scheme.eq_ignore_ascii_case("bearer") || parts.next().map_or(true, str::is_empty) {
        return Err(AuthError::InvalidScheme);
    }
    Ok(())
}

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
    AuthGateway: FromRef<S>,
    MetricsLog: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let metrics = MetricsLog::from_ref(state);
        let request_id = parts
            .extensions
            .get::<RequestId>()
            .cloned()
            .unwrap_or_default();

        // Two event types per authenticated request: `jwt_validation` tracks
        // the credential check itself, `authorization` the access decision.
        match authenticate(parts, state).await {
            Ok(identity) => {
                metrics.record(
                    &request_id,
                    "jwt_validation",
                    Some(&identity.username),
                    MetricStatus::Success,
                    "token_valid",
                );
                metrics.record(
                    &request_id,
                    "authorization",
                    Some(&identity.username),
                    MetricStatus::Success,
                    "access_granted",
                );
                Ok(identity)
            }
            Err(err) => {
                warn!(uri = %parts.uri, error = %err, "authentication failed");
                metrics.record(
                    &request_id,
                    "jwt_validation",
                    None,
                    MetricStatus::Failed,
                    err.metric_detail(),
                );
                Err(err.into())
            }
        }
    }
}

async fn authenticate<S>(parts: &Parts, state: &S) -> Result<Identity, AuthError>
where
    S: Send + Sync,
    AuthGateway: FromRef<S>,
{
    let authorization = parts
        .headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingHeader)?
        .to_str()
        .map_err(|_| AuthError::InvalidScheme)?;
    require_bearer(authorization)?;

    let gateway = AuthGateway::from_ref(state);
    gateway.validate(authorization).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_scheme_is_case_insensitive() {
        assert!(require_bearer("Bearer abc").is_ok());
        assert!(require_bearer("bearer abc").is_ok());
        assert!(require_bearer("BEARER abc").is_ok());
    }

    #[test]
    fn non_bearer_headers_are_rejected() {
        assert!(matches!(require_bearer("Basic abc"), Err(AuthError::InvalidScheme)));
        assert!(matches!(require_bearer("Bearer"), Err(AuthError::InvalidScheme)));
        assert!(matches!(require_bearer("Bearer "), Err(AuthError::InvalidScheme)));
    }
}
