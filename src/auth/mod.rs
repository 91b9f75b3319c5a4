//! Connection identity resolution.
//!
//! A WebSocket connection arrives with an authenticated claim set. This module
//! extracts those claims from the bearer token and maps them to the single
//! canonical user identifier the connection registry groups by. Connections
//! with no resolvable identifier are never added to any user group.

use actix_web::HttpRequest;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::websocket::ConnectionId;

/// Primary subject identifier claim
pub const CLAIM_NAME_ID: &str = "nameid";
/// Generic JWT subject claim
pub const CLAIM_SUBJECT: &str = "sub";
/// Application-specific user id claim
pub const CLAIM_USER_ID: &str = "userId";
/// Legacy XML-namespace name identifier claim
pub const CLAIM_XML_NAME_IDENTIFIER: &str =
    "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/nameidentifier";

/// Claim kinds recognized as user identifiers, highest priority first
const IDENTITY_CLAIM_PRIORITY: [&str; 4] = [
    CLAIM_NAME_ID,
    CLAIM_SUBJECT,
    CLAIM_USER_ID,
    CLAIM_XML_NAME_IDENTIFIER,
];

/// A typed key/value assertion about an authenticated connection's identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claim {
    pub kind: String,
    pub value: String,
}

impl Claim {
    pub fn new(kind: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            value: value.into(),
        }
    }
}

/// Resolve the canonical user identifier from an ordered claim set.
///
/// Claim kinds are checked in fixed priority order; the first present,
/// non-empty value wins. `None` is a normal outcome, not an error: it means
/// the connection carries no recognizable identity and must not be grouped.
pub fn resolve_user_id(claims: &[Claim]) -> Option<String> {
    IDENTITY_CLAIM_PRIORITY.iter().find_map(|kind| {
        claims
            .iter()
            .find(|c| c.kind == *kind && !c.value.is_empty())
            .map(|c| c.value.clone())
    })
}

/// Resolve identity for a connection, emitting the diagnostic record.
///
/// Logging never blocks or fails resolution.
pub fn resolve_for_connection(connection_id: ConnectionId, claims: &[Claim]) -> Option<String> {
    match resolve_user_id(claims) {
        Some(user_id) => {
            tracing::info!(
                connection_id = %connection_id,
                user_id = %user_id,
                "resolved connection identity"
            );
            Some(user_id)
        }
        None => {
            tracing::warn!(
                connection_id = %connection_id,
                "connection presented no resolvable identity claim"
            );
            None
        }
    }
}

/// Claims carried by the marketplace's bearer tokens.
///
/// All identity fields are optional; which one is populated depends on the
/// issuer. `resolve_user_id` decides which wins.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenClaims {
    #[serde(default)]
    pub nameid: Option<String>,
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(rename = "userId", default)]
    pub user_id: Option<String>,
    #[serde(
        rename = "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/nameidentifier",
        default
    )]
    pub name_identifier: Option<String>,
    pub exp: i64,
}

impl TokenClaims {
    /// Flatten into the ordered claim set the resolver operates on
    pub fn into_claims(self) -> Vec<Claim> {
        let mut claims = Vec::new();
        if let Some(v) = self.nameid {
            claims.push(Claim::new(CLAIM_NAME_ID, v));
        }
        if let Some(v) = self.sub {
            claims.push(Claim::new(CLAIM_SUBJECT, v));
        }
        if let Some(v) = self.user_id {
            claims.push(Claim::new(CLAIM_USER_ID, v));
        }
        if let Some(v) = self.name_identifier {
            claims.push(Claim::new(CLAIM_XML_NAME_IDENTIFIER, v));
        }
        claims
    }
}

/// Extract the bearer token from the `token` query parameter or the
/// `Authorization` header.
pub fn bearer_token(req: &HttpRequest, query_token: Option<&str>) -> Option<String> {
    query_token.map(|s| s.to_string()).or_else(|| {
        req.headers()
            .get(actix_web::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.strip_prefix("Bearer "))
            .map(|s| s.to_string())
    })
}

/// Validate a bearer token and return its claim set
pub fn decode_bearer(token: &str, secret: &str) -> Result<Vec<Claim>, AppError> {
    let data = decode::<TokenClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map_err(|e| {
        tracing::warn!("JWT validation failed: {}", e);
        AppError::Unauthorized
    })?;

    Ok(data.claims.into_claims())
}
