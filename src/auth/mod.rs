//! Bearer-token authorization
//!
//! A request is authorized for a permission when its `Authorization` header
//! carries a `Bearer` JWT that verifies against the configured key and whose
//! permission claim lists that permission.

use serde_json::Value;
use thiserror::Error;

pub mod verifier;

pub use verifier::{KeySource, TokenVerifier, VerifierConfig};

/// Why a request was refused. Every variant answers HTTP 401.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Authorization header is expected.")]
    MissingHeader,

    #[error("{0}")]
    InvalidHeader(&'static str),

    #[error("Token expired.")]
    TokenExpired,

    #[error("Incorrect claims. Please, check the audience and issuer.")]
    InvalidClaims,

    #[error("Unable to parse authentication token.")]
    InvalidToken,

    #[error("Permissions not included in JWT.")]
    PermissionsMissing,

    #[error("Permission not found.")]
    PermissionDenied(String),
}

impl AuthError {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::MissingHeader => "authorization_header_missing",
            AuthError::InvalidHeader(_) => "invalid_header",
            AuthError::TokenExpired => "token_expired",
            AuthError::InvalidClaims | AuthError::PermissionsMissing => "invalid_claims",
            AuthError::InvalidToken => "invalid_token",
            AuthError::PermissionDenied(_) => "unauthorized",
        }
    }
}

/// Pull the token out of an `Authorization` header value.
///
/// The header must be exactly two whitespace-separated parts, the first of
/// which is literally `Bearer`.
pub fn bearer_token(header: Option<&str>) -> Result<&str, AuthError> {
    let header = header.ok_or(AuthError::MissingHeader)?;
    let parts: Vec<&str> = header.split_whitespace().collect();

    match parts.as_slice() {
        [] => Err(AuthError::InvalidHeader(
            "Authorization header must start with \"Bearer\".",
        )),
        [scheme, ..] if *scheme != "Bearer" => Err(AuthError::InvalidHeader(
            "Authorization header must start with \"Bearer\".",
        )),
        [_] => Err(AuthError::InvalidHeader("Token not found.")),
        [_, token] => Ok(*token),
        _ => Err(AuthError::InvalidHeader(
            "Authorization header must be bearer token.",
        )),
    }
}

/// Verified token payload handed to protected handlers
#[derive(Debug, Clone)]
pub struct Claims {
    /// `sub` claim, when present
    pub subject: Option<String>,
    /// Granted permissions
    pub permissions: Vec<String>,
    /// Full decoded payload
    pub payload: Value,
}

impl Claims {
    /// Build from a decoded payload, reading permissions from `claim`.
    ///
    /// The claim may be an array of strings or a space-delimited string.
    pub fn from_payload(payload: Value, claim: &str) -> Result<Self, AuthError> {
        let permissions: Vec<String> = match payload.get(claim) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            Some(Value::String(scopes)) => {
                scopes.split_whitespace().map(str::to_string).collect()
            }
            _ => return Err(AuthError::PermissionsMissing),
        };

        let subject = payload
            .get("sub")
            .and_then(Value::as_str)
            .map(str::to_string);

        Ok(Self {
            subject,
            permissions,
            payload,
        })
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p == permission)
    }

    /// Fail with [`AuthError::PermissionDenied`] unless `permission` was granted
    pub fn require(&self, permission: &str) -> Result<(), AuthError> {
        if self.has_permission(permission) {
            Ok(())
        } else {
            Err(AuthError::PermissionDenied(permission.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bearer_token_accepts_two_parts() {
        assert_eq!(bearer_token(Some("Bearer abc.def.ghi")), Ok("abc.def.ghi"));
    }

    #[test]
    fn test_bearer_token_rejections() {
        assert_eq!(bearer_token(None), Err(AuthError::MissingHeader));
        assert_eq!(
            bearer_token(Some("Basic dXNlcjpwYXNz")).unwrap_err().code(),
            "invalid_header"
        );
        assert_eq!(
            bearer_token(Some("bearer abc")),
            Err(AuthError::InvalidHeader(
                "Authorization header must start with \"Bearer\"."
            ))
        );
        assert_eq!(
            bearer_token(Some("Bearer")),
            Err(AuthError::InvalidHeader("Token not found."))
        );
        assert_eq!(
            bearer_token(Some("Bearer abc def")),
            Err(AuthError::InvalidHeader(
                "Authorization header must be bearer token."
            ))
        );
        assert!(bearer_token(Some("")).is_err());
    }

    #[test]
    fn test_permissions_from_array() {
        let claims = Claims::from_payload(
            json!({"sub": "auth0|barista", "permissions": ["get:drinks-detail", "post:drinks"]}),
            "permissions",
        )
        .unwrap();

        assert_eq!(claims.subject.as_deref(), Some("auth0|barista"));
        assert!(claims.require("post:drinks").is_ok());
        assert_eq!(
            claims.require("delete:drinks"),
            Err(AuthError::PermissionDenied("delete:drinks".to_string()))
        );
    }

    #[test]
    fn test_permissions_from_scope_string() {
        let claims =
            Claims::from_payload(json!({"scope": "openid patch:drinks"}), "scope").unwrap();
        assert!(claims.has_permission("patch:drinks"));
        assert!(!claims.has_permission("openid profile"));
    }

    #[test]
    fn test_missing_permission_claim() {
        let err = Claims::from_payload(json!({"sub": "x"}), "permissions").unwrap_err();
        assert_eq!(err, AuthError::PermissionsMissing);
        assert_eq!(err.code(), "invalid_claims");
    }
}
