//! JWT signature and claim verification

use std::sync::Arc;
use std::time::{Duration, Instant};

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::jwk::{Jwk, JwkSet};
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde_json::Value;
use tokio::sync::RwLock;

use super::{bearer_token, AuthError, Claims};
use crate::{Error, Result};

/// Where token signing keys come from
#[derive(Debug, Clone, PartialEq)]
pub enum KeySource {
    /// Shared secret (HS256)
    Hs256Secret(String),
    /// Identity-provider public key in PEM form (RS256)
    Rs256PublicKeyPem(String),
    /// Identity-provider key set fetched over HTTP, selected by `kid`
    Jwks { url: String, algorithm: Algorithm },
}

/// Runtime verifier settings resolved from configuration
#[derive(Debug, Clone)]
pub struct VerifierConfig {
    pub key_source: KeySource,
    pub audience: Option<String>,
    pub issuer: Option<String>,
    /// Claim holding the granted permissions
    pub permissions_claim: String,
    pub leeway_seconds: u64,
    pub jwks_cache_ttl_seconds: u64,
}

impl VerifierConfig {
    /// Settings for a shared-secret verifier with no audience or issuer checks
    pub fn hs256(secret: impl Into<String>) -> Self {
        Self {
            key_source: KeySource::Hs256Secret(secret.into()),
            audience: None,
            issuer: None,
            permissions_claim: "permissions".to_string(),
            leeway_seconds: 0,
            jwks_cache_ttl_seconds: 300,
        }
    }
}

struct CachedJwks {
    set: Arc<JwkSet>,
    fetched_at: Instant,
}

impl CachedJwks {
    fn is_fresh(&self, ttl: Duration) -> bool {
        self.fetched_at.elapsed() < ttl
    }
}

struct JwksClient {
    url: String,
    ttl: Duration,
    cache: RwLock<Option<CachedJwks>>,
    http: reqwest::Client,
}

impl JwksClient {
    async fn key(&self, kid: &str) -> std::result::Result<Option<Jwk>, AuthError> {
        if let Some(jwk) = self.cached(kid).await {
            return Ok(Some(jwk));
        }

        // Unknown kid or stale set: refetch once and retry.
        self.refresh().await?;
        Ok(self.cached(kid).await)
    }

    async fn cached(&self, kid: &str) -> Option<Jwk> {
        let cache = self.cache.read().await;
        let set = match cache.as_ref() {
            Some(cached) if cached.is_fresh(self.ttl) => Arc::clone(&cached.set),
            _ => return None,
        };
        drop(cache);

        set.find(kid).cloned()
    }

    async fn refresh(&self) -> std::result::Result<(), AuthError> {
        let set = self
            .http
            .get(&self.url)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|err| {
                tracing::warn!(url = %self.url, error = %err, "Failed to fetch JWKS");
                AuthError::InvalidToken
            })?
            .json::<JwkSet>()
            .await
            .map_err(|err| {
                tracing::warn!(url = %self.url, error = %err, "Failed to parse JWKS");
                AuthError::InvalidToken
            })?;

        tracing::debug!(url = %self.url, keys = set.keys.len(), "Refreshed JWKS");
        *self.cache.write().await = Some(CachedJwks {
            set: Arc::new(set),
            fetched_at: Instant::now(),
        });
        Ok(())
    }
}

enum SigningKeys {
    Static {
        key: DecodingKey,
        algorithm: Algorithm,
    },
    Jwks {
        client: JwksClient,
        algorithm: Algorithm,
    },
}

/// Verifies bearer tokens and checks their permissions
pub struct TokenVerifier {
    config: VerifierConfig,
    keys: SigningKeys,
}

impl TokenVerifier {
    pub fn new(config: VerifierConfig) -> Result<Self> {
        let keys = match &config.key_source {
            KeySource::Hs256Secret(secret) => SigningKeys::Static {
                key: DecodingKey::from_secret(secret.as_bytes()),
                algorithm: Algorithm::HS256,
            },
            KeySource::Rs256PublicKeyPem(pem) => SigningKeys::Static {
                key: DecodingKey::from_rsa_pem(pem.as_bytes()).map_err(|e| {
                    Error::config(format!("failed to parse auth.rs256_public_key_pem: {e}"))
                })?,
                algorithm: Algorithm::RS256,
            },
            KeySource::Jwks { url, algorithm } => {
                let http = reqwest::Client::builder()
                    .timeout(Duration::from_secs(10))
                    .build()
                    .map_err(|e| Error::config(format!("failed to build JWKS client: {e}")))?;

                SigningKeys::Jwks {
                    client: JwksClient {
                        url: url.clone(),
                        ttl: Duration::from_secs(config.jwks_cache_ttl_seconds),
                        cache: RwLock::new(None),
                        http,
                    },
                    algorithm: *algorithm,
                }
            }
        };

        Ok(Self { config, keys })
    }

    /// Check an `Authorization` header value against `permission`.
    ///
    /// On success the verified claims are returned for the handler.
    pub async fn authorize(
        &self,
        header: Option<&str>,
        permission: &str,
    ) -> std::result::Result<Claims, AuthError> {
        let token = bearer_token(header)?;
        let claims = self.verify(token).await?;
        claims.require(permission)?;
        Ok(claims)
    }

    /// Verify signature, expiry, audience and issuer, then decode claims.
    pub async fn verify(&self, token: &str) -> std::result::Result<Claims, AuthError> {
        let payload = match &self.keys {
            SigningKeys::Static { key, algorithm } => self.decode(token, key, *algorithm)?,
            SigningKeys::Jwks { client, algorithm } => {
                let header = decode_header(token).map_err(|_| AuthError::InvalidToken)?;
                let kid = header.kid.ok_or(AuthError::InvalidToken)?;
                let jwk = client.key(&kid).await?.ok_or(AuthError::InvalidToken)?;
                let key = DecodingKey::from_jwk(&jwk).map_err(|_| AuthError::InvalidToken)?;
                self.decode(token, &key, *algorithm)?
            }
        };

        Claims::from_payload(payload, &self.config.permissions_claim)
    }

    fn decode(
        &self,
        token: &str,
        key: &DecodingKey,
        algorithm: Algorithm,
    ) -> std::result::Result<Value, AuthError> {
        decode::<Value>(token, key, &self.validation_for(algorithm))
            .map(|data| data.claims)
            .map_err(|err| classify(err.kind()))
    }

    fn validation_for(&self, algorithm: Algorithm) -> Validation {
        let mut validation = Validation::new(algorithm);
        validation.leeway = self.config.leeway_seconds;

        match self.config.audience.as_deref() {
            Some(aud) => {
                validation.set_audience(&[aud]);
                validation.required_spec_claims.insert("aud".to_string());
            }
            None => validation.validate_aud = false,
        }

        if let Some(iss) = self.config.issuer.as_deref() {
            validation.set_issuer(&[iss]);
            validation.required_spec_claims.insert("iss".to_string());
        }

        validation
    }
}

fn classify(kind: &ErrorKind) -> AuthError {
    match kind {
        ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        ErrorKind::InvalidAudience | ErrorKind::InvalidIssuer => AuthError::InvalidClaims,
        ErrorKind::MissingRequiredClaim(claim) if claim == "aud" || claim == "iss" => {
            AuthError::InvalidClaims
        }
        _ => AuthError::InvalidToken,
    }
}
