use std::env;
use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use jsonwebtoken::Algorithm;
use serde::Deserialize;

use crate::auth::{KeySource, VerifierConfig};

const DEFAULT_PORT: u16 = 8080;

/// Top-level application configuration loaded from file + environment.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseSection,
    pub auth: AuthSection,
    pub logging: LoggingSection,
}

impl AppConfig {
    /// Load configuration from disk and environment.
    ///
    /// Environment variables use the `DRINKERY_` prefix and `__` between
    /// section and key, e.g. `DRINKERY_AUTH__HS256_SECRET`.
    pub fn load() -> Result<Self> {
        let config_path =
            env::var("DRINKERY_CONFIG").unwrap_or_else(|_| "config.toml".to_string());

        let mut builder = config::Config::builder();

        if Path::new(&config_path).exists() {
            builder = builder.add_source(config::File::from(PathBuf::from(&config_path)));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("DRINKERY")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder.build()?;
        let mut config: Self = settings.try_deserialize()?;

        if config.logging.level.trim().is_empty() {
            config.logging.level = "info".to_string();
        }

        Ok(config)
    }

    /// Resolve the token verifier settings.
    pub fn verifier_config(&self) -> Result<VerifierConfig> {
        self.auth.to_runtime()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseSection {
    pub url: String,
    pub max_connections: u32,
    /// Drop and recreate the `drink` table at startup
    pub reset_on_start: bool,
}

impl Default for DatabaseSection {
    fn default() -> Self {
        Self {
            url: "sqlite://drinks.db".to_string(),
            max_connections: 5,
            reset_on_start: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthSection {
    /// Identity-provider domain, e.g. `coffee-shop.auth0.com`
    pub domain: Option<String>,
    pub jwks_url: Option<String>,
    pub hs256_secret: Option<String>,
    pub rs256_public_key_pem: Option<String>,
    /// Algorithm accepted for JWKS keys
    pub algorithm: Algorithm,
    pub audience: Option<String>,
    pub issuer: Option<String>,
    pub permissions_claim: String,
    pub leeway_seconds: u64,
    pub jwks_cache_ttl_seconds: u64,
}

impl Default for AuthSection {
    fn default() -> Self {
        Self {
            domain: None,
            jwks_url: None,
            hs256_secret: None,
            rs256_public_key_pem: None,
            algorithm: Algorithm::RS256,
            audience: None,
            issuer: None,
            permissions_claim: "permissions".to_string(),
            leeway_seconds: 60,
            jwks_cache_ttl_seconds: 300,
        }
    }
}

impl AuthSection {
    pub fn to_runtime(&self) -> Result<VerifierConfig> {
        let domain = non_empty(self.domain.as_deref());

        let jwks_url = non_empty(self.jwks_url.as_deref())
            .map(str::to_string)
            .or_else(|| domain.map(|d| format!("https://{d}/.well-known/jwks.json")));

        let mut sources = Vec::new();
        if let Some(secret) = non_empty(self.hs256_secret.as_deref()) {
            sources.push(KeySource::Hs256Secret(secret.to_string()));
        }
        if let Some(pem) = non_empty(self.rs256_public_key_pem.as_deref()) {
            sources.push(KeySource::Rs256PublicKeyPem(pem.to_string()));
        }
        if let Some(url) = jwks_url {
            sources.push(KeySource::Jwks {
                url,
                algorithm: self.algorithm,
            });
        }

        if sources.len() > 1 {
            bail!("auth.hs256_secret, auth.rs256_public_key_pem and auth.jwks_url/auth.domain are mutually exclusive");
        }
        let Some(key_source) = sources.pop() else {
            bail!("one of auth.hs256_secret, auth.rs256_public_key_pem, auth.jwks_url or auth.domain must be specified");
        };

        if self.permissions_claim.trim().is_empty() {
            bail!("auth.permissions_claim must not be empty");
        }

        let issuer = non_empty(self.issuer.as_deref())
            .map(str::to_string)
            .or_else(|| domain.map(|d| format!("https://{d}/")));

        Ok(VerifierConfig {
            key_source,
            audience: non_empty(self.audience.as_deref()).map(str::to_string),
            issuer,
            permissions_claim: self.permissions_claim.trim().to_string(),
            leeway_seconds: self.leeway_seconds,
            jwks_cache_ttl_seconds: self.jwks_cache_ttl_seconds,
        })
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct LoggingSection {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Text,
}
