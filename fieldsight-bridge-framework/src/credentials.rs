//! Short-lived broker credentials.
//!
//! Every authenticated broker operation gets its own freshly signed token.
//! Tokens are handed to the operation and dropped afterwards; nothing in the
//! framework caches them, so a token can never be used close to its expiry.

use std::path::PathBuf;
use std::time::Duration;

use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};

use fieldsight_common::current_timestamp_millis;

use crate::error::{BridgeError, Result};

/// MQTT username sent alongside a token; the broker ignores it.
pub const TOKEN_USERNAME: &str = "unused";

/// Signing algorithm for broker tokens.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TokenAlgorithm {
    /// RSA PKCS#1 v1.5 with SHA-256.
    #[default]
    RS256,
    /// ECDSA P-256 with SHA-256.
    ES256,
}

impl From<TokenAlgorithm> for Algorithm {
    fn from(alg: TokenAlgorithm) -> Self {
        match alg {
            TokenAlgorithm::RS256 => Algorithm::RS256,
            TokenAlgorithm::ES256 => Algorithm::ES256,
        }
    }
}

/// Credential configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Path to the PEM private key used to sign tokens.
    pub private_key: PathBuf,

    /// Signing algorithm matching the key type.
    #[serde(default)]
    pub algorithm: TokenAlgorithm,

    /// Token lifetime in seconds.
    #[serde(default = "default_token_ttl")]
    pub token_ttl_secs: u64,
}

fn default_token_ttl() -> u64 {
    300
}

/// A signed, single-use broker credential.
#[derive(Clone)]
pub struct Credential {
    /// MQTT username.
    pub username: String,
    /// MQTT password (the signed token).
    pub password: String,
    /// Issued-at, seconds since epoch.
    pub issued_at: i64,
    /// Expiry, seconds since epoch.
    pub expires_at: i64,
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("issued_at", &self.issued_at)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Source of fresh credentials, one per authenticated operation.
pub trait CredentialMinter: Send + Sync {
    fn mint(&self) -> Result<Credential>;
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    iat: i64,
    exp: i64,
    aud: String,
}

/// Mints JWTs signed with a private key loaded once at startup.
pub struct JwtMinter {
    key: EncodingKey,
    algorithm: TokenAlgorithm,
    audience: String,
    ttl: Duration,
}

impl JwtMinter {
    /// Build a minter from PEM-encoded key material.
    pub fn from_pem(
        pem: &[u8],
        algorithm: TokenAlgorithm,
        audience: impl Into<String>,
        ttl: Duration,
    ) -> Result<Self> {
        let key = match algorithm {
            TokenAlgorithm::RS256 => EncodingKey::from_rsa_pem(pem)?,
            TokenAlgorithm::ES256 => EncodingKey::from_ec_pem(pem)?,
        };

        Ok(Self {
            key,
            algorithm,
            audience: audience.into(),
            ttl,
        })
    }

    /// Load the signing key named by `config`.
    pub fn load(config: &AuthConfig, audience: impl Into<String>) -> Result<Self> {
        let pem = std::fs::read(&config.private_key).map_err(|e| {
            BridgeError::credential(format!(
                "Failed to read private key '{}': {}",
                config.private_key.display(),
                e
            ))
        })?;

        Self::from_pem(
            &pem,
            config.algorithm,
            audience,
            Duration::from_secs(config.token_ttl_secs),
        )
    }

    pub fn algorithm(&self) -> TokenAlgorithm {
        self.algorithm
    }

    pub fn audience(&self) -> &str {
        &self.audience
    }
}

impl CredentialMinter for JwtMinter {
    fn mint(&self) -> Result<Credential> {
        let iat = current_timestamp_millis() / 1000;
        let exp = iat + self.ttl.as_secs() as i64;
        let claims = Claims {
            iat,
            exp,
            aud: self.audience.clone(),
        };

        let token = jsonwebtoken::encode(&Header::new(self.algorithm.into()), &claims, &self.key)?;

        tracing::trace!(aud = %self.audience, exp, "Minted broker token");

        Ok(Credential {
            username: TOKEN_USERNAME.to_string(),
            password: token,
            issued_at: iat,
            expires_at: exp,
        })
    }
}
