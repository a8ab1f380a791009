//! Token verification for WebSocket sessions.

use async_trait::async_trait;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};

use super::api_secret::match_api_secret_id;
use super::context::Auth;
use crate::config::{AuthApiSecret, ServerConfig};
use crate::errors::auth_error::{AuthError, AuthResult};

/// Claims accepted in HS256 session tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Identity of the client
    pub sub: String,
    /// Expiry as seconds since the epoch
    pub exp: u64,
}

/// Verifies the token presented when a session opens
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> AuthResult<Auth>;

    /// Whether sessions must authenticate at all
    fn required(&self) -> bool {
        true
    }
}

/// Accepts API secrets first, then HS256 JWTs
pub struct ConfiguredVerifier {
    api_secrets: Vec<AuthApiSecret>,
    jwt_key: Option<DecodingKey>,
    validation: Validation,
}

impl ConfiguredVerifier {
    pub fn new(api_secrets: Vec<AuthApiSecret>, jwt_secret: Option<&str>) -> Self {
        Self {
            api_secrets,
            jwt_key: jwt_secret.map(|secret| DecodingKey::from_secret(secret.as_bytes())),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(
            config.auth_api_secrets.clone(),
            config.auth_jwt_secret.as_deref(),
        )
    }
}

#[async_trait]
impl TokenVerifier for ConfiguredVerifier {
    async fn verify(&self, token: &str) -> AuthResult<Auth> {
        let token = token.trim();
        let token = token.strip_prefix("Bearer ").unwrap_or(token).trim();
        if token.is_empty() {
            return Err(AuthError::MissingToken);
        }

        if let Some(id) = match_api_secret_id(token, &self.api_secrets) {
            return Ok(Auth::new(id));
        }

        let Some(key) = &self.jwt_key else {
            if self.api_secrets.is_empty() {
                return Err(AuthError::ConfigError(
                    "no API secret or JWT secret configured".to_string(),
                ));
            }
            return Err(AuthError::InvalidToken("no matching API secret".to_string()));
        };

        match decode::<TokenClaims>(token, key, &self.validation) {
            Ok(data) => Ok(Auth::new(data.claims.sub)),
            Err(e) => match e.kind() {
                ErrorKind::ExpiredSignature => Err(AuthError::TokenExpired),
                _ => Err(AuthError::InvalidToken(e.to_string())),
            },
        }
    }
}

/// Used when authentication is disabled
pub struct AllowAllVerifier;

#[async_trait]
impl TokenVerifier for AllowAllVerifier {
    async fn verify(&self, _token: &str) -> AuthResult<Auth> {
        Ok(Auth::empty())
    }

    fn required(&self) -> bool {
        false
    }
}
