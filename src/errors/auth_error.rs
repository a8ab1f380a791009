/// Error codes for structured error responses
pub mod error_codes {
    pub const MISSING_TOKEN: &str = "missing_token";
    pub const INVALID_TOKEN: &str = "invalid_token";
    pub const TOKEN_EXPIRED: &str = "token_expired";
    pub const CONFIG_ERROR: &str = "config_error";
}

/// Authentication error types. All of them terminate the connection.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No token was supplied
    #[error("Authentication required")]
    MissingToken,

    /// The token matched no API secret and is not a valid JWT
    #[error("Invalid authentication token")]
    InvalidToken(String),

    /// The JWT signature is valid but `exp` has passed
    #[error("Authentication token expired")]
    TokenExpired,

    /// Configuration error (auth required but no verifier configured)
    #[error("Auth configuration error: {0}")]
    ConfigError(String),
}

impl AuthError {
    /// Get the error code for structured error responses
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingToken => error_codes::MISSING_TOKEN,
            AuthError::InvalidToken(_) => error_codes::INVALID_TOKEN,
            AuthError::TokenExpired => error_codes::TOKEN_EXPIRED,
            AuthError::ConfigError(_) => error_codes::CONFIG_ERROR,
        }
    }

    /// Log the error at the appropriate level
    pub fn log(&self) {
        match self {
            AuthError::MissingToken => {
                tracing::debug!("{}", self);
            }
            AuthError::InvalidToken(detail) => {
                tracing::warn!("Invalid authentication token: {}", detail);
            }
            AuthError::TokenExpired => {
                tracing::warn!("{}", self);
            }
            AuthError::ConfigError(msg) => {
                tracing::error!("Auth configuration error: {}", msg);
            }
        }
    }
}

/// Result type for auth operations
pub type AuthResult<T> = Result<T, AuthError>;
