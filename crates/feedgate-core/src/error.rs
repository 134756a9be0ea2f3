//! Unified error types for the gateway core.

use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use thiserror::Error;

/// Unified error type for Feedgate.
///
/// A cache miss is a normal negative result rather than a failure; callers
/// usually match on [`GatewayError::CacheMiss`] (or use
/// [`GatewayError::is_cache_miss`]) and fall through to the remote source.
#[derive(Error, Debug)]
pub enum GatewayError {
    // ============ Cache Errors ============
    /// Key absent or expired
    #[error("Cache miss")]
    CacheMiss,

    /// Connectivity or protocol failure from a remote cache backend
    #[error("Cache backend unavailable: {0}")]
    CacheUnavailable(String),

    // ============ Credential Errors ============
    /// Authorization endpoint unreachable or returned an unusable response
    #[error("Token refresh failed: {0}")]
    TokenRefresh(String),

    /// Connections endpoint failed or returned no tenants
    #[error("Tenant resolution failed: {0}")]
    TenantResolution(String),

    // ============ Infrastructure Errors ============
    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Payload could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(String),

    // ============ Internal Errors ============
    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Generic error wrapper
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl GatewayError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::CacheMiss => 404,
            Self::CacheUnavailable(_) => 503,
            Self::TokenRefresh(_) | Self::TenantResolution(_) => 502,
            Self::Configuration(_) | Self::Serialization(_) | Self::Internal(_) | Self::Other(_) => {
                500
            }
        }
    }

    /// Returns a machine-readable error code.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::CacheMiss => "CACHE_MISS",
            Self::CacheUnavailable(_) => "CACHE_UNAVAILABLE",
            Self::TokenRefresh(_) => "TOKEN_REFRESH_FAILED",
            Self::TenantResolution(_) => "TENANT_RESOLUTION_FAILED",
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
            Self::Internal(_) | Self::Other(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns true for the ordinary "not cached" outcome.
    #[must_use]
    pub const fn is_cache_miss(&self) -> bool {
        matches!(self, Self::CacheMiss)
    }

    /// Creates a cache backend error.
    #[must_use]
    pub fn cache_unavailable<T: Into<String>>(message: T) -> Self {
        Self::CacheUnavailable(message.into())
    }

    /// Creates a token refresh error.
    #[must_use]
    pub fn token_refresh<T: Into<String>>(message: T) -> Self {
        Self::TokenRefresh(message.into())
    }

    /// Creates a tenant resolution error.
    #[must_use]
    pub fn tenant_resolution<T: Into<String>>(message: T) -> Self {
        Self::TenantResolution(message.into())
    }

    /// Creates a configuration error.
    #[must_use]
    pub fn configuration<T: Into<String>>(message: T) -> Self {
        Self::Configuration(message.into())
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal<T: Into<String>>(message: T) -> Self {
        Self::Internal(message.into())
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(format!("JSON serialization error: {}", err))
    }
}

/// Serializable error response for the handler layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Machine-readable error code
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Request trace ID for debugging
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
}

impl ErrorResponse {
    /// Creates a new error response from a `GatewayError`.
    #[must_use]
    pub fn from_error(error: &GatewayError) -> Self {
        Self {
            code: error.error_code().to_string(),
            message: error.to_string(),
            trace_id: None,
        }
    }

    /// Sets the trace ID.
    #[must_use]
    pub fn with_trace_id(mut self, trace_id: impl Into<String>) -> Self {
        self.trace_id = Some(trace_id.into());
        self
    }
}

impl From<&GatewayError> for ErrorResponse {
    fn from(error: &GatewayError) -> Self {
        Self::from_error(error)
    }
}
