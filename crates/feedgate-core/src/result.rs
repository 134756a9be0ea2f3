//! Result type aliases for Feedgate.

use crate::GatewayError;

/// A specialized `Result` type for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;
