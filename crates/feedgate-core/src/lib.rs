//! # Feedgate Core
//!
//! Error definitions, result aliases and logging setup shared by every
//! crate of the Feedgate bank-feed gateway.

pub mod error;
pub mod result;
pub mod telemetry;

pub use error::*;
pub use result::*;
pub use telemetry::*;
