//! # Feedgate Xero
//!
//! Credentials for outbound Xero calls: a cached client-credentials access
//! token ([`TokenManager`]) and the tenant the credentials act for
//! ([`TenantResolver`]). Both are built once at startup and shared.

mod endpoints;
mod session;
mod tenant;
mod token_manager;

pub use endpoints::*;
pub use session::*;
pub use tenant::*;
pub use token_manager::*;
