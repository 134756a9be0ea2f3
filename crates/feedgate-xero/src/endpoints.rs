//! Fixed Xero identity and API endpoints.

/// OAuth2 token endpoint.
pub const TOKEN_URL: &str = "https://identity.xero.com/connect/token";

/// Connections listing endpoint.
pub const CONNECTIONS_URL: &str = "https://api.xero.com/connections";

/// Header carrying the tenant id on API calls.
pub const TENANT_ID_HEADER: &str = "xero-tenant-id";

/// Endpoints used by the credential components.
///
/// Production code uses [`XeroEndpoints::default`]; other values exist so
/// tests can point at a mock server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XeroEndpoints {
    /// OAuth2 token endpoint.
    pub token_url: String,
    /// Connections listing endpoint.
    pub connections_url: String,
}

impl XeroEndpoints {
    /// Endpoints rooted at `base_url`, using Xero's paths.
    #[must_use]
    pub fn with_base_url(base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        Self {
            token_url: format!("{}/connect/token", base),
            connections_url: format!("{}/connections", base),
        }
    }
}

impl Default for XeroEndpoints {
    fn default() -> Self {
        Self {
            token_url: TOKEN_URL.to_string(),
            connections_url: CONNECTIONS_URL.to_string(),
        }
    }
}
