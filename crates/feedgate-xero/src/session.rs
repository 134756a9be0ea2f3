//! Credential wiring for outbound Xero calls.

use crate::{TenantResolver, TokenManager, XeroEndpoints, TENANT_ID_HEADER};
use feedgate_config::XeroConfig;
use feedgate_core::{GatewayError, GatewayResult};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::Client;
use std::sync::Arc;

/// The process-wide token manager and tenant resolver.
///
/// Built once at startup and shared by handle with every component that
/// calls the Xero API.
#[derive(Clone)]
pub struct XeroSession {
    tokens: Arc<TokenManager>,
    tenants: Arc<TenantResolver>,
}

impl XeroSession {
    /// Creates a session against the production Xero endpoints.
    pub fn new(config: &XeroConfig) -> GatewayResult<Self> {
        Self::with_endpoints(config, &XeroEndpoints::default())
    }

    /// Creates a session against the given endpoints.
    pub fn with_endpoints(config: &XeroConfig, endpoints: &XeroEndpoints) -> GatewayResult<Self> {
        let client = Client::builder()
            .user_agent(concat!("feedgate/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| GatewayError::internal(format!("Failed to create HTTP client: {}", e)))?;

        let tokens = Arc::new(TokenManager::new(
            client.clone(),
            endpoints.token_url.clone(),
            config.clone(),
        ));
        let tenants = Arc::new(TenantResolver::new(
            client,
            endpoints.connections_url.clone(),
            tokens.clone(),
        ));

        Ok(Self { tokens, tenants })
    }

    /// The shared token manager.
    #[must_use]
    pub fn tokens(&self) -> &Arc<TokenManager> {
        &self.tokens
    }

    /// The shared tenant resolver.
    #[must_use]
    pub fn tenants(&self) -> &Arc<TenantResolver> {
        &self.tenants
    }

    /// Headers authorizing one API call: bearer token plus tenant id.
    pub async fn authorization_headers(&self) -> GatewayResult<HeaderMap> {
        let access_token = self.tokens.access_token().await?;
        let tenant_id = self.tenants.tenant_id().await?;

        let mut headers = HeaderMap::with_capacity(2);
        headers.insert(AUTHORIZATION, header_value(&format!("Bearer {}", access_token))?);
        headers.insert(HeaderName::from_static(TENANT_ID_HEADER), header_value(&tenant_id)?);
        Ok(headers)
    }
}

fn header_value(value: &str) -> GatewayResult<HeaderValue> {
    let mut header = HeaderValue::from_str(value)
        .map_err(|e| GatewayError::internal(format!("Invalid header value: {}", e)))?;
    header.set_sensitive(true);
    Ok(header)
}
