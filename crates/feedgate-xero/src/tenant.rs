//! Tenant id resolution.

use crate::AccessTokenProvider;
use feedgate_core::{GatewayError, GatewayResult};
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::info;

/// One entry of the connections listing.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct XeroConnection {
    /// Tenant the connection grants access to.
    pub tenant_id: String,
    /// Tenant kind, e.g. `ORGANISATION`.
    #[serde(default)]
    pub tenant_type: Option<String>,
    /// Display name of the tenant.
    #[serde(default)]
    pub tenant_name: Option<String>,
}

/// Resolves the tenant the configured credentials act on behalf of.
///
/// The first successful resolution is kept for the lifetime of the
/// resolver and never re-resolved. Concurrent first callers share one
/// lookup; a failed lookup is not cached.
pub struct TenantResolver {
    client: Client,
    connections_url: String,
    tokens: Arc<dyn AccessTokenProvider>,
    tenant_id: OnceCell<String>,
}

impl TenantResolver {
    /// Creates a resolver with no cached tenant.
    pub fn new(
        client: Client,
        connections_url: impl Into<String>,
        tokens: Arc<dyn AccessTokenProvider>,
    ) -> Self {
        Self {
            client,
            connections_url: connections_url.into(),
            tokens,
            tenant_id: OnceCell::new(),
        }
    }

    /// Returns the tenant id, resolving it on first use.
    pub async fn tenant_id(&self) -> GatewayResult<String> {
        self.tenant_id
            .get_or_try_init(|| self.resolve())
            .await
            .cloned()
    }

    /// The cached tenant id, if already resolved.
    #[must_use]
    pub fn cached_tenant_id(&self) -> Option<&str> {
        self.tenant_id.get().map(String::as_str)
    }

    async fn resolve(&self) -> GatewayResult<String> {
        let access_token = self.tokens.access_token().await?;

        info!("Fetching Xero tenant id");
        let response = self
            .client
            .get(&self.connections_url)
            .bearer_auth(access_token)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .send()
            .await
            .map_err(|e| {
                GatewayError::tenant_resolution(format!("failed to call connections endpoint: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::tenant_resolution(format!(
                "connections endpoint returned {}: {}",
                status, body
            )));
        }

        let connections: Vec<XeroConnection> = response.json().await.map_err(|e| {
            GatewayError::tenant_resolution(format!("failed to parse connections response: {}", e))
        })?;

        let tenant_id = connections
            .into_iter()
            .next()
            .map(|connection| connection.tenant_id)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| GatewayError::tenant_resolution("no tenants found for these credentials"))?;

        info!(tenant_id = %tenant_id, "Xero tenant resolved");
        Ok(tenant_id)
    }
}
