//! Client-credentials access token cache.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use feedgate_config::XeroConfig;
use feedgate_core::{GatewayError, GatewayResult};
use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use reqwest::Client;
use serde::Deserialize;
use std::fmt;
use tracing::{debug, info, warn};

/// Seconds before expiry at which a cached token is treated as stale.
pub const REFRESH_AHEAD_SECS: i64 = 5 * 60;

/// Source of bearer tokens for outbound calls.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    /// Returns a bearer token valid for at least the refresh-ahead margin.
    async fn access_token(&self) -> GatewayResult<String>;
}

/// An issued bearer token. Replaced wholesale on refresh.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    value: String,
    expires_at: DateTime<Utc>,
}

impl AccessToken {
    /// Creates a token expiring at `expires_at`.
    #[must_use]
    pub fn new(value: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            value: value.into(),
            expires_at,
        }
    }

    /// The bearer string.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Absolute expiry.
    #[must_use]
    pub const fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// True while the token outlives `now` by more than the refresh-ahead
    /// margin.
    #[must_use]
    pub fn is_fresh_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now + chrono::Duration::seconds(REFRESH_AHEAD_SECS)
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("value", &"***")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    /// Lifetime in seconds from issue.
    expires_in: i64,
}

#[derive(Debug, Deserialize)]
struct OAuthErrorResponse {
    error: String,
    error_description: Option<String>,
}

type RefreshFuture = Shared<BoxFuture<'static, Result<AccessToken, String>>>;

#[derive(Default)]
struct TokenState {
    token: Option<AccessToken>,
    in_flight: Option<RefreshFuture>,
}

/// Caches the client-credentials access token and refreshes it when it
/// comes within [`REFRESH_AHEAD_SECS`] of expiry.
///
/// Concurrent callers that find the token stale join a single shared
/// refresh, so one round trip to the token endpoint serves all of them and
/// all receive the same token (or the same error). The state lock is only
/// held for bookkeeping, never across the network call, so callers holding
/// a fresh token are not queued behind a refresh.
///
/// A failed refresh is returned to every waiter and leaves the cache stale;
/// the next call starts a new refresh. A stale token is never handed out.
pub struct TokenManager {
    client: Client,
    token_url: String,
    credentials: XeroConfig,
    state: Mutex<TokenState>,
}

impl TokenManager {
    /// Creates a manager with no cached token.
    pub fn new(client: Client, token_url: impl Into<String>, credentials: XeroConfig) -> Self {
        Self {
            client,
            token_url: token_url.into(),
            credentials,
            state: Mutex::new(TokenState::default()),
        }
    }

    /// Returns a valid bearer token, refreshing first if needed.
    ///
    /// Dropping the returned future abandons the wait but not the shared
    /// refresh; other waiters keep driving it.
    pub async fn access_token(&self) -> GatewayResult<String> {
        let refresh = {
            let mut state = self.state.lock();
            if let Some(token) = state.token.as_ref().filter(|t| t.is_fresh_at(Utc::now())) {
                return Ok(token.value.clone());
            }
            state
                .in_flight
                .get_or_insert_with(|| self.start_refresh())
                .clone()
        };

        let result = refresh.clone().await;

        {
            let mut state = self.state.lock();
            if state.in_flight.as_ref().is_some_and(|f| f.ptr_eq(&refresh)) {
                state.in_flight = None;
                if let Ok(token) = &result {
                    state.token = Some(token.clone());
                }
            }
        }

        result
            .map(|token| token.value)
            .map_err(GatewayError::TokenRefresh)
    }

    /// Expiry of the cached token, if any.
    #[must_use]
    pub fn cached_expiry(&self) -> Option<DateTime<Utc>> {
        self.state.lock().token.as_ref().map(AccessToken::expires_at)
    }

    fn start_refresh(&self) -> RefreshFuture {
        debug!("Starting access token refresh");
        let client = self.client.clone();
        let token_url = self.token_url.clone();
        let credentials = self.credentials.clone();

        async move { request_token(&client, &token_url, &credentials).await }
            .boxed()
            .shared()
    }
}

#[async_trait]
impl AccessTokenProvider for TokenManager {
    async fn access_token(&self) -> GatewayResult<String> {
        TokenManager::access_token(self).await
    }
}

async fn request_token(
    client: &Client,
    token_url: &str,
    credentials: &XeroConfig,
) -> Result<AccessToken, String> {
    info!("Requesting new Xero access token");

    let response = client
        .post(token_url)
        .form(&[
            ("grant_type", "client_credentials"),
            ("client_id", credentials.client_id.as_str()),
            ("client_secret", credentials.client_secret.as_str()),
        ])
        .send()
        .await
        .map_err(|e| format!("failed to call authorization endpoint: {}", e))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| format!("failed to read token response: {}", e))?;

    if !status.is_success() {
        let detail = match serde_json::from_str::<OAuthErrorResponse>(&body) {
            Ok(err) => match err.error_description {
                Some(description) => format!("{} ({})", err.error, description),
                None => err.error,
            },
            Err(_) => body,
        };
        warn!(%status, "Authorization endpoint rejected token request");
        return Err(format!("authorization endpoint returned {}: {}", status, detail));
    }

    let parsed: TokenResponse = serde_json::from_str(&body)
        .map_err(|e| format!("failed to parse token response: {}", e))?;
    if parsed.access_token.is_empty() {
        return Err("token response contained an empty access token".to_string());
    }

    let now = Utc::now();
    let expires_at = chrono::Duration::try_seconds(parsed.expires_in)
        .and_then(|lifetime| now.checked_add_signed(lifetime))
        .ok_or_else(|| format!("invalid expires_in in token response: {}", parsed.expires_in))?;

    let token = AccessToken::new(parsed.access_token, expires_at);
    if !token.is_fresh_at(now) {
        warn!(
            expires_in = parsed.expires_in,
            "Issued token lifetime is shorter than the refresh-ahead margin"
        );
        return Err(format!(
            "issued token expires in {}s, inside the {}s refresh-ahead margin",
            parsed.expires_in, REFRESH_AHEAD_SECS
        ));
    }

    info!(expires_at = %token.expires_at, "Xero access token refreshed");
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn credentials() -> XeroConfig {
        XeroConfig {
            client_id: "client-id".to_string(),
            client_secret: "client-secret".to_string(),
        }
    }

    fn manager(server: &MockServer) -> TokenManager {
        TokenManager::new(
            Client::new(),
            format!("{}/connect/token", server.uri()),
            credentials(),
        )
    }

    fn seed(manager: &TokenManager, value: &str, expires_in: chrono::Duration) {
        manager.state.lock().token = Some(AccessToken::new(value, Utc::now() + expires_in));
    }

    fn token_body(token: &str, expires_in: i64) -> serde_json::Value {
        serde_json::json!({
            "access_token": token,
            "expires_in": expires_in,
            "token_type": "Bearer",
            "scope": "bankfeeds"
        })
    }

    #[test]
    fn test_freshness_margin() {
        let now = Utc::now();
        let fresh = AccessToken::new("a", now + chrono::Duration::minutes(10));
        let stale = AccessToken::new("b", now + chrono::Duration::minutes(4));
        let edge = AccessToken::new("c", now + chrono::Duration::seconds(REFRESH_AHEAD_SECS));

        assert!(fresh.is_fresh_at(now));
        assert!(!stale.is_fresh_at(now));
        assert!(!edge.is_fresh_at(now));
    }

    #[test]
    fn test_debug_hides_value() {
        let token = AccessToken::new("super-secret", Utc::now());
        assert!(!format!("{:?}", token).contains("super-secret"));
    }

    #[tokio::test]
    async fn test_fresh_token_skips_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/connect/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_body("new", 1800)))
            .expect(0)
            .mount(&server)
            .await;

        let manager = manager(&server);
        seed(&manager, "cached", chrono::Duration::minutes(10));

        assert_eq!(manager.access_token().await.unwrap(), "cached");
        server.verify().await;
    }

    #[tokio::test]
    async fn test_token_near_expiry_is_refreshed_once() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/connect/token"))
            .and(body_string_contains("grant_type=client_credentials"))
            .and(body_string_contains("client_id=client-id"))
            .and(body_string_contains("client_secret=client-secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_body("refreshed", 1800)))
            .expect(1)
            .mount(&server)
            .await;

        let manager = manager(&server);
        seed(&manager, "old", chrono::Duration::minutes(4));

        assert_eq!(manager.access_token().await.unwrap(), "refreshed");
        assert_eq!(manager.access_token().await.unwrap(), "refreshed");

        let expiry = manager.cached_expiry().unwrap();
        assert!(expiry > Utc::now() + chrono::Duration::minutes(5));
        assert!(expiry <= Utc::now() + chrono::Duration::seconds(1800));
        server.verify().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_callers_share_one_refresh() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/connect/token"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(token_body("shared", 1800))
                    .set_delay(Duration::from_millis(200)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let manager = Arc::new(manager(&server));
        let handles: Vec<_> = (0..50)
            .map(|_| {
                let manager = manager.clone();
                tokio::spawn(async move { manager.access_token().await })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), "shared");
        }
        server.verify().await;
    }

    #[tokio::test]
    async fn test_failed_refresh_is_not_cached() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/connect/token"))
            .respond_with(
                ResponseTemplate::new(400).set_body_json(serde_json::json!({
                    "error": "invalid_client"
                })),
            )
            .expect(2)
            .mount(&server)
            .await;

        let manager = manager(&server);

        let err = manager.access_token().await.unwrap_err();
        assert!(matches!(err, GatewayError::TokenRefresh(ref msg) if msg.contains("invalid_client")));

        // the next call tries again instead of replaying the failure
        assert!(manager.access_token().await.is_err());
        assert!(manager.cached_expiry().is_none());
        server.verify().await;
    }

    #[tokio::test]
    async fn test_stale_token_not_served_after_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/connect/token"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let manager = manager(&server);
        seed(&manager, "stale", chrono::Duration::minutes(1));

        let err = manager.access_token().await.unwrap_err();
        assert_eq!(err.error_code(), "TOKEN_REFRESH_FAILED");
    }

    #[tokio::test]
    async fn test_unparsable_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/connect/token"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = manager(&server).access_token().await.unwrap_err();
        assert!(matches!(err, GatewayError::TokenRefresh(ref msg) if msg.contains("parse")));
    }

    #[tokio::test]
    async fn test_out_of_range_lifetime_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/connect/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_body("huge", i64::MAX)))
            .mount(&server)
            .await;

        let manager = manager(&server);
        let err = manager.access_token().await.unwrap_err();
        assert!(matches!(err, GatewayError::TokenRefresh(ref msg) if msg.contains("expires_in")));
        assert!(manager.cached_expiry().is_none());
    }

    #[tokio::test]
    async fn test_token_inside_margin_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/connect/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_body("short", 60)))
            .expect(2)
            .mount(&server)
            .await;

        let manager = manager(&server);
        let err = manager.access_token().await.unwrap_err();
        assert!(matches!(err, GatewayError::TokenRefresh(ref msg) if msg.contains("margin")));
        assert!(manager.cached_expiry().is_none());

        // never cached, so the next call asks again
        assert!(manager.access_token().await.is_err());
    }

    #[tokio::test]
    async fn test_unreachable_endpoint() {
        let manager = TokenManager::new(Client::new(), "http://127.0.0.1:1/connect/token", credentials());
        let err = manager.access_token().await.unwrap_err();
        assert!(matches!(err, GatewayError::TokenRefresh(_)));
    }

    #[tokio::test]
    async fn test_usable_through_provider_trait() {
        let server = MockServer::start().await;
        let manager = manager(&server);
        seed(&manager, "via-trait", chrono::Duration::hours(1));

        let provider: Arc<dyn AccessTokenProvider> = Arc::new(manager);
        assert_eq!(provider.access_token().await.unwrap(), "via-trait");
    }
}
