//! Configuration for the fleet gateway.

use std::time::Duration;

/// Provider and API endpoint constants.
pub mod api {
    use std::time::Duration;

    /// Tesla Fleet OAuth authorization endpoint.
    pub const AUTH_URL: &str = "https://fleet-auth.prd.vn.cloud.tesla.com/oauth2/v3/authorize";

    /// Tesla Fleet OAuth token endpoint.
    pub const TOKEN_URL: &str = "https://fleet-auth.prd.vn.cloud.tesla.com/oauth2/v3/token";

    /// Tesla Fleet API base.
    pub const FLEET_API: &str = "https://fleet-api.prd.na.vn.cloud.tesla.com/api/1";

    /// OAuth scopes requested at login.
    pub const SCOPES: &[&str] = &["vehicle_device_data", "vehicle_location"];

    /// Request timeout (wake commands can be slow while the vehicle comes up).
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

    /// Connection timeout.
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Maximum keepalive connections per host.
    pub const MAX_KEEPALIVE: usize = 10;

    /// Keepalive expiry.
    pub const KEEPALIVE_EXPIRY: Duration = Duration::from_secs(30);
}

/// Lifetimes for the ephemeral server-side state.
pub mod lifetimes {
    use std::time::Duration;

    /// OAuth correlation (state + code verifier) TTL: 10 minutes.
    pub const CORRELATION_TTL: Duration = Duration::from_secs(600);

    /// Session lifetime fallback when the provider omits `expires_in`.
    pub const DEFAULT_TOKEN_LIFETIME: Duration = Duration::from_secs(3600);

    /// Session cookie lifetime: 7 days. Longer than any access token so the
    /// cookie outlives the session, not the other way around.
    pub const SESSION_COOKIE_MAX_AGE: Duration = Duration::from_secs(7 * 24 * 60 * 60);

    /// Expired-entry sweep interval for both stores.
    pub const SWEEP_INTERVAL: Duration = Duration::from_secs(300);
}

/// Gateway configuration.
///
/// Constructed once at startup and passed into the provider client and
/// server; nothing reads process-wide environment state after this.
#[derive(Debug, Clone)]
pub struct Config {
    /// OAuth client identifier registered with the provider.
    pub client_id: String,

    /// OAuth client secret.
    pub client_secret: String,

    /// Redirect URI for the OAuth callback.
    pub redirect_uri: String,

    /// Authorization endpoint (overridable for testing).
    pub auth_url: String,

    /// Token endpoint (overridable for testing).
    pub token_url: String,

    /// Device-control API base URL (overridable for testing).
    pub api_base_url: String,

    /// Listen port.
    pub port: u16,

    /// Request timeout.
    pub request_timeout: Duration,

    /// Connection timeout.
    pub connect_timeout: Duration,
}

impl Config {
    /// Create a configuration with production endpoints.
    #[must_use]
    pub fn new(client_id: String, client_secret: String, redirect_uri: String) -> Self {
        Self {
            client_id,
            client_secret,
            redirect_uri,
            auth_url: api::AUTH_URL.to_string(),
            token_url: api::TOKEN_URL.to_string(),
            api_base_url: api::FLEET_API.to_string(),
            port: 3000,
            request_timeout: api::REQUEST_TIMEOUT,
            connect_timeout: api::CONNECT_TIMEOUT,
        }
    }

    /// Create a test configuration with all endpoints pointed at a mock server.
    #[must_use]
    pub fn for_testing(base_url: &str) -> Self {
        Self {
            client_id: "test-client-id".to_string(),
            client_secret: "test-client-secret".to_string(),
            redirect_uri: "http://localhost:3000/auth/callback".to_string(),
            auth_url: format!("{base_url}/oauth2/v3/authorize"),
            token_url: format!("{base_url}/oauth2/v3/token"),
            api_base_url: format!("{base_url}/api/1"),
            port: 0,
            request_timeout: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(2),
        }
    }

    /// Create configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first missing required variable
    /// (`TESLA_CLIENT_ID`, `TESLA_CLIENT_SECRET`, `TESLA_REDIRECT_URI`).
    /// The process must not serve traffic without them.
    pub fn from_env() -> anyhow::Result<Self> {
        let client_id = require_env("TESLA_CLIENT_ID")?;
        let client_secret = require_env("TESLA_CLIENT_SECRET")?;
        let redirect_uri = require_env("TESLA_REDIRECT_URI")?;

        let mut config = Self::new(client_id, client_secret, redirect_uri);
        if let Ok(port) = std::env::var("PORT") {
            config.port = port.parse().map_err(|_| {
                anyhow::anyhow!("PORT must be a number between 1 and 65535, got {port:?}")
            })?;
        }

        Ok(config)
    }
}

fn require_env(name: &str) -> anyhow::Result<String> {
    non_blank(name, std::env::var(name).ok())
}

fn non_blank(name: &str, value: Option<String>) -> anyhow::Result<String> {
    match value {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => anyhow::bail!("required environment variable {name} is not set"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_uses_production_endpoints() {
        let config = Config::new("id".into(), "secret".into(), "http://cb".into());
        assert_eq!(config.auth_url, api::AUTH_URL);
        assert_eq!(config.token_url, api::TOKEN_URL);
        assert_eq!(config.api_base_url, api::FLEET_API);
        assert_eq!(config.port, 3000);
    }

    #[test]
    fn test_for_testing_points_at_mock() {
        let config = Config::for_testing("http://127.0.0.1:9999");
        assert!(config.auth_url.starts_with("http://127.0.0.1:9999"));
        assert!(config.token_url.starts_with("http://127.0.0.1:9999"));
        assert!(config.api_base_url.starts_with("http://127.0.0.1:9999"));
    }

    #[test]
    fn test_required_vars_reject_missing_and_blank() {
        let err = non_blank("TESLA_CLIENT_ID", None).unwrap_err();
        assert!(err.to_string().contains("TESLA_CLIENT_ID"));

        assert!(non_blank("TESLA_CLIENT_SECRET", Some("  ".into())).is_err());
        assert_eq!(non_blank("TESLA_REDIRECT_URI", Some("http://cb".into())).unwrap(), "http://cb");
    }

    #[test]
    fn test_scopes_cover_device_data() {
        assert!(api::SCOPES.contains(&"vehicle_device_data"));
    }
}
