//! Tesla Fleet API client.
//!
//! Provides the device-control side of the gateway:
//! - Connection pooling via reqwest
//! - Per-call bearer tokens (no token is stored here)
//! - Opaque passthrough of 2xx bodies; non-2xx translated to
//!   [`ClientError::Upstream`] with the remote status preserved
//!
//! Upstream failures are surfaced directly with no automatic retry: the
//! Fleet API may require a caller-driven wake sequence before a command
//! succeeds, and retrying here would mask that contract.

pub mod token;

use reqwest::Client;
use serde_json::Value;

use crate::config::{Config, api};
use crate::error::{ClientError, ClientResult};

/// Device-control API client.
///
/// Stateless per call: every operation takes the session's bearer token.
#[derive(Clone)]
pub struct FleetClient {
    /// Pooled HTTP client.
    client: Client,

    /// Fleet API base URL.
    api_base_url: String,
}

impl FleetClient {
    /// Create a new client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client initialization fails.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::CONTENT_TYPE,
            "application/json".parse().expect("valid content-type header"),
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .pool_max_idle_per_host(api::MAX_KEEPALIVE)
            .pool_idle_timeout(api::KEEPALIVE_EXPIRY)
            .gzip(true)
            .build()?;

        Ok(Self { client, api_base_url: config.api_base_url.clone() })
    }

    /// Fetch the authenticated user's profile.
    pub async fn get_me(&self, access_token: &str) -> ClientResult<Value> {
        let url = format!("{}/users/me", self.api_base_url);
        self.get(access_token, &url, &[]).await
    }

    /// List the user's vehicles.
    pub async fn list_vehicles(&self, access_token: &str) -> ClientResult<Value> {
        let url = format!("{}/vehicles", self.api_base_url);
        self.get(access_token, &url, &[]).await
    }

    /// Fetch vehicle data, optionally scoped to a subset of data categories.
    ///
    /// When `endpoints` is present it is forwarded as the Fleet API's
    /// semicolon-joined `endpoints` filter; when absent the full data set
    /// is requested.
    pub async fn vehicle_data(
        &self,
        access_token: &str,
        vehicle_id: &str,
        endpoints: Option<&[String]>,
    ) -> ClientResult<Value> {
        let url = format!("{}/vehicles/{}/vehicle_data", self.api_base_url, vehicle_id);

        let params = match endpoints {
            Some(endpoints) => vec![("endpoints".to_string(), endpoints.join(";"))],
            None => vec![],
        };

        self.get(access_token, &url, &params).await
    }

    /// Fetch the charge-state view of vehicle data.
    pub async fn charge_state(&self, access_token: &str, vehicle_id: &str) -> ClientResult<Value> {
        self.vehicle_data(access_token, vehicle_id, Some(&["charge_state".to_string()])).await
    }

    /// Fetch the location view of vehicle data.
    pub async fn location(&self, access_token: &str, vehicle_id: &str) -> ClientResult<Value> {
        self.vehicle_data(access_token, vehicle_id, Some(&["location_data".to_string()])).await
    }

    /// Wake a sleeping vehicle.
    ///
    /// Callers should wake a vehicle observed as `asleep` before issuing
    /// data or command requests; the gateway does not auto-wake.
    pub async fn wake(&self, access_token: &str, vehicle_id: &str) -> ClientResult<Value> {
        let url = format!("{}/vehicles/{}/wake_up", self.api_base_url, vehicle_id);
        self.post(access_token, &url, None).await
    }

    /// Start charging.
    pub async fn charge_start(&self, access_token: &str, vehicle_id: &str) -> ClientResult<Value> {
        let url = format!("{}/vehicles/{}/command/charge_start", self.api_base_url, vehicle_id);
        self.post(access_token, &url, None).await
    }

    /// Stop charging.
    pub async fn charge_stop(&self, access_token: &str, vehicle_id: &str) -> ClientResult<Value> {
        let url = format!("{}/vehicles/{}/command/charge_stop", self.api_base_url, vehicle_id);
        self.post(access_token, &url, None).await
    }

    /// Set the charge limit percentage.
    ///
    /// Bounds are validated at the gateway before this is called; the
    /// client forwards whatever it is given.
    pub async fn set_charge_limit(
        &self,
        access_token: &str,
        vehicle_id: &str,
        percent: i64,
    ) -> ClientResult<Value> {
        let url = format!("{}/vehicles/{}/command/set_charge_limit", self.api_base_url, vehicle_id);
        let body = serde_json::json!({ "percent": percent });
        self.post(access_token, &url, Some(&body)).await
    }

    /// Make a GET request with a bearer token.
    async fn get(
        &self,
        access_token: &str,
        url: &str,
        params: &[(String, String)],
    ) -> ClientResult<Value> {
        let response =
            self.client.get(url).bearer_auth(access_token).query(params).send().await?;

        Self::handle_response(response).await
    }

    /// Make a POST request with a bearer token.
    async fn post(
        &self,
        access_token: &str,
        url: &str,
        body: Option<&Value>,
    ) -> ClientResult<Value> {
        let mut request = self.client.post(url).bearer_auth(access_token);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        Self::handle_response(response).await
    }

    /// Pass 2xx bodies through; translate everything else.
    async fn handle_response(response: reqwest::Response) -> ClientResult<Value> {
        let status = response.status();

        if status.is_success() {
            return Ok(response.json().await?);
        }

        let body = response.text().await.unwrap_or_default();
        Err(ClientError::upstream(status.as_u16(), body))
    }
}

impl std::fmt::Debug for FleetClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FleetClient").field("api_base_url", &self.api_base_url).finish()
    }
}
