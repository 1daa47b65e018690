//! Provider token exchange.
//!
//! A pure request/response collaborator: exchanges an authorization code
//! (plus its PKCE verifier) for provider tokens. No state is stored here.

use reqwest::Client;
use serde::Deserialize;

use crate::config::Config;
use crate::error::{ClientError, ClientResult};

/// Successful token exchange payload.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    /// Bearer token for upstream API calls.
    pub access_token: String,

    /// Refresh token, if issued.
    #[serde(default)]
    pub refresh_token: Option<String>,

    /// Advertised token lifetime in seconds; callers default this when absent.
    #[serde(default)]
    pub expires_in: Option<u64>,
}

/// OAuth token endpoint client.
#[derive(Clone)]
pub struct TokenClient {
    client: Client,
    token_url: String,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
}

impl TokenClient {
    /// Create a new token client.
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client initialization fails.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .build()?;

        Ok(Self {
            client,
            token_url: config.token_url.clone(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            redirect_uri: config.redirect_uri.clone(),
        })
    }

    /// Exchange an authorization code for tokens (RFC 6749 §4.1.3, with the
    /// PKCE verifier from the original authorization request).
    pub async fn exchange_code(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> ClientResult<TokenResponse> {
        let form = [
            ("grant_type", "authorization_code"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("code", code),
            ("code_verifier", code_verifier),
            ("redirect_uri", self.redirect_uri.as_str()),
        ];

        let response = self.client.post(&self.token_url).form(&form).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::upstream(status.as_u16(), body));
        }

        Ok(response.json().await?)
    }
}

impl std::fmt::Debug for TokenClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Client secret never appears in debug output.
        f.debug_struct("TokenClient")
            .field("token_url", &self.token_url)
            .field("client_id", &self.client_id)
            .finish()
    }
}
