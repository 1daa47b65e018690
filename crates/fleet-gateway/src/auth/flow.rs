//! OAuth authorization-code flow coordination.
//!
//! Orchestrates the login state machine: authorization redirect, callback
//! consumption, token exchange, profile fetch, and session creation. A
//! session materializes only when the whole sequence succeeds.

use std::sync::Arc;
use std::time::Duration;

use url::Url;

use crate::auth::correlation::CorrelationStore;
use crate::auth::pkce;
use crate::auth::session::{Session, SessionStore};
use crate::config::Config;
use crate::config::lifetimes::DEFAULT_TOKEN_LIFETIME;
use crate::error::{ApiError, ApiResult, ClientError};
use crate::fleet::FleetClient;
use crate::fleet::token::TokenClient;

/// Everything the login handler needs to redirect the browser.
#[derive(Debug)]
pub struct LoginRedirect {
    /// Provider authorization URL, fully parameterized.
    pub authorization_url: String,
    /// CSRF correlation token echoed by the provider.
    pub state: String,
    /// PKCE verifier, also set as a short-lived browser cookie.
    pub code_verifier: String,
}

/// Raw callback query parameters as they arrived.
#[derive(Debug, Default)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// OAuth flow coordinator.
#[derive(Clone)]
pub struct AuthFlow {
    correlations: CorrelationStore,
    sessions: Arc<dyn SessionStore>,
    tokens: TokenClient,
    fleet: FleetClient,
    auth_url: Url,
    client_id: String,
    redirect_uri: String,
}

impl AuthFlow {
    /// Create a coordinator over the given stores and upstream clients.
    ///
    /// # Errors
    ///
    /// Returns error if the configured authorization URL does not parse or
    /// the token client cannot be built.
    pub fn new(
        config: &Config,
        fleet: FleetClient,
        sessions: Arc<dyn SessionStore>,
    ) -> anyhow::Result<Self> {
        let auth_url = Url::parse(&config.auth_url)
            .map_err(|e| anyhow::anyhow!("invalid authorization URL {:?}: {e}", config.auth_url))?;

        Ok(Self {
            correlations: CorrelationStore::new(),
            sessions,
            tokens: TokenClient::new(config)?,
            fleet,
            auth_url,
            client_id: config.client_id.clone(),
            redirect_uri: config.redirect_uri.clone(),
        })
    }

    /// The correlation store, for sweep-task wiring.
    #[must_use]
    pub const fn correlations(&self) -> &CorrelationStore {
        &self.correlations
    }

    /// Begin a login attempt.
    ///
    /// Generates a fresh `state` and code verifier, records the
    /// correlation, and returns the provider authorization URL.
    pub async fn begin_login(&self, scopes: &[&str]) -> LoginRedirect {
        let state = pkce::generate_token();
        let code_verifier = pkce::generate_token();

        self.correlations.insert(state.clone(), code_verifier.clone()).await;

        let mut url = self.auth_url.clone();
        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.client_id)
            .append_pair("redirect_uri", &self.redirect_uri)
            .append_pair("scope", &scopes.join(" "))
            .append_pair("state", &state)
            .append_pair("code_challenge", &pkce::code_challenge(&code_verifier))
            .append_pair("code_challenge_method", "S256");

        tracing::debug!("issued login redirect");

        LoginRedirect { authorization_url: url.into(), state, code_verifier }
    }

    /// Complete a login attempt from callback parameters.
    ///
    /// Returns the new session identifier. Fails closed on a provider
    /// error, a malformed callback, an unknown/expired/replayed `state`,
    /// or a failed exchange; no session is created on any failure path.
    pub async fn complete_login(&self, params: CallbackParams) -> ApiResult<String> {
        if let Some(error) = params.error {
            return Err(ApiError::provider(error, params.error_description));
        }

        let code = params.code.ok_or(ApiError::InvalidCallback("missing code parameter"))?;
        let state = params.state.ok_or(ApiError::InvalidCallback("missing state parameter"))?;

        // Consume-once: a replayed or double-submitted state observes
        // "not found" here even if the first attempt is still in flight.
        let code_verifier =
            self.correlations.consume(&state).await.ok_or(ApiError::StateMismatch)?;

        let tokens = self
            .tokens
            .exchange_code(&code, &code_verifier)
            .await
            .map_err(ApiError::ExchangeFailed)?;

        let profile =
            self.fleet.get_me(&tokens.access_token).await.map_err(ApiError::ExchangeFailed)?;

        let user_id = extract_user_id(&profile).ok_or_else(|| {
            use serde::de::Error as _;
            ApiError::ExchangeFailed(ClientError::Parse(serde_json::Error::custom(
                "profile response contained no user identifier",
            )))
        })?;

        let lifetime = tokens.expires_in.map_or(DEFAULT_TOKEN_LIFETIME, Duration::from_secs);
        let session_id = pkce::generate_token();
        let session =
            Session::new(tokens.access_token, tokens.refresh_token, user_id, lifetime);

        tracing::info!(user = %session.user_id, "login completed");
        self.sessions.create(session_id.clone(), session).await;

        Ok(session_id)
    }

    /// Delete a session on explicit logout. Unknown ids are a no-op.
    pub async fn logout(&self, session_id: &str) {
        self.sessions.delete(session_id).await;
        tracing::debug!("session deleted on logout");
    }
}

impl std::fmt::Debug for AuthFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthFlow").field("client_id", &self.client_id).finish()
    }
}

/// Pick the user identifier out of a provider profile.
///
/// Prefers a stable identifier field, unwrapping the Fleet API's
/// `response` envelope when present; an email-like field is only a
/// fallback for profiles without a stable id.
fn extract_user_id(profile: &serde_json::Value) -> Option<String> {
    let body = profile.get("response").unwrap_or(profile);

    for key in ["id", "sub", "vault_uuid"] {
        match body.get(key) {
            Some(serde_json::Value::String(id)) if !id.is_empty() => return Some(id.clone()),
            Some(serde_json::Value::Number(id)) => return Some(id.to_string()),
            _ => {}
        }
    }

    body.get("email").and_then(|v| v.as_str()).filter(|s| !s.is_empty()).map(str::to_string)
}
