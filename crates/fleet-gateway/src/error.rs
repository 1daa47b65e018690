//! Error types for the fleet gateway.
//!
//! Uses `thiserror` for structured error handling with automatic `From`
//! implementations. Errors are layered: [`ClientError`] covers the upstream
//! HTTP layer, [`ApiError`] covers request handling and maps onto HTTP
//! responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Errors from the upstream HTTP client layer.
#[derive(thiserror::Error, Debug)]
pub enum ClientError {
    /// HTTP transport error (connection, DNS, TLS, etc.)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Upstream API returned a non-2xx status. The body is kept opaque;
    /// device payload schemas are not interpreted here.
    #[error("Upstream returned {status}")]
    Upstream {
        /// HTTP status code from the remote API
        status: u16,
        /// Raw response body, not assumed well-formed
        body: String,
    },

    /// JSON parsing error
    #[error("Failed to parse response: {0}")]
    Parse(#[from] serde_json::Error),
}

impl ClientError {
    /// Create an upstream error from a status and raw body.
    #[must_use]
    pub fn upstream(status: u16, body: impl Into<String>) -> Self {
        Self::Upstream { status, body: body.into() }
    }

    /// Get the remote status code if the upstream answered at all.
    #[must_use]
    pub const fn upstream_status(&self) -> Option<u16> {
        match self {
            Self::Upstream { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Errors surfaced to HTTP callers.
///
/// Every failure path returns a structured error distinguishable by kind;
/// nothing is silently swallowed and nothing is retried automatically.
#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    /// The identity provider returned an error parameter at callback.
    #[error("Provider error: {error}: {description}")]
    Provider {
        /// Provider-supplied error code
        error: String,
        /// Provider-supplied human-readable description
        description: String,
    },

    /// Callback arrived without a required parameter.
    #[error("Invalid callback: {0}")]
    InvalidCallback(&'static str),

    /// Callback state is unknown, expired, or already consumed.
    #[error("OAuth state mismatch")]
    StateMismatch,

    /// Token exchange or profile fetch failed; no session was created.
    #[error("Token exchange failed: {0}")]
    ExchangeFailed(#[source] ClientError),

    /// No session, or the session has expired.
    #[error("Authentication required")]
    Unauthenticated,

    /// A command parameter is outside its domain bounds.
    #[error("{0}")]
    InvalidParameter(String),

    /// The device-control API returned a failure.
    #[error("Upstream failure: {0}")]
    Upstream(#[from] ClientError),
}

impl ApiError {
    /// Create a provider error from callback query parameters.
    #[must_use]
    pub fn provider(error: impl Into<String>, description: Option<String>) -> Self {
        Self::Provider {
            error: error.into(),
            description: description.unwrap_or_else(|| "Unknown error".to_string()),
        }
    }

    /// Create an invalid-parameter error naming the violated bound.
    #[must_use]
    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        Self::InvalidParameter(message.into())
    }

    /// Stable machine-readable kind for the response body.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Provider { .. } => "provider_error",
            Self::InvalidCallback(_) => "invalid_callback",
            Self::StateMismatch => "state_mismatch",
            Self::ExchangeFailed(_) => "exchange_failed",
            Self::Unauthenticated => "unauthenticated",
            Self::InvalidParameter(_) => "invalid_parameter",
            Self::Upstream(_) => "upstream_failure",
        }
    }

    /// HTTP status this error maps to.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Provider { .. }
            | Self::InvalidCallback(_)
            | Self::StateMismatch
            | Self::InvalidParameter(_) => StatusCode::BAD_REQUEST,
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::ExchangeFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        match &self {
            Self::ExchangeFailed(source) => {
                tracing::error!(error = %source, "token exchange failed");
            }
            Self::Upstream(source) => {
                tracing::warn!(error = %source, "upstream call failed");
            }
            _ => {
                tracing::debug!(kind = self.kind(), "request rejected");
            }
        }

        let mut body = serde_json::json!({
            "error": self.kind(),
            "message": self.to_string(),
        });

        // Preserve the remote status where the upstream answered at all.
        if let Self::Upstream(client_err) = &self {
            if let Some(upstream_status) = client_err.upstream_status() {
                body["upstream_status"] = serde_json::json!(upstream_status);
            }
        }

        (status, Json(body)).into_response()
    }
}

/// Result type alias for upstream client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Result type alias for request handling.
pub type ApiResult<T> = Result<T, ApiError>;
