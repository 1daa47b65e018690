//! HTTP server: router assembly and serving.
//!
//! The router wires the OAuth flow handlers, the authentication gate, and
//! the command gateway over shared application state. The stores spawn
//! their expired-entry sweeps when the gateway is assembled.

pub mod api;
pub mod auth;
pub mod pages;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::{AuthFlow, InMemorySessionStore, SessionStore};
use crate::config::Config;
use crate::fleet::FleetClient;

/// Shared state for all handlers.
#[derive(Clone)]
pub struct AppState {
    /// OAuth flow coordinator.
    pub flow: AuthFlow,
    /// Device-control API client.
    pub fleet: FleetClient,
    /// Session store, shared with the coordinator.
    pub sessions: Arc<dyn SessionStore>,
}

/// The assembled gateway.
pub struct Gateway {
    state: AppState,
    port: u16,
}

impl Gateway {
    /// Assemble the gateway from configuration.
    ///
    /// Must be called from within a Tokio runtime: the store sweep tasks
    /// are spawned here.
    ///
    /// # Errors
    ///
    /// Returns error if an upstream client cannot be built.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let fleet = FleetClient::new(config)?;

        let session_store = InMemorySessionStore::new();
        session_store.clone().start_sweep_task();
        let sessions: Arc<dyn SessionStore> = Arc::new(session_store);

        let flow = AuthFlow::new(config, fleet.clone(), Arc::clone(&sessions))?;
        flow.correlations().clone().start_sweep_task();

        Ok(Self { state: AppState { flow, fleet, sessions }, port: config.port })
    }

    /// Build the router over the gateway state.
    #[must_use]
    pub fn router(&self) -> Router {
        create_router(self.state.clone())
    }

    /// Serve until ctrl-c.
    ///
    /// # Errors
    ///
    /// Returns error on bind or server failure.
    pub async fn run(self) -> anyhow::Result<()> {
        let router = self.router();
        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));

        tracing::info!("gateway listening on http://{addr}");

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, router).with_graceful_shutdown(shutdown_signal()).await?;

        tracing::info!("gateway shut down");
        Ok(())
    }
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway").field("port", &self.port).finish()
    }
}

/// Create the HTTP router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(pages::landing))
        .route("/health", get(health_check))
        .route("/auth/login", get(auth::login))
        .route("/auth/callback", get(auth::callback))
        .route("/logout", get(auth::logout))
        .route("/dashboard", get(pages::dashboard))
        .route("/api/me", get(api::me))
        .route("/api/vehicles", get(api::vehicles))
        .route("/api/vehicles/{id}/data", get(api::vehicle_data))
        .route("/api/vehicles/{id}/charge", get(api::charge_state))
        .route("/api/vehicles/{id}/location", get(api::location))
        .route("/api/vehicles/{id}/wake", post(api::wake))
        .route("/api/vehicles/{id}/charge/start", post(api::charge_start))
        .route("/api/vehicles/{id}/charge/stop", post(api::charge_stop))
        .route("/api/vehicles/{id}/charge/limit", post(api::set_charge_limit))
        .fallback(not_found)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "fleet-gateway",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(serde_json::json!({ "error": "not_found" })))
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c().await.expect("failed to install CTRL+C handler");
    tracing::info!("received shutdown signal");
}
