//! Fleet Gateway
//!
//! An OAuth session and command gateway for the Tesla Fleet API. End users
//! authenticate against the Fleet identity provider via the
//! authorization-code flow (with PKCE); the gateway maintains per-user
//! sessions tied to provider tokens and forwards validated vehicle
//! commands upstream with the session's bearer token.
//!
//! # Features
//!
//! - **Authorization-code flow**: server-side consume-once correlation of
//!   `state` and PKCE verifier, 10-minute TTL
//! - **Sessions**: opaque cookie-held identifiers, lazy expiry, in-memory
//!   store behind a swappable contract
//! - **Command gateway**: vehicle data, charge and wake commands with
//!   local parameter validation before any upstream call
//!
//! # Example
//!
//! ```no_run
//! use fleet_gateway::{config::Config, server::Gateway};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     Gateway::new(&config)?.run().await
//! }
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod fleet;
pub mod server;

pub use config::Config;
pub use error::{ApiError, ClientError};
pub use fleet::FleetClient;
pub use server::Gateway;
