//! Authentication subsystem.
//!
//! The OAuth authorization-code flow (with PKCE), the correlation store
//! for in-flight login attempts, and the session store keyed by opaque
//! client-held identifiers.

pub mod correlation;
pub mod flow;
pub mod pkce;
pub mod session;

pub use correlation::CorrelationStore;
pub use flow::{AuthFlow, CallbackParams, LoginRedirect};
pub use session::{InMemorySessionStore, Session, SessionStore};
