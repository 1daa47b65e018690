//! Authentication handlers and the request-time gate.
//!
//! The gate ([`CurrentSession`]) resolves the `session_id` cookie to a live
//! session and attaches it to the handler. A missing or dead session yields
//! 401; a stale cookie is cleared in the same response. Once attached, the
//! session is treated as valid for the whole request, with no mid-flight
//! recheck.

use std::ops::Deref;

use axum::extract::{FromRequestParts, Query, State};
use axum::http::request::Parts;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use serde::Deserialize;

use crate::auth::{CallbackParams, Session};
use crate::config::{api, lifetimes};
use crate::error::ApiError;
use crate::server::AppState;

/// Session credential cookie.
pub const SESSION_COOKIE: &str = "session_id";
/// CSRF correlation cookie, set for the browser leg of the flow.
pub const STATE_COOKIE: &str = "oauth_state";
/// PKCE verifier cookie, set for the browser leg of the flow.
pub const VERIFIER_COOKIE: &str = "code_verifier";

/// The live session attached to an authenticated request.
#[derive(Debug, Clone)]
pub struct CurrentSession(pub Session);

impl Deref for CurrentSession {
    type Target = Session;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromRequestParts<AppState> for CurrentSession {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);

        let Some(cookie) = jar.get(SESSION_COOKIE) else {
            return Err(AuthRejection { clear_stale_cookie: false });
        };

        // A lazily-expired session is deleted by the store and lands here
        // exactly like an unknown id.
        match state.sessions.get(cookie.value()).await {
            Some(session) => Ok(Self(session)),
            None => Err(AuthRejection { clear_stale_cookie: true }),
        }
    }
}

/// Rejection from the authentication gate.
///
/// Always a 401; additionally clears the credential carrier when the
/// request presented a cookie that no longer resolves to a session.
#[derive(Debug)]
pub struct AuthRejection {
    clear_stale_cookie: bool,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let response = ApiError::Unauthenticated.into_response();
        if self.clear_stale_cookie {
            let jar = CookieJar::new().remove(removal_cookie(SESSION_COOKIE));
            (jar, response).into_response()
        } else {
            response
        }
    }
}

/// `GET /auth/login`
///
/// Begin the OAuth redirect.
pub async fn login(State(state): State<AppState>, jar: CookieJar) -> (CookieJar, Redirect) {
    let redirect = state.flow.begin_login(api::SCOPES).await;

    let jar = jar
        .add(correlation_cookie(STATE_COOKIE, redirect.state.clone()))
        .add(correlation_cookie(VERIFIER_COOKIE, redirect.code_verifier.clone()));

    (jar, Redirect::to(&redirect.authorization_url))
}

/// Callback query parameters as sent by the provider.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// `GET /auth/callback`
///
/// Consume the provider callback.
///
/// The correlation cookies are cleared on every outcome; the session
/// cookie is only set when the full login sequence succeeded.
pub async fn callback(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<CallbackQuery>,
) -> Result<(CookieJar, Redirect), (CookieJar, ApiError)> {
    let jar = jar
        .remove(removal_cookie(STATE_COOKIE))
        .remove(removal_cookie(VERIFIER_COOKIE));

    let params = CallbackParams {
        code: query.code,
        state: query.state,
        error: query.error,
        error_description: query.error_description,
    };

    match state.flow.complete_login(params).await {
        Ok(session_id) => {
            let jar = jar.add(session_cookie(session_id));
            Ok((jar, Redirect::to("/dashboard")))
        }
        Err(err) => Err((jar, err)),
    }
}

/// `GET /logout`
///
/// Delete the session and clear the credential.
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> (CookieJar, Redirect) {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        state.flow.logout(cookie.value()).await;
    }

    (jar.remove(removal_cookie(SESSION_COOKIE)), Redirect::to("/"))
}

/// Short-lived HTTP-only carrier for the browser leg of the OAuth flow.
fn correlation_cookie(name: &'static str, value: String) -> Cookie<'static> {
    Cookie::build((name, value))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(time::Duration::try_from(lifetimes::CORRELATION_TTL).expect("fits in range"))
        .build()
}

/// Long-lived HTTP-only session credential.
fn session_cookie(session_id: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, session_id))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(
            time::Duration::try_from(lifetimes::SESSION_COOKIE_MAX_AGE).expect("fits in range"),
        )
        .build()
}

/// Removal cookie matching the attributes the carrier was set with.
fn removal_cookie(name: &'static str) -> Cookie<'static> {
    Cookie::build((name, "")).path("/").build()
}
