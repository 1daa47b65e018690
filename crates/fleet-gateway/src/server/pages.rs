//! Human-facing HTML pages: landing and dashboard.
//!
//! All interpolated values are HTML-escaped.

use axum::extract::State;
use axum::response::Html;
use axum_extra::extract::CookieJar;
use serde_json::Value;

use crate::error::ApiResult;
use crate::server::AppState;
use crate::server::auth::{CurrentSession, SESSION_COOKIE};

/// `GET /`
///
/// Landing page with authentication status.
pub async fn landing(State(state): State<AppState>, jar: CookieJar) -> Html<String> {
    let authenticated = match jar.get(SESSION_COOKIE) {
        Some(cookie) => state.sessions.get(cookie.value()).await.is_some(),
        None => false,
    };

    Html(render_landing(authenticated))
}

/// `GET /dashboard`
///
/// Human-readable vehicle list.
pub async fn dashboard(
    State(state): State<AppState>,
    session: CurrentSession,
) -> ApiResult<Html<String>> {
    let vehicles = state.fleet.list_vehicles(&session.access_token).await?;
    Ok(Html(render_dashboard(&vehicles)))
}

fn render_landing(authenticated: bool) -> String {
    let auth_section = if authenticated {
        r#"<p>Connected</p>
<a href="/dashboard" class="button">Dashboard</a>
<a href="/api/vehicles" class="button">My Vehicles</a>
<a href="/logout" class="button danger">Disconnect</a>"#
    } else {
        r#"<p>Not connected</p>
<a href="/auth/login" class="button">Connect</a>"#
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width,initial-scale=1">
<title>Fleet Gateway</title>
<style>
body {{ font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, sans-serif; max-width: 800px; margin: 0 auto; padding: 20px; }}
.auth-section {{ background: #f5f5f5; padding: 20px; border-radius: 8px; margin-bottom: 20px; }}
.button {{ display: inline-block; padding: 10px 20px; background: #007bff; color: white; text-decoration: none; border-radius: 4px; margin: 5px; }}
.button:hover {{ background: #0056b3; }}
.danger {{ background: #dc3545; }}
.danger:hover {{ background: #c82333; }}
code {{ background: #f0f0f0; padding: 2px 4px; border-radius: 3px; }}
</style>
</head>
<body>
<h1>Fleet Gateway</h1>
<div class="auth-section">
<h2>Authentication Status</h2>
{auth_section}
</div>
<div>
<h2>API Endpoints</h2>
<ul>
<li><code>GET /api/me</code> - User profile</li>
<li><code>GET /api/vehicles</code> - List vehicles</li>
<li><code>GET /api/vehicles/{{id}}/data</code> - Vehicle data</li>
<li><code>GET /api/vehicles/{{id}}/charge</code> - Charge state</li>
<li><code>GET /api/vehicles/{{id}}/location</code> - Location</li>
<li><code>POST /api/vehicles/{{id}}/wake</code> - Wake vehicle</li>
<li><code>POST /api/vehicles/{{id}}/charge/start</code> - Start charging</li>
<li><code>POST /api/vehicles/{{id}}/charge/stop</code> - Stop charging</li>
<li><code>POST /api/vehicles/{{id}}/charge/limit</code> - Set charge limit</li>
</ul>
</div>
</body>
</html>"#
    )
}

fn render_dashboard(vehicles: &Value) -> String {
    let body = vehicles.get("response").and_then(Value::as_array).map_or_else(
        || "<p>No vehicles found</p>".to_string(),
        |list| {
            if list.is_empty() {
                return "<p>No vehicles found</p>".to_string();
            }
            list.iter().map(render_vehicle_card).collect()
        },
    );

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width,initial-scale=1">
<title>Fleet Dashboard</title>
<style>
body {{ font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, sans-serif; max-width: 1200px; margin: 0 auto; padding: 20px; }}
.vehicle-grid {{ display: grid; grid-template-columns: repeat(auto-fit, minmax(400px, 1fr)); gap: 20px; }}
.vehicle-card {{ background: white; border: 1px solid #ddd; border-radius: 8px; padding: 20px; box-shadow: 0 2px 4px rgba(0,0,0,0.1); }}
.button {{ display: inline-block; padding: 8px 16px; background: #007bff; color: white; text-decoration: none; border-radius: 4px; margin: 5px; font-size: 14px; }}
.button:hover {{ background: #0056b3; }}
.status {{ padding: 4px 8px; border-radius: 4px; font-size: 12px; font-weight: bold; }}
.online {{ background: #28a745; color: white; }}
.offline {{ background: #6c757d; color: white; }}
.asleep {{ background: #ffc107; color: black; }}
</style>
</head>
<body>
<h1>Your Vehicles</h1>
<div class="vehicle-grid">
{body}
</div>
<br>
<a href="/">&larr; Back to Home</a>
</body>
</html>"#
    )
}

fn render_vehicle_card(vehicle: &Value) -> String {
    let id = field(vehicle, "id");
    let name = field(vehicle, "display_name");
    let vin = field(vehicle, "vin");
    let vehicle_state = field(vehicle, "state");

    // A sleeping vehicle gets a wake shortcut; waking before data requests
    // is the caller's responsibility.
    let wake_link = if vehicle_state == "asleep" {
        format!(r#"<a href="/api/vehicles/{id}/wake" class="button">Wake Up</a>"#)
    } else {
        String::new()
    };

    format!(
        r#"<div class="vehicle-card">
<h3>{name}</h3>
<p><strong>VIN:</strong> {vin}</p>
<p><strong>Status:</strong> <span class="status {vehicle_state}">{vehicle_state}</span></p>
<div>
<a href="/api/vehicles/{id}/data" class="button">View Data</a>
<a href="/api/vehicles/{id}/charge" class="button">Charge State</a>
{wake_link}
</div>
</div>"#
    )
}

/// Fetch a field as an escaped string, tolerating numbers and absence.
fn field(value: &Value, key: &str) -> String {
    match value.get(key) {
        Some(Value::String(s)) => html_escape(s),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

/// Escape HTML special characters.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}
