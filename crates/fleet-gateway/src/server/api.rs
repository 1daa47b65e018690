//! Command gateway handlers.
//!
//! Every operation runs behind the authentication gate, attaches the
//! session's bearer token, and forwards to the Fleet API. Command
//! parameters are validated against their domain bounds before any
//! upstream call; 2xx bodies pass through unmodified.

use axum::Json;
use axum::extract::{Path, Query, State};
use serde::Deserialize;
use serde_json::Value;

use crate::error::{ApiError, ApiResult};
use crate::server::AppState;
use crate::server::auth::CurrentSession;

/// Charge limit domain bounds: the remote hardware rejects limits below
/// 50 percent, so the gateway fails fast locally.
const CHARGE_LIMIT_MIN: i64 = 50;
const CHARGE_LIMIT_MAX: i64 = 100;

/// `GET /api/me`
///
/// Provider profile passthrough.
pub async fn me(State(state): State<AppState>, session: CurrentSession) -> ApiResult<Json<Value>> {
    Ok(Json(state.fleet.get_me(&session.access_token).await?))
}

/// `GET /api/vehicles`
///
/// Device list passthrough.
pub async fn vehicles(
    State(state): State<AppState>,
    session: CurrentSession,
) -> ApiResult<Json<Value>> {
    Ok(Json(state.fleet.list_vehicles(&session.access_token).await?))
}

/// Query parameters for the vehicle data endpoint.
#[derive(Debug, Deserialize)]
pub struct DataQuery {
    /// Comma-delimited data categories; absent means the full data set.
    pub endpoints: Option<String>,
}

/// `GET /api/vehicles/{id}/data`
///
/// Device data, optionally scoped.
pub async fn vehicle_data(
    State(state): State<AppState>,
    session: CurrentSession,
    Path(vehicle_id): Path<String>,
    Query(query): Query<DataQuery>,
) -> ApiResult<Json<Value>> {
    let endpoints: Option<Vec<String>> =
        query.endpoints.map(|raw| raw.split(',').map(str::to_string).collect());

    let data = state
        .fleet
        .vehicle_data(&session.access_token, &vehicle_id, endpoints.as_deref())
        .await?;
    Ok(Json(data))
}

/// `GET /api/vehicles/{id}/charge`
///
/// Charge-state view.
pub async fn charge_state(
    State(state): State<AppState>,
    session: CurrentSession,
    Path(vehicle_id): Path<String>,
) -> ApiResult<Json<Value>> {
    Ok(Json(state.fleet.charge_state(&session.access_token, &vehicle_id).await?))
}

/// `GET /api/vehicles/{id}/location`
///
/// Location view.
pub async fn location(
    State(state): State<AppState>,
    session: CurrentSession,
    Path(vehicle_id): Path<String>,
) -> ApiResult<Json<Value>> {
    Ok(Json(state.fleet.location(&session.access_token, &vehicle_id).await?))
}

/// `POST /api/vehicles/{id}/wake`
///
/// Wake command.
///
/// Waking is the caller's responsibility for vehicles observed as
/// `asleep`; no handler wakes on the caller's behalf.
pub async fn wake(
    State(state): State<AppState>,
    session: CurrentSession,
    Path(vehicle_id): Path<String>,
) -> ApiResult<Json<Value>> {
    tracing::info!(vehicle = %vehicle_id, "wake command");
    Ok(Json(state.fleet.wake(&session.access_token, &vehicle_id).await?))
}

/// `POST /api/vehicles/{id}/charge/start`
pub async fn charge_start(
    State(state): State<AppState>,
    session: CurrentSession,
    Path(vehicle_id): Path<String>,
) -> ApiResult<Json<Value>> {
    tracing::info!(vehicle = %vehicle_id, "start charging");
    Ok(Json(state.fleet.charge_start(&session.access_token, &vehicle_id).await?))
}

/// `POST /api/vehicles/{id}/charge/stop`
pub async fn charge_stop(
    State(state): State<AppState>,
    session: CurrentSession,
    Path(vehicle_id): Path<String>,
) -> ApiResult<Json<Value>> {
    tracing::info!(vehicle = %vehicle_id, "stop charging");
    Ok(Json(state.fleet.charge_stop(&session.access_token, &vehicle_id).await?))
}

/// Request body for the charge limit command.
#[derive(Debug, Deserialize)]
pub struct ChargeLimitRequest {
    pub percent: i64,
}

/// `POST /api/vehicles/{id}/charge/limit`
///
/// The requested percentage must satisfy `50 <= percent <= 100`; values
/// outside the bound never reach the remote API.
pub async fn set_charge_limit(
    State(state): State<AppState>,
    session: CurrentSession,
    Path(vehicle_id): Path<String>,
    Json(body): Json<ChargeLimitRequest>,
) -> ApiResult<Json<Value>> {
    validate_charge_limit(body.percent)?;

    tracing::info!(vehicle = %vehicle_id, percent = body.percent, "set charge limit");
    let result =
        state.fleet.set_charge_limit(&session.access_token, &vehicle_id, body.percent).await?;
    Ok(Json(result))
}

/// Check the charge limit against its domain bounds.
fn validate_charge_limit(percent: i64) -> ApiResult<()> {
    if !(CHARGE_LIMIT_MIN..=CHARGE_LIMIT_MAX).contains(&percent) {
        return Err(ApiError::invalid_parameter(format!(
            "charge limit must be between {CHARGE_LIMIT_MIN} and {CHARGE_LIMIT_MAX} percent, \
             got {percent}"
        )));
    }
    Ok(())
}
