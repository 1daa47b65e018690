//! Integration tests for the command gateway.
//!
//! Each test authenticates through the real OAuth flow against a wiremock
//! provider, then exercises a protected route and asserts on what was
//! forwarded upstream.

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use serde_json::json;
use tower::ServiceExt;
use wiremock::matchers::{body_json, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

use fleet_gateway::config::Config;
use fleet_gateway::server::Gateway;

/// Stand up a gateway against the mock server and complete a login,
/// returning the session cookie to present on protected requests.
async fn authenticate(mock_server: &MockServer) -> (Gateway, String) {
    Mock::given(method("POST"))
        .and(path("/oauth2/v3/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "fleet-token-1",
            "expires_in": 3600
        })))
        .mount(mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/1/users/me"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"response": {"id": "u1"}})),
        )
        .mount(mock_server)
        .await;

    let config = Config::for_testing(&mock_server.uri());
    let gateway = Gateway::new(&config).unwrap();

    let login = gateway
        .router()
        .oneshot(Request::get("/auth/login").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let location = login.headers().get(header::LOCATION).unwrap().to_str().unwrap();
    let url = url::Url::parse(location).unwrap();
    let state = url
        .query_pairs()
        .find(|(k, _)| k == "state")
        .map(|(_, v)| v.into_owned())
        .expect("state param");

    let callback = gateway
        .router()
        .oneshot(
            Request::get(format!("/auth/callback?code=abc&state={state}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(callback.status(), StatusCode::SEE_OTHER);

    let session_cookie = callback
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap())
        .find(|c| c.starts_with("session_id=") && !c.starts_with("session_id=;"))
        .expect("session cookie set")
        .split(';')
        .next()
        .unwrap()
        .to_string();

    (gateway, session_cookie)
}

async fn body_json_of(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// ─── Passthrough reads ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_vehicle_list_passes_upstream_body_through() {
    let mock_server = MockServer::start().await;
    let (gateway, cookie) = authenticate(&mock_server).await;

    let upstream_body = json!({
        "response": [{"id": 42, "display_name": "Roadster", "state": "online"}],
        "count": 1
    });
    Mock::given(method("GET"))
        .and(path("/api/1/vehicles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(upstream_body.clone()))
        .mount(&mock_server)
        .await;

    let response = gateway
        .router()
        .oneshot(
            Request::get("/api/vehicles").header(header::COOKIE, &cookie).body(Body::empty()).unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json_of(response).await, upstream_body);
}

#[tokio::test]
async fn test_profile_passthrough_uses_session_bearer_token() {
    let mock_server = MockServer::start().await;
    let (gateway, cookie) = authenticate(&mock_server).await;

    let response = gateway
        .router()
        .oneshot(Request::get("/api/me").header(header::COOKIE, &cookie).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Every /users/me call carried the session's bearer token.
    let requests = mock_server.received_requests().await.unwrap();
    let me_calls: Vec<_> =
        requests.iter().filter(|r| r.url.path() == "/api/1/users/me").collect();
    assert!(!me_calls.is_empty());
    for call in me_calls {
        assert_eq!(
            call.headers.get("authorization").map(|v| v.to_str().unwrap()),
            Some("Bearer fleet-token-1")
        );
    }
}

#[tokio::test]
async fn test_vehicle_data_forwards_endpoint_filter() {
    let mock_server = MockServer::start().await;
    let (gateway, cookie) = authenticate(&mock_server).await;

    let upstream_body = json!({"response": {"charge_state": {"battery_level": 71}}});
    Mock::given(method("GET"))
        .and(path("/api/1/vehicles/42/vehicle_data"))
        .and(query_param("endpoints", "charge_state;drive_state"))
        .respond_with(ResponseTemplate::new(200).set_body_json(upstream_body.clone()))
        .mount(&mock_server)
        .await;

    let response = gateway
        .router()
        .oneshot(
            Request::get("/api/vehicles/42/data?endpoints=charge_state,drive_state")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    // The comma-delimited inbound filter went upstream semicolon-joined,
    // and the 2xx body came back unmodified.
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json_of(response).await, upstream_body);
}

#[tokio::test]
async fn test_vehicle_data_without_filter_requests_full_set() {
    let mock_server = MockServer::start().await;
    let (gateway, cookie) = authenticate(&mock_server).await;

    Mock::given(method("GET"))
        .and(path("/api/1/vehicles/42/vehicle_data"))
        .and(query_param_is_missing("endpoints"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"response": {}})))
        .mount(&mock_server)
        .await;

    let response = gateway
        .router()
        .oneshot(
            Request::get("/api/vehicles/42/data")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_charge_view_is_a_filtered_data_request() {
    let mock_server = MockServer::start().await;
    let (gateway, cookie) = authenticate(&mock_server).await;

    Mock::given(method("GET"))
        .and(path("/api/1/vehicles/42/vehicle_data"))
        .and(query_param("endpoints", "charge_state"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": {"charge_state": {"battery_level": 54, "charge_limit_soc": 80}}
        })))
        .mount(&mock_server)
        .await;

    let response = gateway
        .router()
        .oneshot(
            Request::get("/api/vehicles/42/charge")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json_of(response).await;
    assert_eq!(body["response"]["charge_state"]["battery_level"], 54);
}

#[tokio::test]
async fn test_location_view_requests_location_data() {
    let mock_server = MockServer::start().await;
    let (gateway, cookie) = authenticate(&mock_server).await;

    Mock::given(method("GET"))
        .and(path("/api/1/vehicles/42/vehicle_data"))
        .and(query_param("endpoints", "location_data"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": {"drive_state": {"latitude": 37.4, "longitude": -122.1}}
        })))
        .mount(&mock_server)
        .await;

    let response = gateway
        .router()
        .oneshot(
            Request::get("/api/vehicles/42/location")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

// ─── Commands ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_wake_command_posts_upstream() {
    let mock_server = MockServer::start().await;
    let (gateway, cookie) = authenticate(&mock_server).await;

    Mock::given(method("POST"))
        .and(path("/api/1/vehicles/42/wake_up"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": {"id": 42, "state": "online"}
        })))
        .mount(&mock_server)
        .await;

    let response = gateway
        .router()
        .oneshot(
            Request::post("/api/vehicles/42/wake")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json_of(response).await["response"]["state"], "online");
}

#[tokio::test]
async fn test_charge_start_and_stop_hit_command_endpoints() {
    let mock_server = MockServer::start().await;
    let (gateway, cookie) = authenticate(&mock_server).await;

    for command in ["charge_start", "charge_stop"] {
        Mock::given(method("POST"))
            .and(path(format!("/api/1/vehicles/42/command/{command}")))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"response": {"result": true}})),
            )
            .mount(&mock_server)
            .await;
    }

    for route in ["/api/vehicles/42/charge/start", "/api/vehicles/42/charge/stop"] {
        let response = gateway
            .router()
            .oneshot(
                Request::post(route).header(header::COOKIE, &cookie).body(Body::empty()).unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}

#[tokio::test]
async fn test_charge_limit_bounds_are_enforced_locally() {
    let mock_server = MockServer::start().await;
    let (gateway, cookie) = authenticate(&mock_server).await;

    // No mock is mounted for set_charge_limit: out-of-bounds requests must
    // never produce an upstream call.
    for percent in [49, 101] {
        let response = gateway
            .router()
            .oneshot(
                Request::post("/api/vehicles/42/charge/limit")
                    .header(header::COOKIE, &cookie)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(json!({"percent": percent}).to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json_of(response).await;
        assert_eq!(body["error"], "invalid_parameter");
        assert!(body["message"].as_str().unwrap().contains("50"));
    }

    let upstream_calls = mock_server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.url.path().contains("set_charge_limit"))
        .count();
    assert_eq!(upstream_calls, 0);
}

#[tokio::test]
async fn test_charge_limit_boundary_values_are_forwarded() {
    let mock_server = MockServer::start().await;
    let (gateway, cookie) = authenticate(&mock_server).await;

    for percent in [50, 100] {
        Mock::given(method("POST"))
            .and(path("/api/1/vehicles/42/command/set_charge_limit"))
            .and(body_json(json!({"percent": percent})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "response": {"result": true, "charge_limit_soc": percent}
            })))
            .mount(&mock_server)
            .await;

        let response = gateway
            .router()
            .oneshot(
                Request::post("/api/vehicles/42/charge/limit")
                    .header(header::COOKIE, &cookie)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(json!({"percent": percent}).to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json_of(response).await["response"]["charge_limit_soc"], percent);
    }
}

// ─── Upstream failure translation ────────────────────────────────────────────

#[tokio::test]
async fn test_upstream_error_surfaces_with_remote_status() {
    let mock_server = MockServer::start().await;
    let (gateway, cookie) = authenticate(&mock_server).await;

    Mock::given(method("GET"))
        .and(path("/api/1/vehicles"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .mount(&mock_server)
        .await;

    let response = gateway
        .router()
        .oneshot(
            Request::get("/api/vehicles").header(header::COOKIE, &cookie).body(Body::empty()).unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = body_json_of(response).await;
    assert_eq!(body["error"], "upstream_failure");
    assert_eq!(body["upstream_status"], 500);
}

#[tokio::test]
async fn test_vehicle_asleep_response_passes_through_as_error() {
    let mock_server = MockServer::start().await;
    let (gateway, cookie) = authenticate(&mock_server).await;

    // The Fleet API answers 408 for a sleeping vehicle; the gateway does
    // not auto-wake, it surfaces the failure for the caller to handle.
    Mock::given(method("GET"))
        .and(path("/api/1/vehicles/42/vehicle_data"))
        .respond_with(ResponseTemplate::new(408).set_body_string("vehicle unavailable"))
        .mount(&mock_server)
        .await;

    let response = gateway
        .router()
        .oneshot(
            Request::get("/api/vehicles/42/data")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(body_json_of(response).await["upstream_status"], 408);
}

// ─── Gate ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_protected_routes_require_a_session() {
    let mock_server = MockServer::start().await;
    let config = Config::for_testing(&mock_server.uri());
    let gateway = Gateway::new(&config).unwrap();

    for (verb, route) in [
        ("GET", "/api/me"),
        ("GET", "/api/vehicles"),
        ("GET", "/api/vehicles/42/data"),
        ("GET", "/api/vehicles/42/charge"),
        ("GET", "/api/vehicles/42/location"),
        ("GET", "/dashboard"),
        ("POST", "/api/vehicles/42/wake"),
        ("POST", "/api/vehicles/42/charge/start"),
        ("POST", "/api/vehicles/42/charge/stop"),
    ] {
        let request =
            Request::builder().method(verb).uri(route).body(Body::empty()).unwrap();
        let response = gateway.router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "route {route}");
    }
}
