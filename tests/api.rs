//! Integration tests for the HTTP surface: drives `api::router` directly
//! via `tower::ServiceExt::oneshot`, without a bound socket.
//!
//! Bag pickup and deposit (scenarios 5 and 6) are exercised at the unit
//! level instead, in `engine::session`'s own tests — they need to place
//! loot at an exact position, which the public HTTP surface intentionally
//! has no way to do (loot placement is the generator's job, not a client
//! request).

use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use serde_json::{json, Value};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

use strayfinder_backend::api::{self, AppState};
use strayfinder_backend::config::FrontendData;
use strayfinder_backend::engine::game::{Game, LootGeneratorConfig};
use strayfinder_backend::engine::map::{LootType, Map, Point, Road};
use strayfinder_backend::lane::Lane;
use strayfinder_backend::rng::{RandomSource, ThreadRandomSource};

fn test_map() -> Map {
    let mut map = Map::new(
        "map1".into(),
        "First Map".into(),
        2.0,
        3,
        vec![LootType { value: 10 }],
    );
    map.add_road(Road::horizontal(Point { x: 0, y: 0 }, 10));
    map
}

fn scratch_www_root() -> PathBuf {
    let root = std::env::temp_dir().join(format!("strayfinder-api-test-{}", std::process::id()));
    let _ = std::fs::create_dir_all(&root);
    let mut index = std::fs::File::create(root.join("index.html")).unwrap();
    index.write_all(b"<html>ok</html>").unwrap();
    root
}

fn build_app(tick_endpoint_enabled: bool) -> axum::Router {
    let mut game = Game::new(LootGeneratorConfig {
        period: Duration::from_secs(3600),
        probability: 0.0,
    });
    game.add_map(test_map()).unwrap();

    let rng: Arc<dyn RandomSource> = Arc::new(ThreadRandomSource);
    let lane = Lane::spawn(game, rng.clone());

    let state = AppState {
        lane,
        rng,
        www_root: scratch_www_root(),
        frontend_data: Arc::new(FrontendData::new()),
        tick_endpoint_enabled,
    };
    api::router(state)
}

fn json_request(method: Method, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri).header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(Method::GET).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn join(app: &axum::Router, user_name: &str, map_id: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/game/join",
            None,
            json!({ "userName": user_name, "mapId": map_id }),
        ))
        .await
        .unwrap();
    let status = response.status();
    (status, body_json(response).await)
}

#[tokio::test]
async fn join_returns_token_and_player_id() {
    let app = build_app(true);
    let (status, body) = join(&app, "Scooby", "map1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["authToken"].as_str().unwrap().len(), 32);
    assert_eq!(body["playerId"], 0);
}

#[tokio::test]
async fn join_unknown_map_is_404_map_not_found() {
    let app = build_app(true);
    let (status, body) = join(&app, "A", "nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "mapNotFound");
}

#[tokio::test]
async fn join_empty_username_is_400_invalid_argument() {
    let app = build_app(true);
    let (status, body) = join(&app, "", "map1").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalidArgument");
}

#[tokio::test]
async fn action_then_tick_moves_dog() {
    let app = build_app(true);
    let (_, join_body) = join(&app, "Scooby", "map1").await;
    let token = join_body["authToken"].as_str().unwrap().to_string();

    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/game/player/action",
            Some(&token),
            json!({ "move": "R" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/game/tick",
            None,
            json!({ "timeDelta": 1000.0 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.clone().oneshot(get_request("/api/v1/game/state", Some(&token))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let state = body_json(response).await;
    let dog = &state["players"]["0"];
    assert!((dog["pos"][0].as_f64().unwrap() - 2.0).abs() < 1e-6);
    assert_eq!(dog["dir"], "R");
}

#[tokio::test]
async fn stop_preserves_direction() {
    let app = build_app(true);
    let (_, join_body) = join(&app, "Scooby", "map1").await;
    let token = join_body["authToken"].as_str().unwrap().to_string();

    app.clone()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/game/player/action",
            Some(&token),
            json!({ "move": "R" }),
        ))
        .await
        .unwrap();
    app.clone()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/game/player/action",
            Some(&token),
            json!({ "move": "" }),
        ))
        .await
        .unwrap();

    let response = app.clone().oneshot(get_request("/api/v1/game/state", Some(&token))).await.unwrap();
    let state = body_json(response).await;
    let dog = &state["players"]["0"];
    assert_eq!(dog["dir"], "R");
    assert_eq!(dog["speed"][0], 0.0);
    assert_eq!(dog["speed"][1], 0.0);
}

#[tokio::test]
async fn tick_rejects_non_positive_time_delta() {
    let app = build_app(true);
    let response = app
        .clone()
        .oneshot(json_request(Method::POST, "/api/v1/game/tick", None, json!({ "timeDelta": 0.0 })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["code"], "invalidArgument");
}

#[tokio::test]
async fn tick_endpoint_absent_when_internal_ticker_owns_time() {
    let app = build_app(false);
    let response = app
        .clone()
        .oneshot(json_request(Method::POST, "/api/v1/game/tick", None, json!({ "timeDelta": 100.0 })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn missing_auth_header_is_401_invalid_token() {
    let app = build_app(true);
    let response = app.clone().oneshot(get_request("/api/v1/game/state", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["code"], "invalidToken");
}

#[tokio::test]
async fn malformed_token_is_401_invalid_token() {
    let app = build_app(true);
    let response = app.clone().oneshot(get_request("/api/v1/game/state", Some("too-short"))).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["code"], "invalidToken");
}

#[tokio::test]
async fn well_formed_unknown_token_is_401_unknown_token() {
    let app = build_app(true);
    let fake_token = "a".repeat(32);
    let response = app.clone().oneshot(get_request("/api/v1/game/state", Some(&fake_token))).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["code"], "unknownToken");
}

#[tokio::test]
async fn get_unknown_map_is_404() {
    let app = build_app(true);
    let response = app.clone().oneshot(get_request("/api/v1/maps/nope", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_maps_returns_summaries() {
    let app = build_app(true);
    let response = app.clone().oneshot(get_request("/api/v1/maps", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body[0]["id"], "map1");
    assert_eq!(body[0]["name"], "First Map");
}

#[tokio::test]
async fn health_endpoint_reports_ok() {
    let app = build_app(true);
    let response = app.clone().oneshot(get_request("/health", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn static_file_served_with_content_type() {
    let app = build_app(true);
    let response = app.clone().oneshot(get_request("/index.html", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get("content-type").unwrap(), "text/html");
}

#[tokio::test]
async fn static_path_traversal_is_rejected() {
    let app = build_app(true);
    let response = app.clone().oneshot(get_request("/../../../etc/passwd", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_api_route_is_400_bad_request() {
    let app = build_app(true);
    let response = app.clone().oneshot(get_request("/api/v1/nonexistent", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn wrong_method_on_api_route_is_405_invalid_method_envelope() {
    let app = build_app(true);
    let response = app.clone().oneshot(get_request("/api/v1/game/join", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(response.headers().get("allow").unwrap(), "POST");
    let body = body_json(response).await;
    assert_eq!(body["code"], "invalidMethod");
}

#[tokio::test]
async fn post_on_get_only_route_is_405_invalid_method_envelope() {
    let app = build_app(true);
    let response = app
        .clone()
        .oneshot(json_request(Method::POST, "/api/v1/maps", None, json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(response.headers().get("allow").unwrap(), "GET, HEAD");
    let body = body_json(response).await;
    assert_eq!(body["code"], "invalidMethod");
}

#[tokio::test]
async fn malformed_json_body_is_400_invalid_argument_envelope() {
    let app = build_app(true);
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/game/join")
        .header("content-type", "application/json")
        .body(Body::from("{ not json"))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["code"], "invalidArgument");
}

#[tokio::test]
async fn missing_content_type_on_join_is_400_invalid_argument_envelope() {
    let app = build_app(true);
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/game/join")
        .body(Body::from(json!({ "userName": "Scooby", "mapId": "map1" }).to_string()))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["code"], "invalidArgument");
}
