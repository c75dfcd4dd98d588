//! HTTP API: map listing/detail, join, players/state snapshots, action and
//! tick endpoints. Every mutating/reading call is dispatched onto the
//! `Lane` so the `Game` stays the sole source of truth.

use crate::config::FrontendData;
use crate::engine::dog::Direction;
use crate::engine::map::Road;
use crate::error::ClientError;
use crate::lane::Lane;
use crate::metrics;
use crate::rng::RandomSource;
use crate::static_files;
use axum::{
    extract::{FromRequest, FromRequestParts, Path, State},
    http::{header, request::Parts, HeaderValue, Request, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

/// `Json` whose rejection is the spec's `{"code":"invalidArgument", …}`
/// envelope instead of axum's plaintext 400/415 body — malformed JSON and
/// a missing/wrong `Content-Type` both count as a bad request body.
struct AppJson<T>(T);

impl<S, T> FromRequest<S> for AppJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ClientError;

    async fn from_request(req: Request<axum::body::Body>, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ClientError::InvalidArgument(rejection.to_string()))?;
        Ok(AppJson(value))
    }
}

#[derive(Clone)]
pub struct AppState {
    pub lane: Lane,
    pub rng: Arc<dyn RandomSource>,
    pub www_root: PathBuf,
    pub frontend_data: Arc<FrontendData>,
    pub tick_endpoint_enabled: bool,
}

/// Method-not-allowed fallback for routes that only accept GET/HEAD: the
/// spec requires the `{"code":"invalidMethod", …}` envelope and `Allow`
/// header on every API route, not axum's default empty-bodied 405.
async fn method_not_allowed_get_head() -> ClientError {
    ClientError::InvalidMethod { allow: "GET, HEAD" }
}

/// Same, for routes that only accept POST.
async fn method_not_allowed_post() -> ClientError {
    ClientError::InvalidMethod { allow: "POST" }
}

pub fn router(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics_handler))
        .route(
            "/api/v1/maps",
            get(list_maps).head(list_maps).fallback(method_not_allowed_get_head),
        )
        .route(
            "/api/v1/maps/{id}",
            get(get_map).head(get_map).fallback(method_not_allowed_get_head),
        )
        .route("/api/v1/game/join", post(join).fallback(method_not_allowed_post))
        .route(
            "/api/v1/game/players",
            get(get_players).head(get_players).fallback(method_not_allowed_get_head),
        )
        .route(
            "/api/v1/game/state",
            get(get_state).head(get_state).fallback(method_not_allowed_get_head),
        )
        .route(
            "/api/v1/game/player/action",
            post(player_action).fallback(method_not_allowed_post),
        );

    if state.tick_endpoint_enabled {
        router = router.route("/api/v1/game/tick", post(tick).fallback(method_not_allowed_post));
    }

    router
        .fallback(static_file_fallback)
        .layer(middleware::from_fn(request_logging))
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "service": "strayfinder-backend" }))
}

async fn metrics_handler() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        metrics::gather_metrics(),
    )
}

async fn request_logging(req: Request<axum::body::Body>, next: Next) -> Response {
    let method = req.method().clone();
    let uri = req.uri().clone();
    tracing::info!(event = "request received", method = %method, uri = %uri);

    let start = Instant::now();
    let response = next.run(req).await;
    let elapsed = start.elapsed();

    let path = metrics::normalize_path(uri.path());
    let status = response.status().as_u16().to_string();
    metrics::API_REQUESTS_TOTAL
        .with_label_values(&[method.as_str(), &path, &status])
        .inc();
    metrics::API_REQUEST_DURATION_SECONDS
        .with_label_values(&[&path])
        .observe(elapsed.as_secs_f64());

    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();
    tracing::info!(
        event = "response sent",
        response_time_ms = elapsed.as_secs_f64() * 1000.0,
        code = response.status().as_u16(),
        content_type = %content_type,
    );

    response
}

async fn static_file_fallback(
    State(state): State<AppState>,
    req: Request<axum::body::Body>,
) -> Result<Response, ClientError> {
    let path = req.uri().path();
    if path.starts_with("/api/") {
        return Err(ClientError::BadRequest);
    }
    static_files::serve(&state.www_root, req.method(), path).await
}

// ── No-cache JSON envelope ────────────────────────────────────────────

fn json_response(status: StatusCode, body: Value) -> Response {
    let mut response = (status, Json(body)).into_response();
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    response
}

// ── Auth extractor ────────────────────────────────────────────────────

pub struct AuthPlayer {
    pub id: u32,
    pub map_id: String,
}

impl<S> FromRequestParts<S> for AuthPlayer
where
    S: Send + Sync,
    AppState: axum::extract::FromRef<S>,
{
    type Rejection = ClientError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);

        let header_value = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(ClientError::InvalidToken)?;

        let token = header_value
            .strip_prefix("Bearer ")
            .ok_or(ClientError::InvalidToken)?;

        if token.len() != 32 || !token.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ClientError::InvalidToken);
        }

        let token = token.to_string();
        let found = app_state
            .lane
            .run(move |game| game.find_player(&token).map(|p| (p.id, p.map_id.clone())))
            .await;

        found
            .map(|(id, map_id)| AuthPlayer { id, map_id })
            .ok_or(ClientError::UnknownToken)
    }
}

// ── Maps ──────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct MapSummary {
    id: String,
    name: String,
}

async fn list_maps(State(state): State<AppState>) -> Response {
    let summaries: Vec<MapSummary> = state
        .lane
        .run(|game| {
            game.maps()
                .iter()
                .map(|m| MapSummary { id: m.id.clone(), name: m.name.clone() })
                .collect()
        })
        .await;
    json_response(StatusCode::OK, json!(summaries))
}

#[derive(Serialize)]
struct RoadDto {
    x0: i32,
    y0: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    x1: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    y1: Option<i32>,
}

impl From<Road> for RoadDto {
    fn from(road: Road) -> Self {
        if road.is_horizontal() {
            RoadDto { x0: road.start.x, y0: road.start.y, x1: Some(road.end.x), y1: None }
        } else {
            RoadDto { x0: road.start.x, y0: road.start.y, x1: None, y1: Some(road.end.y) }
        }
    }
}

struct MapDetail {
    id: String,
    name: String,
    dog_speed: f64,
    bag_capacity: u32,
    roads: Vec<RoadDto>,
    buildings: Vec<crate::engine::map::Building>,
    offices: Vec<crate::engine::map::Office>,
}

async fn get_map(State(state): State<AppState>, Path(id): Path<String>) -> Result<Response, ClientError> {
    let loot_types = state.frontend_data.get(&id).cloned().unwrap_or_else(|| json!([]));

    let detail = state
        .lane
        .run({
            let id = id.clone();
            move |game| {
                game.find_map(&id).map(|map| MapDetail {
                    id: map.id.clone(),
                    name: map.name.clone(),
                    dog_speed: map.dog_speed,
                    bag_capacity: map.bag_capacity,
                    roads: map.roads.iter().copied().map(RoadDto::from).collect(),
                    buildings: map.buildings.clone(),
                    offices: map.offices.clone(),
                })
            }
        })
        .await
        .ok_or(ClientError::MapNotFound)?;

    Ok(json_response(
        StatusCode::OK,
        json!({
            "id": detail.id,
            "name": detail.name,
            "dogSpeed": detail.dog_speed,
            "bagCapacity": detail.bag_capacity,
            "roads": detail.roads,
            "buildings": detail.buildings,
            "offices": detail.offices,
            "lootTypes": loot_types,
        }),
    ))
}

// ── Join ──────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct JoinRequest {
    #[serde(rename = "userName")]
    user_name: String,
    #[serde(rename = "mapId")]
    map_id: String,
}

async fn join(State(state): State<AppState>, AppJson(req): AppJson<JoinRequest>) -> Result<Response, ClientError> {
    if req.user_name.is_empty() {
        return Err(ClientError::InvalidArgument("userName must not be empty".into()));
    }

    let rng = state.rng.clone();
    let map_id = req.map_id.clone();
    let user_name = req.user_name.clone();
    let joined = state
        .lane
        .run(move |game| game.add_player(user_name, &map_id, rng.as_ref()))
        .await;

    let (token, player_id) = joined.ok_or_else(|| {
        metrics::JOIN_MAP_NOT_FOUND_TOTAL.with_label_values(&[&req.map_id]).inc();
        ClientError::MapNotFound
    })?;

    let (players, sessions) = state
        .lane
        .run(|game| (game.players().iter().count(), game.maps().iter().filter(|m| game.session(&m.id).is_some()).count()))
        .await;
    metrics::ACTIVE_PLAYERS.set(players as i64);
    metrics::ACTIVE_SESSIONS.set(sessions as i64);

    Ok(json_response(StatusCode::OK, json!({ "authToken": token, "playerId": player_id })))
}

// ── Players ───────────────────────────────────────────────────────────

async fn get_players(State(state): State<AppState>, auth: AuthPlayer) -> Response {
    let players: Vec<(u32, String)> = state
        .lane
        .run(move |game| {
            game.players()
                .iter()
                .filter(|p| p.map_id == auth.map_id)
                .map(|p| (p.id, p.name.clone()))
                .collect()
        })
        .await;

    let body: serde_json::Map<String, Value> = players
        .into_iter()
        .map(|(id, name)| (id.to_string(), json!({ "name": name })))
        .collect();

    json_response(StatusCode::OK, Value::Object(body))
}

// ── State ─────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct DogState {
    pos: (f64, f64),
    speed: (f64, f64),
    dir: &'static str,
    bag: Vec<BagItem>,
    score: u64,
}

#[derive(Serialize)]
struct BagItem {
    id: u64,
    #[serde(rename = "type")]
    loot_type: usize,
}

async fn get_state(State(state): State<AppState>, auth: AuthPlayer) -> Response {
    let snapshot = state
        .lane
        .run(move |game| {
            let session = game.session(&auth.map_id)?;
            let players: serde_json::Map<String, Value> = session
                .dogs()
                .iter()
                .map(|dog| {
                    let stopped = dog.is_stopped();
                    let state = DogState {
                        pos: (dog.position.x, dog.position.y),
                        speed: (dog.speed.horizontal, dog.speed.vertical),
                        dir: crate::engine::session::wire_direction_for(dog.direction, stopped),
                        bag: dog
                            .backpack()
                            .iter()
                            .map(|&(id, loot_type)| BagItem { id, loot_type })
                            .collect(),
                        score: dog.score,
                    };
                    (dog.id.to_string(), json!(state))
                })
                .collect();

            let lost_objects: serde_json::Map<String, Value> = session
                .lost_objects()
                .iter()
                .map(|(id, loot)| (id.to_string(), json!(loot)))
                .collect();

            Some(json!({ "players": players, "lostObjects": lost_objects }))
        })
        .await;

    match snapshot {
        Some(body) => json_response(StatusCode::OK, body),
        None => json_response(StatusCode::OK, json!({ "players": {}, "lostObjects": {} })),
    }
}

// ── Action ────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct ActionRequest {
    #[serde(rename = "move")]
    move_: String,
}

async fn player_action(
    State(state): State<AppState>,
    auth: AuthPlayer,
    AppJson(req): AppJson<ActionRequest>,
) -> Result<Response, ClientError> {
    let direction = Direction::from_move_str(&req.move_)
        .ok_or_else(|| ClientError::InvalidArgument("move must be one of L, R, U, D, \"\"".into()))?;

    let map_id = auth.map_id.clone();
    state
        .lane
        .run(move |game| {
            let Some(speed) = game.find_map(&map_id).map(|m| m.dog_speed) else {
                return;
            };
            if let Some(session) = game.session_mut(&map_id) {
                if let Some(dog) = session.dog_mut(auth.id) {
                    dog.set_movement(direction, speed);
                }
            }
        })
        .await;

    Ok(json_response(StatusCode::OK, json!({})))
}

// ── Tick ──────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct TickRequest {
    #[serde(rename = "timeDelta")]
    time_delta_ms: f64,
}

async fn tick(State(state): State<AppState>, AppJson(req): AppJson<TickRequest>) -> Result<Response, ClientError> {
    if req.time_delta_ms < 1e-6 {
        return Err(ClientError::InvalidArgument("timeDelta must be positive".into()));
    }

    let dt = req.time_delta_ms / 1000.0;
    let rng = state.rng.clone();
    let tick_start = std::time::Instant::now();
    state.lane.run(move |game| game.set_time_shift(dt, rng.as_ref())).await;
    metrics::TICK_DURATION_MS.observe(tick_start.elapsed().as_secs_f64() * 1000.0);

    Ok(json_response(StatusCode::OK, json!({})))
}
