//! # REST + WebSocket API
//!
//! Builds the axum router that exposes the booking node's HTTP interface.
//! All endpoints share application state through axum's `State` extractor.
//!
//! ## Endpoints
//!
//! | Method | Path                     | Description                        |
//! |--------|--------------------------|------------------------------------|
//! | GET    | `/health`                | Liveness probe                     |
//! | GET    | `/status`                | Node status summary                |
//! | POST   | `/rpc`                   | JSON-RPC 2.0 gateway               |
//! | GET    | `/ws`                    | WebSocket for live booking events  |
//! | GET    | `/renters/:address`      | Renter record by address           |
//! | GET    | `/cars/:address`         | Car record by address              |
//! | GET    | `/bookings/:renter/:car` | Live booking for a renter/car pair |
//!
//! The `/rpc` gateway is the only mutating surface; the REST routes are
//! read-only views over the same engine.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    http::{Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use dpace_booking::engine::BookingEngine;
use dpace_booking::error::BookingError;
use dpace_booking::escalation;
use dpace_booking::events::BookingEvent;
use dpace_protocol::config::PROTOCOL_FINGERPRINT;
use dpace_protocol::identity::PartyId;
use dpace_protocol::rpc::{
    CancelBookingParams, CarBookingParams, DeployCarParams, DeployRenterParams, ForceEndParams,
    OperationResponse, PartyStateParams, PartyStateResponse, RenterBookingParams, RpcError,
    RpcResponse, ValidateCarParams, VersionResponse,
};

use crate::metrics::{NodeMetrics, SharedMetrics};

// ---------------------------------------------------------------------------
// Application State
// ---------------------------------------------------------------------------

/// Shared application state available to all request handlers.
///
/// Cheap to clone — everything behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// The node's reported version string.
    pub version: String,
    /// Network identifier (e.g., "devnet", "testnet", "mainnet").
    pub network: String,
    /// The booking engine. Lifecycle operations take the write half;
    /// queries take the read half.
    pub engine: Arc<RwLock<BookingEngine>>,
    /// Broadcast channel for live booking event notifications.
    pub event_tx: broadcast::Sender<BookingEvent>,
    /// Reference to Prometheus metrics for in-handler recording.
    pub metrics: SharedMetrics,
}

// ---------------------------------------------------------------------------
// Router Construction
// ---------------------------------------------------------------------------

/// Builds the full axum [`Router`] with all API routes, CORS, and tracing.
///
/// The returned router is ready to be served on the configured RPC port.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/status", get(status_handler))
        .route("/rpc", post(rpc_handler))
        .route("/ws", get(ws_handler))
        .route("/renters/:address", get(renter_handler))
        .route("/cars/:address", get(car_handler))
        .route("/bookings/:renter/:car", get(booking_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// JSON-RPC Envelope
// ---------------------------------------------------------------------------

/// A JSON-RPC 2.0 request envelope as the node accepts it.
///
/// The method stays a plain string here so unknown methods can be answered
/// with error -32601 instead of failing body extraction. Once the method is
/// recognized, the typed parameter structs in [`dpace_protocol::rpc`] take
/// over and a malformed payload becomes -32602.
#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    /// Protocol version. Must be "2.0".
    pub jsonrpc: String,
    /// The method to invoke.
    pub method: String,
    /// Method parameters.
    #[serde(default)]
    pub params: serde_json::Value,
    /// Request identifier. Echoed back in the response.
    pub id: serde_json::Value,
}

// ---------------------------------------------------------------------------
// Response Types
// ---------------------------------------------------------------------------

/// Response payload for `GET /status`.
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Node software version.
    pub version: String,
    /// Network identifier.
    pub network: String,
    /// Number of registered renters.
    pub renters: u64,
    /// Number of registered cars.
    pub cars: u64,
    /// Number of live bookings.
    pub active_bookings: u64,
    /// Ledger time as the engine sees it (Unix seconds).
    pub ledger_time: i64,
    /// ISO-8601 timestamp of the response.
    pub timestamp: String,
}

/// Response payload for `GET /renters/:address`.
#[derive(Debug, Serialize, Deserialize)]
pub struct RenterResponse {
    /// Bech32 party address.
    pub address: String,
    /// Display form of the renter's lifecycle state.
    pub state: String,
    /// Deposit held in escrow.
    pub deposited_value: u64,
}

/// Response payload for `GET /cars/:address`.
#[derive(Debug, Serialize, Deserialize)]
pub struct CarResponse {
    /// Bech32 party address.
    pub address: String,
    /// Display form of the car's lifecycle state.
    pub state: String,
    /// Listed price per time unit.
    pub price_per_unit: u64,
    /// Hex digest of the car's listing details.
    pub details_digest: String,
    /// Hex form of the published availability token, if any.
    pub current_token: Option<String>,
    /// Published pickup location, if any.
    pub current_location: Option<String>,
}

/// Response payload for `GET /bookings/:renter/:car`.
#[derive(Debug, Serialize, Deserialize)]
pub struct BookingResponse {
    /// Booking identifier.
    pub id: String,
    /// Renter address.
    pub renter: String,
    /// Car address.
    pub car: String,
    /// Hex form of the secret link binding the booking to the car's token.
    pub secret_link: String,
    /// Ledger time when the booking was opened.
    pub created_at: i64,
    /// Ledger time at which force-end becomes permitted.
    pub deadline: i64,
    /// Seconds until the escalation window opens; 0 once it has.
    pub remaining_secs: i64,
}

/// Generic error body returned by REST endpoints on failure.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// `GET /health` — returns 200 if the node is alive.
///
/// This is the liveness probe for orchestrators (k8s, systemd, etc.).
/// It intentionally does not inspect the engine — that belongs in `/status`.
async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

/// `GET /status` — returns node status summary.
async fn status_handler(State(state): State<AppState>) -> impl IntoResponse {
    let engine = state.engine.read().await;
    let resp = StatusResponse {
        version: state.version.clone(),
        network: state.network.clone(),
        renters: engine.renter_count() as u64,
        cars: engine.car_count() as u64,
        active_bookings: engine.booking_count() as u64,
        ledger_time: engine.now(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    };
    Json(resp)
}

/// `POST /rpc` — JSON-RPC 2.0 gateway.
///
/// Routes `dpace_*` method calls to the booking engine. Unknown methods
/// return error code -32601 (Method not found); engine rejections travel
/// as -32000 with the error kind in `data.kind`.
async fn rpc_handler(
    State(state): State<AppState>,
    Json(req): Json<JsonRpcRequest>,
) -> impl IntoResponse {
    state.metrics.rpc_requests_total.inc();

    if req.jsonrpc != "2.0" {
        return Json(RpcResponse::error(
            req.id,
            RpcError::invalid_request("jsonrpc must be \"2.0\""),
        ));
    }

    let timer = state.metrics.operation_latency_seconds.start_timer();
    let outcome = dispatch(&state, &req.method, req.params).await;
    timer.observe_duration();

    match outcome {
        Ok(result) => Json(RpcResponse::success(req.id, result)),
        Err(error) => Json(RpcResponse::error(req.id, error)),
    }
}

/// Routes one JSON-RPC method call to the engine.
///
/// Returns the `result` payload or a typed JSON-RPC error.
async fn dispatch(
    state: &AppState,
    method: &str,
    params: serde_json::Value,
) -> Result<serde_json::Value, RpcError> {
    match method {
        "dpace_deployRenter" => {
            let p: DeployRenterParams = parse_params(params)?;
            let mut engine = state.engine.write().await;
            let outcome = engine.deploy_renter(&p.renter, &p.credential, p.deposit);
            refresh_gauges(&state.metrics, &engine);
            drop(engine);
            finish_operation(state, outcome)
        }
        "dpace_deployCar" => {
            let p: DeployCarParams = parse_params(params)?;
            let mut engine = state.engine.write().await;
            let outcome =
                engine.deploy_car(&p.owner, p.details.as_bytes(), &p.credential, p.price_per_unit);
            refresh_gauges(&state.metrics, &engine);
            drop(engine);
            finish_operation(state, outcome)
        }
        "dpace_validateCar" => {
            let p: ValidateCarParams = parse_params(params)?;
            let mut engine = state.engine.write().await;
            let outcome = engine.validate_car(&p.car, p.token, &p.location);
            drop(engine);
            finish_operation(state, outcome)
        }
        "dpace_renterBooking" => {
            let p: RenterBookingParams = parse_params(params)?;
            let mut engine = state.engine.write().await;
            let outcome = engine.renter_booking(&p.renter, &p.car, p.secret_link, &p.authorization);
            if outcome.is_ok() {
                state.metrics.bookings_created_total.inc();
            }
            refresh_gauges(&state.metrics, &engine);
            drop(engine);
            finish_operation(state, outcome)
        }
        "dpace_carBooking" => {
            let p: CarBookingParams = parse_params(params)?;
            let mut engine = state.engine.write().await;
            let outcome = engine.car_booking(&p.car, &p.renter, &p.authorization);
            drop(engine);
            finish_operation(state, outcome)
        }
        "dpace_cancelBooking" => {
            let p: CancelBookingParams = parse_params(params)?;
            let mut engine = state.engine.write().await;
            let outcome = engine.cancel_booking(&p.caller, &p.authorization);
            if outcome.is_ok() {
                state.metrics.bookings_cancelled_total.inc();
            }
            refresh_gauges(&state.metrics, &engine);
            drop(engine);
            finish_operation(state, outcome)
        }
        "dpace_forceEnd" => {
            let p: ForceEndParams = parse_params(params)?;
            let mut engine = state.engine.write().await;
            let outcome = engine.force_end(&p.car, &p.renter, p.new_token, &p.new_location);
            if outcome.is_ok() {
                state.metrics.force_ends_total.inc();
            }
            refresh_gauges(&state.metrics, &engine);
            drop(engine);
            finish_operation(state, outcome)
        }
        "dpace_renterState" => {
            let p: PartyStateParams = parse_params(params)?;
            let engine = state.engine.read().await;
            match engine.renter_state(&p.address) {
                Some(s) => Ok(serde_json::to_value(PartyStateResponse {
                    address: p.address.to_address(),
                    state: s.to_string(),
                })
                .unwrap()),
                None => Err(RpcError::party_not_found(&p.address.to_address())),
            }
        }
        "dpace_carState" => {
            let p: PartyStateParams = parse_params(params)?;
            let engine = state.engine.read().await;
            match engine.car_state(&p.address) {
                Some(s) => Ok(serde_json::to_value(PartyStateResponse {
                    address: p.address.to_address(),
                    state: s.to_string(),
                })
                .unwrap()),
                None => Err(RpcError::party_not_found(&p.address.to_address())),
            }
        }
        "dpace_version" => Ok(serde_json::to_value(VersionResponse {
            version: state.version.clone(),
            protocol: PROTOCOL_FINGERPRINT.to_string(),
        })
        .unwrap()),
        _ => Err(RpcError::method_not_found(method)),
    }
}

/// Parses method parameters into their typed form.
fn parse_params<T: DeserializeOwned>(params: serde_json::Value) -> Result<T, RpcError> {
    serde_json::from_value(params).map_err(|e| RpcError::invalid_params(e.to_string()))
}

/// Folds an engine outcome into a JSON-RPC result.
///
/// Successful operations broadcast their events to WebSocket subscribers
/// and return an [`OperationResponse`]; rejections count against the
/// rejection metric and become `-32000` errors with the machine-readable
/// kind in `data.kind`.
fn finish_operation(
    state: &AppState,
    outcome: Result<Vec<BookingEvent>, BookingError>,
) -> Result<serde_json::Value, RpcError> {
    match outcome {
        Ok(events) => {
            let mut payloads = Vec::with_capacity(events.len());
            for event in events {
                payloads.push(serde_json::to_value(&event).unwrap());
                let _ = state.event_tx.send(event);
            }
            let resp = OperationResponse {
                status: "ok".to_string(),
                events: payloads,
            };
            Ok(serde_json::to_value(resp).unwrap())
        }
        Err(err) => {
            state.metrics.operations_rejected_total.inc();
            tracing::debug!("operation rejected: {}", err);
            Err(RpcError::operation_rejected(
                err.to_string(),
                error_kind(&err),
            ))
        }
    }
}

/// The machine-readable name carried in `data.kind` of rejection errors.
fn error_kind(err: &BookingError) -> &'static str {
    match err {
        BookingError::InvalidCredential => "InvalidCredential",
        BookingError::InsufficientDeposit { .. } => "InsufficientDeposit",
        BookingError::DuplicateRegistration { .. } => "DuplicateRegistration",
        BookingError::StateMismatch { .. } => "StateMismatch",
        BookingError::TokenMismatch => "TokenMismatch",
        BookingError::Unauthorized { .. } => "Unauthorized",
        BookingError::PrematureForceEnd { .. } => "PrematureForceEnd",
        BookingError::DuplicateCommitment { .. } => "DuplicateCommitment",
    }
}

/// Synchronizes the headline gauges with the engine's current counts.
pub fn refresh_gauges(metrics: &NodeMetrics, engine: &BookingEngine) {
    metrics.registered_renters.set(engine.renter_count() as i64);
    metrics.registered_cars.set(engine.car_count() as i64);
    metrics.active_bookings.set(engine.booking_count() as i64);
}

/// `GET /ws` — WebSocket upgrade for live event streaming.
///
/// Clients receive JSON-encoded [`BookingEvent`] messages as lifecycle
/// operations emit them. The connection is read-only from the server's
/// perspective; client messages are ignored.
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws_connection(socket, state))
}

/// Drives a single WebSocket connection, forwarding broadcast events
/// until the client disconnects or the channel is closed.
async fn handle_ws_connection(mut socket: WebSocket, state: AppState) {
    let mut rx = state.event_tx.subscribe();

    loop {
        tokio::select! {
            event = rx.recv() => {
                match event {
                    Ok(ev) => {
                        let payload = match serde_json::to_string(&ev) {
                            Ok(s) => s,
                            Err(e) => {
                                tracing::warn!("failed to serialize ws event: {}", e);
                                continue;
                            }
                        };
                        if socket.send(Message::Text(payload.into())).await.is_err() {
                            // Client disconnected.
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!("ws subscriber lagged by {} events", n);
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        break;
                    }
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(_)) => {
                        // Client messages are ignored — this is a push-only feed.
                    }
                    _ => break, // Disconnected or error.
                }
            }
        }
    }
}

/// `GET /renters/:address` — returns the renter record for the address.
///
/// Returns 400 for a malformed address and 404 for an address with no
/// registered renter.
async fn renter_handler(
    Path(address): Path<String>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let party = match PartyId::from_address(&address) {
        Ok(p) => p,
        Err(e) => return bad_address(&address, e).into_response(),
    };

    let engine = state.engine.read().await;
    match engine.renter(&party) {
        Some(record) => {
            let resp = RenterResponse {
                address,
                state: record.state.to_string(),
                deposited_value: record.deposited_value,
            };
            (StatusCode::OK, Json(serde_json::to_value(resp).unwrap())).into_response()
        }
        None => {
            let err = ErrorResponse {
                error: format!("renter not found: {}", address),
            };
            (
                StatusCode::NOT_FOUND,
                Json(serde_json::to_value(err).unwrap()),
            )
                .into_response()
        }
    }
}

/// `GET /cars/:address` — returns the car record for the address.
///
/// The availability token is included once published; a car that has
/// never validated shows `null` for token and location.
async fn car_handler(
    Path(address): Path<String>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let party = match PartyId::from_address(&address) {
        Ok(p) => p,
        Err(e) => return bad_address(&address, e).into_response(),
    };

    let engine = state.engine.read().await;
    match engine.car(&party) {
        Some(record) => {
            let resp = CarResponse {
                address,
                state: record.state.to_string(),
                price_per_unit: record.price_per_unit,
                details_digest: record.details_digest.to_hex(),
                current_token: record.current_token.as_ref().map(|t| t.to_hex()),
                current_location: record.current_location.clone(),
            };
            (StatusCode::OK, Json(serde_json::to_value(resp).unwrap())).into_response()
        }
        None => {
            let err = ErrorResponse {
                error: format!("car not found: {}", address),
            };
            (
                StatusCode::NOT_FOUND,
                Json(serde_json::to_value(err).unwrap()),
            )
                .into_response()
        }
    }
}

/// `GET /bookings/:renter/:car` — returns the live booking for the pair.
///
/// Returns 404 once the booking ends; closed bookings are not retained.
async fn booking_handler(
    Path((renter_addr, car_addr)): Path<(String, String)>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let renter = match PartyId::from_address(&renter_addr) {
        Ok(p) => p,
        Err(e) => return bad_address(&renter_addr, e).into_response(),
    };
    let car = match PartyId::from_address(&car_addr) {
        Ok(p) => p,
        Err(e) => return bad_address(&car_addr, e).into_response(),
    };

    let engine = state.engine.read().await;
    match engine.booking(&renter, &car) {
        Some(booking) => {
            let resp = BookingResponse {
                id: booking.id.to_string(),
                renter: renter_addr,
                car: car_addr,
                secret_link: booking.secret_link.to_hex(),
                created_at: booking.created_at,
                deadline: booking.deadline,
                remaining_secs: escalation::remaining_secs(booking, engine.now()),
            };
            (StatusCode::OK, Json(serde_json::to_value(resp).unwrap())).into_response()
        }
        None => {
            let err = ErrorResponse {
                error: format!("no booking for renter {} and car {}", renter_addr, car_addr),
            };
            (
                StatusCode::NOT_FOUND,
                Json(serde_json::to_value(err).unwrap()),
            )
                .into_response()
        }
    }
}

/// 400 response for a path parameter that is not a valid Bech32 address.
fn bad_address(address: &str, err: impl std::fmt::Display) -> impl IntoResponse {
    let body = ErrorResponse {
        error: format!("invalid address {}: {}", address, err),
    };
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::to_value(body).unwrap()),
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
