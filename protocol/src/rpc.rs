//! # JSON-RPC API Definitions
//!
//! Type-safe definitions for the dPACE JSON-RPC API. This module defines the
//! request/response types and method enumeration — the actual HTTP server
//! implementation lives in the node binary (using axum).
//!
//! The API follows the JSON-RPC 2.0 specification with dPACE-specific method
//! names prefixed with `dpace_`. This convention avoids collisions with other
//! JSON-RPC services that might run on the same node.
//!
//! ## Method Index
//!
//! | Method                 | Description                                  |
//! |------------------------|----------------------------------------------|
//! | `dpace_deployRenter`   | Register a renter with credential + deposit  |
//! | `dpace_deployCar`      | Register a car with credential + price       |
//! | `dpace_validateCar`    | Publish a car's availability token/location  |
//! | `dpace_renterBooking`  | Renter books an available car                |
//! | `dpace_carBooking`     | Car confirms a reserved booking              |
//! | `dpace_cancelBooking`  | Either party cancels with counterparty auth  |
//! | `dpace_forceEnd`       | Car force-ends a booking past the deadline   |
//! | `dpace_renterState`    | Query a renter's lifecycle state             |
//! | `dpace_carState`       | Query a car's lifecycle state                |
//! | `dpace_version`        | Node and protocol version                    |

use serde::{Deserialize, Serialize};

use crate::credential::RegistrationCredential;
use crate::crypto::hash::Digest;
use crate::hashlock::HashlockAuthorization;
use crate::identity::PartyId;

// ---------------------------------------------------------------------------
// RPC Method Enumeration
// ---------------------------------------------------------------------------

/// Supported JSON-RPC methods.
///
/// Each variant corresponds to a specific API endpoint. The method name
/// on the wire uses the string representation (e.g., `"dpace_deployRenter"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RpcMethod {
    /// Register a renter identity.
    /// Parameters: [`DeployRenterParams`]
    #[serde(rename = "dpace_deployRenter")]
    DeployRenter,
    /// Register a car identity.
    /// Parameters: [`DeployCarParams`]
    #[serde(rename = "dpace_deployCar")]
    DeployCar,
    /// Mark a car available with a fresh token and location.
    /// Parameters: [`ValidateCarParams`]
    #[serde(rename = "dpace_validateCar")]
    ValidateCar,
    /// Book an available car (renter side).
    /// Parameters: [`RenterBookingParams`]
    #[serde(rename = "dpace_renterBooking")]
    RenterBooking,
    /// Confirm a reserved booking (car side).
    /// Parameters: [`CarBookingParams`]
    #[serde(rename = "dpace_carBooking")]
    CarBooking,
    /// Cancel a booking with the counterparty's authorization.
    /// Parameters: [`CancelBookingParams`]
    #[serde(rename = "dpace_cancelBooking")]
    CancelBooking,
    /// Force-end a booking after the escalation deadline (car side).
    /// Parameters: [`ForceEndParams`]
    #[serde(rename = "dpace_forceEnd")]
    ForceEnd,
    /// Query a renter's current state.
    /// Parameters: [`PartyStateParams`]
    #[serde(rename = "dpace_renterState")]
    RenterState,
    /// Query a car's current state.
    /// Parameters: [`PartyStateParams`]
    #[serde(rename = "dpace_carState")]
    CarState,
    /// Node and protocol version. Parameters: none.
    #[serde(rename = "dpace_version")]
    Version,
}

// ---------------------------------------------------------------------------
// RPC Request / Response
// ---------------------------------------------------------------------------

/// A JSON-RPC 2.0 request.
///
/// The `id` field is used to match requests with responses. The `params`
/// field carries method-specific arguments as an opaque JSON value —
/// the method handler is responsible for parsing and validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcRequest {
    /// JSON-RPC version. Always "2.0".
    pub jsonrpc: String,
    /// Request identifier. Echoed back in the response.
    pub id: serde_json::Value,
    /// The method to invoke.
    pub method: RpcMethod,
    /// Method-specific parameters.
    #[serde(default)]
    pub params: serde_json::Value,
}

impl RpcRequest {
    /// Creates a new RPC request with the given method and parameters.
    pub fn new(id: serde_json::Value, method: RpcMethod, params: serde_json::Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            method,
            params,
        }
    }
}

/// A JSON-RPC 2.0 response.
///
/// Exactly one of `result` or `error` will be set. Both being `None`
/// is a protocol violation that should never happen from a conforming node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcResponse {
    /// JSON-RPC version. Always "2.0".
    pub jsonrpc: String,
    /// The request ID this response corresponds to.
    pub id: serde_json::Value,
    /// The successful result, if the method completed without error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    /// The error, if the method failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

impl RpcResponse {
    /// Creates a successful response.
    pub fn success(id: serde_json::Value, result: serde_json::Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Creates an error response.
    pub fn error(id: serde_json::Value, error: RpcError) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }
}

// ---------------------------------------------------------------------------
// RPC Errors
// ---------------------------------------------------------------------------

/// JSON-RPC 2.0 error object with standard error codes.
///
/// Error codes follow the JSON-RPC 2.0 specification:
/// - `-32700`: Parse error
/// - `-32600`: Invalid request
/// - `-32601`: Method not found
/// - `-32602`: Invalid params
/// - `-32603`: Internal error
/// - `-32000` to `-32099`: Server error (application-specific)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcError {
    /// Numeric error code.
    pub code: i32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional error data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl RpcError {
    /// JSON parse error.
    pub fn parse_error(msg: impl Into<String>) -> Self {
        Self {
            code: -32700,
            message: msg.into(),
            data: None,
        }
    }

    /// Invalid JSON-RPC request structure.
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self {
            code: -32600,
            message: msg.into(),
            data: None,
        }
    }

    /// The requested method does not exist.
    pub fn method_not_found(method: impl Into<String>) -> Self {
        Self {
            code: -32601,
            message: format!("method not found: {}", method.into()),
            data: None,
        }
    }

    /// Invalid method parameters.
    pub fn invalid_params(msg: impl Into<String>) -> Self {
        Self {
            code: -32602,
            message: msg.into(),
            data: None,
        }
    }

    /// Internal server error.
    pub fn internal_error(msg: impl Into<String>) -> Self {
        Self {
            code: -32603,
            message: msg.into(),
            data: None,
        }
    }

    /// A lifecycle operation was rejected by the booking engine.
    /// The message carries the engine's own wording; `data.kind` carries
    /// the machine-readable error name.
    pub fn operation_rejected(reason: impl Into<String>, kind: &str) -> Self {
        Self {
            code: -32000,
            message: reason.into(),
            data: Some(serde_json::json!({ "kind": kind })),
        }
    }

    /// No party registered under the given address.
    pub fn party_not_found(address: &str) -> Self {
        Self {
            code: -32001,
            message: format!("party not found: {}", address),
            data: None,
        }
    }

    /// No booking exists for the given pair.
    pub fn booking_not_found(renter: &str, car: &str) -> Self {
        Self {
            code: -32002,
            message: format!("no booking for renter {} and car {}", renter, car),
            data: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Typed Parameter Payloads
// ---------------------------------------------------------------------------

/// Parameters for `dpace_deployRenter`.
///
/// Addresses are Bech32 strings on the wire; serde validates them into
/// [`PartyId`]s during parameter parsing, so a malformed address fails
/// with `invalid params` before it ever reaches the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeployRenterParams {
    /// The registering renter (the caller).
    pub renter: PartyId,
    /// RSP-issued credential over the renter's private claim.
    pub credential: RegistrationCredential,
    /// Deposit attached to the registration, in escrow units.
    pub deposit: u64,
}

/// Parameters for `dpace_deployCar`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeployCarParams {
    /// The registering car identity (the caller).
    pub owner: PartyId,
    /// The car's public listing details (the credential's claim).
    pub details: String,
    /// RSP-issued credential over `details`.
    pub credential: RegistrationCredential,
    /// Listed price per time unit.
    pub price_per_unit: u64,
}

/// Parameters for `dpace_validateCar`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidateCarParams {
    /// The car publishing its availability (the caller).
    pub car: PartyId,
    /// Fresh availability token (digest of a session nonce).
    pub token: Digest,
    /// Where the car is parked.
    pub location: String,
}

/// Parameters for `dpace_renterBooking`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenterBookingParams {
    /// The booking renter (the caller).
    pub renter: PartyId,
    /// The car being booked.
    pub car: PartyId,
    /// SHA-256 of the car's availability token.
    pub secret_link: Digest,
    /// The car's hashlock authorization toward the renter.
    pub authorization: HashlockAuthorization,
}

/// Parameters for `dpace_carBooking`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CarBookingParams {
    /// The confirming car (the caller).
    pub car: PartyId,
    /// The renter holding the reservation.
    pub renter: PartyId,
    /// The renter's hashlock authorization toward the car.
    pub authorization: HashlockAuthorization,
}

/// Parameters for `dpace_cancelBooking`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelBookingParams {
    /// The party requesting cancellation.
    pub caller: PartyId,
    /// The counterparty's hashlock authorization toward the caller.
    pub authorization: HashlockAuthorization,
}

/// Parameters for `dpace_forceEnd`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForceEndParams {
    /// The car forcing termination (the caller).
    pub car: PartyId,
    /// The renter whose booking is being terminated.
    pub renter: PartyId,
    /// Replacement availability token recorded on the car.
    pub new_token: Digest,
    /// Replacement location recorded on the car.
    pub new_location: String,
}

/// Parameters for `dpace_renterState` / `dpace_carState`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartyStateParams {
    /// The address to query.
    pub address: PartyId,
}

// ---------------------------------------------------------------------------
// Typed Response Payloads
// ---------------------------------------------------------------------------

/// Response payload for every lifecycle operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationResponse {
    /// Always `"ok"` — failures travel as JSON-RPC error objects instead.
    pub status: String,
    /// Events emitted by the operation, in emission order.
    pub events: Vec<serde_json::Value>,
}

/// Response payload for `dpace_renterState` / `dpace_carState`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartyStateResponse {
    /// The address queried.
    pub address: String,
    /// Display form of the party's current state.
    pub state: String,
}

/// Response payload for `dpace_version`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionResponse {
    /// Node build version.
    pub version: String,
    /// Protocol fingerprint.
    pub protocol: String,
}
