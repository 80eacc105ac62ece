//! Merges per-hop counters and identity into the response envelope.
//!
//! The body leaving a hop is always a serialized string, whatever path
//! produced it, so the boundary contract is stable across success, injected
//! faults, and relay failures.

use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use serde_json::{Map, Value};

use crate::fault::FAULT_MESSAGE;
use crate::http::request::ClientIdentity;
use crate::relay::RelayResult;
use crate::trace::propagation::{TRACEPARENT, TRACESTATE};

/// Body returned when the chain produced nothing usable.
pub const NO_DATA_BODY: &str = "No data from remote server.";

/// Final response envelope for one hop.
#[derive(Debug, Clone)]
pub struct HopResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl IntoResponse for HopResponse {
    fn into_response(self) -> Response {
        (self.status, self.headers, self.body).into_response()
    }
}

/// Response for a hop that decided to fail: the fixed message, JSON-encoded,
/// and nothing else.
pub fn fault_response(own_headers: &HeaderMap) -> HopResponse {
    HopResponse {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        headers: own_headers.clone(),
        body: serde_json::to_string(FAULT_MESSAGE).unwrap_or_default(),
    }
}

/// Merge this hop's counter into whatever the relay produced.
///
/// - Object payload: the counter is inserted under `hits_field`; insert-only,
///   so counters contributed by hops further down always survive.
/// - Non-object payload (a downstream fault message): passed through verbatim
///   with the relay's status.
/// - No payload: 502 with a literal no-data body when the relay itself
///   succeeded, else the relay's normalized failure status.
pub fn merge_relayed(
    result: RelayResult,
    own_headers: &HeaderMap,
    hits_field: &str,
    hits: u64,
) -> HopResponse {
    let headers = result
        .headers
        .unwrap_or_else(|| own_headers.clone());

    match result.data {
        Some(Value::Object(mut map)) => {
            map.insert(hits_field.to_owned(), Value::from(hits));
            HopResponse {
                status: result.status,
                headers,
                body: Value::Object(map).to_string(),
            }
        }
        Some(other) => HopResponse {
            status: result.status,
            headers,
            body: other.to_string(),
        },
        None => {
            let status = if result.status.is_success() {
                StatusCode::BAD_GATEWAY
            } else {
                result.status
            };
            tracing::warn!(
                status = %status,
                status_text = %result.status_text,
                "no usable payload from next hop"
            );
            HopResponse {
                status,
                headers,
                body: NO_DATA_BODY.to_owned(),
            }
        }
    }
}

/// Terminal hop: compose the base payload every upstream hop merges into.
/// The inbound body fields are echoed, then identity, counter, and the
/// carrier headers are layered on top.
pub fn terminal_response(
    mut body_fields: Map<String, Value>,
    identity: &ClientIdentity,
    own_headers: &HeaderMap,
    hits_field: &str,
    hits: u64,
) -> HopResponse {
    body_fields.insert(
        "requestIp".to_owned(),
        Value::from(identity.request_ip.clone()),
    );
    body_fields.insert("uuid".to_owned(), Value::from(identity.uuid.clone()));
    body_fields.insert(hits_field.to_owned(), Value::from(hits));
    for name in [TRACEPARENT, TRACESTATE] {
        if let Some(value) = own_headers.get(name).and_then(|v| v.to_str().ok()) {
            body_fields.insert(name.to_owned(), Value::from(value));
        }
    }
    HopResponse {
        status: StatusCode::OK,
        headers: own_headers.clone(),
        body: Value::Object(body_fields).to_string(),
    }
}
