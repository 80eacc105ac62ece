//! Inbound body parsing and client identity resolution.
//!
//! Bodies arrive as JSON objects, JSON-encoded strings of objects, or
//! nothing at all; none of those may fail the request. The entry hop mints
//! the correlation identity the rest of the chain carries.

use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Fallback when no originating IP can be determined.
pub const UNKNOWN_IP: &str = "unknown";

/// Correlation identity carried hop to hop in the request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientIdentity {
    pub request_ip: String,
    pub uuid: String,
}

/// Parse an inbound body leniently. Anything that is not an object (directly
/// or behind one level of JSON string encoding) becomes an empty map.
pub fn parse_body(bytes: &[u8]) -> Map<String, Value> {
    let value: Value = match serde_json::from_slice(bytes) {
        Ok(v) => v,
        Err(_) => return Map::new(),
    };
    match value {
        Value::Object(map) => map,
        Value::String(inner) => match serde_json::from_str(&inner) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        },
        _ => Map::new(),
    }
}

/// Resolve the identity for this request. Body fields win; otherwise the IP
/// comes from the forwarded-for header and, at the entry hop, a fresh uuid
/// is minted.
pub fn resolve_identity(
    body: &Map<String, Value>,
    headers: &HeaderMap,
    mint_uuid: bool,
) -> ClientIdentity {
    let request_ip = body
        .get("requestIp")
        .and_then(Value::as_str)
        .map(str::to_owned)
        .or_else(|| {
            headers
                .get("x-forwarded-for")
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned)
        })
        .unwrap_or_else(|| UNKNOWN_IP.to_owned());

    let uuid = body
        .get("uuid")
        .and_then(Value::as_str)
        .map(str::to_owned)
        .unwrap_or_else(|| {
            if mint_uuid {
                Uuid::new_v4().to_string()
            } else {
                String::new()
            }
        });

    ClientIdentity { request_ip, uuid }
}
