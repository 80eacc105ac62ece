//! Outbound call to the next hop, normalized into one shape.
//!
//! `ChainRelay::call` never returns an error: downstream success, downstream
//! failure statuses, and transport-level errors all collapse into a
//! [`RelayResult`] so the aggregator and response builder proceed uniformly.

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderValue, Method, Request, StatusCode};
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::TokioExecutor;
use serde_json::Value;
use std::time::Duration;

use crate::http::headers::filter_headers;
use crate::http::request::ClientIdentity;

/// Status text reported when the downstream call failed outright.
pub const RELAY_FAILURE_TEXT: &str = "Bad request from frontend to backend";

const MAX_RELAY_BODY: usize = 1024 * 1024;

/// Uniform shape for every downstream outcome.
#[derive(Debug, Clone)]
pub struct RelayResult {
    pub status: StatusCode,
    pub status_text: String,
    /// Downstream response headers, re-filtered. Absent when the call failed.
    pub headers: Option<HeaderMap>,
    /// Downstream JSON payload, if any was readable. On failure this may
    /// still carry the downstream body (e.g. a fault message) so it can
    /// surface to the original caller.
    pub data: Option<Value>,
}

impl RelayResult {
    fn failure(data: Option<Value>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            status_text: RELAY_FAILURE_TEXT.to_owned(),
            headers: None,
            data,
        }
    }
}

/// Performs the outbound call to the next hop in the chain.
pub struct ChainRelay {
    client: Client<HttpConnector, Body>,
    next_hop: String,
    timeout: Option<Duration>,
}

impl ChainRelay {
    /// `timeout: None` preserves the unbounded downstream call; a hung next
    /// hop then stalls the whole chain. Configure a timeout to trade that
    /// for a degraded 500 response.
    pub fn new(next_hop: String, timeout: Option<Duration>) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        Self {
            client,
            next_hop,
            timeout,
        }
    }

    pub fn next_hop(&self) -> &str {
        &self.next_hop
    }

    /// PUT the identity to the next hop, carrying the filtered headers and
    /// the informational delay hint as a query parameter.
    pub async fn call(
        &self,
        identity: &ClientIdentity,
        headers: &HeaderMap,
        delay_hint_ms: u64,
    ) -> RelayResult {
        let uri = format!("{}?delay={}", self.next_hop, delay_hint_ms);
        let payload = match serde_json::to_vec(identity) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!(error = %e, "failed to encode relay body");
                return RelayResult::failure(None);
            }
        };

        let mut builder = Request::builder().method(Method::PUT).uri(&uri);
        if let Some(out) = builder.headers_mut() {
            for (name, value) in headers {
                out.insert(name.clone(), value.clone());
            }
            out.insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/json"),
            );
        }
        let request = match builder.body(Body::from(payload)) {
            Ok(request) => request,
            Err(e) => {
                tracing::error!(error = %e, next_hop = %self.next_hop, "failed to build relay request");
                return RelayResult::failure(None);
            }
        };

        let outcome = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, self.client.request(request)).await {
                Ok(result) => result,
                Err(_) => {
                    tracing::error!(
                        next_hop = %self.next_hop,
                        timeout_ms = limit.as_millis() as u64,
                        "relay call timed out"
                    );
                    return RelayResult::failure(None);
                }
            },
            None => self.client.request(request).await,
        };

        let response = match outcome {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(error = %e, next_hop = %self.next_hop, "relay transport error");
                return RelayResult::failure(None);
            }
        };

        let (parts, body) = response.into_parts();
        let bytes = match axum::body::to_bytes(Body::new(body), MAX_RELAY_BODY).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!(error = %e, next_hop = %self.next_hop, "failed to read relay response body");
                return RelayResult::failure(None);
            }
        };
        let data = serde_json::from_slice::<Value>(&bytes).ok();

        if parts.status.is_success() {
            RelayResult {
                status: parts.status,
                status_text: parts
                    .status
                    .canonical_reason()
                    .unwrap_or_default()
                    .to_owned(),
                headers: Some(filter_headers(&parts.headers)),
                data,
            }
        } else {
            tracing::warn!(
                status = %parts.status,
                next_hop = %self.next_hop,
                "next hop reported failure"
            );
            RelayResult::failure(data)
        }
    }
}
