//! Configuration schema for a single hop.
//!
//! All types derive Serde traits for deserialization from TOML config files;
//! every field has a default so a minimal config stays minimal.

use serde::{Deserialize, Serialize};

/// Root configuration for one hop process.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HopConfig {
    /// Where this hop sits in the chain.
    pub role: HopRole,

    /// Service name reported on every span.
    pub service_name: String,

    /// URL of the next hop; required unless terminal.
    pub next_hop: Option<String>,

    /// JSON field this hop's counter is published under in the aggregated
    /// response.
    pub hits_field: String,

    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Fault-injection policy knobs.
    pub fault: FaultConfig,

    /// Downstream relay settings.
    pub relay: RelayConfig,

    /// Span exporter selection.
    pub exporter: ExporterConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for HopConfig {
    fn default() -> Self {
        Self {
            role: HopRole::Terminal,
            service_name: "hopchain".to_string(),
            next_hop: None,
            hits_field: "hopHits".to_string(),
            listener: ListenerConfig::default(),
            timeouts: TimeoutConfig::default(),
            fault: FaultConfig::default(),
            relay: RelayConfig::default(),
            exporter: ExporterConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl HopConfig {
    /// Name of the per-request root span.
    pub fn request_span_name(&self) -> String {
        format!("{}_request", self.service_name)
    }
}

/// Position of a hop within the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum HopRole {
    /// First hop: derives the client IP from forwarded headers, mints the
    /// correlation uuid, and mints the trace context downstream hops see.
    Entry,
    /// Relays to the next hop, forwarding whatever context it received.
    Intermediate,
    /// Last hop: no relay; composes the base payload.
    #[default]
    Terminal,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:7071").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:7071".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Total time allowed for handling one inbound request, in seconds.
    /// Must cover this hop's own delay plus the whole downstream chain.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 60 }
    }
}

/// Fault-injection policy for this hop. These are knobs, not constants:
/// tests override them to force or forbid failures.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FaultConfig {
    /// Upper bound (exclusive) on the synthetic work delay, in milliseconds.
    pub work_delay_bound_ms: u64,

    /// Upper bound (exclusive) on the informational delay hint forwarded to
    /// the next hop.
    pub relay_delay_bound_ms: u64,

    /// Fail one request in this many. 0 disables failures, 1 fails every
    /// request.
    pub failure_denominator: u64,

    /// Fixed RNG seed for deterministic behavior under test.
    pub seed: Option<u64>,
}

impl Default for FaultConfig {
    fn default() -> Self {
        Self {
            work_delay_bound_ms: 2000,
            relay_delay_bound_ms: 3000,
            failure_denominator: 20,
            seed: None,
        }
    }
}

/// Downstream relay settings.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RelayConfig {
    /// Timeout for the downstream call, in seconds. Unset preserves the
    /// unbounded call; a hung next hop then stalls the whole chain.
    pub timeout_secs: Option<u64>,
}

/// Span exporter selection.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ExporterConfig {
    pub mode: ExporterMode,
}

/// Which exporter finished spans are handed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExporterMode {
    /// Structured log line per span.
    #[default]
    Log,
    /// Discard spans.
    Noop,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
