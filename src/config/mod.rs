//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! hop config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks, all errors at once)
//!     → HopConfig (validated, immutable)
//!     → shared via Arc with the server and handler
//! ```

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    ExporterConfig, ExporterMode, FaultConfig, HopConfig, HopRole, ListenerConfig,
    ObservabilityConfig, RelayConfig, TimeoutConfig,
};
pub use validation::{validate_config, ValidationError};
