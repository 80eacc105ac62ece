//! Semantic configuration validation.
//!
//! Serde handles the syntactic layer; this module checks the values make
//! sense together and reports all problems at once, not just the first.

use thiserror::Error;
use url::Url;

use crate::config::schema::{HopConfig, HopRole};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("bind address '{0}' is not a valid socket address")]
    BindAddress(String),

    #[error("role '{0:?}' requires next_hop")]
    MissingNextHop(HopRole),

    #[error("terminal hop must not configure next_hop")]
    UnexpectedNextHop,

    #[error("next_hop '{0}' is not a usable http(s) url: {1}")]
    NextHopUrl(String, String),

    #[error("next_hop '{0}' must not carry a query string")]
    NextHopQuery(String),

    #[error("hits_field must not be empty")]
    EmptyHitsField,

    #[error("service_name must not be empty")]
    EmptyServiceName,
}

/// Validate one hop's configuration, collecting every error.
pub fn validate_config(config: &HopConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config
        .listener
        .bind_address
        .parse::<std::net::SocketAddr>()
        .is_err()
    {
        errors.push(ValidationError::BindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    match (config.role, &config.next_hop) {
        (HopRole::Terminal, Some(_)) => errors.push(ValidationError::UnexpectedNextHop),
        (HopRole::Terminal, None) => {}
        (role, None) => errors.push(ValidationError::MissingNextHop(role)),
        (_, Some(next)) => match Url::parse(next) {
            Ok(url) => {
                if !matches!(url.scheme(), "http" | "https") {
                    errors.push(ValidationError::NextHopUrl(
                        next.clone(),
                        format!("unsupported scheme '{}'", url.scheme()),
                    ));
                }
                // the relay appends its own ?delay= parameter
                if url.query().is_some() {
                    errors.push(ValidationError::NextHopQuery(next.clone()));
                }
            }
            Err(e) => errors.push(ValidationError::NextHopUrl(next.clone(), e.to_string())),
        },
    }

    if config.hits_field.trim().is_empty() {
        errors.push(ValidationError::EmptyHitsField);
    }
    if config.service_name.trim().is_empty() {
        errors.push(ValidationError::EmptyServiceName);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
