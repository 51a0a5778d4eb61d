//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation of the merged layers (serde handles syntax)
//! - Validate value ranges (port, request timeout)
//! - Check that TLS material accompanies the TLS switch
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Runs on the merged layers, before the port is narrowed to `u16`

use thiserror::Error;

use crate::config::schema::PartialConfig;

/// Highest legal listen port.
pub const MAX_PORT: u64 = 65535;

/// A single semantic validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid port \"{0}\": must be between 1 and 65535")]
    PortOutOfRange(u64),

    #[error("invalid request timeout: must be a positive number of seconds")]
    InvalidRequestTimeout,

    #[error("TLS is enabled but no {0} file is configured")]
    MissingTlsMaterial(&'static str),
}

/// Validate merged configuration layers.
pub fn validate_config(config: &PartialConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    match config.port {
        Some(port) if (1..=MAX_PORT).contains(&port) => {}
        Some(port) => errors.push(ValidationError::PortOutOfRange(port)),
        None => errors.push(ValidationError::PortOutOfRange(0)),
    }

    if !matches!(config.request_timeout, Some(t) if t > 0) {
        errors.push(ValidationError::InvalidRequestTimeout);
    }

    if config.tls == Some(true) {
        if config.tls_cert.is_none() {
            errors.push(ValidationError::MissingTlsMaterial("certificate"));
        }
        if config.tls_key.is_none() {
            errors.push(ValidationError::MissingTlsMaterial("private key"));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(validate_config(&PartialConfig::defaults()).is_ok());
    }

    #[test]
    fn test_port_range() {
        let mut config = PartialConfig::defaults();
        config.port = Some(65535);
        assert!(validate_config(&config).is_ok());

        config.port = Some(65536);
        assert_eq!(
            validate_config(&config).unwrap_err(),
            vec![ValidationError::PortOutOfRange(65536)]
        );
    }

    #[test]
    fn test_reports_all_errors() {
        let mut config = PartialConfig::defaults();
        config.port = Some(70000);
        config.tls = Some(true);

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors.contains(&ValidationError::MissingTlsMaterial("certificate")));
        assert!(errors.contains(&ValidationError::MissingTlsMaterial("private key")));
    }

    #[test]
    fn test_error_display() {
        let err = ValidationError::PortOutOfRange(70000);
        assert_eq!(
            err.to_string(),
            "invalid port \"70000\": must be between 1 and 65535"
        );
    }
}
