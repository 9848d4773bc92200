// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use reqwest::StatusCode;

/// A level name that is not one of the seven [`crate::Severity`] levels.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid log level '{level}'. Valid levels are: error, warn, info, http, verbose, debug, silly")]
pub struct InvalidLevel {
    level: String,
}

impl InvalidLevel {
    pub(crate) fn new(level: &str) -> Self {
        Self {
            level: level.to_string(),
        }
    }

    /// The rejected level name.
    #[must_use]
    pub fn level(&self) -> &str {
        &self.level
    }
}

/// Reasons a harvested batch failed to reach the Log API.
///
/// Every variant means the batch is gone: nothing is retried or put back in
/// the buffer.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    /// The batch could not be serialized or compressed.
    #[error("Failed to prepare payload: {0}")]
    Payload(String),

    /// The request never produced a response (connection refused, timeout, ...).
    #[error("Log API request failed: {0}")]
    Transport(#[source] reqwest::Error),

    /// The Log API answered with something other than 202 Accepted.
    #[error("Log API response code not 202: {status}")]
    UnexpectedStatus { status: StatusCode, body: String },

    /// The 202 response body was not a valid acknowledgment.
    #[error("Invalid response from Log API: {0}")]
    InvalidAck(String),
}

/// Invalid logger configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    InvalidLevel(#[from] InvalidLevel),

    #[error("Harvesting requires a running tokio runtime")]
    NoRuntime,

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_level_display() {
        let error = InvalidLevel::new("bogus");
        assert_eq!(
            error.to_string(),
            "Invalid log level 'bogus'. Valid levels are: error, warn, info, http, verbose, debug, silly"
        );
    }

    #[test]
    fn test_unexpected_status_display() {
        let error = DeliveryError::UnexpectedStatus {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: String::new(),
        };
        assert_eq!(
            error.to_string(),
            "Log API response code not 202: 500 Internal Server Error"
        );
    }

    #[test]
    fn test_config_error_from_invalid_level() {
        let error: ConfigError = InvalidLevel::new("loud").into();
        assert!(matches!(error, ConfigError::InvalidLevel(_)));
        assert!(error.to_string().contains("loud"));
    }
}
