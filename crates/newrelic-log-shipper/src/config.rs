// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::env;
use std::time::Duration;

use serde::{Deserialize, Deserializer};

use crate::constants::{
    DEFAULT_HARVEST_INTERVAL, DEFAULT_REQUEST_TIMEOUT, EU_LOG_API_URL, LICENSE_KEY_ENV_VAR,
    US_LOG_API_URL,
};
use crate::error::ConfigError;
use crate::record::Attributes;
use crate::severity::Severity;

/// New Relic data center the account lives in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    #[default]
    Us,
    Eu,
}

impl Region {
    /// Log API endpoint for the region.
    #[must_use]
    pub const fn endpoint(self) -> &'static str {
        match self {
            Region::Us => US_LOG_API_URL,
            Region::Eu => EU_LOG_API_URL,
        }
    }
}

/// Configuration of a [`crate::Logger`].
///
/// Every field has a default, so configurations are usually written as
/// `LoggerConfig { license_key: Some(..), ..Default::default() }` or
/// deserialized from a partial document.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    /// License key sent as `X-License-Key`. Falls back to
    /// `NEW_RELIC_LICENSE_KEY` when not set.
    pub license_key: Option<String>,
    /// Attributes shared by every record of every batch.
    pub attributes: Attributes,
    pub region: Region,
    /// Initial severity threshold.
    pub level: Severity,
    /// Verbose diagnostics about each harvest.
    pub debug: bool,
    /// Whether the periodic harvest timer runs.
    pub harvest: bool,
    /// Time between two timer-triggered harvests.
    #[serde(rename = "interval_ms", deserialize_with = "deserialize_millis")]
    pub harvest_interval: Duration,
    /// Timeout of a single Log API request.
    #[serde(rename = "timeout_ms", deserialize_with = "deserialize_millis")]
    pub timeout: Duration,
    /// Replaces the regional endpoint (proxies, tests).
    pub endpoint: Option<String>,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            license_key: None,
            attributes: Attributes::new(),
            region: Region::Us,
            level: Severity::Info,
            debug: false,
            harvest: true,
            harvest_interval: DEFAULT_HARVEST_INTERVAL,
            timeout: DEFAULT_REQUEST_TIMEOUT,
            endpoint: None,
        }
    }
}

impl LoggerConfig {
    /// Builds a configuration from environment variables:
    ///
    /// - `NEW_RELIC_LICENSE_KEY`
    /// - `NEW_RELIC_LOG_LEVEL` (default `info`)
    /// - `NEW_RELIC_LOG_REGION` (`eu` selects the EU endpoint)
    /// - `NEW_RELIC_LOG_DEBUG` (`true` enables diagnostics)
    /// - `NEW_RELIC_LOG_HARVEST` (`false` disables the timer)
    /// - `NEW_RELIC_LOG_HARVEST_INTERVAL_MS` (default 15000)
    /// - `NEW_RELIC_LOG_ENDPOINT`
    pub fn from_env() -> Result<Self, ConfigError> {
        let license_key = env::var(LICENSE_KEY_ENV_VAR)
            .ok()
            .filter(|key| !key.trim().is_empty());
        let level = match env::var("NEW_RELIC_LOG_LEVEL") {
            Ok(level) => level.to_lowercase().parse()?,
            Err(_) => Severity::default(),
        };
        let region = match env::var("NEW_RELIC_LOG_REGION") {
            Ok(region) if region.eq_ignore_ascii_case("eu") => Region::Eu,
            _ => Region::Us,
        };
        let debug = env::var("NEW_RELIC_LOG_DEBUG")
            .map(|val| val.to_lowercase() == "true")
            .unwrap_or(false);
        let harvest = env::var("NEW_RELIC_LOG_HARVEST")
            .map(|val| val.to_lowercase() != "false")
            .unwrap_or(true);
        let harvest_interval = env::var("NEW_RELIC_LOG_HARVEST_INTERVAL_MS")
            .ok()
            .and_then(|ms| ms.parse::<u64>().ok())
            .map_or(DEFAULT_HARVEST_INTERVAL, Duration::from_millis);
        let endpoint = env::var("NEW_RELIC_LOG_ENDPOINT").ok();

        let config = Self {
            license_key,
            region,
            level,
            debug,
            harvest,
            harvest_interval,
            endpoint,
            ..Default::default()
        };

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.harvest && self.harvest_interval.is_zero() {
            return Err(ConfigError::InvalidConfig(
                "harvest interval must be greater than 0".to_string(),
            ));
        }

        if self.timeout.is_zero() {
            return Err(ConfigError::InvalidConfig(
                "request timeout must be greater than 0".to_string(),
            ));
        }

        if let Some(endpoint) = &self.endpoint {
            let url = reqwest::Url::parse(endpoint).map_err(|e| {
                ConfigError::InvalidConfig(format!("invalid endpoint '{endpoint}': {e}"))
            })?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(ConfigError::InvalidConfig(format!(
                    "endpoint '{endpoint}' must use http or https"
                )));
            }
        }

        Ok(())
    }

    /// The configured license key, or `NEW_RELIC_LICENSE_KEY` when none is set.
    #[must_use]
    pub fn resolve_license_key(&self) -> Option<String> {
        self.license_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .or_else(|| {
                env::var(LICENSE_KEY_ENV_VAR)
                    .ok()
                    .filter(|key| !key.trim().is_empty())
            })
    }

    /// URL batches are posted to.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        self.endpoint
            .as_deref()
            .unwrap_or_else(|| self.region.endpoint())
    }
}

fn deserialize_millis<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    u64::deserialize(deserializer).map(Duration::from_millis)
}
