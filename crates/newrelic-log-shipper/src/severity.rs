// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Severity levels accepted by the logger.
//!
//! Seven levels are supported, ordered from most to least severe. Each level
//! has a stable rank (0 for `error` through 6 for `silly`) and every
//! enablement decision is a rank comparison:
//!
//! | Level     | Rank |
//! |-----------|------|
//! | `error`   | 0    |
//! | `warn`    | 1    |
//! | `info`    | 2    |
//! | `http`    | 3    |
//! | `verbose` | 4    |
//! | `debug`   | 5    |
//! | `silly`   | 6    |
//!
//! A logger configured at `info` emits `info`, `warn` and `error` and
//! suppresses everything else.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use tracing::error;

use crate::error::InvalidLevel;

/// Severity of a log record.
///
/// # Parsing
///
/// ```
/// use newrelic_log_shipper::Severity;
///
/// let level: Severity = "verbose".parse().unwrap();
/// assert_eq!(level.rank(), 4);
/// assert!("loud".parse::<Severity>().is_err());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Severity {
    Error,
    Warn,
    /// The default threshold.
    #[default]
    Info,
    Http,
    Verbose,
    Debug,
    Silly,
}

impl Severity {
    /// Every level, most severe first.
    pub const ALL: [Severity; 7] = [
        Severity::Error,
        Severity::Warn,
        Severity::Info,
        Severity::Http,
        Severity::Verbose,
        Severity::Debug,
        Severity::Silly,
    ];

    /// Numeric rank of the level, 0 being the most severe.
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Severity::Error => 0,
            Severity::Warn => 1,
            Severity::Info => 2,
            Severity::Http => 3,
            Severity::Verbose => 4,
            Severity::Debug => 5,
            Severity::Silly => 6,
        }
    }

    /// Inverse of [`Severity::rank`].
    #[must_use]
    pub fn from_rank(rank: u8) -> Option<Self> {
        Self::ALL.get(usize::from(rank)).copied()
    }

    /// Name of the level as sent in the `log_level` attribute.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warn => "warn",
            Severity::Info => "info",
            Severity::Http => "http",
            Severity::Verbose => "verbose",
            Severity::Debug => "debug",
            Severity::Silly => "silly",
        }
    }

    /// Whether a logger whose threshold is `self` accepts `candidate`.
    #[must_use]
    pub const fn enables(self, candidate: Severity) -> bool {
        candidate.rank() <= self.rank()
    }
}

/// Whether a logger configured at `configured` emits records at `candidate`.
#[must_use]
pub const fn is_enabled(configured: Severity, candidate: Severity) -> bool {
    configured.enables(candidate)
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AsRef<str> for Severity {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

/// Level names are matched exactly; `"INFO"` is not a level.
impl FromStr for Severity {
    type Err = InvalidLevel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|level| level.as_str() == s)
            .ok_or_else(|| InvalidLevel::new(s))
    }
}

impl Serialize for Severity {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

/// Lenient deserialization for configuration files.
///
/// An unknown name or a non-string value is logged and replaced by the
/// default threshold, so a typo in configuration never stops the logger from
/// starting.
impl<'de> Deserialize<'de> for Severity {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;

        if let Value::String(s) = value {
            match Severity::from_str(&s) {
                Ok(level) => Ok(level),
                Err(e) => {
                    error!("{e}, falling back to {}", Severity::default());
                    Ok(Severity::default())
                }
            }
        } else {
            error!("Expected a string for log level, got {:?}", value);
            Ok(Severity::default())
        }
    }
}

impl From<log::Level> for Severity {
    fn from(level: log::Level) -> Self {
        match level {
            log::Level::Error => Severity::Error,
            log::Level::Warn => Severity::Warn,
            log::Level::Info => Severity::Info,
            log::Level::Debug => Severity::Debug,
            log::Level::Trace => Severity::Silly,
        }
    }
}
