// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Constants for the New Relic Log API and the harvest cycle.

use std::time::Duration;

/// Log API endpoint for accounts in the US region.
pub const US_LOG_API_URL: &str = "https://log-api.newrelic.com/log/v1";

/// Log API endpoint for accounts in the EU region.
pub const EU_LOG_API_URL: &str = "https://log-api.eu.newrelic.com/log/v1";

/// Environment variable consulted when no license key is configured.
pub const LICENSE_KEY_ENV_VAR: &str = "NEW_RELIC_LICENSE_KEY";

/// Maximum length, in characters, of a truncated string.
///
/// Strings longer than this are cut to [`TRUNCATED_PREFIX_LENGTH`] characters
/// followed by [`ELLIPSIS`], which brings them to exactly this length.
pub const MAX_OUTPUT_LENGTH: usize = 1024;

/// Number of characters kept from a string that exceeds [`MAX_OUTPUT_LENGTH`].
pub const TRUNCATED_PREFIX_LENGTH: usize = 1021;

/// Marker appended to truncated strings.
pub const ELLIPSIS: &str = "...";

/// Default time between two timer-triggered harvests.
pub const DEFAULT_HARVEST_INTERVAL: Duration = Duration::from_millis(15_000);

/// Default timeout applied to every Log API request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Placeholder for `error.stack` when the error carries no stack text.
pub const NO_STACK_TRACE: &str = "No stack trace";

/// Fallback `error.class` when the error has no more specific kind name.
pub const GENERIC_ERROR_CLASS: &str = "Error";
