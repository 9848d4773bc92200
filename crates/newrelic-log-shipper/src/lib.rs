// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! # New Relic Log Shipper
//!
//! A process-embedded log shipper. Application code logs structured records
//! through a [`Logger`]; records are buffered in memory and periodically
//! harvested, serialized, gzip-compressed and posted to the New Relic Log API.
//!
//! ## Pipeline
//!
//! ```text
//!   Logger::info / LogSink::*        log crate (LogBridge)
//!            │                              │
//!            └──────────┬───────────────────┘
//!                       v
//!               ┌───────────────┐
//!               │ RecordBuffer  │  (append / take_all)
//!               └───────┬───────┘
//!                       │  timer tick, flush(), shutdown
//!                       v
//!               ┌───────────────┐
//!               │   Harvester   │
//!               └───────┬───────┘
//!                       v
//!               ┌───────────────┐
//!               │    Flusher    │  (JSON -> gzip -> POST, expect 202)
//!               └───────────────┘
//! ```
//!
//! Delivery is best-effort: a batch that fails to deliver is logged as a
//! warning and dropped. Nothing is retried or persisted.
//!
//! ## Example
//!
//! ```rust,no_run
//! use newrelic_log_shipper::{LogSink, Logger, LoggerConfig};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let logger = Logger::new(LoggerConfig {
//!     license_key: Some("my-license-key".to_string()),
//!     ..Default::default()
//! })?;
//! let _guard = logger.shutdown_guard();
//!
//! logger.info("user signed in", Default::default());
//! logger.flush().await?;
//! # Ok(())
//! # }
//! ```

#![deny(clippy::all)]
#![deny(clippy::unwrap_used)]
#![deny(unused_extern_crates)]
#![deny(unused_allocation)]
#![deny(unused_assignments)]
#![deny(unused_comparisons)]
#![allow(clippy::module_name_repetitions)]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::panic))]

/// Bridge from the `log` crate into a [`Logger`]
pub mod bridge;

/// Buffer of pending records and the batches taken from it
pub mod buffer;

/// Logger configuration - defaults, environment variables and validation
pub mod config;

/// Endpoints, limits and defaults
pub mod constants;

/// Error types
pub mod error;

/// Delivery of batches to the Log API
pub mod flusher;

/// Periodic, manual and shutdown harvests
pub mod harvester;

/// The logger facade
pub mod logger;

/// Wire format of a delivered batch
pub mod payload;

/// Log records and error enrichment
pub mod record;

/// Severity levels
pub mod severity;

/// Level-gated logging contract shared by every sink
pub mod sink;

/// String truncation
pub mod truncate;

pub use bridge::LogBridge;
pub use buffer::{Batch, RecordBuffer};
pub use config::{LoggerConfig, Region};
pub use error::{ConfigError, DeliveryError, InvalidLevel};
pub use flusher::{Ack, Flusher};
pub use logger::{LinkingMetadata, Logger, ShutdownGuard};
pub use record::{Attributes, ErrorDetails, LogRecord};
pub use severity::Severity;
pub use sink::LogSink;
pub use truncate::truncate;
