// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! The logger facade.
//!
//! A [`Logger`] owns the record buffer, the severity threshold and the harvest
//! machinery. Cloning it is cheap and every clone logs into the same buffer.
//! Logging never waits on the network: a log call either appends one record
//! or, when its level is disabled, does nothing at all.
//!
//! # Lifecycle
//!
//! ```text
//!   Logger::new ──> timer running ──> shutdown() ──> timer stopped
//!                        │                 │
//!                 flush() any time    final harvest, at most once
//! ```
//!
//! The final harvest runs the first time any of these happens:
//! [`Logger::shutdown`], [`Logger::shutdown_on_signal`] seeing Ctrl-C or
//! SIGTERM, a [`ShutdownGuard`] being dropped (including during a panic), or
//! the last clone of the logger being dropped. Later triggers find the exit flag set and return immediately. A shutdown
//! harvest does not wait for deliveries the timer already started.

use std::borrow::Cow;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread;

use serde_json::Value;
use tokio::runtime::{Handle, RuntimeFlavor};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::buffer::RecordBuffer;
use crate::config::LoggerConfig;
use crate::error::{ConfigError, DeliveryError, InvalidLevel};
use crate::flusher::{Ack, Flusher};
use crate::harvester::Harvester;
use crate::record::{Attributes, LogRecord};
use crate::severity::Severity;
use crate::sink::LogSink;
use crate::truncate::truncate;

/// Source of correlation attributes (trace id, span id, entity name, ...)
/// merged into every record.
///
/// Keys returned here overwrite attributes of the same name passed to the
/// log call.
pub trait LinkingMetadata: Send + Sync {
    fn linking_metadata(&self) -> Attributes;
}

impl<F> LinkingMetadata for F
where
    F: Fn() -> Attributes + Send + Sync,
{
    fn linking_metadata(&self) -> Attributes {
        self()
    }
}

/// Buffered logger shipping to the New Relic Log API.
#[derive(Clone)]
pub struct Logger {
    inner: Arc<Inner>,
}

struct Inner {
    threshold: AtomicU8,
    buffer: Arc<RecordBuffer>,
    harvester: Harvester,
    linking_metadata: Option<Arc<dyn LinkingMetadata>>,
    exit_flag: AtomicBool,
    cancel_token: CancellationToken,
}

impl Inner {
    /// Flips the exit flag and stops the timer. Only the first caller gets
    /// `true` and runs the final harvest.
    fn begin_shutdown(&self) -> bool {
        if self.exit_flag.swap(true, Ordering::AcqRel) {
            return false;
        }
        debug!("LOGS | Shutting down, running final harvest");
        self.cancel_token.cancel();
        true
    }
}

// The last handle going away is an exit path too.
impl Drop for Inner {
    fn drop(&mut self) {
        if self.begin_shutdown() && !self.buffer.is_empty() {
            harvest_blocking(&self.harvester);
        }
    }
}

impl Logger {
    /// Creates a logger and, when `config.harvest` is set, starts the
    /// periodic harvest on the current tokio runtime.
    ///
    /// Without a license key (configured or in `NEW_RELIC_LICENSE_KEY`) the
    /// logger still accepts records but every harvest discards them.
    pub fn new(config: LoggerConfig) -> Result<Self, ConfigError> {
        Self::build(config, None)
    }

    /// Like [`Logger::new`], merging `provider`'s attributes into every
    /// record.
    pub fn with_linking_metadata(
        config: LoggerConfig,
        provider: Arc<dyn LinkingMetadata>,
    ) -> Result<Self, ConfigError> {
        Self::build(config, Some(provider))
    }

    fn build(
        config: LoggerConfig,
        linking_metadata: Option<Arc<dyn LinkingMetadata>>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let flusher = match config.resolve_license_key() {
            Some(license_key) => Some(Flusher::new(&license_key, &config)?),
            None => {
                warn!("No New Relic Logs license key specified. Logs will not be sent.");
                None
            }
        };

        let buffer = Arc::new(RecordBuffer::new());
        let harvester = Harvester::new(Arc::clone(&buffer), flusher, config.debug);
        let cancel_token = CancellationToken::new();

        if config.harvest {
            Handle::try_current().map_err(|_| ConfigError::NoRuntime)?;
            // Detached: the task ends with the cancel token.
            drop(harvester.spawn_periodic(config.harvest_interval, cancel_token.clone())?);
        } else {
            debug!("LOGS | Periodic harvest disabled");
        }

        Ok(Self {
            inner: Arc::new(Inner {
                threshold: AtomicU8::new(config.level.rank()),
                buffer,
                harvester,
                linking_metadata,
                exit_flag: AtomicBool::new(false),
                cancel_token,
            }),
        })
    }

    /// The current severity threshold.
    #[must_use]
    pub fn level(&self) -> Severity {
        Severity::from_rank(self.inner.threshold.load(Ordering::Relaxed)).unwrap_or_default()
    }

    /// Sets the threshold by name. An unknown name is rejected and the
    /// threshold stays as it was.
    pub fn set_level(&self, level: &str) -> Result<(), InvalidLevel> {
        let level: Severity = level.parse()?;
        self.set_severity(level);
        Ok(())
    }

    pub fn set_severity(&self, level: Severity) {
        self.inner.threshold.store(level.rank(), Ordering::Relaxed);
    }

    /// Whether the level named `level` is enabled. Unknown names are logged
    /// and reported as disabled.
    #[must_use]
    pub fn is_level_enabled_by_name(&self, level: &str) -> bool {
        match level.parse::<Severity>() {
            Ok(level) => self.is_level_enabled(level),
            Err(_) => {
                warn!("Tried to check invalid log level {level}");
                false
            }
        }
    }

    /// Number of records waiting for the next harvest.
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.inner.buffer.len()
    }

    /// Harvests now and waits for the delivery.
    ///
    /// Resolves to `Ok(None)` without any request when nothing was buffered.
    /// On failure the records are already gone.
    pub async fn flush(&self) -> Result<Option<Ack>, DeliveryError> {
        self.inner.harvester.harvest().await
    }

    /// Stops the harvest timer and runs the final harvest.
    ///
    /// Only the first call harvests; later calls return `Ok(None)`. Dropping
    /// the last clone of a logger that was never shut down runs the same
    /// harvest, blocking until it completes.
    pub async fn shutdown(&self) -> Result<Option<Ack>, DeliveryError> {
        if !self.inner.begin_shutdown() {
            return Ok(None);
        }
        self.inner.harvester.harvest().await
    }

    /// Whether the final harvest has been started.
    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.inner.exit_flag.load(Ordering::Acquire)
    }

    /// Waits for Ctrl-C or SIGTERM, then shuts down.
    ///
    /// The signal is consumed: the application decides whether to exit once
    /// this resolves.
    pub async fn shutdown_on_signal(&self) -> Result<Option<Ack>, DeliveryError> {
        wait_for_shutdown_signal().await;
        self.shutdown().await
    }

    /// Returns a guard that shuts the logger down when dropped.
    pub fn shutdown_guard(&self) -> ShutdownGuard {
        ShutdownGuard {
            logger: self.clone(),
        }
    }

    fn linking_attributes(&self) -> Option<Attributes> {
        self.inner
            .linking_metadata
            .as_ref()
            .map(|provider| provider.linking_metadata())
    }
}

impl LogSink for Logger {
    fn is_level_enabled(&self, level: Severity) -> bool {
        self.level().enables(level)
    }

    /// Appends a record without consulting the threshold. String messages are
    /// truncated; linking metadata is merged in.
    fn log(&self, level: Severity, message: Value, mut attributes: Attributes) {
        let message = match message {
            Value::String(s) => {
                let cut = match truncate(&s) {
                    Cow::Owned(cut) => Some(cut),
                    Cow::Borrowed(_) => None,
                };
                Value::String(cut.unwrap_or(s))
            }
            other => other,
        };

        if let Some(linking) = self.linking_attributes() {
            attributes.extend(linking);
        }

        self.inner
            .buffer
            .append(LogRecord::new(level, message, attributes));
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("level", &self.level())
            .field("buffered", &self.buffered())
            .field("shut_down", &self.is_shut_down())
            .finish_non_exhaustive()
    }
}

/// Runs the logger's final harvest when dropped, unless it already ran.
///
/// The drop blocks until the delivery completes, whatever runtime (if any)
/// it happens on. Unlike relying on the last clone being dropped, the guard
/// pins the harvest to the end of its scope.
#[must_use = "the final harvest runs when the guard is dropped"]
pub struct ShutdownGuard {
    logger: Logger,
}

impl ShutdownGuard {
    /// Shuts down now instead of on drop.
    pub async fn shutdown(self) -> Result<Option<Ack>, DeliveryError> {
        self.logger.shutdown().await
    }
}

impl Drop for ShutdownGuard {
    fn drop(&mut self) {
        if self.logger.inner.begin_shutdown() {
            harvest_blocking(&self.logger.inner.harvester);
        }
    }
}

impl fmt::Debug for ShutdownGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShutdownGuard")
            .field("logger", &self.logger)
            .finish()
    }
}

/// Runs one harvest to completion from synchronous code.
///
/// A multi-threaded runtime keeps driving its other tasks while this thread
/// blocks. A current-thread runtime cannot, so the harvest runs on a helper
/// thread with its own runtime and HTTP client, and is joined.
fn harvest_blocking(harvester: &Harvester) {
    // Outcomes are logged by the flusher.
    match Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            let _ = tokio::task::block_in_place(|| handle.block_on(harvester.harvest()));
        }
        Ok(_) => {
            let harvester = harvester.detached();
            let spawned = thread::Builder::new()
                .name("newrelic-final-harvest".to_string())
                .spawn(move || harvest_on_new_runtime(&harvester));
            match spawned {
                Ok(handle) => {
                    if handle.join().is_err() {
                        error!("LOGS | Final harvest thread panicked");
                    }
                }
                Err(e) => error!("LOGS | Unable to run final harvest: {e}"),
            }
        }
        Err(_) => harvest_on_new_runtime(&harvester.detached()),
    }
}

fn harvest_on_new_runtime(harvester: &Harvester) {
    match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => {
            let _ = runtime.block_on(harvester.harvest());
        }
        Err(e) => error!("LOGS | Unable to run final harvest: {e}"),
    }
}

async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("LOGS | Unable to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("LOGS | Unable to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => debug!("LOGS | Received Ctrl-C"),
        () = terminate => debug!("LOGS | Received SIGTERM"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use serial_test::serial;
    use std::time::Duration;
    use tracing_test::traced_test;

    fn test_config() -> LoggerConfig {
        LoggerConfig {
            license_key: Some("test-license-key".to_string()),
            endpoint: Some("http://127.0.0.1:9/log/v1".to_string()),
            harvest: false,
            ..Default::default()
        }
    }

    fn logger() -> Logger {
        Logger::new(test_config()).unwrap()
    }

    #[test]
    fn test_default_level_is_info() {
        assert_eq!(logger().level(), Severity::Info);
    }

    #[test]
    fn test_set_level() {
        let logger = logger();
        logger.set_level("debug").unwrap();
        assert_eq!(logger.level(), Severity::Debug);
    }

    #[test]
    fn test_set_invalid_level_keeps_previous() {
        let logger = logger();
        logger.set_level("warn").unwrap();

        let err = logger.set_level("bogus").unwrap_err();
        assert_eq!(err.level(), "bogus");
        assert_eq!(logger.level(), Severity::Warn);
    }

    #[test]
    #[traced_test]
    fn test_is_level_enabled_by_name() {
        let logger = logger();
        assert!(logger.is_level_enabled_by_name("warn"));
        assert!(!logger.is_level_enabled_by_name("debug"));
        assert!(!logger.is_level_enabled_by_name("bogus"));
        assert!(logs_contain("Tried to check invalid log level bogus"));
    }

    #[test]
    fn test_disabled_level_does_not_append() {
        let logger = logger();
        logger.http("h", Attributes::new());
        logger.verbose("v", Attributes::new());
        logger.debug("d", Attributes::new());
        logger.silly("s", Attributes::new());
        assert_eq!(logger.buffered(), 0);

        logger.info("i", Attributes::new());
        assert_eq!(logger.buffered(), 1);
    }

    #[test]
    fn test_log_bypasses_threshold() {
        let logger = logger();
        logger.set_severity(Severity::Error);
        logger.log(Severity::Silly, json!("adapter"), Attributes::new());
        assert_eq!(logger.buffered(), 1);
    }

    #[test]
    fn test_message_is_truncated() {
        let logger = logger();
        logger.info("x".repeat(4096), Attributes::new());

        let batch = logger.inner.buffer.take_all();
        let message = batch.records()[0].message().as_str().unwrap();
        assert_eq!(message.len(), 1024);
        assert!(message.ends_with("..."));
    }

    #[test]
    fn test_non_string_message_is_kept() {
        let logger = logger();
        logger.info(json!({"order": 42}), Attributes::new());

        let batch = logger.inner.buffer.take_all();
        assert_eq!(batch.records()[0].message(), &json!({"order": 42}));
    }

    #[test]
    fn test_linking_metadata_is_merged() {
        let provider = || {
            let mut attributes = Attributes::new();
            attributes.insert("trace.id".to_string(), json!("abc"));
            attributes.insert("entity.name".to_string(), json!("checkout"));
            attributes
        };
        let logger = Logger::with_linking_metadata(test_config(), Arc::new(provider)).unwrap();

        let mut attributes = Attributes::new();
        attributes.insert("entity.name".to_string(), json!("caller"));
        attributes.insert("user".to_string(), json!("u1"));
        logger.info("hello", attributes);

        let batch = logger.inner.buffer.take_all();
        let attributes = batch.records()[0].attributes();
        assert_eq!(attributes["trace.id"], json!("abc"));
        assert_eq!(attributes["entity.name"], json!("checkout"));
        assert_eq!(attributes["user"], json!("u1"));
    }

    #[test]
    fn test_harvest_outside_runtime_is_rejected() {
        let config = LoggerConfig {
            harvest: true,
            ..test_config()
        };
        assert!(matches!(Logger::new(config), Err(ConfigError::NoRuntime)));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = LoggerConfig {
            timeout: Duration::ZERO,
            ..test_config()
        };
        assert!(matches!(
            Logger::new(config),
            Err(ConfigError::InvalidConfig(_))
        ));
    }

    #[tokio::test]
    async fn test_flush_empty_buffer() {
        // Nothing listens on the endpoint, so any request would fail.
        assert!(logger().flush().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_shutdown_runs_once() {
        let logger = logger();
        assert!(!logger.is_shut_down());

        assert!(logger.shutdown().await.unwrap().is_none());
        assert!(logger.is_shut_down());

        logger.info("after shutdown", Attributes::new());
        assert!(logger.shutdown().await.unwrap().is_none());
        assert_eq!(logger.buffered(), 1);
    }

    #[tokio::test]
    async fn test_shutdown_stops_timer() {
        let config = LoggerConfig {
            harvest: true,
            harvest_interval: Duration::from_secs(3600),
            ..test_config()
        };
        let logger = Logger::new(config).unwrap();
        assert!(!logger.inner.cancel_token.is_cancelled());

        let _ = logger.shutdown().await;
        assert!(logger.inner.cancel_token.is_cancelled());
    }

    #[tokio::test]
    async fn test_dropping_last_clone_stops_timer() {
        let config = LoggerConfig {
            harvest: true,
            harvest_interval: Duration::from_secs(3600),
            ..test_config()
        };
        let logger = Logger::new(config).unwrap();
        let token = logger.inner.cancel_token.clone();
        let clone = logger.clone();

        drop(logger);
        assert!(!token.is_cancelled());
        drop(clone);
        assert!(token.is_cancelled());
    }

    #[test]
    #[traced_test]
    fn test_dropping_last_clone_runs_final_harvest() {
        let logger = logger();
        let clone = logger.clone();
        logger.info("pending", Attributes::new());

        drop(logger);
        assert!(!clone.is_shut_down());
        assert_eq!(clone.buffered(), 1);

        // Nothing listens on the endpoint: the attempt is made and fails.
        drop(clone);
        assert!(logs_contain("Dropping 1 log records"));
    }

    #[test]
    #[traced_test]
    fn test_dropping_shut_down_logger_does_not_harvest_again() {
        let logger = logger();
        drop(logger.shutdown_guard());
        logger.info("after shutdown", Attributes::new());

        drop(logger);
        assert!(!logs_contain("Dropping 1 log records"));
    }

    #[test]
    #[serial]
    #[traced_test]
    fn test_missing_license_key_discards() {
        std::env::remove_var(crate::constants::LICENSE_KEY_ENV_VAR);
        let config = LoggerConfig {
            license_key: None,
            ..test_config()
        };
        let logger = Logger::new(config).unwrap();
        assert!(logs_contain("Logs will not be sent"));

        logger.info("nowhere", Attributes::new());
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        assert!(runtime.block_on(logger.flush()).unwrap().is_none());
        assert_eq!(logger.buffered(), 0);
    }

    #[test]
    fn test_guard_outside_runtime_marks_shut_down() {
        let logger = logger();
        drop(logger.shutdown_guard());
        assert!(logger.is_shut_down());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_guard_on_multi_thread_runtime() {
        let logger = logger();
        {
            let _guard = logger.shutdown_guard();
        }
        assert!(logger.is_shut_down());
    }

    #[tokio::test]
    async fn test_explicit_guard_shutdown() {
        let logger = logger();
        let guard = logger.shutdown_guard();
        assert!(guard.shutdown().await.unwrap().is_none());
        assert!(logger.is_shut_down());
    }
}
