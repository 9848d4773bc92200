// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Bridge from the [`log`] facade.
//!
//! Installing a [`LogBridge`] as the global logger routes every `log::info!`
//! and friends into a sink. The global max level set at install time does the
//! filtering; the sink's own threshold is not consulted.

use log::{LevelFilter, Metadata, Record, SetLoggerError};
use serde_json::Value;

use crate::logger::Logger;
use crate::record::Attributes;
use crate::severity::Severity;
use crate::sink::LogSink;

/// Targets never forwarded. Delivering a batch logs through these crates, so
/// forwarding them would feed the shipper its own traffic.
const IGNORED_TARGETS: [&str; 6] = [
    "newrelic_log_shipper",
    "reqwest",
    "hyper",
    "hyper_util",
    "h2",
    "rustls",
];

pub struct LogBridge<S = Logger> {
    sink: S,
}

impl<S> LogBridge<S>
where
    S: LogSink + Send + Sync + 'static,
{
    pub fn new(sink: S) -> Self {
        Self { sink }
    }

    /// Installs the bridge as the global `log` logger.
    ///
    /// Fails if another logger was installed first.
    pub fn install(self, max_level: LevelFilter) -> Result<(), SetLoggerError> {
        log::set_boxed_logger(Box::new(self))?;
        log::set_max_level(max_level);
        Ok(())
    }
}

impl<S> log::Log for LogBridge<S>
where
    S: LogSink + Send + Sync,
{
    fn enabled(&self, metadata: &Metadata) -> bool {
        let target = metadata.target();
        !IGNORED_TARGETS.iter().any(|ignored| {
            target
                .strip_prefix(ignored)
                .is_some_and(|rest| rest.is_empty() || rest.starts_with("::"))
        })
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let mut attributes = Attributes::new();
        attributes.insert(
            "logger.name".to_string(),
            Value::String(record.target().to_string()),
        );
        self.sink.log(
            Severity::from(record.level()),
            Value::String(record.args().to_string()),
            attributes,
        );
    }

    // Delivery is driven by the harvest cycle.
    fn flush(&self) {}
}
