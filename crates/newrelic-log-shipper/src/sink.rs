// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! The level-gated logging contract.
//!
//! A sink answers two questions: is a level enabled, and where does a record
//! go. The per-level methods (`error`, `warn`, ... `silly`) are built on top
//! of those, so code that logs can be written once against `impl LogSink` or
//! `Arc<dyn LogSink>` and handed whichever sink fits the call site.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use newrelic_log_shipper::{Attributes, LogSink};
//!
//! fn handle_request(sink: &Arc<dyn LogSink + Send + Sync>) {
//!     sink.info("request handled", Attributes::new());
//! }
//! ```

use std::sync::Arc;

use serde_json::Value;

use crate::record::{Attributes, ErrorDetails};
use crate::severity::Severity;

pub trait LogSink {
    /// Whether records at `level` are currently accepted.
    fn is_level_enabled(&self, level: Severity) -> bool;

    /// Records a message at `level` without consulting the threshold.
    fn log(&self, level: Severity, message: Value, attributes: Attributes);

    /// Records a message if `level` is enabled, and drops it otherwise.
    fn log_if_enabled(&self, level: Severity, message: Value, attributes: Attributes) {
        if self.is_level_enabled(level) {
            self.log(level, message, attributes);
        }
    }

    /// Logs at `error`. With `error` details the record also carries
    /// `exception`, `error.message`, `error.class` and `error.stack`.
    fn error(&self, message: impl Into<Value>, error: Option<ErrorDetails>, mut attributes: Attributes)
    where
        Self: Sized,
    {
        if self.is_level_enabled(Severity::Error) {
            if let Some(error) = error {
                error.enrich(&mut attributes);
            }
            self.log(Severity::Error, message.into(), attributes);
        }
    }

    fn warn(&self, message: impl Into<Value>, attributes: Attributes)
    where
        Self: Sized,
    {
        self.log_if_enabled(Severity::Warn, message.into(), attributes);
    }

    fn info(&self, message: impl Into<Value>, attributes: Attributes)
    where
        Self: Sized,
    {
        self.log_if_enabled(Severity::Info, message.into(), attributes);
    }

    fn http(&self, message: impl Into<Value>, attributes: Attributes)
    where
        Self: Sized,
    {
        self.log_if_enabled(Severity::Http, message.into(), attributes);
    }

    fn verbose(&self, message: impl Into<Value>, attributes: Attributes)
    where
        Self: Sized,
    {
        self.log_if_enabled(Severity::Verbose, message.into(), attributes);
    }

    fn debug(&self, message: impl Into<Value>, attributes: Attributes)
    where
        Self: Sized,
    {
        self.log_if_enabled(Severity::Debug, message.into(), attributes);
    }

    fn silly(&self, message: impl Into<Value>, attributes: Attributes)
    where
        Self: Sized,
    {
        self.log_if_enabled(Severity::Silly, message.into(), attributes);
    }
}

impl<S: LogSink + ?Sized> LogSink for &S {
    fn is_level_enabled(&self, level: Severity) -> bool {
        (**self).is_level_enabled(level)
    }

    fn log(&self, level: Severity, message: Value, attributes: Attributes) {
        (**self).log(level, message, attributes);
    }
}

impl<S: LogSink + ?Sized> LogSink for Arc<S> {
    fn is_level_enabled(&self, level: Severity) -> bool {
        (**self).is_level_enabled(level)
    }

    fn log(&self, level: Severity, message: Value, attributes: Attributes) {
        (**self).log(level, message, attributes);
    }
}
