// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Log records as they sit in the buffer, and the attributes that enrich
//! `error` records.

use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::Value;

use crate::constants::{GENERIC_ERROR_CLASS, NO_STACK_TRACE};
use crate::severity::Severity;
use crate::truncate::truncate;

/// Key/value metadata attached to a record or to a whole batch.
pub type Attributes = serde_json::Map<String, Value>;

/// A single buffered log record. Immutable once created.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    timestamp: i64,
    level: Severity,
    message: Value,
    attributes: Attributes,
}

impl LogRecord {
    /// Creates a record stamped with the current time.
    #[must_use]
    pub fn new(level: Severity, message: Value, attributes: Attributes) -> Self {
        Self::with_timestamp(now_millis(), level, message, attributes)
    }

    #[must_use]
    pub fn with_timestamp(
        timestamp: i64,
        level: Severity,
        message: Value,
        attributes: Attributes,
    ) -> Self {
        Self {
            timestamp,
            level,
            message,
            attributes,
        }
    }

    /// Milliseconds since the Unix epoch at which the record was created.
    #[must_use]
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    #[must_use]
    pub fn level(&self) -> Severity {
        self.level
    }

    /// The message, usually a string. Other JSON values are stringified on
    /// the wire.
    #[must_use]
    pub fn message(&self) -> &Value {
        &self.message
    }

    #[must_use]
    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }
}

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or_default()
}

/// Description of an error attached to an `error` record.
///
/// Build one explicitly, or from any [`std::error::Error`]:
///
/// ```
/// use newrelic_log_shipper::ErrorDetails;
///
/// let io = std::io::Error::new(std::io::ErrorKind::Other, "disk on fire");
/// let details = ErrorDetails::from_error(&io);
/// assert_eq!(details.message(), "disk on fire");
/// assert_eq!(details.class(), "Error");
///
/// let custom = ErrorDetails::new("boom").with_class("TimeoutError");
/// assert_eq!(custom.class(), "TimeoutError");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorDetails {
    message: String,
    class: Option<String>,
    stack: Option<String>,
}

impl ErrorDetails {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            class: None,
            stack: None,
        }
    }

    /// Overrides the kind name reported as `error.class`.
    #[must_use]
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }

    /// Sets the stack text reported as `error.stack`, e.g. a captured
    /// [`std::backtrace::Backtrace`].
    #[must_use]
    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    /// Describes `err` using its `Display` text, its concrete type name and
    /// its `source()` chain as the stack.
    ///
    /// Trait objects carry no concrete type name and report the generic
    /// `"Error"` class.
    #[must_use]
    pub fn from_error<E>(err: &E) -> Self
    where
        E: std::error::Error + ?Sized,
    {
        let mut causes = Vec::new();
        let mut source = err.source();
        while let Some(cause) = source {
            causes.push(format!("caused by: {cause}"));
            source = cause.source();
        }

        Self {
            message: err.to_string(),
            class: short_type_name(std::any::type_name::<E>()).map(str::to_string),
            stack: (!causes.is_empty()).then(|| causes.join("\n")),
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Kind name, falling back to `"Error"`.
    #[must_use]
    pub fn class(&self) -> &str {
        match self.class.as_deref() {
            Some(class) if !class.is_empty() => class,
            _ => GENERIC_ERROR_CLASS,
        }
    }

    #[must_use]
    pub fn stack(&self) -> Option<&str> {
        self.stack.as_deref()
    }

    /// Writes the four `exception` / `error.*` attributes into `attributes`.
    pub(crate) fn enrich(&self, attributes: &mut Attributes) {
        attributes.insert("exception".to_string(), Value::Bool(true));
        attributes.insert(
            "error.message".to_string(),
            Value::String(truncate(&self.message).into_owned()),
        );
        attributes.insert(
            "error.class".to_string(),
            Value::String(self.class().to_string()),
        );
        let stack = match self.stack.as_deref() {
            Some(stack) => truncate(stack).into_owned(),
            None => NO_STACK_TRACE.to_string(),
        };
        attributes.insert("error.stack".to_string(), Value::String(stack));
    }
}

impl<E> From<&E> for ErrorDetails
where
    E: std::error::Error + ?Sized,
{
    fn from(err: &E) -> Self {
        Self::from_error(err)
    }
}

/// Last path segment of a type name, without generic arguments.
fn short_type_name(full: &str) -> Option<&str> {
    if full.starts_with("dyn ") || full.starts_with('&') || full.starts_with('(') {
        return None;
    }
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().filter(|name| !name.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fmt;

    #[derive(Debug)]
    struct ConnectionReset {
        source: std::io::Error,
    }

    impl fmt::Display for ConnectionReset {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "connection reset")
        }
    }

    impl std::error::Error for ConnectionReset {
        fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
            Some(&self.source)
        }
    }

    #[test]
    fn test_new_record_is_timestamped_now() {
        let before = now_millis();
        let record = LogRecord::new(Severity::Info, json!("hi"), Attributes::new());
        let after = now_millis();
        assert!(record.timestamp() >= before && record.timestamp() <= after);
        assert_eq!(record.level(), Severity::Info);
        assert_eq!(record.message(), &json!("hi"));
    }

    #[test]
    fn test_from_error_uses_type_name_and_source_chain() {
        let err = ConnectionReset {
            source: std::io::Error::new(std::io::ErrorKind::Other, "peer went away"),
        };
        let details = ErrorDetails::from_error(&err);
        assert_eq!(details.message(), "connection reset");
        assert_eq!(details.class(), "ConnectionReset");
        assert_eq!(details.stack(), Some("caused by: peer went away"));
    }

    #[test]
    fn test_from_trait_object_falls_back_to_generic_class() {
        let err: Box<dyn std::error::Error> = "plain".into();
        let details = ErrorDetails::from_error(err.as_ref());
        assert_eq!(details.class(), GENERIC_ERROR_CLASS);
        assert_eq!(details.stack(), None);
    }

    #[test]
    fn test_empty_class_falls_back_to_generic_class() {
        assert_eq!(ErrorDetails::new("x").with_class("").class(), "Error");
    }

    #[test]
    fn test_enrich_inserts_error_attributes() {
        let details = ErrorDetails::new("boom")
            .with_class("Error")
            .with_stack("at main (app.rs:1)");
        let mut attributes = Attributes::new();
        details.enrich(&mut attributes);

        assert_eq!(attributes["exception"], json!(true));
        assert_eq!(attributes["error.message"], json!("boom"));
        assert_eq!(attributes["error.class"], json!("Error"));
        assert_eq!(attributes["error.stack"], json!("at main (app.rs:1)"));
    }

    #[test]
    fn test_enrich_without_stack_uses_placeholder() {
        let mut attributes = Attributes::new();
        ErrorDetails::new("boom").enrich(&mut attributes);
        assert_eq!(attributes["error.stack"], json!(NO_STACK_TRACE));
    }

    #[test]
    fn test_enrich_truncates_message_and_stack() {
        let details = ErrorDetails::new("m".repeat(5000)).with_stack("s".repeat(5000));
        let mut attributes = Attributes::new();
        details.enrich(&mut attributes);

        let message = attributes["error.message"].as_str().unwrap();
        let stack = attributes["error.stack"].as_str().unwrap();
        assert_eq!(message.len(), 1024);
        assert_eq!(stack.len(), 1024);
        assert!(message.ends_with("..."));
        assert!(stack.ends_with("..."));
    }

    #[test]
    fn test_short_type_name() {
        assert_eq!(short_type_name("std::io::error::Error"), Some("Error"));
        assert_eq!(short_type_name("app::Wrapper<alloc::string::String>"), Some("Wrapper"));
        assert_eq!(short_type_name("dyn core::error::Error"), None);
        assert_eq!(short_type_name("Plain"), Some("Plain"));
    }
}
