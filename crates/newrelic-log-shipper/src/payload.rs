// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! JSON body of a Log API request.
//!
//! A batch is sent as a one-element array holding the common attributes and
//! one entry per record:
//!
//! ```json
//! [
//!   {
//!     "common": { "attributes": { "app": "checkout" } },
//!     "logs": [
//!       { "timestamp": 1700000000000, "message": "a", "attributes": { "log_level": "info" } },
//!       { "timestamp": 1700000000001, "message": "b", "attributes": { "log_level": "warn", "x": 1 } }
//!     ]
//!   }
//! ]
//! ```

use std::borrow::Cow;

use serde::Serialize;
use serde_json::Value;

use crate::buffer::Batch;
use crate::record::{Attributes, LogRecord};

#[derive(Serialize)]
struct Envelope<'a> {
    common: Common<'a>,
    logs: Vec<WireLog<'a>>,
}

#[derive(Serialize)]
struct Common<'a> {
    attributes: &'a Attributes,
}

#[derive(Serialize)]
struct WireLog<'a> {
    timestamp: i64,
    message: Cow<'a, str>,
    attributes: Attributes,
}

impl<'a> From<&'a LogRecord> for WireLog<'a> {
    fn from(record: &'a LogRecord) -> Self {
        let message = match record.message() {
            Value::String(s) => Cow::Borrowed(s.as_str()),
            other => Cow::Owned(other.to_string()),
        };

        // Record attributes are applied last and win over `log_level`.
        let mut attributes = Attributes::new();
        attributes.insert(
            "log_level".to_string(),
            Value::String(record.level().as_str().to_string()),
        );
        attributes.extend(
            record
                .attributes()
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );

        WireLog {
            timestamp: record.timestamp(),
            message,
            attributes,
        }
    }
}

/// Serializes `batch` into the uncompressed request body.
pub fn serialize(common_attributes: &Attributes, batch: &Batch) -> Result<Vec<u8>, serde_json::Error> {
    let envelope = Envelope {
        common: Common {
            attributes: common_attributes,
        },
        logs: batch.iter().map(WireLog::from).collect(),
    };
    serde_json::to_vec(&[envelope])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::severity::Severity;
    use serde_json::json;

    fn attrs(value: Value) -> Attributes {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    #[test]
    fn test_serialize_envelope_shape() {
        let batch = Batch::from(vec![
            LogRecord::with_timestamp(1, Severity::Info, json!("a"), Attributes::new()),
            LogRecord::with_timestamp(2, Severity::Warn, json!("b"), attrs(json!({"x": 1}))),
        ]);
        let common = attrs(json!({"app": "test", "env": "development"}));

        let body: Value = serde_json::from_slice(&serialize(&common, &batch).unwrap()).unwrap();

        assert_eq!(
            body,
            json!([{
                "common": {"attributes": {"app": "test", "env": "development"}},
                "logs": [
                    {"timestamp": 1, "message": "a", "attributes": {"log_level": "info"}},
                    {"timestamp": 2, "message": "b", "attributes": {"log_level": "warn", "x": 1}}
                ]
            }])
        );
    }

    #[test]
    fn test_non_string_message_is_stringified() {
        let batch = Batch::from(vec![LogRecord::with_timestamp(
            1,
            Severity::Info,
            json!({"order": 42}),
            Attributes::new(),
        )]);

        let body: Value =
            serde_json::from_slice(&serialize(&Attributes::new(), &batch).unwrap()).unwrap();
        assert_eq!(body[0]["logs"][0]["message"], json!(r#"{"order":42}"#));
    }

    #[test]
    fn test_record_attribute_overrides_log_level() {
        let batch = Batch::from(vec![LogRecord::with_timestamp(
            1,
            Severity::Info,
            json!("a"),
            attrs(json!({"log_level": "custom"})),
        )]);

        let body: Value =
            serde_json::from_slice(&serialize(&Attributes::new(), &batch).unwrap()).unwrap();
        assert_eq!(body[0]["logs"][0]["attributes"]["log_level"], json!("custom"));
    }

    #[test]
    fn test_empty_batch_serializes_empty_logs() {
        let body: Value =
            serde_json::from_slice(&serialize(&Attributes::new(), &Batch::default()).unwrap())
                .unwrap();
        assert_eq!(body, json!([{"common": {"attributes": {}}, "logs": []}]));
    }
}
