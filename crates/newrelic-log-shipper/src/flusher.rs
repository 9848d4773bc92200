// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Delivery of harvested batches to the New Relic Log API.
//!
//! # Request lifecycle
//!
//! ```text
//!   Batch
//!     │
//!     v
//!   ┌─────────────┐
//!   │  Serialize  │ (JSON, see `payload`)
//!   └──────┬──────┘
//!          v
//!   ┌─────────────┐
//!   │  Compress   │ (gzip)
//!   └──────┬──────┘
//!          v
//!   ┌─────────────┐
//!   │  HTTP POST  │ (X-License-Key, Content-Encoding: gzip)
//!   └──────┬──────┘
//!          v
//!   ┌─────────────┐
//!   │ 202 + ack?  │ (requestId in the body)
//!   └─────────────┘
//! ```
//!
//! There is exactly one attempt per batch. Any failure is logged as a warning
//! and returned; the batch is dropped either way.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use flate2::write::GzEncoder;
use flate2::Compression;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_ENCODING, CONTENT_TYPE};
use reqwest::StatusCode;
use serde_json::Value;
use tracing::{debug, warn};

use crate::buffer::Batch;
use crate::config::LoggerConfig;
use crate::error::{ConfigError, DeliveryError};
use crate::payload;
use crate::record::Attributes;

const LICENSE_KEY_HEADER: &str = "x-license-key";

/// Acknowledgment returned by the Log API for an accepted batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ack {
    request_id: String,
}

impl Ack {
    /// Identifier of the accepted request, useful when talking to support.
    #[must_use]
    pub fn request_id(&self) -> &str {
        &self.request_id
    }
}

/// Client for the Log API of one account and region.
#[derive(Debug, Clone)]
pub struct Flusher {
    client: reqwest::Client,
    timeout: Duration,
    endpoint: String,
    common_attributes: Arc<Attributes>,
    headers: HeaderMap,
}

impl Flusher {
    pub fn new(license_key: &str, config: &LoggerConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            client: build_client(config.timeout)?,
            timeout: config.timeout,
            endpoint: config.endpoint().to_string(),
            common_attributes: Arc::new(config.attributes.clone()),
            headers: build_headers(license_key)?,
        })
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Same target and headers, with a client that shares no pooled
    /// connections with this one. Needed when the runtime that opened those
    /// connections cannot make progress.
    pub(crate) fn with_fresh_client(&self) -> Result<Self, ConfigError> {
        Ok(Self {
            client: build_client(self.timeout)?,
            ..self.clone()
        })
    }

    /// Ships `batch` in a single request.
    ///
    /// Failures are logged here; callers only need the outcome.
    pub async fn deliver(&self, batch: Batch) -> Result<Ack, DeliveryError> {
        let count = batch.len();
        match self.send(batch).await {
            Ok(ack) => {
                debug!(
                    "LOGS | Delivered {count} log records, request id {}",
                    ack.request_id()
                );
                Ok(ack)
            }
            Err(e) => {
                warn!("LOGS | Dropping {count} log records: {e}");
                Err(e)
            }
        }
    }

    async fn send(&self, batch: Batch) -> Result<Ack, DeliveryError> {
        let body = payload::serialize(&self.common_attributes, &batch)
            .map_err(|e| DeliveryError::Payload(e.to_string()))?;
        drop(batch);
        let body = compress(&body).map_err(|e| DeliveryError::Payload(e.to_string()))?;

        let response = self
            .client
            .post(&self.endpoint)
            .headers(self.headers.clone())
            .body(body)
            .send()
            .await
            .map_err(DeliveryError::Transport)?;

        let status = response.status();
        if status != StatusCode::ACCEPTED {
            let body = response.text().await.unwrap_or_default();
            return Err(DeliveryError::UnexpectedStatus { status, body });
        }

        let body = response.bytes().await.map_err(DeliveryError::Transport)?;
        parse_ack(&body)
    }
}

fn build_client(timeout: Duration) -> Result<reqwest::Client, ConfigError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(ConfigError::HttpClient)
}

fn build_headers(license_key: &str) -> Result<HeaderMap, ConfigError> {
    let license_key = HeaderValue::from_str(license_key).map_err(|_| {
        ConfigError::InvalidConfig("license key contains characters not allowed in a header".to_string())
    })?;

    let mut headers = HeaderMap::new();
    headers.insert(HeaderName::from_static(LICENSE_KEY_HEADER), license_key);
    headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(CONTENT_ENCODING, HeaderValue::from_static("gzip"));
    Ok(headers)
}

pub(crate) fn compress(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

/// The body must be a JSON object with a non-empty string `requestId`.
fn parse_ack(body: &[u8]) -> Result<Ack, DeliveryError> {
    let value: Value =
        serde_json::from_slice(body).map_err(|e| DeliveryError::InvalidAck(e.to_string()))?;

    match value.get("requestId").and_then(Value::as_str) {
        Some(request_id) if !request_id.is_empty() => Ok(Ack {
            request_id: request_id.to_string(),
        }),
        _ => Err(DeliveryError::InvalidAck(
            "response has no requestId".to_string(),
        )),
    }
}
