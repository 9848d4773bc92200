// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Harvest cycles: take everything buffered and hand it to the flusher.
//!
//! A harvest is triggered three ways, all running [`Harvester::harvest`]:
//!
//! - the periodic timer started by [`Harvester::spawn_periodic`],
//! - a manual [`crate::Logger::flush`],
//! - the one-shot [`crate::Logger::shutdown`].
//!
//! Harvests are not serialized against each other. Each one takes its own
//! disjoint batch, so two deliveries may be in flight at once and complete in
//! any order.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::buffer::RecordBuffer;
use crate::error::{ConfigError, DeliveryError};
use crate::flusher::{Ack, Flusher};

#[derive(Debug, Clone)]
pub struct Harvester {
    buffer: Arc<RecordBuffer>,
    /// `None` when no license key is available; harvests then discard.
    flusher: Option<Flusher>,
    debug: bool,
}

impl Harvester {
    #[must_use]
    pub fn new(buffer: Arc<RecordBuffer>, flusher: Option<Flusher>, debug: bool) -> Self {
        Self {
            buffer,
            flusher,
            debug,
        }
    }

    /// Runs one harvest.
    ///
    /// Returns `Ok(None)` without touching the network when there was nothing
    /// to send. The buffer is emptied before the request starts.
    pub async fn harvest(&self) -> Result<Option<Ack>, DeliveryError> {
        let batch = self.buffer.take_all();
        if batch.is_empty() {
            if self.debug {
                debug!("LOGS | No log records to send");
            }
            return Ok(None);
        }

        let Some(flusher) = &self.flusher else {
            debug!(
                "LOGS | No license key, discarding {} log records",
                batch.len()
            );
            return Ok(None);
        };

        if self.debug {
            debug!("LOGS | Sending {} log records", batch.len());
        }
        flusher.deliver(batch).await.map(Some)
    }

    /// A copy whose flusher opens its own connections, for harvests run on a
    /// runtime other than the one the buffer's owner lives on.
    pub(crate) fn detached(&self) -> Self {
        let flusher = self.flusher.as_ref().map(|flusher| {
            flusher.with_fresh_client().unwrap_or_else(|e| {
                warn!("LOGS | Reusing the existing HTTP client: {e}");
                flusher.clone()
            })
        });
        Self {
            flusher,
            ..self.clone()
        }
    }

    /// Starts the periodic harvest on the current runtime.
    ///
    /// The first harvest happens one `period` after the call. Every tick spawns
    /// its own delivery so a slow endpoint never delays the next tick. The task
    /// ends when `cancel_token` is cancelled; it does not keep the runtime
    /// alive on its own. A zero `period` is rejected.
    pub fn spawn_periodic(
        &self,
        period: Duration,
        cancel_token: CancellationToken,
    ) -> Result<JoinHandle<()>, ConfigError> {
        if period.is_zero() {
            return Err(ConfigError::InvalidConfig(
                "harvest interval must be greater than 0".to_string(),
            ));
        }

        let harvester = self.clone();
        Ok(tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately.
            ticker.tick().await;

            loop {
                tokio::select! {
                    () = cancel_token.cancelled() => {
                        debug!("LOGS | Harvest timer stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        let harvester = harvester.clone();
                        // Failures are logged by the flusher.
                        tokio::spawn(async move {
                            let _ = harvester.harvest().await;
                        });
                    }
                }
            }
        }))
    }
}
