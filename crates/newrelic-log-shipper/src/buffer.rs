// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! In-memory buffer of pending log records.
//!
//! Producers [`append`](RecordBuffer::append) records in call order; a harvest
//! [`take_all`](RecordBuffer::take_all)s them in one step. The lock is held
//! only for the push or for swapping the backing vector out, so neither
//! operation can be observed half-done: every record ends up in exactly one
//! batch.
//!
//! # Memory
//!
//! The buffer has no size cap. With harvesting disabled, or while deliveries
//! keep failing between harvests, it grows with every record logged.

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::record::LogRecord;

/// FIFO buffer shared by the logging path and the harvest path.
#[derive(Debug, Default)]
pub struct RecordBuffer {
    records: Mutex<Vec<LogRecord>>,
}

impl RecordBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a record after every record already buffered.
    pub fn append(&self, record: LogRecord) {
        self.lock().push(record);
    }

    /// Removes and returns everything buffered, oldest first.
    ///
    /// An empty buffer yields an empty batch.
    pub fn take_all(&self) -> Batch {
        let records = std::mem::take(&mut *self.lock());
        Batch { records }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // A panic while holding the lock cannot leave the vector half-modified,
    // so a poisoned lock is still safe to use.
    fn lock(&self) -> MutexGuard<'_, Vec<LogRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Ordered snapshot of the records taken by one harvest.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Batch {
    records: Vec<LogRecord>,
}

impl Batch {
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn records(&self) -> &[LogRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LogRecord> {
        self.records.iter()
    }
}

impl From<Vec<LogRecord>> for Batch {
    fn from(records: Vec<LogRecord>) -> Self {
        Self { records }
    }
}

impl IntoIterator for Batch {
    type Item = LogRecord;
    type IntoIter = std::vec::IntoIter<LogRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl<'a> IntoIterator for &'a Batch {
    type Item = &'a LogRecord;
    type IntoIter = std::slice::Iter<'a, LogRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
