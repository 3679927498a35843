// Copyright 2026 TagSense Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! In-memory record store for the current session.
//!
//! Ordered and append-only: insertion order is arrival order. The poll worker
//! is the only appender; selection flags are point mutations from the
//! presentation side. One lock guards the sequence against that interleaving.
//!
//! The store is shared by `Arc` and survives foreground/background
//! transitions by reference; nothing is reloaded from disk.

use parking_lot::Mutex;
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

use crate::events::ReaderEvent;
use crate::record::Record;

#[derive(Debug, Default)]
struct StoreInner {
    records: Vec<Record>,
    /// Index range appended during the most recent poll run.
    session_start: usize,
    session_end: usize,
}

/// Ordered in-memory collection of decoded records.
pub struct RecordStore {
    inner: Mutex<StoreInner>,
    notifier: Option<UnboundedSender<ReaderEvent>>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(StoreInner::default()),
            notifier: None,
        }
    }

    /// A store that reports every mutation over the event channel.
    pub fn with_notifier(notifier: UnboundedSender<ReaderEvent>) -> Self {
        Self {
            inner: Mutex::new(StoreInner::default()),
            notifier: Some(notifier),
        }
    }

    fn notify(&self, event: ReaderEvent) {
        if let Some(tx) = &self.notifier {
            let _ = tx.send(event);
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().records.is_empty()
    }

    /// Clone of the full contents, for the presentation layer.
    pub fn snapshot(&self) -> Vec<Record> {
        self.inner.lock().records.clone()
    }

    /// Append a record, returning its index.
    pub fn append(&self, record: Record) -> usize {
        let index = {
            let mut inner = self.inner.lock();
            inner.records.push(record);
            inner.records.len() - 1
        };
        self.notify(ReaderEvent::StoreChanged);
        index
    }

    /// Mark the start of a poll run: the session window opens at the current
    /// end of the store.
    pub fn begin_session(&self) {
        let mut inner = self.inner.lock();
        inner.session_start = inner.records.len();
        inner.session_end = inner.session_start;
    }

    /// Close the session window at the current end of the store.
    pub fn end_session(&self) {
        let mut inner = self.inner.lock();
        inner.session_end = inner.records.len();
    }

    /// The `[start, end)` index range appended during the last poll run.
    pub fn session_window(&self) -> (usize, usize) {
        let inner = self.inner.lock();
        (inner.session_start, inner.session_end)
    }

    /// Set the selection flag for one record. Returns false when the index
    /// is out of range.
    pub fn set_selected(&self, index: usize, selected: bool) -> bool {
        let updated = {
            let mut inner = self.inner.lock();
            match inner.records.get_mut(index) {
                Some(record) => {
                    record.selected = selected;
                    true
                }
                None => false,
            }
        };
        if updated {
            self.notify(ReaderEvent::StoreChanged);
        }
        updated
    }

    /// Select every not-yet-selected record in the last session window.
    pub fn select_last_session(&self) {
        {
            let mut inner = self.inner.lock();
            let (start, end) = (inner.session_start, inner.session_end);
            for record in &mut inner.records[start..end] {
                if !record.selected {
                    record.selected = true;
                }
            }
        }
        self.notify(ReaderEvent::StoreChanged);
    }

    /// Collect clones of all selected records in store order, then clear
    /// every selection flag.
    pub fn take_selected(&self) -> Vec<Record> {
        let selected = {
            let mut inner = self.inner.lock();
            let selected: Vec<Record> = inner
                .records
                .iter()
                .filter(|record| record.selected)
                .cloned()
                .collect();
            for record in &mut inner.records {
                record.selected = false;
            }
            selected
        };
        debug!("{} records collected for export", selected.len());
        self.notify(ReaderEvent::StoreChanged);
        selected
    }

    /// Remove everything. The session window collapses to empty.
    pub fn clear(&self) {
        let removed = {
            let mut inner = self.inner.lock();
            let removed = inner.records.len();
            inner.records.clear();
            inner.session_start = 0;
            inner.session_end = 0;
            removed
        };
        if removed > 0 {
            self.notify(ReaderEvent::RangeRemoved {
                start: 0,
                len: removed,
            });
        }
    }
}

impl Default for RecordStore {
    fn default() -> Self {
        Self::new()
    }
}
