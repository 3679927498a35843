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

//! Event processing and presentation dispatch.
//!
//! The poll worker and the record store emit [`ReaderEvent`]s over a channel;
//! a single consumer applies them to the shared state and drives the
//! presentation refresh on its own scheduling domain. The worker never
//! touches presentation structures directly.

use std::sync::Arc;
use tracing::{debug, error, info};

use crate::record::Record;
use crate::state::{ReaderState, ReaderStatus};
use crate::store::RecordStore;

/// Events emitted by the reader core.
#[derive(Debug)]
pub enum ReaderEvent {
    /// A poll run started.
    SessionStarted,
    /// A record was appended to the store.
    RecordAppended { index: usize },
    /// The link was permanently lost; the poll run stopped itself.
    LinkLost(String),
    /// A poll run finished, by stop request or link loss.
    SessionFinished { appended: usize },
    /// Store contents or selection flags changed.
    StoreChanged,
    /// A contiguous range was removed from the store (explicit clear).
    RangeRemoved { start: usize, len: usize },
}

/// Seam to the rendering layer.
///
/// The core guarantees only "something changed"; the presenter re-reads the
/// full snapshot it is handed.
pub trait Presenter: Send {
    /// Re-render the record list.
    fn refresh(&self, records: &[Record]);

    /// Reflect a status change.
    fn status_changed(&self, status: ReaderStatus);
}

/// Presenter that just logs. Stands in when no UI is attached.
pub struct LogPresenter;

impl Presenter for LogPresenter {
    fn refresh(&self, records: &[Record]) {
        debug!("record list refreshed: {} records", records.len());
    }

    fn status_changed(&self, status: ReaderStatus) {
        info!("status: {}", status.as_str());
    }
}

/// Consumes reader events, updating state and presentation.
pub struct EventProcessor {
    presenter: Box<dyn Presenter>,
    state: Arc<ReaderState>,
    store: Arc<RecordStore>,
}

impl EventProcessor {
    pub fn new(
        presenter: Box<dyn Presenter>,
        state: Arc<ReaderState>,
        store: Arc<RecordStore>,
    ) -> Self {
        Self {
            presenter,
            state,
            store,
        }
    }

    /// Apply a single event.
    pub fn process_event(&mut self, event: ReaderEvent) {
        match event {
            ReaderEvent::SessionStarted => {
                self.state.set_status(ReaderStatus::Reading);
                self.presenter.status_changed(ReaderStatus::Reading);
            }
            ReaderEvent::RecordAppended { index } => {
                debug!("record appended at index {}", index);
            }
            ReaderEvent::LinkLost(reason) => {
                error!("link lost: {}", reason);
                self.state.set_error(reason);
                self.presenter.status_changed(ReaderStatus::TagGone);
            }
            ReaderEvent::SessionFinished { appended } => {
                info!("poll run finished, {} records appended", appended);
                if self.state.get_status() == ReaderStatus::Reading {
                    self.state.set_status(ReaderStatus::TagGone);
                    self.presenter.status_changed(ReaderStatus::TagGone);
                }
                self.presenter.refresh(&self.store.snapshot());
            }
            ReaderEvent::StoreChanged => {
                self.presenter.refresh(&self.store.snapshot());
            }
            ReaderEvent::RangeRemoved { start, len } => {
                debug!("range removed: [{}, {})", start, start + len);
                self.presenter.refresh(&self.store.snapshot());
            }
        }
    }
}
