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

//! Cadenced tag polling.
//!
//! One worker task per poll run: wait a cadence interval, connect if needed,
//! read one message, decode, append, release the link, repeat. Physical
//! misalignment is routine, so an out-of-range peer just means "nothing yet";
//! only a hard transport fault ends the run from the inside.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::link::{LinkError, TagLink};
use super::ndef;
use crate::events::ReaderEvent;
use crate::record;
use crate::store::RecordStore;

/// Default wait between poll attempts, in milliseconds.
pub const DEFAULT_CADENCE_MS: u64 = 3000;

/// Drives the poll loop against the currently discovered tag.
pub struct PollController {
    store: Arc<RecordStore>,
    events: UnboundedSender<ReaderEvent>,
    link: Arc<Mutex<Option<TagLink>>>,
    cadence_ms: u64,
    stop_tx: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl PollController {
    pub fn new(store: Arc<RecordStore>, events: UnboundedSender<ReaderEvent>) -> Self {
        let (stop_tx, _) = watch::channel(false);
        Self {
            store,
            events,
            link: Arc::new(Mutex::new(None)),
            cadence_ms: DEFAULT_CADENCE_MS,
            stop_tx,
            task: None,
        }
    }

    /// Cadence used by the next `start()`. Must be positive.
    pub fn set_cadence_ms(&mut self, cadence_ms: u64) {
        if cadence_ms > 0 {
            self.cadence_ms = cadence_ms;
        }
    }

    pub fn cadence_ms(&self) -> u64 {
        self.cadence_ms
    }

    /// Install a freshly discovered link, superseding the previous one.
    ///
    /// A running poll loop is stopped first so the old handle is not swapped
    /// out from under it; the superseded link gets its close attempt.
    pub async fn set_link(&mut self, link: TagLink) {
        self.stop().await;
        let mut guard = self.link.lock();
        if let Some(mut old) = guard.take() {
            debug!("superseding previous tag link");
            old.close();
        }
        *guard = Some(link);
    }

    /// True while a poll run is in flight.
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Start a poll run over the current link. No-op when one is already
    /// running or no tag has been discovered.
    pub fn start(&mut self) {
        if self.is_running() {
            debug!("poll loop already running");
            return;
        }
        if self.link.lock().is_none() {
            warn!("no tag discovered, not starting poll loop");
            return;
        }

        self.stop_tx.send_replace(false);
        let stop_rx = self.stop_tx.subscribe();
        let store = Arc::clone(&self.store);
        let link = Arc::clone(&self.link);
        let events = self.events.clone();
        let cadence = Duration::from_millis(self.cadence_ms);

        self.task = Some(tokio::spawn(run_loop(
            store, link, events, cadence, stop_rx,
        )));
    }

    /// Request a stop and wait for the loop to observe it. Cooperative: the
    /// flag is honored at iteration boundaries, never mid-read.
    pub async fn stop(&mut self) {
        self.stop_tx.send_replace(true);
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

async fn run_loop(
    store: Arc<RecordStore>,
    link: Arc<Mutex<Option<TagLink>>>,
    events: UnboundedSender<ReaderEvent>,
    cadence: Duration,
    mut stop_rx: watch::Receiver<bool>,
) {
    info!("poll loop started, cadence {:?}", cadence);
    store.begin_session();
    let _ = events.send(ReaderEvent::SessionStarted);

    let mut appended = 0usize;

    loop {
        if *stop_rx.borrow_and_update() {
            break;
        }

        // The cadence wait is the only suspension point; a stop request or a
        // forced close must unblock it promptly.
        tokio::select! {
            _ = tokio::time::sleep(cadence) => {}
            _ = stop_rx.changed() => {}
        }
        if *stop_rx.borrow_and_update() {
            break;
        }

        let mut guard = link.lock();
        let Some(tag) = guard.as_mut() else {
            break;
        };

        if !tag.is_connected() {
            match tag.connect() {
                Ok(()) => {}
                Err(LinkError::Unavailable) => {
                    debug!("tag out of range, retrying next tick");
                    continue;
                }
                Err(err) => {
                    warn!("connect failed hard: {}", err);
                    let _ = events.send(ReaderEvent::LinkLost(err.to_string()));
                    break;
                }
            }
        }

        match tag.read_message() {
            Ok(Some(payload)) => match decode_record(&payload) {
                Ok(decoded) => {
                    let index = store.append(decoded);
                    appended += 1;
                    let _ = events.send(ReaderEvent::RecordAppended { index });
                }
                Err(err) => {
                    warn!("dropping undecodable message: {}", err);
                }
            },
            Ok(None) => {
                debug!("no message yet");
            }
            Err(err) => {
                warn!("link read fault: {}", err);
                let _ = events.send(ReaderEvent::LinkLost(err.to_string()));
                break;
            }
        }

        // Each iteration hands the link back so the next one re-establishes
        // it fresh.
        tag.release();
    }

    store.end_session();
    let _ = events.send(ReaderEvent::SessionFinished { appended });
    info!("poll loop finished, {} records appended", appended);
}

fn decode_record(payload: &[u8]) -> Result<record::Record, record::CodecError> {
    let text = ndef::decode_payload(payload)?;
    record::decode_line(&text)
}
