//! Integration tests for the polling and export flow.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use tagsense_desktop::archive::{export_selected, FileArchive};
use tagsense_desktop::events::ReaderEvent;
use tagsense_desktop::nfc::{ndef, LinkError, PollController, TagLink, TagTransport};
use tagsense_desktop::record;
use tagsense_desktop::store::RecordStore;

const WIRE_LINE: &str =
    "V:1.05 R:1234.5 adc_1[V]:0.452 adc_4[V]:0.631 VDS[V]:0.82 I[pA]:415 I native:27£";

/// Tag that is never in range.
struct OutOfRangeTag;

impl TagTransport for OutOfRangeTag {
    fn backend_name(&self) -> &'static str {
        "out-of-range"
    }

    fn connect(&mut self) -> Result<(), LinkError> {
        Err(LinkError::Unavailable)
    }

    fn read_message(&mut self) -> Result<Option<Vec<u8>>, LinkError> {
        Ok(None)
    }

    fn close(&mut self) {}
}

/// Tag that delivers one message, then fails hard.
struct OneShotTag {
    delivered: bool,
}

impl TagTransport for OneShotTag {
    fn backend_name(&self) -> &'static str {
        "one-shot"
    }

    fn connect(&mut self) -> Result<(), LinkError> {
        Ok(())
    }

    fn read_message(&mut self) -> Result<Option<Vec<u8>>, LinkError> {
        if self.delivered {
            return Err(LinkError::Transport("field decayed".into()));
        }
        self.delivered = true;
        Ok(Some(ndef::encode_text_payload(WIRE_LINE, "en")))
    }

    fn close(&mut self) {}
}

/// Tag that records whether it was closed.
struct CloseProbeTag {
    closed: Arc<AtomicBool>,
}

impl TagTransport for CloseProbeTag {
    fn backend_name(&self) -> &'static str {
        "close-probe"
    }

    fn connect(&mut self) -> Result<(), LinkError> {
        Ok(())
    }

    fn read_message(&mut self) -> Result<Option<Vec<u8>>, LinkError> {
        Ok(None)
    }

    fn close(&mut self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

async fn wait_until_stopped(controller: &PollController) -> bool {
    for _ in 0..200 {
        if !controller.is_running() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

#[tokio::test]
async fn test_out_of_range_tag_never_appends_and_never_self_stops() {
    let store = Arc::new(RecordStore::new());
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<ReaderEvent>();

    let mut controller = PollController::new(store.clone(), event_tx);
    controller.set_cadence_ms(5);
    controller.set_link(TagLink::discovered(Box::new(OutOfRangeTag))).await;
    controller.start();

    // Plenty of cadence ticks, every one of them a miss.
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert!(controller.is_running());
    assert!(store.is_empty());

    // Only an external stop request ends the run.
    controller.stop().await;
    assert!(!controller.is_running());
    assert!(store.is_empty());

    let mut finished = false;
    while let Ok(event) = event_rx.try_recv() {
        if let ReaderEvent::SessionFinished { appended } = event {
            assert_eq!(appended, 0);
            finished = true;
        }
    }
    assert!(finished);
}

#[tokio::test]
async fn test_transport_fault_stops_loop_after_one_record() {
    let store = Arc::new(RecordStore::new());
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<ReaderEvent>();

    let mut controller = PollController::new(store.clone(), event_tx);
    controller.set_cadence_ms(5);
    controller
        .set_link(TagLink::discovered(Box::new(OneShotTag { delivered: false })))
        .await;
    controller.start();

    assert!(wait_until_stopped(&controller).await);
    assert_eq!(store.len(), 1);

    let record = &store.snapshot()[0];
    assert_eq!(record.firmware_version, "1.05");
    assert_eq!(record.ipa, 415);

    let mut link_lost = false;
    while let Ok(event) = event_rx.try_recv() {
        if matches!(event, ReaderEvent::LinkLost(_)) {
            link_lost = true;
        }
    }
    assert!(link_lost);
}

#[tokio::test]
async fn test_new_discovery_supersedes_previous_link() {
    let store = Arc::new(RecordStore::new());
    let (event_tx, _event_rx) = mpsc::unbounded_channel::<ReaderEvent>();

    let closed = Arc::new(AtomicBool::new(false));
    let mut controller = PollController::new(store, event_tx);
    controller
        .set_link(TagLink::discovered(Box::new(CloseProbeTag {
            closed: closed.clone(),
        })))
        .await;

    controller.set_link(TagLink::discovered(Box::new(OutOfRangeTag))).await;
    assert!(closed.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_poll_then_select_and_export_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let archive = FileArchive::new(dir.path()).unwrap();
    let store = Arc::new(RecordStore::new());
    let (event_tx, _event_rx) = mpsc::unbounded_channel::<ReaderEvent>();

    // Two records predate the poll run.
    for _ in 0..2 {
        store.append(record::decode_line(WIRE_LINE).unwrap());
    }

    let mut controller = PollController::new(store.clone(), event_tx);
    controller.set_cadence_ms(5);
    controller
        .set_link(TagLink::discovered(Box::new(OneShotTag { delivered: false })))
        .await;
    controller.start();
    assert!(wait_until_stopped(&controller).await);

    assert_eq!(store.len(), 3);
    assert_eq!(store.session_window(), (2, 3));

    store.select_last_session();
    let path = export_selected(&store, &archive).unwrap();
    assert!(path.ends_with("test1.csv"));

    // Only the last-session record was exported, and it reads back intact.
    let restored = archive.read_records("test1.csv").unwrap();
    assert_eq!(restored.len(), 1);
    assert_eq!(restored[0].firmware_version, "1.05");
    assert_eq!(restored[0].resistance, 1234.5);
    assert_eq!(restored[0].native_value, 27);

    // A second export of the same selection lands in the next free name.
    store.select_last_session();
    let path = export_selected(&store, &archive).unwrap();
    assert!(path.ends_with("test2.csv"));
}
