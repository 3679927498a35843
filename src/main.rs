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

//! TagSense Desktop Application

use anyhow::Result;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tagsense_desktop::archive::FileArchive;
use tagsense_desktop::config::Config;
use tagsense_desktop::events::{EventProcessor, LogPresenter, ReaderEvent};
use tagsense_desktop::nfc::{PollController, SimTransport, TagLink};
use tagsense_desktop::state::{ReaderState, ReaderStatus};
use tagsense_desktop::store::RecordStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("tagsense_desktop=info".parse()?),
        )
        .init();

    info!(
        "Starting TagSense Desktop v{}...",
        env!("CARGO_PKG_VERSION")
    );

    // Load configuration
    let config = Config::load()?;
    info!("Configuration loaded");

    // Initialize the archive directory
    let archive = FileArchive::new(config.data_dir.join(&config.archive.directory))?;
    info!("{} exported files on disk", archive.list()?.len());

    // Create shared state and the record store
    let state = ReaderState::new();
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<ReaderEvent>();
    let store = Arc::new(RecordStore::with_notifier(event_tx.clone()));

    // Consume reader events on their own task
    let mut processor = EventProcessor::new(Box::new(LogPresenter), state.clone(), store.clone());
    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            processor.process_event(event);
        }
    });

    // The platform NFC stack would hand us a transport on tag discovery;
    // without hardware attached, a simulated tag plays that part.
    let mut controller = PollController::new(store.clone(), event_tx.clone());
    controller.set_cadence_ms(config.reader.cadence_ms);

    let transport = Box::new(SimTransport::new(config.reader.sim_miss_rate));
    controller.set_link(TagLink::discovered(transport)).await;
    state.set_status(ReaderStatus::Discovered);
    info!("Tag discovered, polling every {} ms", controller.cadence_ms());

    controller.start();

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received");

    controller.stop().await;
    info!("{} records collected this run", store.len());

    info!("TagSense Desktop stopped");
    Ok(())
}
