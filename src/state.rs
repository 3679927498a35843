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

//! Shared reader state.

use parking_lot::RwLock;
use std::sync::Arc;

/// Reader status shown to the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderStatus {
    /// No tag known.
    Idle,
    /// Tag discovered, not being polled yet.
    Discovered,
    /// Poll loop running.
    Reading,
    /// The link was lost or the poll run ended.
    TagGone,
}

impl ReaderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReaderStatus::Idle => "Idle",
            ReaderStatus::Discovered => "Tag discovered, ready to read",
            ReaderStatus::Reading => "Reading...",
            ReaderStatus::TagGone => "Tag gone",
        }
    }
}

/// Shared application state.
#[derive(Debug)]
pub struct ReaderState {
    /// Current reader status.
    pub status: RwLock<ReaderStatus>,

    /// Last link error surfaced to the user, if any.
    pub last_error: RwLock<Option<String>>,
}

impl Default for ReaderState {
    fn default() -> Self {
        Self {
            status: RwLock::new(ReaderStatus::Idle),
            last_error: RwLock::new(None),
        }
    }
}

impl ReaderState {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_status(&self, status: ReaderStatus) {
        *self.status.write() = status;
    }

    pub fn get_status(&self) -> ReaderStatus {
        *self.status.read()
    }

    pub fn set_error(&self, message: String) {
        *self.last_error.write() = Some(message);
        *self.status.write() = ReaderStatus::TagGone;
    }

    pub fn get_error(&self) -> Option<String> {
        self.last_error.read().clone()
    }
}
