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

//! Tag communication module.
//!
//! Link handle and state machine, NDEF payload decoding, the cadenced poll
//! loop, and a simulated transport for running without hardware.

pub mod link;
pub mod ndef;
pub mod poller;
pub mod sim;

pub use link::{LinkError, LinkState, TagLink, TagTransport};
pub use poller::{PollController, DEFAULT_CADENCE_MS};
pub use sim::SimTransport;
