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

//! TagSense desktop core.
//!
//! Polls a contact-less sensor tag for text-encoded measurement records,
//! decodes them into typed records, accumulates them in memory, and exports
//! selections as CSV files that can be re-read later.

pub mod archive;
pub mod config;
pub mod events;
pub mod nfc;
pub mod record;
pub mod series;
pub mod state;
pub mod store;
