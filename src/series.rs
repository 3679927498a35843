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

//! Chart series preparation.
//!
//! Turns a record slice into the numeric series an external bar-chart
//! renderer consumes. Resistance spans orders of magnitude, so it is
//! log-scaled; an open-circuit reading gets a sentinel bar below the axis.

use crate::record::Record;

/// Bar height standing in for an infinite resistance reading.
pub const INFINITE_RESISTANCE_BAR: f64 = -1.0;

/// Chartable record metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Resistance,
    V1,
    V2,
    Vds,
}

impl Metric {
    /// All metrics, in the order the selection widget lists them.
    pub const ALL: [Metric; 4] = [Metric::Resistance, Metric::V1, Metric::V2, Metric::Vds];

    pub fn label(&self) -> &'static str {
        match self {
            Metric::Resistance => "Resistance",
            Metric::V1 => "V1",
            Metric::V2 => "V2",
            Metric::Vds => "VDS",
        }
    }

    /// Metric at a selection-widget position.
    pub fn from_index(index: usize) -> Option<Metric> {
        Self::ALL.get(index).copied()
    }
}

/// One series value per record, in record order.
pub fn series_for(records: &[Record], metric: Metric) -> Vec<f64> {
    records
        .iter()
        .map(|record| match metric {
            Metric::Resistance => {
                if record.resistance.is_infinite() {
                    INFINITE_RESISTANCE_BAR
                } else {
                    record.resistance.ln()
                }
            }
            Metric::V1 => record.v1,
            Metric::V2 => record.v2,
            Metric::Vds => record.vds,
        })
        .collect()
}
