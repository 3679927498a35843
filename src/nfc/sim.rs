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

//! Simulated tag transport.
//!
//! Generates plausible wire payloads with jittered measurement values, and
//! misses connects at a configurable rate to mimic a hand-held tag drifting
//! out of range. Backs the demo binary and integration tests when no real
//! NFC stack is attached.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::link::{LinkError, TagTransport};
use super::ndef;

/// Firmware version reported by the simulated tag.
const SIM_FIRMWARE: &str = "1.05";

pub struct SimTransport {
    rng: StdRng,
    /// Probability that a connect attempt finds the tag out of range.
    miss_rate: f64,
    connected: bool,
}

impl SimTransport {
    pub fn new(miss_rate: f64) -> Self {
        Self {
            rng: StdRng::from_entropy(),
            miss_rate: miss_rate.clamp(0.0, 1.0),
            connected: false,
        }
    }

    /// Deterministic variant for tests.
    pub fn seeded(miss_rate: f64, seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            miss_rate: miss_rate.clamp(0.0, 1.0),
            connected: false,
        }
    }

    fn sample_line(&mut self) -> String {
        // Occasionally the sensor saturates and reports an open circuit.
        let resistance = if self.rng.gen_bool(0.05) {
            "inf".to_string()
        } else {
            format!("{:.1}", self.rng.gen_range(800.0..2500.0))
        };

        format!(
            "V:{} R:{} adc_1[V]:{:.3} adc_4[V]:{:.3} VDS[V]:{:.3} I[pA]:{} I native:{}£",
            SIM_FIRMWARE,
            resistance,
            self.rng.gen_range(0.1..0.9),
            self.rng.gen_range(0.1..0.9),
            self.rng.gen_range(0.1..0.9),
            self.rng.gen_range(0..2000),
            self.rng.gen_range(0..4096),
        )
    }
}

impl TagTransport for SimTransport {
    fn backend_name(&self) -> &'static str {
        "sim"
    }

    fn connect(&mut self) -> Result<(), LinkError> {
        if self.rng.gen_bool(self.miss_rate) {
            return Err(LinkError::Unavailable);
        }
        self.connected = true;
        Ok(())
    }

    fn read_message(&mut self) -> Result<Option<Vec<u8>>, LinkError> {
        if !self.connected {
            return Err(LinkError::Transport("read while disconnected".into()));
        }
        let line = self.sample_line();
        Ok(Some(ndef::encode_text_payload(&line, "en")))
    }

    fn close(&mut self) {
        self.connected = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record;

    #[test]
    fn test_sim_payload_decodes_cleanly() {
        let mut transport = SimTransport::seeded(0.0, 42);
        transport.connect().unwrap();

        for _ in 0..50 {
            let payload = transport.read_message().unwrap().unwrap();
            let text = ndef::decode_payload(&payload).unwrap();
            let decoded = record::decode_line(&text).unwrap();
            assert!(decoded.is_complete());
            assert_eq!(decoded.firmware_version, SIM_FIRMWARE);
        }
    }

    #[test]
    fn test_sim_always_misses_at_full_rate() {
        let mut transport = SimTransport::seeded(1.0, 7);
        for _ in 0..10 {
            assert!(matches!(transport.connect(), Err(LinkError::Unavailable)));
        }
    }
}
