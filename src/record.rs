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

//! Measurement record type and codec.
//!
//! Two text formats live here: the key-marker wire format produced by the tag
//! firmware (tolerant, field-by-field), and the positional CSV format used for
//! durable export and re-import (strict, all-or-nothing per line).

use chrono::{Local, NaiveDateTime, Timelike};
use thiserror::Error;

/// Number of marker pairs in the wire format.
pub const FIELD_PAIR_COUNT: u8 = 7;

/// Column header written at the top of every exported file.
pub const EXPORT_HEADER: &str = "id,CodVersion,r,v1,v2,vds,ipA,nativeValue";

/// Timestamp format used in exported files.
pub const STORED_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Glyph terminating the last field of a wire line.
const LINE_TERMINATOR: &str = "£";

/// Codec failures.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The payload does not contain a decodable text region.
    #[error("malformed payload: no decodable text region")]
    MalformedPayload,

    /// A numeric field in the wire format failed to parse. Fatal to the line.
    #[error("numeric field {field} failed to parse: {value:?}")]
    NumericParse { field: &'static str, value: String },

    /// A stored CSV line failed strict decoding. The line is rejected whole.
    #[error("invalid stored record: {0}")]
    InvalidStoredRecord(String),
}

/// One decoded measurement sample.
///
/// Fields not present in the source text keep their zero value; the wire
/// decoder never fails merely because a field is absent. `matched_fields`
/// tells a fully decoded record (7) apart from a partial one.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Capture time, stamped at decode time. Not carried in the wire payload.
    pub timestamp: NaiveDateTime,
    /// Firmware version token reported by the tag.
    pub firmware_version: String,
    /// Sensor resistance. `f64::INFINITY` when the tag reports `inf`.
    pub resistance: f64,
    pub v1: f64,
    pub v2: f64,
    pub vds: f64,
    /// Current in picoamperes. Present-but-empty decodes to 0.
    pub ipa: i64,
    /// Raw ADC value. Empty decodes to 0, unparsable to -1.
    pub native_value: i64,
    /// Export selection flag. Only ever mutated by user commands.
    pub selected: bool,
    /// How many of the seven marker pairs matched during decoding.
    pub matched_fields: u8,
}

impl Record {
    fn blank(timestamp: NaiveDateTime) -> Self {
        Self {
            timestamp,
            firmware_version: String::new(),
            resistance: 0.0,
            v1: 0.0,
            v2: 0.0,
            vds: 0.0,
            ipa: 0,
            native_value: 0,
            selected: false,
            matched_fields: 0,
        }
    }

    /// True when every marker pair was found in the source line.
    pub fn is_complete(&self) -> bool {
        self.matched_fields == FIELD_PAIR_COUNT
    }
}

/// Current local time truncated to whole seconds, so a stamped record
/// round-trips through the stored format unchanged.
pub fn stamp_now() -> NaiveDateTime {
    let now = Local::now().naive_local();
    now.with_nanosecond(0).unwrap_or(now)
}

/// The trimmed text strictly between the *last* occurrence of `own` and the
/// *first* occurrence of `next`. The asymmetry is deliberate: the producer may
/// repeat a key label inside an earlier value without breaking extraction.
/// Missing markers or reversed bounds yield `None`.
fn span<'a>(text: &'a str, own: &str, next: &str) -> Option<&'a str> {
    let start = text.rfind(own)? + own.len();
    let end = text.find(next)?;
    Some(text.get(start..end)?.trim())
}

fn parse_float(value: &str, field: &'static str) -> Result<f64, CodecError> {
    value.parse().map_err(|_| CodecError::NumericParse {
        field,
        value: value.to_string(),
    })
}

fn parse_int(value: &str, field: &'static str) -> Result<i64, CodecError> {
    value.parse().map_err(|_| CodecError::NumericParse {
        field,
        value: value.to_string(),
    })
}

/// Decode one wire-format line into a [`Record`].
///
/// Each marker pair is attempted independently; a pair whose markers are not
/// both present leaves its field at the default and decoding moves on. A
/// numeric value that is present but unparsable aborts the whole line, except
/// for the native value which degrades to -1.
pub fn decode_line(text: &str) -> Result<Record, CodecError> {
    let mut record = Record::blank(stamp_now());

    if let Some(value) = span(text, "V:", "R:") {
        record.firmware_version = value.to_string();
        record.matched_fields += 1;
    }
    if let Some(value) = span(text, "R:", "adc_1[V]:") {
        record.resistance = if value == "inf" {
            f64::INFINITY
        } else {
            parse_float(value, "R")?
        };
        record.matched_fields += 1;
    }
    if let Some(value) = span(text, "adc_1[V]:", "adc_4[V]:") {
        record.v1 = parse_float(value, "adc_1[V]")?;
        record.matched_fields += 1;
    }
    if let Some(value) = span(text, "adc_4[V]:", "VDS[V]:") {
        record.v2 = parse_float(value, "adc_4[V]")?;
        record.matched_fields += 1;
    }
    if let Some(value) = span(text, "VDS[V]:", "I[pA]:") {
        record.vds = parse_float(value, "VDS[V]")?;
        record.matched_fields += 1;
    }
    if let Some(value) = span(text, "I[pA]:", "I native") {
        record.ipa = if value.is_empty() {
            0
        } else {
            parse_int(value, "I[pA]")?
        };
        record.matched_fields += 1;
    }
    if let Some(value) = span(text, "native:", LINE_TERMINATOR) {
        record.native_value = if value.is_empty() {
            0
        } else {
            value.parse().unwrap_or(-1)
        };
        record.matched_fields += 1;
    }

    Ok(record)
}

/// Decode one stored CSV line. Strict: eight positional fields, every
/// conversion must succeed, otherwise the whole line is rejected.
pub fn decode_stored_line(line: &str) -> Result<Record, CodecError> {
    let parts: Vec<&str> = line.split(',').collect();
    if parts.len() != 8 {
        return Err(CodecError::InvalidStoredRecord(format!(
            "expected 8 fields, found {}",
            parts.len()
        )));
    }

    let invalid = |what: &str| CodecError::InvalidStoredRecord(format!("{what}: {line:?}"));

    let timestamp = NaiveDateTime::parse_from_str(parts[0], STORED_TIME_FORMAT)
        .map_err(|_| invalid("bad timestamp"))?;
    let resistance: f64 = parts[2].parse().map_err(|_| invalid("bad r"))?;
    let v1: f64 = parts[3].parse().map_err(|_| invalid("bad v1"))?;
    let v2: f64 = parts[4].parse().map_err(|_| invalid("bad v2"))?;
    let vds: f64 = parts[5].parse().map_err(|_| invalid("bad vds"))?;
    let ipa: i64 = parts[6].parse().map_err(|_| invalid("bad ipA"))?;
    let native_value: i64 = parts[7].parse().map_err(|_| invalid("bad nativeValue"))?;

    Ok(Record {
        timestamp,
        firmware_version: parts[1].to_string(),
        resistance,
        v1,
        v2,
        vds,
        ipa,
        native_value,
        selected: false,
        matched_fields: FIELD_PAIR_COUNT,
    })
}

/// Serialize records to the exportable CSV blob: one header line, then one
/// comma-joined line per record. Infinite resistance serializes to the
/// canonical token `inf`, which is also what the strict decoder accepts.
/// Embedded commas are not escaped; this is an accepted format limitation.
pub fn encode_records(records: &[Record]) -> String {
    let mut out = String::with_capacity(64 * (records.len() + 1));
    out.push_str(EXPORT_HEADER);
    out.push('\n');
    for record in records {
        out.push_str(&format!(
            "{},{},{},{},{},{},{},{}\n",
            record.timestamp.format(STORED_TIME_FORMAT),
            record.firmware_version,
            record.resistance,
            record.v1,
            record.v2,
            record.vds,
            record.ipa,
            record.native_value,
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_LINE: &str =
        "V:1.05 R:1234.5 adc_1[V]:0.452 adc_4[V]:0.631 VDS[V]:0.82 I[pA]:415 I native:27£";

    #[test]
    fn test_decode_full_line() {
        let record = decode_line(FULL_LINE).unwrap();

        assert_eq!(record.firmware_version, "1.05");
        assert_eq!(record.resistance, 1234.5);
        assert_eq!(record.v1, 0.452);
        assert_eq!(record.v2, 0.631);
        assert_eq!(record.vds, 0.82);
        assert_eq!(record.ipa, 415);
        assert_eq!(record.native_value, 27);
        assert!(!record.selected);
        assert!(record.is_complete());
    }

    #[test]
    fn test_decode_infinite_resistance() {
        let record = decode_line("V:1.0 R: inf adc_1[V]:0.1 adc_4[V]:0.2 VDS[V]:0.3 I[pA]:4 I native:5£")
            .unwrap();
        assert!(record.resistance.is_infinite());
        assert!(record.resistance.is_sign_positive());
    }

    #[test]
    fn test_missing_native_marker_leaves_default() {
        // No "I native" tail: both native fields stay at zero and the
        // decode still succeeds.
        let record =
            decode_line("V:1.0 R:5.0 adc_1[V]:0.1 adc_4[V]:0.2 VDS[V]:0.3 I[pA]:4").unwrap();
        assert_eq!(record.native_value, 0);
        assert_eq!(record.ipa, 0);
        assert_eq!(record.vds, 0.3);
        assert_eq!(record.matched_fields, 5);
        assert!(!record.is_complete());
    }

    #[test]
    fn test_empty_ipa_defaults_to_zero() {
        let record =
            decode_line("V:1.0 R:5.0 adc_1[V]:0.1 adc_4[V]:0.2 VDS[V]:0.3 I[pA]: I native:7£")
                .unwrap();
        assert_eq!(record.ipa, 0);
        assert_eq!(record.native_value, 7);
    }

    #[test]
    fn test_unparsable_native_degrades_to_sentinel() {
        let record =
            decode_line("V:1.0 R:5.0 adc_1[V]:0.1 adc_4[V]:0.2 VDS[V]:0.3 I[pA]:4 I native:x9£")
                .unwrap();
        assert_eq!(record.native_value, -1);
        assert!(record.is_complete());
    }

    #[test]
    fn test_unparsable_resistance_is_fatal() {
        let err = decode_line("V:1.0 R:bogus adc_1[V]:0.1 adc_4[V]:0.2 VDS[V]:0.3").unwrap_err();
        assert!(matches!(err, CodecError::NumericParse { field: "R", .. }));
    }

    #[test]
    fn test_own_marker_found_by_last_occurrence() {
        // The version value itself contains the key label; the last
        // occurrence wins, so only the final token is extracted.
        let record = decode_line("V:junk V:2.1 R:5.0 adc_1[V]:0.1 adc_4[V]:0.2 VDS[V]:0.3").unwrap();
        assert_eq!(record.firmware_version, "2.1");
    }

    #[test]
    fn test_reversed_marker_bounds_skip_field() {
        // "R:" appears only before the last "V:", so the version span is
        // reversed and the field is treated as missing.
        let record = decode_line("R:5 then V:1.0 end").unwrap();
        assert_eq!(record.firmware_version, "");
        assert_eq!(record.matched_fields, 0);
    }

    #[test]
    fn test_stored_round_trip() {
        let mut original = decode_line(FULL_LINE).unwrap();
        original.resistance = f64::INFINITY;

        let blob = encode_records(std::slice::from_ref(&original));
        let mut lines = blob.lines();
        assert_eq!(lines.next(), Some(EXPORT_HEADER));

        let decoded = decode_stored_line(lines.next().unwrap()).unwrap();
        assert_eq!(decoded.timestamp, original.timestamp);
        assert_eq!(decoded.firmware_version, original.firmware_version);
        assert!(decoded.resistance.is_infinite());
        assert_eq!(decoded.v1, original.v1);
        assert_eq!(decoded.v2, original.v2);
        assert_eq!(decoded.vds, original.vds);
        assert_eq!(decoded.ipa, original.ipa);
        assert_eq!(decoded.native_value, original.native_value);
    }

    #[test]
    fn test_stored_line_rejected_whole() {
        // One bad numeric field rejects the line; there is no partial mode.
        let err = decode_stored_line("2024-03-01 10:00:00,1.05,oops,0.1,0.2,0.3,4,5").unwrap_err();
        assert!(matches!(err, CodecError::InvalidStoredRecord(_)));

        let err = decode_stored_line("not,enough,fields").unwrap_err();
        assert!(matches!(err, CodecError::InvalidStoredRecord(_)));
    }
}
