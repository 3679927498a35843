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

//! NDEF text-record payload decoding.

use crate::record::CodecError;

/// High bit of the status byte selects the text encoding.
const UTF16_FLAG: u8 = 0x80;

/// Low bits of the status byte carry the language-code prefix length.
const LANG_LEN_MASK: u8 = 0x33;

/// Extract the text body from a raw text-record payload.
///
/// The first byte is a status byte: encoding flag plus the length of a
/// language-code prefix to skip. Returns [`CodecError::MalformedPayload`]
/// when the prefix bounds exceed the buffer or the body is not valid text in
/// the declared encoding; the caller drops the payload and keeps polling.
pub fn decode_payload(payload: &[u8]) -> Result<String, CodecError> {
    let status = *payload.first().ok_or(CodecError::MalformedPayload)?;
    let lang_len = (status & LANG_LEN_MASK) as usize;
    let body = payload
        .get(1 + lang_len..)
        .ok_or(CodecError::MalformedPayload)?;

    if status & UTF16_FLAG == 0 {
        String::from_utf8(body.to_vec()).map_err(|_| CodecError::MalformedPayload)
    } else {
        decode_utf16(body)
    }
}

/// UTF-16 body: BOM-aware, big-endian when no BOM is present.
fn decode_utf16(body: &[u8]) -> Result<String, CodecError> {
    if body.len() % 2 != 0 {
        return Err(CodecError::MalformedPayload);
    }

    let (little_endian, body) = match body {
        [0xFF, 0xFE, rest @ ..] => (true, rest),
        [0xFE, 0xFF, rest @ ..] => (false, rest),
        _ => (false, body),
    };

    let units: Vec<u16> = body
        .chunks_exact(2)
        .map(|pair| {
            if little_endian {
                u16::from_le_bytes([pair[0], pair[1]])
            } else {
                u16::from_be_bytes([pair[0], pair[1]])
            }
        })
        .collect();

    String::from_utf16(&units).map_err(|_| CodecError::MalformedPayload)
}

/// Build a text-record payload. Inverse of [`decode_payload`], UTF-8 only;
/// used by the simulated tag and by tests.
pub fn encode_text_payload(text: &str, language: &str) -> Vec<u8> {
    let mut payload = Vec::with_capacity(1 + language.len() + text.len());
    payload.push(language.len() as u8 & LANG_LEN_MASK);
    payload.extend_from_slice(language.as_bytes());
    payload.extend_from_slice(text.as_bytes());
    payload
}
