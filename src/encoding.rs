//! Encoding detection and incremental decoding.
//!
//! The viewer never knows a file's encoding up front. Detection runs an
//! ordered trial list over the first accumulation buffer and pins the
//! winner for the remainder of the file; decoding then goes through an
//! incremental `encoding_rs::Decoder`, which carries partial multi-byte
//! sequences across read boundaries internally. That is what keeps a
//! code point whose bytes straddle two reads intact.
//!
//! Trial order: UTF-8, UTF-16 (either byte order, accepted only behind a
//! BOM), Shift_JIS, and windows-1252 as the unconditional fallback.
//! UTF-16 without a BOM is deliberately never guessed: any even-length
//! byte prefix validates as UTF-16, so a BOM-less trial would swallow
//! every legacy-encoded file that reaches it.

use crate::error::LoadError;
use encoding_rs::{CoderResult, Decoder, DecoderResult, Encoding};
use encoding_rs::{SHIFT_JIS, UTF_16BE, UTF_16LE, UTF_8, WINDOWS_1252};

/// Candidate encodings, tried in order. The last entry decodes any byte
/// sequence, so detection always terminates with a result.
const CANDIDATES: [&Encoding; 5] = [UTF_8, UTF_16LE, UTF_16BE, SHIFT_JIS, WINDOWS_1252];

const UTF_16LE_BOM: [u8; 2] = [0xFF, 0xFE];
const UTF_16BE_BOM: [u8; 2] = [0xFE, 0xFF];

/// Pick the first candidate encoding that accepts `bytes`.
///
/// `bytes` should be the first accumulation buffer of the file (or the
/// whole file when smaller). A multi-byte sequence cut off at the end of
/// the buffer does not disqualify a candidate.
///
/// The error path exists for the taxonomy only: windows-1252 accepts
/// everything, so exhausting the list means the trial table itself is
/// broken.
pub fn detect(bytes: &[u8]) -> Result<&'static Encoding, LoadError> {
    for candidate in CANDIDATES {
        if accepts(candidate, bytes) {
            return Ok(candidate);
        }
    }
    Err(LoadError::Decode {
        detail: "no candidate encoding accepted the input".to_string(),
    })
}

fn accepts(encoding: &'static Encoding, bytes: &[u8]) -> bool {
    // UTF-16 is BOM-gated; validity alone proves nothing for it.
    if encoding == UTF_16LE {
        return bytes.starts_with(&UTF_16LE_BOM);
    }
    if encoding == UTF_16BE {
        return bytes.starts_with(&UTF_16BE_BOM);
    }
    validates(encoding, bytes)
}

/// Strict trial decode: true when `bytes` contains no malformed sequence
/// under `encoding`. An incomplete sequence at the very end is fine — the
/// buffer is a prefix of the file, not the whole of it.
fn validates(encoding: &'static Encoding, bytes: &[u8]) -> bool {
    let mut decoder = encoding.new_decoder_without_bom_handling();
    let mut out = String::new();
    let mut input = bytes;

    loop {
        let needed = decoder
            .max_utf8_buffer_length_without_replacement(input.len())
            .unwrap_or(input.len() * 4 + 4);
        out.reserve(needed);

        let (result, read) = decoder.decode_to_string_without_replacement(input, &mut out, false);
        input = &input[read..];

        match result {
            DecoderResult::InputEmpty => return true,
            DecoderResult::Malformed(_, _) => return false,
            DecoderResult::OutputFull => out.clear(),
        }
    }
}

/// Incremental decoder for the pinned encoding.
///
/// Wraps `encoding_rs::Decoder` with the replacement policy the engine
/// uses: once an encoding is pinned, malformed sequences decode to U+FFFD
/// rather than aborting the session. A leading BOM matching the pinned
/// encoding is stripped.
pub struct StreamDecoder {
    encoding: &'static Encoding,
    decoder: Decoder,
}

impl StreamDecoder {
    pub fn new(encoding: &'static Encoding) -> Self {
        Self {
            encoding,
            decoder: encoding.new_decoder(),
        }
    }

    pub fn encoding(&self) -> &'static Encoding {
        self.encoding
    }

    /// Decode the next raw buffer, appending to `out`.
    ///
    /// Bytes belonging to an incomplete trailing sequence are held inside
    /// the decoder until the next call.
    pub fn decode_to(&mut self, input: &[u8], out: &mut String) {
        self.decode_inner(input, out, false);
    }

    /// Flush decoder state at end of source. A dangling partial sequence
    /// becomes a replacement character.
    pub fn finish(&mut self, out: &mut String) {
        self.decode_inner(&[], out, true);
    }

    fn decode_inner(&mut self, input: &[u8], out: &mut String, last: bool) {
        let mut input = input;
        loop {
            let needed = self
                .decoder
                .max_utf8_buffer_length(input.len())
                .unwrap_or(input.len() * 4 + 4);
            out.reserve(needed);

            let (result, read, _had_errors) = self.decoder.decode_to_string(input, out, last);
            input = &input[read..];

            match result {
                CoderResult::InputEmpty => return,
                CoderResult::OutputFull => continue,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Decode `bytes` in one streaming pass under the detected encoding.
    fn detect_and_decode(bytes: &[u8]) -> (String, &'static Encoding) {
        let encoding = detect(bytes).unwrap();
        let mut decoder = StreamDecoder::new(encoding);
        let mut out = String::new();
        decoder.decode_to(bytes, &mut out);
        decoder.finish(&mut out);
        (out, encoding)
    }

    #[test]
    fn test_detect_plain_ascii_as_utf8() {
        assert_eq!(detect(b"hello world\n").unwrap(), UTF_8);
    }

    #[test]
    fn test_detect_empty_as_utf8() {
        assert_eq!(detect(b"").unwrap(), UTF_8);
    }

    #[test]
    fn test_detect_multibyte_utf8() {
        assert_eq!(detect("héllo wörld 🌍\n".as_bytes()).unwrap(), UTF_8);
    }

    #[test]
    fn test_truncated_utf8_tail_still_detects_utf8() {
        // "é" is [0xC3, 0xA9]; cut after the lead byte.
        let mut bytes = b"caf".to_vec();
        bytes.push(0xC3);
        assert_eq!(detect(&bytes).unwrap(), UTF_8);
    }

    #[test]
    fn test_detect_utf16le_by_bom() {
        let mut bytes = vec![0xFF, 0xFE];
        for unit in "hi\n".encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        assert_eq!(detect(&bytes).unwrap(), UTF_16LE);

        let (text, _) = detect_and_decode(&bytes);
        assert_eq!(text, "hi\n");
    }

    #[test]
    fn test_detect_utf16be_by_bom() {
        let mut bytes = vec![0xFE, 0xFF];
        for unit in "시\n".encode_utf16() {
            bytes.extend_from_slice(&unit.to_be_bytes());
        }
        assert_eq!(detect(&bytes).unwrap(), UTF_16BE);

        let (text, _) = detect_and_decode(&bytes);
        assert_eq!(text, "시\n");
    }

    #[test]
    fn test_detect_shift_jis() {
        // Shift_JIS for 日本語; the lead byte 0x93 is not valid UTF-8.
        let bytes: &[u8] = &[0x93, 0xFA, 0x96, 0x7B, 0x8C, 0xEA];
        assert_eq!(detect(bytes).unwrap(), SHIFT_JIS);

        let (text, _) = detect_and_decode(bytes);
        assert_eq!(text, "日本語");
    }

    #[test]
    fn test_windows_1252_fallback() {
        // 0xE9 would start a Shift_JIS pair, but 0x0A is not a valid
        // trail byte, so both UTF-8 and Shift_JIS reject this.
        let bytes: &[u8] = b"caf\xE9\n";
        assert_eq!(detect(bytes).unwrap(), WINDOWS_1252);

        let (text, _) = detect_and_decode(bytes);
        assert_eq!(text, "café\n");
    }

    #[test]
    fn test_stream_decoder_carries_split_code_point() {
        // Feed "né" one byte at a time; 0xC3 0xA9 ends up split across
        // calls and must still come out as a single character.
        let bytes = "né".as_bytes();
        let mut decoder = StreamDecoder::new(UTF_8);
        let mut out = String::new();
        for b in bytes {
            decoder.decode_to(std::slice::from_ref(b), &mut out);
        }
        decoder.finish(&mut out);
        assert_eq!(out, "né");
    }

    #[test]
    fn test_stream_decoder_strips_utf16_bom() {
        let mut bytes = vec![0xFF, 0xFE];
        for unit in "abc".encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }

        let mut decoder = StreamDecoder::new(UTF_16LE);
        let mut out = String::new();
        decoder.decode_to(&bytes, &mut out);
        decoder.finish(&mut out);
        assert_eq!(out, "abc");
    }

    #[test]
    fn test_streaming_matches_whole_buffer_decode() {
        // Chopping the input at arbitrary points must not change output.
        let text = "가나다 line one\nαβγ line two\n🎉 line three\n";
        let bytes = text.as_bytes();

        for split in 0..bytes.len() {
            let mut decoder = StreamDecoder::new(UTF_8);
            let mut out = String::new();
            decoder.decode_to(&bytes[..split], &mut out);
            decoder.decode_to(&bytes[split..], &mut out);
            decoder.finish(&mut out);
            assert_eq!(out, text, "split at byte {}", split);
        }
    }

    #[test]
    fn test_malformed_under_pinned_encoding_replaces() {
        let mut decoder = StreamDecoder::new(UTF_8);
        let mut out = String::new();
        decoder.decode_to(b"ok \xFF then\n", &mut out);
        decoder.finish(&mut out);
        assert_eq!(out, "ok \u{FFFD} then\n");
        assert_eq!(decoder.encoding(), UTF_8);
    }
}
