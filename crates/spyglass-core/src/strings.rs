//! Narrow and wide string codecs.
//!
//! Foreign memory and staging buffers both hold NUL-terminated strings: narrow
//! strings as UTF-8 bytes, wide strings as UTF-16LE code units. Decoding stops
//! at the first terminator within the supplied bytes.

use encoding_rs::UTF_16LE;
use tracing::debug;

/// Decodes a narrow NUL-terminated string, lossily replacing invalid UTF-8.
pub fn decode_c_string(bytes: &[u8]) -> String {
    let len = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..len]).into_owned()
}

/// Encodes a narrow string with a trailing NUL.
pub fn encode_c_string(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len() + 1);
    out.extend_from_slice(text.as_bytes());
    out.push(0);
    out
}

/// Decodes a UTF-16LE string, stopping at the first 2-byte NUL unit.
///
/// A trailing odd byte is ignored; it cannot form a code unit.
pub fn decode_wide_string(bytes: &[u8]) -> String {
    let even = bytes.len() - bytes.len() % 2;
    let mut end = even;
    let mut i = 0;
    while i < even {
        if bytes[i] == 0 && bytes[i + 1] == 0 {
            end = i;
            break;
        }
        i += 2;
    }

    let (decoded, _, had_errors) = UTF_16LE.decode(&bytes[..end]);
    if had_errors {
        debug!(
            "UTF-16 decoding had errors for {} bytes starting {:02X?}",
            end,
            &bytes[..end.min(16)]
        );
    }
    decoded.into_owned()
}

/// Encodes a string as UTF-16LE with a trailing 2-byte NUL.
pub fn encode_wide_string(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len() * 2 + 2);
    for unit in text.encode_utf16() {
        out.extend_from_slice(&unit.to_le_bytes());
    }
    out.extend_from_slice(&[0, 0]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_c_string_roundtrip() {
        let encoded = encode_c_string("hello");
        assert_eq!(encoded, b"hello\0");
        assert_eq!(decode_c_string(&encoded), "hello");
    }

    #[test]
    fn test_c_string_stops_at_nul() {
        assert_eq!(decode_c_string(b"abc\0def"), "abc");
    }

    #[test]
    fn test_c_string_without_terminator() {
        assert_eq!(decode_c_string(b"abc"), "abc");
    }

    #[test]
    fn test_wide_string_roundtrip() {
        let encoded = encode_wide_string("wide");
        assert_eq!(encoded.len(), 10);
        assert_eq!(decode_wide_string(&encoded), "wide");
    }

    #[test]
    fn test_wide_string_non_ascii() {
        let encoded = encode_wide_string("héllo ✓");
        assert_eq!(decode_wide_string(&encoded), "héllo ✓");
    }

    #[test]
    fn test_wide_string_stops_at_nul() {
        let mut bytes = encode_wide_string("ab");
        bytes.extend_from_slice(&encode_wide_string("cd"));
        assert_eq!(decode_wide_string(&bytes), "ab");
    }

    #[test]
    fn test_wide_string_odd_tail_ignored() {
        let bytes = [b'a', 0, b'b'];
        assert_eq!(decode_wide_string(&bytes), "a");
    }
}
