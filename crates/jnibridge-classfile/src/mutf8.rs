//! Modified UTF-8 decoding (JVMS §4.4.7).
//!
//! Differs from standard UTF-8 in two ways: NUL is encoded as the two-byte
//! sequence `C0 80`, and supplementary characters are encoded as a surrogate
//! pair, each half written as a three-byte sequence. Four-byte forms never
//! appear.

use jnibridge_core::ClassFormatError;

/// Decode a modified UTF-8 byte string. `base` is the absolute offset of
/// `bytes[0]`, used for error reporting.
pub fn decode(bytes: &[u8], base: usize) -> Result<String, ClassFormatError> {
    // Fast path: pure ASCII without NUL is identical in both encodings.
    if bytes.iter().all(|&b| b != 0 && b < 0x80) {
        return Ok(bytes.iter().map(|&b| b as char).collect());
    }

    let mut units: Vec<u16> = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let bad = || ClassFormatError::BadUtf8 { offset: base + i };
        let b0 = bytes[i];
        match b0 {
            0x01..=0x7F => {
                units.push(u16::from(b0));
                i += 1;
            }
            0xC0..=0xDF => {
                let b1 = continuation(bytes, i + 1).ok_or_else(bad)?;
                units.push((u16::from(b0 & 0x1F) << 6) | b1);
                i += 2;
            }
            0xE0..=0xEF => {
                let b1 = continuation(bytes, i + 1).ok_or_else(bad)?;
                let b2 = continuation(bytes, i + 2).ok_or_else(bad)?;
                units.push((u16::from(b0 & 0x0F) << 12) | (b1 << 6) | b2);
                i += 3;
            }
            _ => return Err(bad()),
        }
    }

    char::decode_utf16(units.iter().copied())
        .collect::<Result<String, _>>()
        .map_err(|_| ClassFormatError::BadUtf8 { offset: base })
}

/// The low six bits of a continuation byte at `index`, if present.
fn continuation(bytes: &[u8], index: usize) -> Option<u16> {
    match bytes.get(index) {
        Some(&b) if b & 0xC0 == 0x80 => Some(u16::from(b & 0x3F)),
        _ => None,
    }
}

/// Encode text as modified UTF-8.
#[cfg(any(test, feature = "test-support"))]
pub fn encode(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    for unit in text.encode_utf16() {
        match unit {
            0x0001..=0x007F => out.push(unit as u8),
            0x0000 | 0x0080..=0x07FF => {
                out.push(0xC0 | (unit >> 6) as u8);
                out.push(0x80 | (unit & 0x3F) as u8);
            }
            _ => {
                out.push(0xE0 | (unit >> 12) as u8);
                out.push(0x80 | ((unit >> 6) & 0x3F) as u8);
                out.push(0x80 | (unit & 0x3F) as u8);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii() {
        assert_eq!(decode(b"java/lang/String", 0).unwrap(), "java/lang/String");
    }

    #[test]
    fn embedded_nul() {
        assert_eq!(decode(&[b'a', 0xC0, 0x80, b'b'], 0).unwrap(), "a\0b");
    }

    #[test]
    fn bmp_and_supplementary() {
        let text = "caf\u{e9} \u{20ac} \u{1F600}";
        let encoded = encode(text);
        // The emoji becomes a six-byte surrogate pair, never a four-byte form.
        assert!(!encoded.iter().any(|&b| b >= 0xF0));
        assert_eq!(decode(&encoded, 0).unwrap(), text);
    }

    #[test]
    fn raw_nul_is_rejected() {
        assert_eq!(
            decode(&[b'a', 0x00], 10).unwrap_err(),
            ClassFormatError::BadUtf8 { offset: 11 }
        );
    }

    #[test]
    fn truncated_sequence_is_rejected() {
        assert!(decode(&[0xE2, 0x82], 0).is_err());
        assert!(decode(&[0xF0, 0x9F, 0x98, 0x80], 0).is_err());
    }
}
