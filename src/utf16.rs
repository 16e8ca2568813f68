//! UTF-16 code point codec and file-boundary conversions
//!
//! Code units are handled as native `u16` values; byte order only matters
//! when reading or writing file data, see [`ByteOrder`].

use crate::detection::{detect_encoding, strip_bom};
use crate::transcode;
use crate::{
    ByteOrder, Encoding, Error, REPLACEMENT_CHARACTER, Result, UTF16BE_BOM, UTF16LE_BOM,
};

/// Longest UTF-16 sequence produced for a single code point (a surrogate pair)
pub const MAX_SEQUENCE_LEN: usize = 2;

const SURROGATE_MASK: u16 = 0xFC00;
const HIGH_SURROGATE: u16 = 0xD800;
const LOW_SURROGATE: u16 = 0xDC00;

/// Encode a code point into `out`, returning the number of units used (1-2)
///
/// Values in the surrogate range U+D800-U+DFFF are never emitted as-is: they
/// encode to [`REPLACEMENT_CHARACTER`]. Values above U+FFFF become a
/// surrogate pair.
pub fn encode(code_point: u32, out: &mut [u16; MAX_SEQUENCE_LEN]) -> usize {
    if code_point <= 0xFFFF {
        out[0] = if (0xD800..=0xDFFF).contains(&code_point) {
            REPLACEMENT_CHARACTER as u16
        } else {
            code_point as u16
        };
        return 1;
    }

    let offset = code_point - 0x10000;
    out[0] = HIGH_SURROGATE | ((offset >> 10) & 0x3FF) as u16;
    out[1] = LOW_SURROGATE | (offset & 0x3FF) as u16;
    2
}

/// Decode the code point at the start of `units`
///
/// Returns the code point and the number of units consumed (never zero).
/// A high surrogate that is not followed by a low surrogate decodes to
/// [`REPLACEMENT_CHARACTER`] and consumes one unit.
pub fn decode(units: &[u16]) -> Result<(u32, usize)> {
    let (&first, rest) = units.split_first().ok_or(Error::EmptyInput)?;
    Ok(decode_pair(first, rest.first().copied()))
}

/// Decode one code point from a unit and the unit following it, if any
#[inline]
pub(crate) fn decode_pair(first: u16, second: Option<u16>) -> (u32, usize) {
    if first & SURROGATE_MASK != HIGH_SURROGATE {
        return (u32::from(first), 1);
    }
    match second {
        Some(low) if low & SURROGATE_MASK == LOW_SURROGATE => {
            let code_point =
                ((u32::from(first & 0x3FF) << 10) | u32::from(low & 0x3FF)) + 0x10000;
            (code_point, 2)
        }
        _ => (REPLACEMENT_CHARACTER, 1),
    }
}

/// Check whether a unit is the first half of a surrogate pair
#[inline]
pub(crate) fn is_high_surrogate(unit: u16) -> bool {
    unit & SURROGATE_MASK == HIGH_SURROGATE
}

/// Convert file data to UTF-16 code units, removing any byte-order-mark
///
/// With [`Encoding::Any`] the encoding is detected first. UTF-8 data is
/// re-encoded; UTF-16 data is reassembled from the file's byte order into
/// native units (anything that is not UTF-8 or UTF-16BE is read as
/// UTF-16LE). Inputs shorter than one code unit produce an empty result,
/// and a trailing odd byte is ignored.
pub fn from_file(data: &[u8], encoding: Encoding) -> Vec<u16> {
    if data.len() < 2 {
        return Vec::new();
    }

    let encoding = match encoding {
        Encoding::Any => detect_encoding(data),
        known => known,
    };

    match encoding {
        Encoding::Utf8 => transcode::utf8_to_utf16(strip_bom(data, Encoding::Utf8)),
        Encoding::Utf16BE => {
            transcode::utf16_bytes_to_units(strip_bom(data, Encoding::Utf16BE), ByteOrder::Big)
        }
        _ => transcode::utf16_bytes_to_units(
            strip_bom(data, Encoding::Utf16LE),
            ByteOrder::Little,
        ),
    }
}

/// Convert UTF-16 code units to big-endian file data with a byte-order-mark
///
/// Returns an empty buffer for empty input. Write the result in binary mode.
pub fn to_file_be(units: &[u16]) -> Vec<u8> {
    to_file(units, ByteOrder::Big)
}

/// Convert UTF-16 code units to little-endian file data with a byte-order-mark
///
/// Returns an empty buffer for empty input. Write the result in binary mode.
pub fn to_file_le(units: &[u16]) -> Vec<u8> {
    to_file(units, ByteOrder::Little)
}

/// Convert UTF-16 code units to file data in `order`, with a byte-order-mark
pub fn to_file(units: &[u16], order: ByteOrder) -> Vec<u8> {
    if units.is_empty() {
        return Vec::new();
    }

    let bom: &[u8] = match order {
        ByteOrder::Big => &UTF16BE_BOM,
        ByteOrder::Little => &UTF16LE_BOM,
    };

    let mut file = Vec::with_capacity(bom.len() + units.len() * 2);
    file.extend_from_slice(bom);
    transcode::write_units(units, order, &mut file);
    file
}

/// Convert UTF-8 bytes to in-memory UTF-16 code units
pub fn from_utf8(bytes: &[u8]) -> Vec<u16> {
    transcode::utf8_to_utf16(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const ASCII: &str = "this is a simple string\nwith two lines.\n\nand a third one too!";
    const SPECIAL: &str = "Cha\u{EE}ne sp\u{E9}ciale en Fran\u{E7}ais,\n avec @ccents (& symboles: ~%\u{B5}$\u{20AC}\u{A3}#\u{A7}\u{B0}).";
    const EXTENDED: &str = "\u{0429}\u{043D}\u{0460}\u{052A}\u{0532}\u{20001}\u{2000A}\u{2000B}\u{306A}\u{306B}\u{305D}\u{3037}\u{306E}\u{3004}\u{25A9}\u{25C4}\u{20A9}\u{10A1}\u{10338}\u{10334}\u{10349}\u{0601}\u{0641}\u{FB52}\u{FB67}\u{FB78}\u{FBF2}\u{13000}\u{13040}\u{1F600}\u{1F428}\n";

    fn encoded(code_point: u32) -> Vec<u16> {
        let mut buffer = [0u16; MAX_SEQUENCE_LEN];
        let len = encode(code_point, &mut buffer);
        buffer[..len].to_vec()
    }

    fn file_bytes(text: &str, order: ByteOrder, with_bom: bool) -> Vec<u8> {
        let mut bytes = Vec::new();
        if with_bom {
            bytes.extend_from_slice(&order.write_unit(0xFEFF));
        }
        for unit in text.encode_utf16() {
            bytes.extend_from_slice(&order.write_unit(unit));
        }
        bytes
    }

    #[test]
    fn test_encode_matches_std() {
        for code in [0x25, 0xA2, 0x7FF, 0x1000, 0xA497, 0xFFFD, 0x10400, 0x104FB, 0x211D8] {
            let ch = char::from_u32(code).unwrap();
            let mut expected = [0u16; 2];
            assert_eq!(encoded(code), ch.encode_utf16(&mut expected), "U+{code:04X}");
        }
    }

    #[test]
    fn test_encode_surrogate_pair() {
        assert_eq!(encoded(0x10000), vec![0xD800, 0xDC00]);
        assert_eq!(encoded(0x1F600), vec![0xD83D, 0xDE00]);
        assert_eq!(encoded(0x10FFFF), vec![0xDBFF, 0xDFFF]);
    }

    #[test]
    fn test_encode_rejects_lone_surrogates() {
        for code in [0xD800, 0xDBFF, 0xDC00, 0xDFFF] {
            assert_eq!(encoded(code), vec![REPLACEMENT_CHARACTER as u16], "U+{code:04X}");
        }
        assert_eq!(encoded(0xD7FF), vec![0xD7FF]);
        assert_eq!(encoded(0xE000), vec![0xE000]);
    }

    #[test]
    fn test_decode() {
        assert_eq!(decode(&[0x41]), Ok((0x41, 1)));
        assert_eq!(decode(&[0x41, 0x42]), Ok((0x41, 1)));
        assert_eq!(decode(&[0xD83D, 0xDE00]), Ok((0x1F600, 2)));
        assert_eq!(decode(&[0xDBFF, 0xDFFF, 0x41]), Ok((0x10FFFF, 2)));
    }

    #[test]
    fn test_decode_unpaired_surrogates() {
        // Consumed is counted in units on this path too
        assert_eq!(decode(&[0xD83D]), Ok((REPLACEMENT_CHARACTER, 1)));
        assert_eq!(decode(&[0xD83D, 0x0041]), Ok((REPLACEMENT_CHARACTER, 1)));
        assert_eq!(decode(&[0xD83D, 0xD83D]), Ok((REPLACEMENT_CHARACTER, 1)));
        // A lone low surrogate passes through unchanged
        assert_eq!(decode(&[0xDE00]), Ok((0xDE00, 1)));
    }

    #[test]
    fn test_decode_empty_input() {
        assert_eq!(decode(&[]), Err(Error::EmptyInput));
    }

    #[test]
    fn test_from_utf8() {
        for text in [ASCII, SPECIAL, EXTENDED] {
            let expected: Vec<u16> = text.encode_utf16().collect();
            assert_eq!(from_utf8(text.as_bytes()), expected);
        }
        assert!(from_utf8(&[]).is_empty());
    }

    #[test]
    fn test_from_file_known_encoding() {
        for text in [ASCII, SPECIAL, EXTENDED] {
            let expected: Vec<u16> = text.encode_utf16().collect();
            for with_bom in [false, true] {
                let be = file_bytes(text, ByteOrder::Big, with_bom);
                assert_eq!(from_file(&be, Encoding::Utf16BE), expected);
                let le = file_bytes(text, ByteOrder::Little, with_bom);
                assert_eq!(from_file(&le, Encoding::Utf16LE), expected);
            }
        }
    }

    #[test]
    fn test_from_file_detected() {
        for text in [ASCII, SPECIAL, EXTENDED] {
            let expected: Vec<u16> = text.encode_utf16().collect();
            assert_eq!(from_file(text.as_bytes(), Encoding::Any), expected);
            let mut with_bom = crate::UTF8_BOM.to_vec();
            with_bom.extend_from_slice(text.as_bytes());
            assert_eq!(from_file(&with_bom, Encoding::Any), expected);

            for with_bom in [false, true] {
                let be = file_bytes(text, ByteOrder::Big, with_bom);
                assert_eq!(from_file(&be, Encoding::Any), expected);
                let le = file_bytes(text, ByteOrder::Little, with_bom);
                assert_eq!(from_file(&le, Encoding::Any), expected);
            }
        }
    }

    #[test]
    fn test_from_file_short_and_odd_inputs() {
        assert!(from_file(&[], Encoding::Any).is_empty());
        assert!(from_file(&[0x41], Encoding::Utf16LE).is_empty());
        assert!(from_file(&UTF16BE_BOM, Encoding::Any).is_empty());
        assert_eq!(from_file(&[0x41, 0x00, 0x42], Encoding::Utf16LE), vec![0x41]);
    }

    #[test]
    fn test_from_file_wrong_hint_is_lossy_not_fatal() {
        let units = from_file(ASCII.as_bytes(), Encoding::Utf16BE);
        assert_eq!(units.len(), ASCII.len() / 2);
        let units = from_file(ASCII.as_bytes(), Encoding::Utf16LE);
        assert_eq!(units.len(), ASCII.len() / 2);
    }

    #[test]
    fn test_to_file() {
        assert!(to_file_be(&[]).is_empty());
        assert!(to_file_le(&[]).is_empty());

        for text in [ASCII, SPECIAL, EXTENDED] {
            let units: Vec<u16> = text.encode_utf16().collect();

            let be = to_file_be(&units);
            assert_eq!(&be[..2], &UTF16BE_BOM);
            assert_eq!(be, file_bytes(text, ByteOrder::Big, true));

            let le = to_file_le(&units);
            assert_eq!(&le[..2], &UTF16LE_BOM);
            assert_eq!(le, file_bytes(text, ByteOrder::Little, true));
        }
    }

    #[test]
    fn test_to_file_literal_bytes() {
        let units = [0x0061, 0xD83D, 0xDE00];
        assert_eq!(to_file_be(&units), vec![0xFE, 0xFF, 0x00, 0x61, 0xD8, 0x3D, 0xDE, 0x00]);
        assert_eq!(to_file_le(&units), vec![0xFF, 0xFE, 0x61, 0x00, 0x3D, 0xD8, 0x00, 0xDE]);
    }

    mod properties {
        use super::super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn round_trip_every_scalar(ch in any::<char>()) {
                let mut buffer = [0u16; MAX_SEQUENCE_LEN];
                let len = encode(ch as u32, &mut buffer);
                prop_assert_eq!(len, ch.len_utf16());
                prop_assert_eq!(decode(&buffer[..len]), Ok((ch as u32, len)));
            }

            #[test]
            fn surrogates_never_encode_literally(code in 0xD800u32..=0xDFFF) {
                let mut buffer = [0u16; MAX_SEQUENCE_LEN];
                prop_assert_eq!(encode(code, &mut buffer), 1);
                prop_assert_eq!(u32::from(buffer[0]), REPLACEMENT_CHARACTER);
            }

            #[test]
            fn decode_always_progresses(units in proptest::collection::vec(any::<u16>(), 1..4)) {
                let (_, consumed) = decode(&units).unwrap();
                prop_assert!(consumed >= 1 && consumed <= units.len());
            }

            #[test]
            fn file_round_trip(text in ".*") {
                let units: Vec<u16> = text.encode_utf16().collect();
                prop_assert_eq!(from_file(&to_file_be(&units), Encoding::Any), units.clone());
                prop_assert_eq!(from_file(&to_file_le(&units), Encoding::Any), units);
            }
        }
    }
}
