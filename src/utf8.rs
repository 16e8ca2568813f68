//! UTF-8 code point codec and file-boundary conversions
//!
//! The decoder is permissive: continuation bytes are masked
//! rather than validated, and anything it cannot make sense of becomes
//! [`REPLACEMENT_CHARACTER`] while consuming exactly one byte.

use crate::detection::{detect_encoding, strip_bom};
use crate::transcode;
use crate::{ByteOrder, Encoding, Error, REPLACEMENT_CHARACTER, Result, UTF8_BOM};

/// Longest UTF-8 sequence produced for a single code point
pub const MAX_SEQUENCE_LEN: usize = 4;

/// Encode a code point into `out`, returning the number of bytes used (1-4)
///
/// U+0000-U+007F use 1 byte, U+0080-U+07FF 2 bytes, U+0800-U+FFFF 3 bytes and
/// everything above 4 bytes. Values past U+10FFFF are not rejected: their
/// high bits are truncated to fit the 21-bit payload of the 4-byte form.
/// No terminator is written after the sequence.
pub fn encode(code_point: u32, out: &mut [u8; MAX_SEQUENCE_LEN]) -> usize {
    if code_point <= 0x7F {
        out[0] = code_point as u8;
        1
    } else if code_point <= 0x7FF {
        out[0] = 0xC0 | (code_point >> 6) as u8;
        out[1] = 0x80 | (code_point & 0x3F) as u8;
        2
    } else if code_point <= 0xFFFF {
        out[0] = 0xE0 | (code_point >> 12) as u8;
        out[1] = 0x80 | ((code_point >> 6) & 0x3F) as u8;
        out[2] = 0x80 | (code_point & 0x3F) as u8;
        3
    } else {
        out[0] = 0xF0 | ((code_point >> 18) & 0x07) as u8;
        out[1] = 0x80 | ((code_point >> 12) & 0x3F) as u8;
        out[2] = 0x80 | ((code_point >> 6) & 0x3F) as u8;
        out[3] = 0x80 | (code_point & 0x3F) as u8;
        4
    }
}

/// Decode the code point at the start of `bytes`
///
/// Returns the code point and the number of bytes consumed, which is never
/// zero. Bytes after the lead byte form the lookahead budget: a multi-byte
/// lead without enough bytes behind it, or an invalid lead byte, decodes to
/// [`REPLACEMENT_CHARACTER`] and consumes one byte.
pub fn decode(bytes: &[u8]) -> Result<(u32, usize)> {
    let (&lead, rest) = bytes.split_first().ok_or(Error::EmptyInput)?;
    Ok(decode_lead(lead, rest))
}

/// Decode one code point from a lead byte and the bytes following it
#[inline]
pub(crate) fn decode_lead(lead: u8, rest: &[u8]) -> (u32, usize) {
    if lead & 0x80 == 0 {
        return (u32::from(lead), 1);
    }

    let (payload, continuations) = if lead & 0xE0 == 0xC0 {
        (lead & 0x1F, 1)
    } else if lead & 0xF0 == 0xE0 {
        (lead & 0x0F, 2)
    } else if lead & 0xF8 == 0xF0 {
        (lead & 0x07, 3)
    } else {
        return (REPLACEMENT_CHARACTER, 1);
    };

    if rest.len() < continuations {
        return (REPLACEMENT_CHARACTER, 1);
    }

    let code_point = rest[..continuations]
        .iter()
        .fold(u32::from(payload), |acc, &byte| {
            (acc << 6) | u32::from(byte & 0x3F)
        });
    (code_point, continuations + 1)
}

/// Number of bytes the decoder wants for a sequence starting with `lead`
///
/// Invalid lead bytes report 1, since they are consumed alone.
#[inline]
pub(crate) fn sequence_len(lead: u8) -> usize {
    if lead & 0x80 == 0 {
        1
    } else if lead & 0xE0 == 0xC0 {
        2
    } else if lead & 0xF0 == 0xE0 {
        3
    } else if lead & 0xF8 == 0xF0 {
        4
    } else {
        1
    }
}

/// Convert file data to a UTF-8 buffer, removing any byte-order-mark
///
/// With [`Encoding::Any`] the encoding is detected first. UTF-8 data is
/// copied as is; UTF-16BE data is re-encoded; anything else is treated as
/// UTF-16LE. A single byte is returned verbatim, without detection.
pub fn from_file(data: &[u8], encoding: Encoding) -> Vec<u8> {
    match data.len() {
        0 => return Vec::new(),
        1 => return data.to_vec(),
        _ => {}
    }

    let encoding = match encoding {
        Encoding::Any => detect_encoding(data),
        known => known,
    };

    match encoding {
        Encoding::Utf8 => strip_bom(data, Encoding::Utf8).to_vec(),
        Encoding::Utf16BE => {
            transcode::utf16_bytes_to_utf8(strip_bom(data, Encoding::Utf16BE), ByteOrder::Big)
        }
        _ => transcode::utf16_bytes_to_utf8(
            strip_bom(data, Encoding::Utf16LE),
            ByteOrder::Little,
        ),
    }
}

/// Convert a UTF-8 buffer to UTF-8 file data, optionally prefixed with a byte-order-mark
///
/// Returns an empty buffer for empty input, even when a BOM is requested.
pub fn to_file(utf8: &[u8], add_bom: bool) -> Vec<u8> {
    if utf8.is_empty() {
        return Vec::new();
    }

    let bom_len = if add_bom { UTF8_BOM.len() } else { 0 };
    let mut file = Vec::with_capacity(utf8.len() + bom_len);
    if add_bom {
        file.extend_from_slice(&UTF8_BOM);
    }
    file.extend_from_slice(utf8);
    file
}

/// Convert in-memory UTF-16 code units to UTF-8
pub fn from_utf16(units: &[u16]) -> Vec<u8> {
    transcode::utf16_units_to_utf8(units)
}
