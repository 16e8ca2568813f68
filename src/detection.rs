//! Encoding detection from byte-order-marks and zero-byte heuristics
//!
//! Detection is best effort. A byte-order-mark is authoritative; without
//! one, the position of zero bytes decides between UTF-16 byte orders, and
//! data without any zero byte is taken as UTF-8. Binary data, or UTF-16 text
//! that contains no ASCII character at all, can be misclassified.

use serde::Serialize;

use crate::{Encoding, UTF8_BOM, UTF16BE_BOM, UTF16LE_BOM};

/// How an encoding was decided
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionMethod {
    /// A byte-order-mark was found at the start of the data
    ByteOrderMark,
    /// A zero byte sat next to a newline, i.e. `\n` encoded as a UTF-16 unit
    NewlineAdjacency,
    /// Zero bytes were counted at even and odd positions
    ZeroByteParity,
    /// Nothing pointed at UTF-16, so UTF-8 was assumed
    Default,
}

/// Result of encoding detection
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetectionResult {
    /// Detected encoding (never [`Encoding::Any`])
    pub encoding: Encoding,
    /// Rule that decided the encoding
    pub method: DetectionMethod,
    /// Length of the byte-order-mark found, 0 if none
    pub bom_len: usize,
}

impl DetectionResult {
    fn new(encoding: Encoding, method: DetectionMethod) -> Self {
        Self {
            encoding,
            method,
            bom_len: 0,
        }
    }

    /// Whether a byte-order-mark was detected
    pub fn bom_detected(&self) -> bool {
        self.bom_len > 0
    }
}

/// Encoding detector for raw file data
#[derive(Debug, Clone, Default)]
pub struct EncodingDetector {
    /// Maximum bytes to analyze (`None` scans everything)
    max_sample_size: Option<usize>,
}

impl EncodingDetector {
    /// Create a detector that scans the whole input
    pub fn new() -> Self {
        Self::default()
    }

    /// Create detector with custom sample size
    pub fn with_sample_size(max_sample_size: usize) -> Self {
        Self {
            max_sample_size: Some(max_sample_size),
        }
    }

    /// Detect encoding of the given data
    pub fn detect(&self, data: &[u8]) -> DetectionResult {
        let sample = match self.max_sample_size {
            Some(limit) if data.len() > limit => &data[..limit],
            _ => data,
        };

        if let Some((encoding, bom_len)) = detect_bom(sample) {
            return DetectionResult {
                encoding,
                method: DetectionMethod::ByteOrderMark,
                bom_len,
            };
        }

        detect_zero_bytes(sample)
    }
}

/// Detect the encoding of raw file data, defaulting to UTF-8
pub fn detect_encoding(data: &[u8]) -> Encoding {
    EncodingDetector::new().detect(data).encoding
}

/// Length of the byte-order-mark of `encoding` at the start of `data`, 0 if absent
pub fn bom_length(data: &[u8], encoding: Encoding) -> usize {
    match encoding.bom() {
        Some(bom) if data.starts_with(bom) => bom.len(),
        _ => 0,
    }
}

/// Remove the byte-order-mark of `encoding` from the start of `data`, if present
pub fn strip_bom(data: &[u8], encoding: Encoding) -> &[u8] {
    &data[bom_length(data, encoding)..]
}

/// Check byte-order-marks in priority order: UTF-8, UTF-16BE, UTF-16LE
fn detect_bom(data: &[u8]) -> Option<(Encoding, usize)> {
    if data.starts_with(&UTF8_BOM) {
        Some((Encoding::Utf8, UTF8_BOM.len()))
    } else if data.starts_with(&UTF16BE_BOM) {
        Some((Encoding::Utf16BE, UTF16BE_BOM.len()))
    } else if data.starts_with(&UTF16LE_BOM) {
        Some((Encoding::Utf16LE, UTF16LE_BOM.len()))
    } else {
        None
    }
}

/// Classify data without a byte-order-mark by where its zero bytes are
///
/// ASCII text in UTF-16 has a zero in every unit: first in big-endian,
/// second in little-endian. A zero next to `\n` settles it immediately.
fn detect_zero_bytes(data: &[u8]) -> DetectionResult {
    let mut even_zeros = 0usize;
    let mut odd_zeros = 0usize;

    for (index, &byte) in data.iter().enumerate() {
        if byte != 0 {
            continue;
        }

        if index % 2 == 1 {
            if data[index - 1] == b'\n' {
                return DetectionResult::new(Encoding::Utf16LE, DetectionMethod::NewlineAdjacency);
            }
            odd_zeros += 1;
        } else if let Some(&next) = data.get(index + 1) {
            if next == b'\n' {
                return DetectionResult::new(Encoding::Utf16BE, DetectionMethod::NewlineAdjacency);
            }
            even_zeros += 1;
        }
    }

    if even_zeros == 0 && odd_zeros == 0 {
        return DetectionResult::new(Encoding::Utf8, DetectionMethod::Default);
    }

    let encoding = if even_zeros >= odd_zeros {
        Encoding::Utf16BE
    } else {
        Encoding::Utf16LE
    };
    DetectionResult::new(encoding, DetectionMethod::ZeroByteParity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ByteOrder;

    fn utf16_bytes(text: &str, order: ByteOrder) -> Vec<u8> {
        text.encode_utf16()
            .flat_map(|unit| order.write_unit(unit))
            .collect()
    }

    #[test]
    fn test_detect_empty() {
        assert_eq!(detect_encoding(&[]), Encoding::Utf8);
        // A lone zero byte is the last byte of the buffer and is not counted
        assert_eq!(detect_encoding(&[0x00]), Encoding::Utf8);

        let result = EncodingDetector::new().detect(&[]);
        assert_eq!(result.method, DetectionMethod::Default);
        assert!(!result.bom_detected());
    }

    #[test]
    fn test_detect_bom_only() {
        assert_eq!(detect_encoding(&[0xEF, 0xBB, 0xBF]), Encoding::Utf8);
        assert_eq!(detect_encoding(&[0xFE, 0xFF]), Encoding::Utf16BE);
        assert_eq!(detect_encoding(&[0xFF, 0xFE]), Encoding::Utf16LE);
    }

    #[test]
    fn test_detect_bom_result() {
        let result = EncodingDetector::new().detect(&[0xEF, 0xBB, 0xBF, b'H', b'i']);
        assert_eq!(result.encoding, Encoding::Utf8);
        assert_eq!(result.method, DetectionMethod::ByteOrderMark);
        assert_eq!(result.bom_len, 3);
        assert!(result.bom_detected());

        // BOM wins over any zero byte that follows
        let result = EncodingDetector::new().detect(&[0xFF, 0xFE, 0x00, b'\n']);
        assert_eq!(result.encoding, Encoding::Utf16LE);
        assert_eq!(result.bom_len, 2);
    }

    #[test]
    fn test_detect_newline_fast_path() {
        let be = utf16_bytes("a\n", ByteOrder::Big);
        assert_eq!(be, vec![0x00, b'a', 0x00, b'\n']);
        let result = EncodingDetector::new().detect(&be);
        assert_eq!(result.encoding, Encoding::Utf16BE);
        assert_eq!(result.method, DetectionMethod::NewlineAdjacency);

        let le = utf16_bytes("a\n", ByteOrder::Little);
        let result = EncodingDetector::new().detect(&le);
        assert_eq!(result.encoding, Encoding::Utf16LE);
        assert_eq!(result.method, DetectionMethod::NewlineAdjacency);
    }

    #[test]
    fn test_detect_without_bom() {
        let texts = [
            "this is a simple string\nwith two lines.\n\nand a third one too!",
            "Cha\u{EE}ne sp\u{E9}ciale en Fran\u{E7}ais,\n avec @ccents (\u{20AC}\u{A3}#\u{A7}\u{B0}).",
            "\u{0429}\u{043D}\u{20001}\u{2000A}\u{306A}\u{13000}\u{1F600}\u{1F428}\n",
        ];
        for text in texts {
            assert_eq!(detect_encoding(text.as_bytes()), Encoding::Utf8, "{text:?}");
            assert_eq!(detect_encoding(&utf16_bytes(text, ByteOrder::Big)), Encoding::Utf16BE);
            assert_eq!(detect_encoding(&utf16_bytes(text, ByteOrder::Little)), Encoding::Utf16LE);
        }
    }

    #[test]
    fn test_detect_zero_parity() {
        let result = EncodingDetector::new().detect(&utf16_bytes("ab", ByteOrder::Big));
        assert_eq!(result.encoding, Encoding::Utf16BE);
        assert_eq!(result.method, DetectionMethod::ZeroByteParity);

        let result = EncodingDetector::new().detect(&utf16_bytes("ab", ByteOrder::Little));
        assert_eq!(result.encoding, Encoding::Utf16LE);
        assert_eq!(result.method, DetectionMethod::ZeroByteParity);

        // A tie goes to big-endian
        assert_eq!(detect_encoding(&[0x00, b'a', b'b', 0x00]), Encoding::Utf16BE);
    }

    #[test]
    fn test_detect_trailing_even_zero_ignored() {
        assert_eq!(detect_encoding(&[b'a', b'b', 0x00]), Encoding::Utf8);
        assert_eq!(detect_encoding(&[b'a', 0x00, 0x00]), Encoding::Utf16LE);
    }

    #[test]
    fn test_detect_with_sample_size() {
        let mut data = b"plain ascii header: ".to_vec();
        data.extend(utf16_bytes("x\n", ByteOrder::Little));

        assert_eq!(EncodingDetector::with_sample_size(8).detect(&data).encoding, Encoding::Utf8);
        assert_eq!(EncodingDetector::new().detect(&data).encoding, Encoding::Utf16LE);
    }

    #[test]
    fn test_strip_bom() {
        let data = [0xEF, 0xBB, 0xBF, b'x'];
        assert_eq!(strip_bom(&data, Encoding::Utf8), b"x");
        assert_eq!(strip_bom(&data, Encoding::Utf16LE), &data);
        assert_eq!(bom_length(&[0xFE, 0xFF, 0x00], Encoding::Utf16BE), 2);
        assert_eq!(bom_length(&[0xFE], Encoding::Utf16BE), 0);
        assert_eq!(bom_length(&[0xFE, 0xFF], Encoding::Any), 0);
    }
}
