//! # utf-transcode - Unicode Transcoding Library
//!
//! Conversion between UTF-8, UTF-16BE and UTF-16LE, with encoding detection
//! and byte-order-mark handling for raw file contents.
//!
//! ## Features
//!
//! - **Single code point codecs** for UTF-8 ([`utf8::encode`], [`utf8::decode`])
//!   and UTF-16 ([`utf16::encode`], [`utf16::decode`])
//! - **Encoding detection** from byte-order-marks or a zero-byte heuristic
//! - **Whole-buffer transcoding** batched through a bounded scratch buffer
//! - **Streaming support** for inputs delivered in chunks
//! - **Lossy decoding**: malformed input decodes to U+FFFD, never to an error
//!
//! ## Quick Start
//!
//! ```rust
//! use utf_transcode::{utf8, utf16, Encoding};
//!
//! // UTF-16LE file contents with a byte-order-mark: "Hi\n"
//! let file = [0xFF, 0xFE, b'H', 0x00, b'i', 0x00, b'\n', 0x00];
//! let text = utf8::from_file(&file, Encoding::Any);
//! assert_eq!(text, b"Hi\n");
//!
//! // And back, as big-endian with a byte-order-mark
//! let units = utf16::from_utf8(&text);
//! let file_be = utf16::to_file_be(&units);
//! assert_eq!(file_be, [0xFE, 0xFF, 0x00, b'H', 0x00, b'i', 0x00, b'\n']);
//! ```

#![deny(missing_docs)]

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

pub mod detection;
mod transcode;
pub mod utf16;
pub mod utf8;

pub use detection::{DetectionMethod, DetectionResult, EncodingDetector, detect_encoding};
pub use transcode::{StreamTranscoder, Transcoder};

/// Code point substituted for any sequence that cannot be decoded
pub const REPLACEMENT_CHARACTER: u32 = 0xFFFD;

/// UTF-8 byte-order-mark
pub const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];
/// UTF-16 big-endian byte-order-mark
pub const UTF16BE_BOM: [u8; 2] = [0xFE, 0xFF];
/// UTF-16 little-endian byte-order-mark
pub const UTF16LE_BOM: [u8; 2] = [0xFF, 0xFE];

/// Result type for transcoding operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during transcoding operations
///
/// Malformed input is never one of them: it decodes to
/// [`REPLACEMENT_CHARACTER`]. These only report broken call contracts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A single code point decode was given no code units
    EmptyInput,
    /// Conversion endpoints cannot be used together
    UnsupportedConversion {
        /// Source encoding name
        from: &'static str,
        /// Target encoding name
        to: &'static str,
    },
    /// Encoding name not recognized
    UnknownEncoding(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::EmptyInput => write!(f, "Cannot decode a code point from empty input"),
            Error::UnsupportedConversion { from, to } => {
                write!(f, "Unsupported conversion from {} to {}", from, to)
            }
            Error::UnknownEncoding(name) => write!(f, "Unknown encoding: {}", name),
        }
    }
}

impl std::error::Error for Error {}

/// Unicode character encodings handled by the transcoder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum Encoding {
    /// Unspecified: resolved by detection before any conversion
    #[default]
    #[serde(rename = "auto")]
    Any,
    /// UTF-8 (1-4 bytes per code point)
    #[serde(rename = "UTF-8")]
    Utf8,
    /// UTF-16 big-endian (1-2 words per code point)
    #[serde(rename = "UTF-16BE")]
    Utf16BE,
    /// UTF-16 little-endian (1-2 words per code point)
    #[serde(rename = "UTF-16LE")]
    Utf16LE,
}

impl Encoding {
    /// Get the canonical name of this encoding
    pub fn name(self) -> &'static str {
        match self {
            Encoding::Any => "auto",
            Encoding::Utf8 => "UTF-8",
            Encoding::Utf16BE => "UTF-16BE",
            Encoding::Utf16LE => "UTF-16LE",
        }
    }

    /// Check whether this is a concrete encoding (anything but [`Encoding::Any`])
    pub fn is_resolved(self) -> bool {
        self != Encoding::Any
    }

    /// Size of one code unit in bytes (`None` when unresolved)
    pub fn code_unit_size(self) -> Option<usize> {
        match self {
            Encoding::Any => None,
            Encoding::Utf8 => Some(1),
            Encoding::Utf16BE | Encoding::Utf16LE => Some(2),
        }
    }

    /// Get the byte order mark (BOM) for this encoding if it has one
    pub fn bom(self) -> Option<&'static [u8]> {
        match self {
            Encoding::Utf8 => Some(&UTF8_BOM),
            Encoding::Utf16BE => Some(&UTF16BE_BOM),
            Encoding::Utf16LE => Some(&UTF16LE_BOM),
            Encoding::Any => None,
        }
    }

    /// Byte order of the encoded data, for UTF-16 only
    pub fn byte_order(self) -> Option<ByteOrder> {
        match self {
            Encoding::Utf16BE => Some(ByteOrder::Big),
            Encoding::Utf16LE => Some(ByteOrder::Little),
            _ => None,
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Encoding {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_uppercase().as_str() {
            "AUTO" | "ANY" => Ok(Encoding::Any),
            "UTF8" | "UTF-8" => Ok(Encoding::Utf8),
            "UTF16BE" | "UTF-16BE" => Ok(Encoding::Utf16BE),
            "UTF16LE" | "UTF-16LE" => Ok(Encoding::Utf16LE),
            _ => Err(Error::UnknownEncoding(s.to_string())),
        }
    }
}

/// Byte order of 16-bit code units in memory or in a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ByteOrder {
    /// Most significant byte first
    Big,
    /// Least significant byte first
    Little,
}

impl ByteOrder {
    /// Byte order of the machine this crate was built for
    pub const fn host() -> Self {
        if cfg!(target_endian = "big") {
            ByteOrder::Big
        } else {
            ByteOrder::Little
        }
    }

    /// Read one code unit stored in this byte order
    #[inline]
    pub fn read_unit(self, bytes: [u8; 2]) -> u16 {
        let unit = u16::from_ne_bytes(bytes);
        if self == Self::host() {
            unit
        } else {
            unit.swap_bytes()
        }
    }

    /// Write one code unit in this byte order
    #[inline]
    pub fn write_unit(self, unit: u16) -> [u8; 2] {
        let unit = if self == Self::host() {
            unit
        } else {
            unit.swap_bytes()
        };
        unit.to_ne_bytes()
    }
}
