//! Whole-buffer and streaming conversion between UTF-8 and UTF-16
//!
//! Every conversion decodes one code point at a time and re-encodes it into
//! a small fixed-size scratch buffer. The scratch buffer is appended to the
//! output only when it is nearly full, so the output grows in large blocks
//! instead of one sequence at a time.

use crate::detection::detect_encoding;
use crate::{ByteOrder, Encoding, Error, Result, utf8, utf16};

/// Scratch capacity when producing UTF-8, in bytes
const UTF8_SCRATCH_SIZE: usize = 512;
/// Scratch capacity when producing UTF-16, in code units
const UTF16_SCRATCH_SIZE: usize = 256;

/// Fixed-capacity staging area flushed into a growing output
struct Scratch<T, const N: usize> {
    items: [T; N],
    len: usize,
    /// Longest sequence a single push may add
    reserve: usize,
}

impl<T: Copy + Default, const N: usize> Scratch<T, N> {
    fn new(reserve: usize) -> Self {
        Self {
            items: [T::default(); N],
            len: 0,
            reserve,
        }
    }

    /// Append one encoded sequence, flushing once less than `reserve` slots remain
    #[inline]
    fn push(&mut self, sequence: &[T], output: &mut Vec<T>) {
        debug_assert!(sequence.len() <= self.reserve);
        self.items[self.len..self.len + sequence.len()].copy_from_slice(sequence);
        self.len += sequence.len();
        if self.len + self.reserve > N {
            self.flush(output);
        }
    }

    fn flush(&mut self, output: &mut Vec<T>) {
        output.extend_from_slice(&self.items[..self.len]);
        self.len = 0;
    }
}

/// Convert UTF-8 bytes to UTF-16 code units
pub(crate) fn utf8_to_utf16(data: &[u8]) -> Vec<u16> {
    let mut output = Vec::with_capacity(data.len());
    let mut scratch = Scratch::<u16, UTF16_SCRATCH_SIZE>::new(utf16::MAX_SEQUENCE_LEN);
    let mut sequence = [0u16; utf16::MAX_SEQUENCE_LEN];

    let mut remaining = data;
    while let Some((&lead, rest)) = remaining.split_first() {
        let (code_point, consumed) = utf8::decode_lead(lead, rest);
        remaining = &remaining[consumed..];

        let produced = utf16::encode(code_point, &mut sequence);
        scratch.push(&sequence[..produced], &mut output);
    }
    scratch.flush(&mut output);
    output
}

/// Convert a stream of UTF-16 code units to UTF-8 bytes
fn units_to_utf8(units: impl Iterator<Item = u16>, capacity: usize) -> Vec<u8> {
    let mut output = Vec::with_capacity(capacity);
    let mut scratch = Scratch::<u8, UTF8_SCRATCH_SIZE>::new(utf8::MAX_SEQUENCE_LEN);
    let mut sequence = [0u8; utf8::MAX_SEQUENCE_LEN];

    let mut units = units.peekable();
    while let Some(first) = units.next() {
        let (code_point, consumed) = utf16::decode_pair(first, units.peek().copied());
        if consumed == 2 {
            units.next();
        }

        let produced = utf8::encode(code_point, &mut sequence);
        scratch.push(&sequence[..produced], &mut output);
    }
    scratch.flush(&mut output);
    output
}

/// Convert in-memory UTF-16 code units to UTF-8 bytes
pub(crate) fn utf16_units_to_utf8(units: &[u16]) -> Vec<u8> {
    units_to_utf8(units.iter().copied(), units.len() * 3 / 2)
}

/// Convert UTF-16 bytes stored in `order` to UTF-8 bytes
///
/// A trailing odd byte is not part of any code unit and is dropped.
pub(crate) fn utf16_bytes_to_utf8(data: &[u8], order: ByteOrder) -> Vec<u8> {
    units_to_utf8(read_units(data, order), data.len())
}

/// Reassemble UTF-16 bytes stored in `order` into native code units
pub(crate) fn utf16_bytes_to_units(data: &[u8], order: ByteOrder) -> Vec<u16> {
    read_units(data, order).collect()
}

/// Append code units to `output` as bytes in `order`
pub(crate) fn write_units(units: &[u16], order: ByteOrder, output: &mut Vec<u8>) {
    output.reserve(units.len() * 2);
    for &unit in units {
        output.extend_from_slice(&order.write_unit(unit));
    }
}

fn read_units(data: &[u8], order: ByteOrder) -> impl Iterator<Item = u16> + '_ {
    data.chunks_exact(2)
        .map(move |pair| order.read_unit([pair[0], pair[1]]))
}

/// Rewrite UTF-16 bytes from one byte order to the other, unit by unit
fn swap_byte_order(data: &[u8], from: ByteOrder, to: ByteOrder) -> Vec<u8> {
    let mut output = Vec::with_capacity(data.len());
    for unit in read_units(data, from) {
        output.extend_from_slice(&to.write_unit(unit));
    }
    output
}

/// Convert between two concrete encodings
fn convert_resolved(from: Encoding, to: Encoding, data: &[u8]) -> Vec<u8> {
    if from == to {
        return data.to_vec();
    }
    match (from.byte_order(), to.byte_order()) {
        (None, Some(target)) => {
            let units = utf8_to_utf16(data);
            let mut output = Vec::with_capacity(units.len() * 2);
            write_units(&units, target, &mut output);
            output
        }
        (Some(source), None) => utf16_bytes_to_utf8(data, source),
        (Some(source), Some(target)) => swap_byte_order(data, source, target),
        (None, None) => data.to_vec(),
    }
}

/// Whole-buffer converter between two encodings
///
/// Byte-order-marks are not special here: a leading U+FEFF is converted like
/// any other code point, so a source BOM becomes the target's BOM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transcoder {
    from: Encoding,
    to: Encoding,
}

impl Transcoder {
    /// Create a new transcoder between two encodings
    ///
    /// The source may be [`Encoding::Any`] (detected on every conversion);
    /// the target must be a concrete encoding.
    pub fn new(from: Encoding, to: Encoding) -> Result<Self> {
        if !to.is_resolved() {
            return Err(Error::UnsupportedConversion {
                from: from.name(),
                to: to.name(),
            });
        }
        Ok(Self { from, to })
    }

    /// Get source encoding
    pub fn from_encoding(&self) -> Encoding {
        self.from
    }

    /// Get target encoding
    pub fn to_encoding(&self) -> Encoding {
        self.to
    }

    /// Source encoding used for `input`, detecting it if needed
    pub fn resolve_source(&self, input: &[u8]) -> Encoding {
        match self.from {
            Encoding::Any => detect_encoding(input),
            known => known,
        }
    }

    /// Convert data from source to target encoding
    ///
    /// Malformed input is replaced with U+FFFD; this never fails.
    pub fn convert(&self, input: &[u8]) -> Vec<u8> {
        convert_resolved(self.resolve_source(input), self.to, input)
    }
}

/// Chunked converter producing the same bytes as [`Transcoder::convert`]
///
/// Only the tail that the whole-buffer decoder would see as truncated (an
/// incomplete UTF-8 sequence, a trailing odd byte or a trailing high
/// surrogate) is held back between chunks.
#[derive(Debug, Clone)]
pub struct StreamTranscoder {
    from: Encoding,
    to: Encoding,
    pending: Vec<u8>,
}

impl StreamTranscoder {
    /// Create a new streaming transcoder; both encodings must be concrete
    pub fn new(from: Encoding, to: Encoding) -> Result<Self> {
        if !from.is_resolved() || !to.is_resolved() {
            return Err(Error::UnsupportedConversion {
                from: from.name(),
                to: to.name(),
            });
        }
        Ok(Self {
            from,
            to,
            pending: Vec::new(),
        })
    }

    /// Get source encoding
    pub fn from_encoding(&self) -> Encoding {
        self.from
    }

    /// Get target encoding
    pub fn to_encoding(&self) -> Encoding {
        self.to
    }

    /// Bytes held back waiting for the next chunk
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Process a chunk of data, returning everything that can be converted so far
    pub fn push(&mut self, chunk: &[u8]) -> Vec<u8> {
        self.pending.extend_from_slice(chunk);
        let complete = self.complete_len();
        let output = convert_resolved(self.from, self.to, &self.pending[..complete]);
        self.pending.drain(..complete);
        output
    }

    /// Convert whatever is still pending, treating it as the end of input
    pub fn finish(self) -> Vec<u8> {
        convert_resolved(self.from, self.to, &self.pending)
    }

    /// Length of the pending prefix that decodes the same whatever comes next
    fn complete_len(&self) -> usize {
        match self.from.byte_order() {
            Some(order) => {
                let even = self.pending.len() & !1;
                match self.pending.get(even.saturating_sub(2)..even) {
                    Some(&[a, b]) if utf16::is_high_surrogate(order.read_unit([a, b])) => even - 2,
                    _ => even,
                }
            }
            None => {
                let mut index = 0;
                while let Some(&lead) = self.pending.get(index) {
                    let needed = utf8::sequence_len(lead);
                    if index + needed > self.pending.len() {
                        break;
                    }
                    index += needed;
                }
                index
            }
        }
    }
}
