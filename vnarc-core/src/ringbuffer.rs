//! Ring dictionary for LZSS decompression.
//!
//! The LZSS variants used by game engines address their history window by
//! absolute slot index rather than by distance from the write head. The window
//! is zero-filled at start, and the write head begins at an engine-specific
//! slot (0xFEE for the classic 4 KiB layout).
//!
//! # Sizes
//!
//! - classic bytewise LZSS: 4 KiB (4096 bytes)
//! - NScripter archives: 256 bytes
//! - Touhou PBG3 archives: 8 KiB (8192 bytes)

use crate::error::{Result, VnArcError};

/// Common dictionary sizes.
pub mod sizes {
    /// Classic 4 KiB window.
    pub const CLASSIC: usize = 4096;
    /// Write head start for the classic window (`4096 - 18`).
    pub const CLASSIC_INITIAL_POSITION: usize = 0xFEE;
    /// Most bytes reserved up front for a decoder output.
    pub const MAX_PREALLOCATION: usize = 1 << 20;
}

/// Capacity to reserve for an output declared to be `limit` bytes long.
///
/// Declared sizes come from untrusted headers, so the reservation is capped
/// and the buffer grows with the data actually produced.
#[inline]
pub fn output_capacity(limit: usize) -> usize {
    limit.min(sizes::MAX_PREALLOCATION)
}

/// A zero-seeded circular window addressed by absolute slot.
#[derive(Debug, Clone)]
pub struct Dictionary {
    buffer: Vec<u8>,
    /// Next slot to be written.
    position: usize,
    mask: usize,
}

impl Dictionary {
    /// Create a window of `size` slots with the write head at
    /// `initial_position`.
    ///
    /// `size` must be a non-zero power of two and `initial_position` must lie
    /// inside the window.
    pub fn new(size: usize, initial_position: usize) -> Result<Self> {
        if size == 0 || !size.is_power_of_two() {
            return Err(VnArcError::usage(format!(
                "dictionary size must be a power of two, got {size}"
            )));
        }
        if initial_position >= size {
            return Err(VnArcError::usage(format!(
                "initial dictionary position {initial_position} outside window of {size}"
            )));
        }
        Ok(Self {
            buffer: vec![0; size],
            position: initial_position,
            mask: size - 1,
        })
    }

    /// Number of slots.
    pub fn size(&self) -> usize {
        self.buffer.len()
    }

    /// Slot the next byte goes to.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Byte at an absolute slot. Indices wrap around the window.
    #[inline]
    pub fn get(&self, index: usize) -> u8 {
        self.buffer[index & self.mask]
    }

    /// Store a byte at the write head and advance it.
    #[inline]
    pub fn write_byte(&mut self, byte: u8) {
        self.buffer[self.position] = byte;
        self.position = (self.position + 1) & self.mask;
    }
}

/// A [`Dictionary`] paired with a bounded output buffer.
///
/// Everything written lands in both the window and the output. Writes beyond
/// the output limit are dropped.
#[derive(Debug)]
pub struct DictionaryOutput {
    dictionary: Dictionary,
    output: Vec<u8>,
    limit: usize,
}

impl DictionaryOutput {
    /// Create an output that stops at `limit` bytes.
    pub fn new(dictionary: Dictionary, limit: usize) -> Self {
        Self {
            dictionary,
            output: Vec::with_capacity(output_capacity(limit)),
            limit,
        }
    }

    /// Whether the output has reached its limit.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.output.len() >= self.limit
    }

    /// Emit one literal byte.
    #[inline]
    pub fn write_literal(&mut self, byte: u8) {
        if !self.is_full() {
            self.dictionary.write_byte(byte);
            self.output.push(byte);
        }
    }

    /// Copy `length` bytes starting at absolute slot `position`.
    ///
    /// Bytes are copied one at a time, so a source range that overlaps the
    /// write head repeats freshly written data.
    pub fn copy_match(&mut self, position: usize, length: usize) {
        let mut source = position;
        for _ in 0..length {
            if self.is_full() {
                break;
            }
            let byte = self.dictionary.get(source);
            self.write_literal(byte);
            source = source.wrapping_add(1);
        }
    }

    /// Bytes produced so far.
    pub fn output(&self) -> &[u8] {
        &self.output
    }

    /// Consume and return the output.
    pub fn into_output(self) -> Vec<u8> {
        self.output
    }

    /// The underlying window.
    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }
}
