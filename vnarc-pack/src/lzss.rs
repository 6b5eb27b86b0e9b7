//! LZSS decompression as used by visual-novel archive formats.
//!
//! LZSS (Lempel-Ziv-Storer-Szymanski) interleaves literal bytes with
//! back-references into a ring dictionary. Two families are common:
//!
//! - **Bitwise**: every token starts with a single flag bit, and match
//!   fields have configurable widths. A match names an absolute slot of a
//!   zero-seeded dictionary of `2^position_bits` bytes.
//! - **Bytewise**: flags come eight at a time in a control byte (low bit
//!   first), and a match is two bytes holding a 12-bit slot and a 4-bit
//!   length over a 4 KiB dictionary.
//!
//! Both decoders stop after `output_size` bytes or when the input runs out.
//! Running out of input is not an error: whatever was decoded is returned.
//!
//! # Example
//!
//! ```
//! use vnarc_pack::lzss::{BytewiseLzssSettings, decompress_bytewise_bytes};
//!
//! // Three literals, a match of slot 0xFEE for six bytes, one literal.
//! let input = [0x17, b'a', b'b', b'c', 0xEE, 0xF3, b'd'];
//! let output = decompress_bytewise_bytes(&input, 64, &BytewiseLzssSettings::default()).unwrap();
//! assert_eq!(output, b"abcabcabcd");
//! ```

use std::borrow::BorrowMut;

use tracing::trace;
use vnarc_core::bitstream::BitStream;
use vnarc_core::error::{Result, VnArcError};
use vnarc_core::ringbuffer::{Dictionary, DictionaryOutput, sizes};
use vnarc_core::stream::ByteStream;

/// Largest supported `position_bits` (a 16 MiB dictionary).
pub const MAX_POSITION_BITS: u8 = 24;

/// Most output bytes one input byte of bytewise LZSS can yield: a two-byte
/// match copies at most 18 bytes.
pub const BYTEWISE_MAX_EXPANSION: usize = 9;

/// Upper bound on the output of `input_len` bytes of bytewise LZSS.
pub fn max_bytewise_output(input_len: usize) -> usize {
    input_len.saturating_mul(BYTEWISE_MAX_EXPANSION)
}

/// LZSS token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LzssToken {
    /// A literal byte.
    Literal(u8),
    /// A back-reference into the dictionary.
    Match {
        /// Absolute dictionary slot of the first byte.
        position: usize,
        /// Number of bytes to copy.
        length: usize,
    },
}

/// Parameters of the bit-packed LZSS family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitwiseLzssSettings {
    /// Width of the slot field; the dictionary holds `2^position_bits` bytes.
    pub position_bits: u8,
    /// Width of the length field.
    pub size_bits: u8,
    /// Added to the length field to get the match length.
    pub min_match_size: usize,
    /// Slot written by the first output byte.
    pub initial_dictionary_pos: usize,
}

impl BitwiseLzssSettings {
    /// Create settings.
    pub const fn new(
        position_bits: u8,
        size_bits: u8,
        min_match_size: usize,
        initial_dictionary_pos: usize,
    ) -> Self {
        Self {
            position_bits,
            size_bits,
            min_match_size,
            initial_dictionary_pos,
        }
    }

    /// Dictionary size in bytes.
    pub fn dictionary_size(&self) -> usize {
        1usize << self.position_bits
    }

    /// Longest match a single token can express.
    pub fn max_match_size(&self) -> usize {
        (1usize << self.size_bits) + self.min_match_size - 1
    }

    /// Check the field widths and the initial slot.
    pub fn validate(&self) -> Result<()> {
        if self.position_bits == 0 || self.position_bits > MAX_POSITION_BITS {
            return Err(VnArcError::usage(format!(
                "position_bits must be in 1..={MAX_POSITION_BITS}, got {}",
                self.position_bits
            )));
        }
        if u32::from(self.position_bits) + u32::from(self.size_bits) > 32 {
            return Err(VnArcError::usage(format!(
                "position_bits + size_bits must not exceed 32, got {} + {}",
                self.position_bits, self.size_bits
            )));
        }
        if self.initial_dictionary_pos >= self.dictionary_size() {
            return Err(VnArcError::usage(format!(
                "initial dictionary position {} outside a {}-byte dictionary",
                self.initial_dictionary_pos,
                self.dictionary_size()
            )));
        }
        Ok(())
    }
}

/// Parameters of the byte-framed LZSS family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BytewiseLzssSettings {
    /// Slot written by the first output byte.
    pub initial_dictionary_pos: usize,
}

impl Default for BytewiseLzssSettings {
    fn default() -> Self {
        Self {
            initial_dictionary_pos: sizes::CLASSIC_INITIAL_POSITION,
        }
    }
}

impl BytewiseLzssSettings {
    /// Check that the initial slot lies inside the 4 KiB dictionary.
    pub fn validate(&self) -> Result<()> {
        if self.initial_dictionary_pos >= sizes::CLASSIC {
            return Err(VnArcError::usage(format!(
                "initial dictionary position {} outside a {}-byte dictionary",
                self.initial_dictionary_pos,
                sizes::CLASSIC
            )));
        }
        Ok(())
    }
}

/// Turn end-of-input into `None`, keep other failures.
fn or_exhausted<T>(result: Result<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_eof() => Ok(None),
        Err(e) => Err(e),
    }
}

fn read_bitwise_token<S: BorrowMut<ByteStream>>(
    bits: &mut BitStream<S>,
    settings: &BitwiseLzssSettings,
) -> Result<LzssToken> {
    if bits.read_bit()? {
        return Ok(LzssToken::Literal(bits.read(8)? as u8));
    }
    let position = bits.read(settings.position_bits)? as usize;
    let length = bits.read(settings.size_bits)? as usize + settings.min_match_size;
    Ok(LzssToken::Match { position, length })
}

fn apply(out: &mut DictionaryOutput, token: LzssToken) {
    match token {
        LzssToken::Literal(byte) => out.write_literal(byte),
        LzssToken::Match { position, length } => out.copy_match(position, length),
    }
}

/// Decompress bit-packed LZSS from a bit stream.
///
/// Flag bit `1` is a literal (the next 8 bits), `0` a match (slot, then
/// length minus `min_match_size`). Returns at most `output_size` bytes.
pub fn decompress_bitwise<S: BorrowMut<ByteStream>>(
    bits: &mut BitStream<S>,
    output_size: usize,
    settings: &BitwiseLzssSettings,
) -> Result<Vec<u8>> {
    settings.validate()?;
    let dictionary = Dictionary::new(settings.dictionary_size(), settings.initial_dictionary_pos)?;
    let mut out = DictionaryOutput::new(dictionary, output_size);

    while !out.is_full() {
        match or_exhausted(read_bitwise_token(bits, settings))? {
            Some(token) => apply(&mut out, token),
            None => {
                trace!(
                    produced = out.output().len(),
                    output_size, "bitwise LZSS input exhausted"
                );
                break;
            }
        }
    }

    Ok(out.into_output())
}

/// Decompress bit-packed LZSS from a byte slice read MSB-first.
pub fn decompress_bitwise_bytes(
    input: &[u8],
    output_size: usize,
    settings: &BitwiseLzssSettings,
) -> Result<Vec<u8>> {
    let mut bits = BitStream::msb(ByteStream::from_bytes(input.to_vec()));
    decompress_bitwise(&mut bits, output_size, settings)
}

/// Decompress byte-framed LZSS from the stream cursor to its end.
pub fn decompress_bytewise(
    input: &mut ByteStream,
    output_size: usize,
    settings: &BytewiseLzssSettings,
) -> Result<Vec<u8>> {
    settings.validate()?;
    let dictionary = Dictionary::new(sizes::CLASSIC, settings.initial_dictionary_pos)?;
    let mut out = DictionaryOutput::new(dictionary, output_size);
    let mut control: u32 = 0;

    while !out.is_full() {
        control >>= 1;
        if control & 0x100 == 0 {
            match or_exhausted(input.read_u8())? {
                Some(flags) => control = u32::from(flags) | 0xFF00,
                None => break,
            }
        }

        let token = if control & 1 != 0 {
            match or_exhausted(input.read_u8())? {
                Some(byte) => LzssToken::Literal(byte),
                None => break,
            }
        } else {
            let Some(lo) = or_exhausted(input.read_u8())? else {
                break;
            };
            let Some(hi) = or_exhausted(input.read_u8())? else {
                break;
            };
            let (lo, hi) = (usize::from(lo), usize::from(hi));
            LzssToken::Match {
                position: lo | ((hi & 0xF0) << 4),
                length: (hi & 0x0F) + 3,
            }
        };
        apply(&mut out, token);
    }

    Ok(out.into_output())
}

/// Decompress byte-framed LZSS from a byte slice.
pub fn decompress_bytewise_bytes(
    input: &[u8],
    output_size: usize,
    settings: &BytewiseLzssSettings,
) -> Result<Vec<u8>> {
    let mut stream = ByteStream::from_bytes(input.to_vec());
    decompress_bytewise(&mut stream, output_size, settings)
}
