//! Bit-level reading on top of a [`ByteStream`].
//!
//! Archive tables and compressed payloads in this domain pack flags and
//! integers at arbitrary bit widths. Most engines use MSB-first order (the
//! first bit of a byte is its high bit); a few use LSB-first. [`BitStream`]
//! supports both.
//!
//! The reader pulls one byte at a time from the wrapped stream, so after a read
//! the underlying cursor sits just past the last byte that contributed bits.
//!
//! # Example
//!
//! ```
//! use vnarc_core::bitstream::{BitOrder, BitStream};
//! use vnarc_core::stream::ByteStream;
//!
//! let mut bits = BitStream::new(ByteStream::from_bytes(vec![0b1011_0100]), BitOrder::Msb);
//! assert_eq!(bits.read(3).unwrap(), 0b101);
//! assert_eq!(bits.read(5).unwrap(), 0b10100);
//! ```

use crate::error::{Result, VnArcError};
use crate::stream::ByteStream;
use std::borrow::BorrowMut;

/// Order in which bits are taken from each byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BitOrder {
    /// High bit first.
    #[default]
    Msb,
    /// Low bit first.
    Lsb,
}

/// A bit reader wrapping an owned or borrowed [`ByteStream`].
#[derive(Debug)]
pub struct BitStream<S: BorrowMut<ByteStream> = ByteStream> {
    stream: S,
    order: BitOrder,
    /// Pending bits. MSB order keeps the next bit at `bits_in_buffer - 1`,
    /// LSB order keeps it at bit 0.
    buffer: u64,
    bits_in_buffer: u8,
    total_bits_read: u64,
}

impl<S: BorrowMut<ByteStream>> BitStream<S> {
    /// Wrap `stream`, reading bits in `order`.
    pub fn new(stream: S, order: BitOrder) -> Self {
        Self {
            stream,
            order,
            buffer: 0,
            bits_in_buffer: 0,
            total_bits_read: 0,
        }
    }

    /// Wrap `stream` with MSB-first order.
    pub fn msb(stream: S) -> Self {
        Self::new(stream, BitOrder::Msb)
    }

    /// Wrap `stream` with LSB-first order.
    pub fn lsb(stream: S) -> Self {
        Self::new(stream, BitOrder::Lsb)
    }

    /// Bit order of this reader.
    pub fn order(&self) -> BitOrder {
        self.order
    }

    /// Get a reference to the underlying stream.
    pub fn get_ref(&self) -> &ByteStream {
        self.stream.borrow()
    }

    /// Consume the reader and return the wrapped stream.
    ///
    /// Bits still buffered are dropped.
    pub fn into_inner(self) -> S {
        self.stream
    }

    /// Total number of bits consumed so far.
    pub fn bits_read(&self) -> u64 {
        self.total_bits_read
    }

    /// Whether no bits remain, neither buffered nor in the stream.
    pub fn eof(&self) -> bool {
        self.bits_in_buffer == 0 && self.stream.borrow().eof()
    }

    fn fill(&mut self, count: u8) -> Result<()> {
        while self.bits_in_buffer < count {
            let stream = self.stream.borrow_mut();
            if stream.eof() {
                let missing = u64::from(count - self.bits_in_buffer).div_ceil(8);
                return Err(VnArcError::unexpected_eof(stream.tell(), missing, 0));
            }
            let byte = u64::from(stream.read_u8()?);
            match self.order {
                BitOrder::Msb => self.buffer = (self.buffer << 8) | byte,
                BitOrder::Lsb => self.buffer |= byte << self.bits_in_buffer,
            }
            self.bits_in_buffer += 8;
        }
        Ok(())
    }

    #[inline]
    fn extract(&self, count: u8) -> u32 {
        let mask = (1u64 << count).wrapping_sub(1);
        let bits = match self.order {
            BitOrder::Msb => self.buffer >> (self.bits_in_buffer - count),
            BitOrder::Lsb => self.buffer,
        };
        (bits & mask) as u32
    }

    #[inline]
    fn consume(&mut self, count: u8) {
        match self.order {
            BitOrder::Msb => {
                let remaining = self.bits_in_buffer - count;
                self.buffer &= (1u64 << remaining).wrapping_sub(1);
            }
            BitOrder::Lsb => self.buffer >>= count,
        }
        self.bits_in_buffer -= count;
        self.total_bits_read += u64::from(count);
    }

    /// Read `count` bits (at most 32) as an unsigned integer.
    ///
    /// In MSB order the first bit read is the most significant bit of the
    /// result; in LSB order it is the least significant. On failure the bits
    /// already buffered stay available.
    pub fn read(&mut self, count: u8) -> Result<u32> {
        debug_assert!(count <= 32, "cannot read more than 32 bits at once");
        if count == 0 {
            return Ok(0);
        }
        self.fill(count)?;
        let value = self.extract(count);
        self.consume(count);
        Ok(value)
    }

    /// Read a single bit.
    #[inline]
    pub fn read_bit(&mut self) -> Result<bool> {
        Ok(self.read(1)? != 0)
    }

    /// Look at the next `count` bits (at most 32) without consuming them.
    pub fn peek(&mut self, count: u8) -> Result<u32> {
        debug_assert!(count <= 32, "cannot peek more than 32 bits at once");
        if count == 0 {
            return Ok(0);
        }
        self.fill(count)?;
        Ok(self.extract(count))
    }

    /// Discard `count` bits.
    pub fn skip(&mut self, mut count: u64) -> Result<()> {
        while count > 0 {
            let step = count.min(32) as u8;
            self.fill(step)?;
            self.consume(step);
            count -= u64::from(step);
        }
        Ok(())
    }

    /// Discard the rest of the current partially read byte.
    pub fn align_to_byte(&mut self) {
        let partial = self.bits_in_buffer % 8;
        if partial > 0 {
            self.consume(partial);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msb(data: &[u8]) -> BitStream {
        BitStream::msb(ByteStream::from_bytes(data.to_vec()))
    }

    fn lsb(data: &[u8]) -> BitStream {
        BitStream::lsb(ByteStream::from_bytes(data.to_vec()))
    }

    #[test]
    fn test_msb_single_bits() {
        let mut bits = msb(&[0xB5]);
        let read: Vec<u32> = (0..8).map(|_| bits.read(1).unwrap()).collect();
        assert_eq!(read, vec![1, 0, 1, 1, 0, 1, 0, 1]);
        assert!(bits.eof());
    }

    #[test]
    fn test_lsb_single_bits() {
        let mut bits = lsb(&[0xB5]);
        let read: Vec<u32> = (0..8).map(|_| bits.read(1).unwrap()).collect();
        assert_eq!(read, vec![1, 0, 1, 0, 1, 1, 0, 1]);
    }

    #[test]
    fn test_cross_byte_reads() {
        let mut bits = msb(&[0xFF, 0x00, 0xA5]);
        assert_eq!(bits.read(4).unwrap(), 0xF);
        assert_eq!(bits.read(8).unwrap(), 0xF0);
        assert_eq!(bits.read(12).unwrap(), 0x0A5);

        let mut bits = lsb(&[0xFF, 0x00]);
        assert_eq!(bits.read(4).unwrap(), 0xF);
        assert_eq!(bits.read(8).unwrap(), 0x0F);
        assert_eq!(bits.read(4).unwrap(), 0x0);
    }

    #[test]
    fn test_full_width_read() {
        let mut bits = msb(&[0x12, 0x34, 0x56, 0x78, 0x9A]);
        assert_eq!(bits.read(4).unwrap(), 0x1);
        assert_eq!(bits.read(32).unwrap(), 0x2345_6789);
        assert_eq!(bits.read(4).unwrap(), 0xA);
    }

    #[test]
    fn test_peek_does_not_consume() {
        let mut bits = msb(&[0xAB]);
        assert_eq!(bits.peek(4).unwrap(), 0xA);
        assert_eq!(bits.peek(4).unwrap(), 0xA);
        assert_eq!(bits.read(4).unwrap(), 0xA);
        assert_eq!(bits.peek(4).unwrap(), 0xB);
        assert_eq!(bits.bits_read(), 4);
    }

    #[test]
    fn test_failure_keeps_buffered_bits() {
        let mut bits = msb(&[0b1100_0000]);
        assert_eq!(bits.read(1).unwrap(), 1);
        let err = bits.read(9).unwrap_err();
        assert!(err.is_eof());
        assert_eq!(bits.read(7).unwrap(), 0b100_0000);
        assert!(bits.eof());
    }

    #[test]
    fn test_skip_and_align() {
        let mut bits = msb(&[0xFF, 0xAA, 0x55]);
        bits.read(3).unwrap();
        bits.align_to_byte();
        assert_eq!(bits.read(8).unwrap(), 0xAA);
        bits.skip(4).unwrap();
        assert_eq!(bits.read(4).unwrap(), 0x5);
        assert_eq!(bits.bits_read(), 24);
        assert!(bits.skip(1).is_err());
    }

    #[test]
    fn test_borrowed_stream() {
        let mut stream = ByteStream::from_bytes(vec![0x80, 0x01, 0x02]);
        {
            let mut bits = BitStream::msb(&mut stream);
            assert!(bits.read_bit().unwrap());
        }
        assert_eq!(stream.tell(), 1);
        assert_eq!(stream.read_u8().unwrap(), 0x01);
    }
}
