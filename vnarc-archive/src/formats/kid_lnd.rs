//! KID LND compression.
//!
//! An LND file is `lnd\0`, four unknown bytes, the `u32` original size, four
//! more unknown bytes and the packed data. Each packed command byte selects
//! one of four operations by its top two bits:
//!
//! | bits | operation                                                   |
//! |------|-------------------------------------------------------------|
//! | `11` | repeat the next byte `(b & 0x1F) + 2` times                 |
//! | `10` | copy `((b >> 2) & 0xF) + 2` bytes from earlier output       |
//! | `01` | repeat the next `(b & 0x3F) + 2` bytes `next + 1` times     |
//! | `00` | copy `(b & 0x1F) + 1` literal bytes                         |
//!
//! With bit 5 set, repeat counts and literal lengths take an extra byte
//! shifted left by five.

use super::expect_magic;
use vnarc_core::error::{Result, VnArcError};
use vnarc_core::ringbuffer::output_capacity;
use vnarc_core::stream::ByteStream;

/// Signature of an LND file.
pub const MAGIC: &[u8] = b"lnd\0";

/// Whether `data` starts with the LND signature.
pub fn is_lnd(data: &[u8]) -> bool {
    data.starts_with(MAGIC)
}

/// Unpack a complete LND file.
pub fn decode_lnd(data: &[u8]) -> Result<Vec<u8>> {
    let mut stream = ByteStream::from_bytes(data.to_vec());
    expect_magic(&mut stream, MAGIC)?;
    stream.skip(4);
    let size_orig = stream.read_u32_le()? as usize;
    stream.skip(4);
    let packed = stream.read_to_eof()?;
    decompress_lnd(&packed, size_orig)
}

/// Unpack raw LND commands into at most `size_orig` bytes.
///
/// Stops early when the input runs out. A back-reference before the start
/// of the output is an error.
pub fn decompress_lnd(input: &[u8], size_orig: usize) -> Result<Vec<u8>> {
    let mut output = Vec::with_capacity(output_capacity(size_orig));
    let mut input = input.iter().copied();

    'decode: while output.len() < size_orig {
        let Some(byte) = input.next() else {
            break;
        };

        match (byte & 0x80 != 0, byte & 0x40 != 0) {
            (true, true) => {
                let mut repetitions = usize::from(byte & 0x1F) + 2;
                if byte & 0x20 != 0 {
                    let Some(extra) = input.next() else {
                        break;
                    };
                    repetitions += usize::from(extra) << 5;
                }
                let Some(value) = input.next() else {
                    break;
                };
                let count = repetitions.min(size_orig - output.len());
                output.resize(output.len() + count, value);
            }
            (true, false) => {
                let size = usize::from((byte >> 2) & 0x0F) + 2;
                let Some(low) = input.next() else {
                    break;
                };
                let look_behind = (usize::from(byte & 3) << 8) + usize::from(low) + 1;
                if look_behind > output.len() {
                    return Err(VnArcError::invalid_distance(look_behind, output.len()));
                }
                for _ in 0..size {
                    if output.len() >= size_orig {
                        break;
                    }
                    output.push(output[output.len() - look_behind]);
                }
            }
            (false, true) => {
                let Some(count) = input.next() else {
                    break;
                };
                let repetitions = usize::from(count) + 1;
                let size = usize::from(byte & 0x3F) + 2;
                let pattern: Vec<u8> = input.by_ref().take(size).collect();
                if pattern.len() < size {
                    break;
                }
                for _ in 0..repetitions {
                    for &value in &pattern {
                        if output.len() >= size_orig {
                            break 'decode;
                        }
                        output.push(value);
                    }
                }
            }
            (false, false) => {
                let mut size = usize::from(byte & 0x1F) + 1;
                if byte & 0x20 != 0 {
                    let Some(extra) = input.next() else {
                        break;
                    };
                    size += usize::from(extra) << 5;
                }
                for _ in 0..size {
                    if output.len() >= size_orig {
                        break 'decode;
                    }
                    let Some(value) = input.next() else {
                        break 'decode;
                    };
                    output.push(value);
                }
            }
        }
    }

    Ok(output)
}
