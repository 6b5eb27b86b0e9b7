//! # vnarc core
//!
//! Core components for the vnarc visual-novel archive toolkit.
//!
//! This crate provides the building blocks every archive decoder reads
//! through:
//!
//! - [`stream`]: Seekable byte streams with typed, bounds-checked reads
//! - [`bitstream`]: MSB-first and LSB-first bit readers over a byte stream
//! - [`ringbuffer`]: Absolute-addressed ring dictionary for LZSS
//! - [`entry`]: Archive entries, archive directories and virtual files
//! - [`recursion`]: Depth guard for archives nested in archives
//! - [`error`]: Error types
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ L4: CLI                                                 │
//! │     vnarc list / extract / detect / formats             │
//! ├─────────────────────────────────────────────────────────┤
//! │ L3: Archive decoders                                    │
//! │     decoder contract, registry, unpacker, formats       │
//! ├─────────────────────────────────────────────────────────┤
//! │ L2: Codecs                                              │
//! │     bitwise / bytewise LZSS, Huffman                    │
//! ├─────────────────────────────────────────────────────────┤
//! │ L1: Streams (this crate)                                │
//! │     ByteStream, BitStream, Dictionary, RecursionGuard   │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use vnarc_core::bitstream::BitStream;
//! use vnarc_core::stream::ByteStream;
//!
//! let mut stream = ByteStream::from_bytes(vec![0x00, 0x02, 0xAB, 0xCD]);
//! let count = stream.read_be::<u16>().unwrap();
//! assert_eq!(count, 2);
//!
//! let mut bits = BitStream::msb(&mut stream);
//! assert_eq!(bits.read(12).unwrap(), 0xABC);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod bitstream;
pub mod entry;
pub mod error;
#[cfg(feature = "mmap")]
pub mod mmap;
pub mod recursion;
pub mod ringbuffer;
pub mod stream;

// Re-exports for convenience
pub use bitstream::{BitOrder, BitStream};
pub use entry::{ArchiveEntry, ArchiveMeta, EntryMethod, VirtualFile};
pub use error::{ErrorKind, Result, VnArcError};
pub use recursion::RecursionGuard;
pub use ringbuffer::{Dictionary, DictionaryOutput};
pub use stream::ByteStream;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::bitstream::{BitOrder, BitStream};
    pub use crate::entry::{ArchiveEntry, ArchiveMeta, EntryMethod, VirtualFile};
    pub use crate::error::{ErrorKind, Result, VnArcError};
    pub use crate::recursion::RecursionGuard;
    pub use crate::stream::ByteStream;
}
