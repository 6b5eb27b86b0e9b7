//! # vnarc pack
//!
//! Pure Rust decompressors for the codecs visual-novel engines wrap their
//! archive entries in.
//!
//! - **Bitwise LZSS**: bit-packed tokens with configurable field widths
//!   (NScripter NSA, Touhou PBG3, ...)
//! - **Bytewise LZSS**: the classic 4 KiB window with control bytes
//!   (GsWin PAK tables, Libido ARC, ...)
//! - **Huffman**: trees described bit by bit or loaded from raw node tables
//!
//! ## Example
//!
//! ```rust
//! use vnarc_pack::{BitwiseLzssSettings, decompress_bitwise_bytes};
//!
//! let settings = BitwiseLzssSettings::new(8, 4, 2, 239);
//! // Two literals: 1 01000001, 1 01000010.
//! let output = decompress_bitwise_bytes(&[0xA0, 0xD0, 0x80], 2, &settings).unwrap();
//! assert_eq!(output, b"AB");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod huffman;
pub mod lzss;

// Re-exports
pub use huffman::HuffmanTree;
pub use lzss::{
    BitwiseLzssSettings, BytewiseLzssSettings, LzssToken, decompress_bitwise,
    decompress_bitwise_bytes, decompress_bytewise, decompress_bytewise_bytes,
};
