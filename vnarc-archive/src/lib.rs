//! # vnarc archive
//!
//! Archive decoding for visual-novel engine containers.
//!
//! This crate provides:
//!
//! - **The decoder contract**: [`ArchiveDecoder`] recognizes a format,
//!   parses its directory and extracts entries
//! - **A registry**: [`DecoderRegistry`] maps identifiers such as
//!   `nscripter/nsa` to decoders and detects the format of an input
//! - **An unpacker**: [`Unpacker`] drives a decoder, names entries, descends
//!   into nested archives under a recursion guard and hands files to a
//!   [`FileSaver`]
//! - **Reference decoders** for NScripter SAR/NSA, Touhou PBG3, GsWin
//!   DataPack5, KISS ARC, Amuse Craft PAC, KID LNK and Libido ARC
//!
//! ## Example
//!
//! ```rust,no_run
//! use vnarc_archive::{DecoderRegistry, MemorySaver, UnpackOptions, Unpacker};
//! use vnarc_core::entry::VirtualFile;
//!
//! let registry = DecoderRegistry::with_builtin();
//! let mut input = VirtualFile::open("arc.nsa").unwrap();
//! let mut saver = MemorySaver::new();
//! let report = Unpacker::new(&registry, UnpackOptions::default())
//!     .unpack(&mut input, None, &mut saver)
//!     .unwrap();
//! println!("{}: {} files", report.format, report.saved.len());
//! ```
//!
//! ## Payload Detection
//!
//! Use [`detect::PayloadFormat`] to sniff extracted entries by their magic
//! bytes.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod decoder;
pub mod detect;
pub mod formats;
pub mod naming;
pub mod registry;
pub mod saver;
pub mod unpack;

// Re-exports
pub use decoder::{ArchiveDecoder, NamingStrategy};
pub use detect::PayloadFormat;
pub use naming::guess_extension;
pub use registry::DecoderRegistry;
pub use saver::{DirectorySaver, FileSaver, MemorySaver, SavedFile};
pub use unpack::{EntryFailure, UnpackOptions, UnpackReport, Unpacker};
