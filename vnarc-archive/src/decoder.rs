//! The contract every archive decoder implements.
//!
//! Decoding an archive happens in three steps:
//!
//! 1. [`ArchiveDecoder::is_recognized`] checks, without side effects, whether
//!    the input is in the decoder's format.
//! 2. [`ArchiveDecoder::read_meta`] parses the archive directory.
//! 3. [`ArchiveDecoder::read_file`] extracts one entry at a time.
//!
//! Decoders are stateless; everything an entry needs travels in its
//! [`ArchiveEntry`].

use vnarc_core::entry::{ArchiveEntry, ArchiveMeta, VirtualFile};
use vnarc_core::error::Result;

/// How extracted entries are named.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NamingStrategy {
    /// Keep the names stored in the archive.
    #[default]
    Preserve,
    /// Replace names with the entry index and a sniffed extension.
    Numeric,
}

/// A decoder for one archive format.
pub trait ArchiveDecoder: Send + Sync {
    /// Format-specific recognition.
    ///
    /// Called with the cursor at 0. May read anywhere and may fail; both are
    /// cleaned up by [`is_recognized`](Self::is_recognized).
    fn recognize(&self, input: &mut VirtualFile) -> Result<bool>;

    /// Whether `input` is in this decoder's format.
    ///
    /// Never fails and leaves the cursor where it was.
    fn is_recognized(&self, input: &mut VirtualFile) -> bool {
        let saved = input.stream.tell();
        input.stream.seek(0);
        let recognized = self.recognize(input);
        input.stream.seek(saved);
        matches!(recognized, Ok(true))
    }

    /// Parse the archive directory.
    fn read_meta(&self, input: &mut VirtualFile) -> Result<ArchiveMeta>;

    /// Extract one entry described by `meta`.
    fn read_file(
        &self,
        input: &mut VirtualFile,
        meta: &ArchiveMeta,
        entry: &ArchiveEntry,
    ) -> Result<VirtualFile>;

    /// How extracted entries should be named.
    fn naming_strategy(&self) -> NamingStrategy {
        NamingStrategy::Preserve
    }

    /// Decoders likely to apply to this archive's entries, tried first when
    /// looking for nested archives.
    fn linked_formats(&self) -> &'static [&'static str] {
        &[]
    }
}
