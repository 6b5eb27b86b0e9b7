//! Amuse Craft `.pac` archives.
//!
//! Two layouts exist. The first has a `u16` count at 0 and a table at 0x3FE
//! with 16-byte names; the second starts with `PAC ` and has a `u32` count
//! at 8 and a table at 0x804 with 32-byte names. Neither carries a version
//! field, so the layout is the one whose last entry ends exactly at the end
//! of the file. Names use `_` as directory separator.

use super::read_stored;
use crate::decoder::ArchiveDecoder;
use crate::naming::decode_sjis;
use vnarc_core::entry::{ArchiveEntry, ArchiveMeta, VirtualFile};
use vnarc_core::error::{Result, VnArcError};
use vnarc_core::stream::ByteStream;

/// Registry identifier of [`AmusePacArchiveDecoder`].
pub const ID: &str = "amuse-craft/pac";

/// Decoder for Amuse Craft `.pac` archives.
#[derive(Debug, Clone, Copy, Default)]
pub struct AmusePacArchiveDecoder;

/// Table layout of a PAC archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacLayout {
    /// Layout number, 1 or 2.
    pub version: u32,
    /// Entry count.
    pub count: u32,
    /// Offset of the first table record.
    pub table_offset: u64,
    /// Width of the name field.
    pub name_len: usize,
}

impl PacLayout {
    fn record_len(&self) -> u64 {
        self.name_len as u64 + 8
    }

    /// Whether the last record's entry ends at the end of the stream.
    fn fits(&self, stream: &mut ByteStream) -> Result<bool> {
        if self.count == 0 {
            return Ok(false);
        }
        let last = self.table_offset + u64::from(self.count - 1) * self.record_len();
        stream.seek(last).skip(self.name_len as u64);
        let size = u64::from(stream.read_u32_le()?);
        let offset = u64::from(stream.read_u32_le()?);
        Ok(offset + size == stream.size())
    }
}

fn layout_v1(stream: &mut ByteStream) -> Result<Option<PacLayout>> {
    let layout = PacLayout {
        version: 1,
        count: u32::from(stream.seek(0).read_u16_le()?),
        table_offset: 0x3FE,
        name_len: 16,
    };
    Ok(layout.fits(stream)?.then_some(layout))
}

fn layout_v2(stream: &mut ByteStream) -> Result<Option<PacLayout>> {
    let layout = PacLayout {
        version: 2,
        count: stream.seek(8).read_u32_le()?,
        table_offset: 0x804,
        name_len: 32,
    };
    Ok(layout.fits(stream)?.then_some(layout))
}

/// Find the layout of `stream`. Read errors count as a mismatch.
pub fn detect_layout(stream: &mut ByteStream) -> Result<PacLayout> {
    if let Ok(Some(layout)) = layout_v1(stream) {
        return Ok(layout);
    }
    if let Ok(Some(layout)) = layout_v2(stream) {
        return Ok(layout);
    }
    Err(VnArcError::not_recognized(ID))
}

impl ArchiveDecoder for AmusePacArchiveDecoder {
    fn recognize(&self, input: &mut VirtualFile) -> Result<bool> {
        detect_layout(&mut input.stream).map(|_| true)
    }

    fn read_meta(&self, input: &mut VirtualFile) -> Result<ArchiveMeta> {
        let layout = detect_layout(&mut input.stream)?;
        let stream = input.stream.seek(layout.table_offset);

        let mut meta = ArchiveMeta::new();
        for _ in 0..layout.count {
            let name = decode_sjis(&stream.read_to_zero_max(layout.name_len)?).replace('_', "/");
            let size = u64::from(stream.read_u32_le()?);
            let offset = u64::from(stream.read_u32_le()?);
            meta.push(ArchiveEntry::new(name, offset, size));
        }
        Ok(meta)
    }

    fn read_file(
        &self,
        input: &mut VirtualFile,
        _meta: &ArchiveMeta,
        entry: &ArchiveEntry,
    ) -> Result<VirtualFile> {
        Ok(VirtualFile::from_bytes(entry.path.clone(), read_stored(input, entry)?))
    }

    fn linked_formats(&self) -> &'static [&'static str] {
        &[
            "truevision/tga",
            "amuse-craft/pgd-ge",
            "amuse-craft/pgd-c00",
            "amuse-craft/bgm",
        ]
    }
}
