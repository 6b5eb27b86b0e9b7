//! GsWin `DataPack5` archives.
//!
//! The header at 0x30 holds the version, the packed table size, a key, the
//! entry count and the data and table offsets. The table is XORed with the
//! low byte of `index & key` and packed with bytewise LZSS. Entries are
//! stored and carry no reliable extension, so one is sniffed.

use super::{expect_magic, read_stored};
use crate::decoder::ArchiveDecoder;
use crate::naming::{apply_guessed_extension, decode_sjis};
use tracing::trace;
use vnarc_core::entry::{ArchiveEntry, ArchiveMeta, VirtualFile};
use vnarc_core::error::{Result, VnArcError};
use vnarc_core::stream::ByteStream;
use vnarc_pack::lzss::{BytewiseLzssSettings, decompress_bytewise_bytes, max_bytewise_output};

/// Registry identifier of [`GsPakArchiveDecoder`].
pub const ID: &str = "gs/pak";

const MAGIC: &[u8] = b"DataPack5\0\0\0\0\0\0\0";
const HEADER_OFFSET: u64 = 0x30;
const NAME_LEN: usize = 0x40;

/// Decoder for GsWin `.pak` archives.
#[derive(Debug, Clone, Copy, Default)]
pub struct GsPakArchiveDecoder;

/// Table record size for a header version.
fn entry_size(version: u32) -> usize {
    if (version >> 16) < 5 { 0x48 } else { 0x68 }
}

impl ArchiveDecoder for GsPakArchiveDecoder {
    fn recognize(&self, input: &mut VirtualFile) -> Result<bool> {
        Ok(input.stream.read(MAGIC.len())? == MAGIC)
    }

    fn read_meta(&self, input: &mut VirtualFile) -> Result<ArchiveMeta> {
        let stream = input.stream.seek(0);
        expect_magic(stream, MAGIC)?;

        stream.seek(HEADER_OFFSET);
        let version = stream.read_u32_le()?;
        let table_size_comp = stream.read_u32_le()? as usize;
        let key = stream.read_u32_le()?;
        let count = stream.read_u32_le()? as usize;
        let data_offset = u64::from(stream.read_u32_le()?);
        let table_offset = u64::from(stream.read_u32_le()?);

        let entry_size = entry_size(version);
        let table_size_orig = count
            .checked_mul(entry_size)
            .ok_or_else(|| VnArcError::corrupted(HEADER_OFFSET, "entry count overflows"))?;
        if table_size_orig > max_bytewise_output(table_size_comp) {
            return Err(VnArcError::corrupted(
                HEADER_OFFSET,
                format!("{count} entries cannot fit a {table_size_comp}-byte table"),
            ));
        }
        trace!(version, count, entry_size, "DataPack5 header");

        let mut table = stream.seek(table_offset).read(table_size_comp)?;
        for (i, byte) in table.iter_mut().enumerate() {
            *byte ^= (i as u32 & key) as u8;
        }
        let table = decompress_bytewise_bytes(&table, table_size_orig, &BytewiseLzssSettings::default())?;
        let mut table = ByteStream::from_bytes(table);

        let mut meta = ArchiveMeta::new();
        for i in 0..count {
            table.seek((i * entry_size) as u64);
            let name = decode_sjis(&table.read_to_zero_max(NAME_LEN)?);
            let offset = u64::from(table.read_u32_le()?) + data_offset;
            let size = u64::from(table.read_u32_le()?);
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
        let mut file = VirtualFile::from_bytes(entry.path.clone(), read_stored(input, entry)?);
        apply_guessed_extension(&mut file);
        Ok(file)
    }

    fn linked_formats(&self) -> &'static [&'static str] {
        &["gs/gfx"]
    }
}
