//! Touhou PBG3 archives.
//!
//! After the `PBG3` magic everything is bit-packed MSB-first. Integers are
//! prefixed by a 2-bit byte count minus one. The header holds the entry
//! count and the table offset; the table lists checksum, offset, original
//! size and an 8-bit-per-character name for each entry. Entries are bitwise
//! LZSS with a 8 KiB dictionary.

use super::{expect_magic, original_len, stored_len};
use crate::decoder::ArchiveDecoder;
use crate::naming::decode_sjis;
use std::borrow::BorrowMut;
use vnarc_core::bitstream::BitStream;
use vnarc_core::entry::{ArchiveEntry, ArchiveMeta, EntryMethod, VirtualFile};
use vnarc_core::error::Result;
use vnarc_core::stream::ByteStream;
use vnarc_pack::lzss::{BitwiseLzssSettings, decompress_bitwise};

/// Registry identifier of [`Pbg3ArchiveDecoder`].
pub const ID: &str = "team-shanghai-alice/pbg3";

const MAGIC: &[u8] = b"PBG3";
const MAX_NAME_LEN: usize = 256;
const LZSS: BitwiseLzssSettings = BitwiseLzssSettings::new(13, 4, 3, 1);

/// Decoder for Touhou PBG3 archives.
#[derive(Debug, Clone, Copy, Default)]
pub struct Pbg3ArchiveDecoder;

fn read_integer<S: BorrowMut<ByteStream>>(bits: &mut BitStream<S>) -> Result<u32> {
    let size = bits.read(2)? + 1;
    bits.read((size * 8) as u8)
}

impl ArchiveDecoder for Pbg3ArchiveDecoder {
    fn recognize(&self, input: &mut VirtualFile) -> Result<bool> {
        Ok(input.stream.read(MAGIC.len())? == MAGIC)
    }

    fn read_meta(&self, input: &mut VirtualFile) -> Result<ArchiveMeta> {
        let stream = input.stream.seek(0);
        expect_magic(stream, MAGIC)?;

        let mut header = BitStream::msb(&mut *stream);
        let count = read_integer(&mut header)?;
        let table_offset = u64::from(read_integer(&mut header)?);

        stream.seek(table_offset);
        let mut table = BitStream::msb(&mut *stream);
        let mut meta = ArchiveMeta::new();
        for _ in 0..count {
            read_integer(&mut table)?;
            read_integer(&mut table)?;
            let checksum = read_integer(&mut table)?;
            let offset = u64::from(read_integer(&mut table)?);
            let size_orig = u64::from(read_integer(&mut table)?);

            let mut name = Vec::new();
            for _ in 0..MAX_NAME_LEN {
                let c = table.read(8)? as u8;
                if c == 0 {
                    break;
                }
                name.push(c);
            }

            meta.push(
                ArchiveEntry::new(decode_sjis(&name), offset, 0)
                    .with_method(EntryMethod::BitwiseLzss)
                    .with_original_size(size_orig)
                    .with_checksum(checksum),
            );
        }
        meta.infer_sizes_from_offsets(table_offset)?;
        Ok(meta)
    }

    fn read_file(
        &self,
        input: &mut VirtualFile,
        _meta: &ArchiveMeta,
        entry: &ArchiveEntry,
    ) -> Result<VirtualFile> {
        let payload = input.stream.substream(entry.offset, stored_len(entry)? as u64)?;
        let mut bits = BitStream::msb(payload);
        let data = decompress_bitwise(&mut bits, original_len(entry)?, &LZSS)?;
        Ok(VirtualFile::from_bytes(entry.path.clone(), data))
    }

    fn linked_formats(&self) -> &'static [&'static str] {
        &["team-shanghai-alice/anm"]
    }
}
