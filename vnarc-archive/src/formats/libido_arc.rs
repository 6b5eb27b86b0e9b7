//! Libido `.arc` archives.
//!
//! A `u32` count, then 32-byte records: a 20-byte name XORed with its own
//! last byte, original size, packed size and offset. Entries are bytewise
//! LZSS.

use super::{original_len, stored_len};
use crate::decoder::ArchiveDecoder;
use crate::naming::decode_sjis;
use vnarc_core::entry::{ArchiveEntry, ArchiveMeta, EntryMethod, VirtualFile};
use vnarc_core::error::Result;
use vnarc_pack::lzss::{BytewiseLzssSettings, decompress_bytewise};

/// Registry identifier of [`LibidoArcArchiveDecoder`].
pub const ID: &str = "libido/arc";

const RECORD_LEN: u64 = 32;
const NAME_LEN: usize = 20;

/// Decoder for Libido `.arc` archives.
#[derive(Debug, Clone, Copy, Default)]
pub struct LibidoArcArchiveDecoder;

fn unmask_name(mut name: Vec<u8>) -> Vec<u8> {
    if let Some(&mask) = name.last() {
        name.iter_mut().for_each(|c| *c ^= mask);
    }
    if let Some(end) = name.iter().position(|&c| c == 0) {
        name.truncate(end);
    }
    name
}

impl ArchiveDecoder for LibidoArcArchiveDecoder {
    fn recognize(&self, input: &mut VirtualFile) -> Result<bool> {
        let stream = &mut input.stream;
        let count = stream.read_u32_le()?;
        if count == 0 {
            return Ok(false);
        }
        stream.skip(u64::from(count - 1) * RECORD_LEN + NAME_LEN as u64 + 4);
        let size_comp = u64::from(stream.read_u32_le()?);
        let offset = u64::from(stream.read_u32_le()?);
        Ok(offset + size_comp == stream.size())
    }

    fn read_meta(&self, input: &mut VirtualFile) -> Result<ArchiveMeta> {
        let stream = input.stream.seek(0);
        let count = stream.read_u32_le()?;

        let mut meta = ArchiveMeta::new();
        for _ in 0..count {
            let name = unmask_name(stream.read(NAME_LEN)?);
            let size_orig = u64::from(stream.read_u32_le()?);
            let size_comp = u64::from(stream.read_u32_le()?);
            let offset = u64::from(stream.read_u32_le()?);
            meta.push(
                ArchiveEntry::new(decode_sjis(&name), offset, size_comp)
                    .with_method(EntryMethod::BytewiseLzss)
                    .with_original_size(size_orig),
            );
        }
        Ok(meta)
    }

    fn read_file(
        &self,
        input: &mut VirtualFile,
        _meta: &ArchiveMeta,
        entry: &ArchiveEntry,
    ) -> Result<VirtualFile> {
        let mut payload = input.stream.substream(entry.offset, stored_len(entry)? as u64)?;
        let data = decompress_bytewise(
            &mut payload,
            original_len(entry)?,
            &BytewiseLzssSettings::default(),
        )?;
        Ok(VirtualFile::from_bytes(entry.path.clone(), data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn masked(name: &str, mask: u8) -> Vec<u8> {
        let mut field = vec![0u8; NAME_LEN];
        field[..name.len()].copy_from_slice(name.as_bytes());
        field[NAME_LEN - 1] = mask;
        for c in &mut field[..NAME_LEN - 1] {
            *c ^= mask;
        }
        field
    }

    fn archive() -> Vec<u8> {
        // 3 literals then a 4-byte match of slot 0xFEE: "abcabca".
        let packed = [0x07, b'a', b'b', b'c', 0xEE, 0xF1];
        let mut data = 1u32.to_le_bytes().to_vec();
        data.extend(masked("scene01.txt", 0x5C));
        data.extend_from_slice(&7u32.to_le_bytes());
        data.extend_from_slice(&(packed.len() as u32).to_le_bytes());
        data.extend_from_slice(&36u32.to_le_bytes());
        data.extend_from_slice(&packed);
        data
    }

    #[test]
    fn test_unmask_name() {
        assert_eq!(unmask_name(masked("a.bmp", 0x7F)), b"a.bmp");
        assert_eq!(unmask_name(Vec::new()), b"");
    }

    #[test]
    fn test_arc_read() {
        let decoder = LibidoArcArchiveDecoder;
        let mut input = VirtualFile::from_bytes("data.arc", archive());
        assert!(decoder.is_recognized(&mut input));

        let meta = decoder.read_meta(&mut input).unwrap();
        assert_eq!(meta.entries[0].path, "scene01.txt");
        let file = decoder.read_file(&mut input, &meta, &meta.entries[0]).unwrap();
        assert_eq!(file.into_bytes().unwrap(), b"abcabca");
    }

    #[test]
    fn test_arc_size_mismatch() {
        let mut data = archive();
        data.push(0);
        let mut input = VirtualFile::from_bytes("data.arc", data);
        assert!(!LibidoArcArchiveDecoder.is_recognized(&mut input));

        let mut empty = VirtualFile::from_bytes("data.arc", vec![0; 4]);
        assert!(!LibidoArcArchiveDecoder.is_recognized(&mut empty));
    }
}
