//! KISS `.arc` archives.
//!
//! A little-endian `u32` count, then per entry a zero-terminated Shift_JIS
//! name, a `u32` offset and a `u32` that is always zero. Sizes follow from
//! the next entry's offset; the last entry runs to the end of the file.

use super::read_stored;
use crate::decoder::ArchiveDecoder;
use crate::naming::decode_sjis_strict;
use vnarc_core::entry::{ArchiveEntry, ArchiveMeta, VirtualFile};
use vnarc_core::error::{Result, VnArcError};

/// Registry identifier of [`KissArcArchiveDecoder`].
pub const ID: &str = "kiss/arc";

/// Decoder for KISS `.arc` archives.
#[derive(Debug, Clone, Copy, Default)]
pub struct KissArcArchiveDecoder;

impl ArchiveDecoder for KissArcArchiveDecoder {
    fn recognize(&self, input: &mut VirtualFile) -> Result<bool> {
        if input.extension().as_deref() != Some("arc") {
            return Ok(false);
        }
        let meta = self.read_meta(input)?;
        Ok(meta
            .entries
            .last()
            .is_some_and(|last| last.end() == input.size()))
    }

    fn read_meta(&self, input: &mut VirtualFile) -> Result<ArchiveMeta> {
        let size = input.size();
        let stream = input.stream.seek(0);
        let count = stream.read_u32_le()?;

        let mut meta = ArchiveMeta::new();
        for _ in 0..count {
            let name = decode_sjis_strict(&stream.read_to_zero()?)?;
            let offset = u64::from(stream.read_u32_le()?);
            if stream.read_u32_le()? != 0 {
                return Err(VnArcError::corrupted(
                    stream.tell() - 4,
                    "expected zero after entry offset",
                ));
            }
            meta.push(ArchiveEntry::new(name, offset, 0));
        }
        meta.infer_sizes_from_offsets(size)?;
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
        &["kiss/plg"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vnarc_core::error::ErrorKind;

    fn archive(names: &[&[u8]], bodies: &[&[u8]]) -> Vec<u8> {
        let table_len: usize = 4 + names.iter().map(|n| n.len() + 1 + 8).sum::<usize>();
        let mut data = (names.len() as u32).to_le_bytes().to_vec();
        let mut offset = table_len;
        for (name, body) in names.iter().zip(bodies) {
            data.extend_from_slice(name);
            data.push(0);
            data.extend_from_slice(&(offset as u32).to_le_bytes());
            data.extend_from_slice(&0u32.to_le_bytes());
            offset += body.len();
        }
        for body in bodies {
            data.extend_from_slice(body);
        }
        data
    }

    #[test]
    fn test_arc_read() {
        // "背景" in Shift_JIS
        let sjis = [0x94, 0x77, 0x8C, 0x69];
        let data = archive(&[b"a.txt", &sjis], &[b"first", b"second!"]);
        let mut input = VirtualFile::from_bytes("data.arc", data);
        let decoder = KissArcArchiveDecoder;
        assert!(decoder.is_recognized(&mut input));

        let meta = decoder.read_meta(&mut input).unwrap();
        assert_eq!(meta.entries[1].path, "背景");
        assert_eq!(meta.entries[0].size_comp, 5);
        assert_eq!(meta.entries[1].size_comp, 7);
        let file = decoder.read_file(&mut input, &meta, &meta.entries[1]).unwrap();
        assert_eq!(file.into_bytes().unwrap(), b"second!");
    }

    #[test]
    fn test_arc_requires_extension_and_zero() {
        let data = archive(&[b"a.txt"], &[b"body"]);
        let mut renamed = VirtualFile::from_bytes("data.bin", data.clone());
        assert!(!KissArcArchiveDecoder.is_recognized(&mut renamed));

        let mut broken = data;
        broken[4 + 6 + 4] = 1;
        let mut input = VirtualFile::from_bytes("data.arc", broken);
        assert!(!KissArcArchiveDecoder.is_recognized(&mut input));
        let err = KissArcArchiveDecoder.read_meta(&mut input).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CorruptData);
    }

    #[test]
    fn test_arc_empty_not_recognized() {
        let mut input = VirtualFile::from_bytes("data.arc", 0u32.to_le_bytes().to_vec());
        assert!(!KissArcArchiveDecoder.is_recognized(&mut input));
    }
}
