//! KID `LNK` archives.
//!
//! `LNK\0`, a `u32` count and eight unknown bytes, then 32-byte records:
//! `u32` offset from the end of the table, `u32` size shifted left by one
//! with the low bit flagging LND compression, and a 24-byte name. Parts of
//! `.wav`, `.jpg` and `.scr` entries are scrambled with a key derived from
//! the name.

use super::kid_lnd::decode_lnd;
use super::{expect_magic, read_stored};
use crate::decoder::ArchiveDecoder;
use crate::naming::decode_sjis;
use tracing::trace;
use vnarc_core::entry::{ArchiveEntry, ArchiveMeta, EntryMethod, VirtualFile};
use vnarc_core::error::Result;

/// Registry identifier of [`KidLnkArchiveDecoder`].
pub const ID: &str = "kid/lnk";

/// Entry method of LND-compressed entries.
pub const METHOD_LND: EntryMethod = EntryMethod::Custom(1);

const MAGIC: &[u8] = b"LNK\0";
const RECORD_LEN: u64 = 32;
const NAME_LEN: usize = 24;
const SCRAMBLED_LEN: usize = 0x100;

/// Decoder for KID `.lnk` archives.
#[derive(Debug, Clone, Copy, Default)]
pub struct KidLnkArchiveDecoder;

/// Where the scrambled run starts for entries named like `path`.
fn scramble_offset(path: &str) -> Option<usize> {
    let extension = path.rsplit_once('.')?.1.to_ascii_lowercase();
    match extension.as_str() {
        "wav" => Some(0),
        "jpg" => Some(0x1100),
        "scr" => Some(0x1000),
        _ => None,
    }
}

/// Seed of the scramble key: the byte sum of the stored name.
fn name_key(name: &[u8]) -> u8 {
    name.iter().fold(0u8, |key, &c| key.wrapping_add(c))
}

/// Undo the scramble of up to 0x100 bytes from `start`.
fn unscramble(data: &mut [u8], start: usize, mut key: u8) {
    for byte in data.iter_mut().skip(start).take(SCRAMBLED_LEN) {
        *byte = byte.wrapping_sub(key);
        key = key.wrapping_mul(0x6D).wrapping_sub(0x25);
    }
}

impl ArchiveDecoder for KidLnkArchiveDecoder {
    fn recognize(&self, input: &mut VirtualFile) -> Result<bool> {
        Ok(input.stream.read(MAGIC.len())? == MAGIC)
    }

    fn read_meta(&self, input: &mut VirtualFile) -> Result<ArchiveMeta> {
        let stream = input.stream.seek(0);
        expect_magic(stream, MAGIC)?;
        let count = stream.read_u32_le()?;
        stream.skip(8);
        let data_start = stream.tell() + u64::from(count) * RECORD_LEN;

        let mut meta = ArchiveMeta::new();
        for _ in 0..count {
            let offset = u64::from(stream.read_u32_le()?) + data_start;
            let packed_size = stream.read_u32_le()?;
            let name = stream.read_to_zero_max(NAME_LEN)?;

            let mut entry = ArchiveEntry::new(decode_sjis(&name), offset, u64::from(packed_size >> 1))
                .with_key(u32::from(name_key(&name)));
            if packed_size & 1 != 0 {
                entry = entry.with_method(METHOD_LND);
            }
            meta.push(entry);
        }
        Ok(meta)
    }

    fn read_file(
        &self,
        input: &mut VirtualFile,
        _meta: &ArchiveMeta,
        entry: &ArchiveEntry,
    ) -> Result<VirtualFile> {
        let mut data = read_stored(input, entry)?;

        if let Some(start) = scramble_offset(&entry.path).filter(|&start| start < data.len()) {
            let key = entry.key.unwrap_or_else(|| u32::from(name_key(entry.path.as_bytes())));
            trace!(entry = %entry.path, start, "unscrambling");
            unscramble(&mut data, start, key as u8);
        }
        if entry.method == METHOD_LND {
            data = decode_lnd(&data)?;
        }
        Ok(VirtualFile::from_bytes(entry.path.clone(), data))
    }

    fn linked_formats(&self) -> &'static [&'static str] {
        &["kid/cps", "kid/prt", "kid/waf"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scramble(data: &mut [u8], start: usize, mut key: u8) {
        for byte in data.iter_mut().skip(start).take(SCRAMBLED_LEN) {
            *byte = byte.wrapping_add(key);
            key = key.wrapping_mul(0x6D).wrapping_sub(0x25);
        }
    }

    fn archive(files: &[(&str, Vec<u8>, bool)]) -> Vec<u8> {
        let mut data = MAGIC.to_vec();
        data.extend_from_slice(&(files.len() as u32).to_le_bytes());
        data.extend_from_slice(&[0; 8]);
        let mut offset = 0u32;
        for (name, body, compressed) in files {
            data.extend_from_slice(&offset.to_le_bytes());
            let packed = ((body.len() as u32) << 1) | u32::from(*compressed);
            data.extend_from_slice(&packed.to_le_bytes());
            let mut field = [0u8; NAME_LEN];
            field[..name.len()].copy_from_slice(name.as_bytes());
            data.extend_from_slice(&field);
            offset += body.len() as u32;
        }
        for (_, body, _) in files {
            data.extend_from_slice(body);
        }
        data
    }

    #[test]
    fn test_scramble_offsets() {
        assert_eq!(scramble_offset("voice.WAV"), Some(0));
        assert_eq!(scramble_offset("cg.jpg"), Some(0x1100));
        assert_eq!(scramble_offset("op.scr"), Some(0x1000));
        assert_eq!(scramble_offset("bgm.ogg"), None);
        assert_eq!(scramble_offset("noext"), None);
    }

    #[test]
    fn test_unscramble_limits() {
        let plain: Vec<u8> = (0..0x180u32).map(|i| i as u8).collect();
        let mut data = plain.clone();
        scramble(&mut data, 0, 0x5A);
        assert_ne!(data[..0x100], plain[..0x100]);
        assert_eq!(data[0x100..], plain[0x100..]);
        unscramble(&mut data, 0, 0x5A);
        assert_eq!(data, plain);
    }

    #[test]
    fn test_lnk_read() {
        let voice = b"RIFF....WAVEdata".to_vec();
        let mut scrambled = voice.clone();
        scramble(&mut scrambled, 0, name_key(b"v001.wav"));

        let mut lnd = b"lnd\0\0\0\0\0".to_vec();
        lnd.extend_from_slice(&6u32.to_le_bytes());
        lnd.extend_from_slice(&[0; 4]);
        lnd.extend_from_slice(&[0x02, b'a', b'b', b'c', 0x84, 0x02]);

        // Too short for the .jpg scramble at 0x1100.
        let photo = b"\xFF\xD8\xFFjpeg".to_vec();

        let data = archive(&[
            ("v001.wav", scrambled, false),
            ("script.txt", lnd, true),
            ("cg.jpg", photo.clone(), false),
        ]);
        let mut input = VirtualFile::from_bytes("data.lnk", data);
        let decoder = KidLnkArchiveDecoder;
        assert!(decoder.is_recognized(&mut input));

        let meta = decoder.read_meta(&mut input).unwrap();
        assert_eq!(meta.len(), 3);
        assert_eq!(meta.entries[1].method, METHOD_LND);
        assert_eq!(meta.entries[0].offset, 16 + 3 * 32);

        let files: Vec<_> = meta
            .iter()
            .map(|entry| {
                decoder
                    .read_file(&mut input, &meta, entry)
                    .unwrap()
                    .into_bytes()
                    .unwrap()
            })
            .collect();
        assert_eq!(files[0], voice);
        assert_eq!(files[1], b"abcabc");
        assert_eq!(files[2], photo);
    }
}
