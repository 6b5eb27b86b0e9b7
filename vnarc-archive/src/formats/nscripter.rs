//! NScripter SAR and NSA archives.
//!
//! Both start with a big-endian `u16` entry count and a `u32` offset to the
//! data area, followed by zero-terminated names. SAR entries are stored;
//! NSA entries carry a compression type and an original size.

use super::{original_len, read_stored, stored_len};
use crate::decoder::ArchiveDecoder;
use crate::naming::decode_sjis;
use tracing::debug;
use vnarc_core::bitstream::BitStream;
use vnarc_core::entry::{ArchiveEntry, ArchiveMeta, EntryMethod, VirtualFile};
use vnarc_core::error::{Result, VnArcError};
use vnarc_pack::lzss::{BitwiseLzssSettings, decompress_bitwise};

/// Registry identifier of [`SarArchiveDecoder`].
pub const SAR_ID: &str = "nscripter/sar";
/// Registry identifier of [`NsaArchiveDecoder`].
pub const NSA_ID: &str = "nscripter/nsa";

/// NSA entry compression: SPB image, stored here undecoded.
pub const NSA_METHOD_SPB: u32 = 1;

const NSA_LZSS: BitwiseLzssSettings = BitwiseLzssSettings::new(8, 4, 2, 239);

/// Decoder for NScripter `.sar` archives.
#[derive(Debug, Clone, Copy, Default)]
pub struct SarArchiveDecoder;

impl ArchiveDecoder for SarArchiveDecoder {
    fn recognize(&self, input: &mut VirtualFile) -> Result<bool> {
        if input.extension().as_deref() != Some("sar") {
            return Ok(false);
        }
        let meta = self.read_meta(input)?;
        Ok(meta.fits_within(input.size()))
    }

    fn read_meta(&self, input: &mut VirtualFile) -> Result<ArchiveMeta> {
        let stream = input.stream.seek(0);
        let count = stream.read_u16_be()?;
        let data_offset = u64::from(stream.read_u32_be()?);

        let mut meta = ArchiveMeta::new();
        for _ in 0..count {
            let name = decode_sjis(&stream.read_to_zero()?);
            let offset = u64::from(stream.read_u32_be()?) + data_offset;
            let size = u64::from(stream.read_u32_be()?);
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
}

/// Decoder for NScripter `.nsa` archives.
#[derive(Debug, Clone, Copy, Default)]
pub struct NsaArchiveDecoder;

impl ArchiveDecoder for NsaArchiveDecoder {
    fn recognize(&self, input: &mut VirtualFile) -> Result<bool> {
        let meta = self.read_meta(input)?;
        Ok(!meta.is_empty() && meta.fits_within(input.size()))
    }

    fn read_meta(&self, input: &mut VirtualFile) -> Result<ArchiveMeta> {
        let stream = input.stream.seek(0);
        let count = stream.read_u16_be()?;
        let data_offset = u64::from(stream.read_u32_be()?);

        let mut meta = ArchiveMeta::new();
        for _ in 0..count {
            let name = decode_sjis(&stream.read_to_zero()?);
            let method = match stream.read_u8()? {
                0 => EntryMethod::Stored,
                2 => EntryMethod::BitwiseLzss,
                other => EntryMethod::Custom(u32::from(other)),
            };
            let offset = u64::from(stream.read_u32_be()?) + data_offset;
            let size_comp = u64::from(stream.read_u32_be()?);
            let size_orig = u64::from(stream.read_u32_be()?);
            meta.push(
                ArchiveEntry::new(name, offset, size_comp)
                    .with_method(method)
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
        let data = match entry.method {
            EntryMethod::Stored => read_stored(input, entry)?,
            EntryMethod::BitwiseLzss => {
                let payload = input.stream.substream(entry.offset, stored_len(entry)? as u64)?;
                let mut bits = BitStream::msb(payload);
                decompress_bitwise(&mut bits, original_len(entry)?, &NSA_LZSS)?
            }
            EntryMethod::Custom(NSA_METHOD_SPB) => {
                debug!(entry = %entry.path, "SPB image kept undecoded");
                read_stored(input, entry)?
            }
            other => return Err(VnArcError::unsupported_method(other.to_string())),
        };
        Ok(VirtualFile::from_bytes(entry.path.clone(), data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nsa_archive() -> Vec<u8> {
        // Two literals, "AB", bit-packed.
        let lzss = [0xA0, 0xD0, 0x80];
        let mut data = Vec::new();
        data.extend_from_slice(&2u16.to_be_bytes());
        let header_len = 2 + 4 + (6 + 1 + 12) + (6 + 1 + 12);
        data.extend_from_slice(&(header_len as u32).to_be_bytes());

        data.extend_from_slice(b"a.txt\0");
        data.push(0);
        data.extend_from_slice(&0u32.to_be_bytes());
        data.extend_from_slice(&5u32.to_be_bytes());
        data.extend_from_slice(&5u32.to_be_bytes());

        data.extend_from_slice(b"b.txt\0");
        data.push(2);
        data.extend_from_slice(&5u32.to_be_bytes());
        data.extend_from_slice(&(lzss.len() as u32).to_be_bytes());
        data.extend_from_slice(&2u32.to_be_bytes());

        assert_eq!(data.len(), header_len);
        data.extend_from_slice(b"hello");
        data.extend_from_slice(&lzss);
        data
    }

    #[test]
    fn test_nsa_read() {
        let decoder = NsaArchiveDecoder;
        let mut input = VirtualFile::from_bytes("arc.nsa", nsa_archive());
        assert!(decoder.is_recognized(&mut input));

        let meta = decoder.read_meta(&mut input).unwrap();
        assert_eq!(meta.len(), 2);
        let stored = decoder.read_file(&mut input, &meta, &meta.entries[0]).unwrap();
        assert_eq!(stored.into_bytes().unwrap(), b"hello");
        let packed = decoder.read_file(&mut input, &meta, &meta.entries[1]).unwrap();
        assert_eq!(packed.path, "b.txt");
        assert_eq!(packed.into_bytes().unwrap(), b"AB");
    }

    #[test]
    fn test_nsa_rejects_overrun() {
        let mut data = nsa_archive();
        data.truncate(data.len() - 1);
        let mut input = VirtualFile::from_bytes("arc.nsa", data);
        assert!(!NsaArchiveDecoder.is_recognized(&mut input));

        let mut empty = VirtualFile::from_bytes("arc.nsa", vec![0, 0, 0, 0, 0, 6]);
        assert!(!NsaArchiveDecoder.is_recognized(&mut empty));
    }

    #[test]
    fn test_nsa_unknown_method() {
        let mut data = nsa_archive();
        data[2 + 4 + 6] = 7;
        let mut input = VirtualFile::from_bytes("arc.nsa", data);
        let meta = NsaArchiveDecoder.read_meta(&mut input).unwrap();
        let err = NsaArchiveDecoder
            .read_file(&mut input, &meta, &meta.entries[0])
            .unwrap_err();
        assert!(matches!(err, VnArcError::UnsupportedMethod { .. }));
    }

    #[test]
    fn test_sar_needs_extension() {
        let mut data = Vec::new();
        data.extend_from_slice(&1u16.to_be_bytes());
        data.extend_from_slice(&18u32.to_be_bytes());
        data.extend_from_slice(b"x\\y\0");
        data.extend_from_slice(&0u32.to_be_bytes());
        data.extend_from_slice(&2u32.to_be_bytes());
        data.extend_from_slice(b"hi");

        let mut input = VirtualFile::from_bytes("arc.sar", data.clone());
        assert!(SarArchiveDecoder.is_recognized(&mut input));
        let meta = SarArchiveDecoder.read_meta(&mut input).unwrap();
        assert_eq!(meta.entries[0].path, "x/y");
        let file = SarArchiveDecoder
            .read_file(&mut input, &meta, &meta.entries[0])
            .unwrap();
        assert_eq!(file.into_bytes().unwrap(), b"hi");

        let mut renamed = VirtualFile::from_bytes("arc.dat", data);
        assert!(!SarArchiveDecoder.is_recognized(&mut renamed));
    }
}
