//! Memory-mapped archive input.
//!
//! Large game archives are usually read with many small seeks scattered over
//! the whole file. A read-only memory map lets [`ByteStream`] serve those reads
//! as plain slice copies and lets several streams share one mapping.
//!
//! # Example
//!
//! ```no_run
//! use vnarc_core::stream::ByteStream;
//!
//! let mut stream = ByteStream::open_mmap("arc.nsa")?;
//! let count = stream.read_be::<u16>()?;
//! # Ok::<(), vnarc_core::error::VnArcError>(())
//! ```
//!
//! # Safety
//!
//! The mapping is read-only, but the file may still be changed by another
//! process while it is mapped. Callers that cannot rule this out should use
//! [`ByteStream::open`] instead.
//!
//! [`ByteStream`]: crate::stream::ByteStream
//! [`ByteStream::open`]: crate::stream::ByteStream::open

use crate::error::Result;
use memmap2::Mmap;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

/// A shared, read-only mapping of a whole file.
#[derive(Debug, Clone)]
pub struct MappedFile {
    mmap: Arc<Mmap>,
}

impl MappedFile {
    /// Map the file at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        Self::from_file(&file)
    }

    /// Map an already opened file.
    pub fn from_file(file: &File) -> Result<Self> {
        // SAFETY: the mapping is read-only; concurrent modification of the
        // file is the caller's responsibility.
        let mmap = unsafe { Mmap::map(file)? };
        Ok(Self {
            mmap: Arc::new(mmap),
        })
    }

    /// Mapped length in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.mmap.len()
    }

    /// Whether the file is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.mmap.is_empty()
    }

    /// The mapped bytes.
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.mmap
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VnArcError;
    use crate::stream::ByteStream;
    use std::io::Write;

    fn temp_file(contents: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_map_and_slice() {
        let file = temp_file(b"LNK\0\x02\x00\x00\x00");
        let mapped = MappedFile::open(file.path()).unwrap();
        assert_eq!(mapped.len(), 8);
        assert!(!mapped.is_empty());
        assert_eq!(&mapped.as_slice()[..4], b"LNK\0");
    }

    #[test]
    fn test_stream_over_mapping() {
        let contents: Vec<u8> = (0..=255u8).cycle().take(4096).collect();
        let file = temp_file(&contents);

        let mut stream = ByteStream::open_mmap(file.path()).unwrap();
        assert_eq!(stream.size(), 4096);
        stream.seek(300);
        assert_eq!(stream.read(4).unwrap(), vec![44, 45, 46, 47]);

        let mut shared = stream.try_clone().unwrap();
        assert_eq!(shared.read_u8().unwrap(), 0);
        assert_eq!(stream.tell(), 304);
    }

    #[test]
    fn test_missing_file() {
        let result = MappedFile::open("/nonexistent/path/to/arc.dat");
        match result {
            Err(VnArcError::Io(e)) => assert_eq!(e.kind(), std::io::ErrorKind::NotFound),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }
}
