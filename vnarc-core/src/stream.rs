//! Seekable byte streams with typed reads.
//!
//! [`ByteStream`] is the cursor every decoder reads through. It knows the total
//! size of its source up front, so a read of `n` bytes at position `p` fails
//! with [`VnArcError::UnexpectedEof`] whenever `p + n > size`, without touching
//! the underlying source. Seeking never fails: a position past the end is only
//! reported by the next read.
//!
//! # Example
//!
//! ```
//! use vnarc_core::stream::ByteStream;
//!
//! let mut stream = ByteStream::from_bytes(b"PBG3\x02\x00\x00\x00name\x00".to_vec());
//! assert_eq!(stream.read(4).unwrap(), b"PBG3");
//! assert_eq!(stream.read_le::<u32>().unwrap(), 2);
//! assert_eq!(stream.read_to_zero().unwrap(), b"name");
//!
//! // Scoped reads leave the cursor untouched.
//! let magic = stream.peek(0, |s| s.read(4)).unwrap();
//! assert_eq!(magic, b"PBG3");
//! assert_eq!(stream.tell(), 13);
//! ```

use crate::error::{Result, VnArcError};
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;
use std::sync::Arc;

/// Any seekable reader usable as a stream backend.
pub trait Source: Read + Seek + Send {}

impl<T: Read + Seek + Send> Source for T {}

/// Fixed-width integers readable from a stream.
pub trait Primitive: Sized + Copy {
    /// Width in bytes.
    const SIZE: usize;

    /// Decode from exactly `SIZE` little-endian bytes.
    fn from_le(bytes: &[u8]) -> Self;

    /// Decode from exactly `SIZE` big-endian bytes.
    fn from_be(bytes: &[u8]) -> Self;
}

macro_rules! impl_primitive {
    ($($ty:ty),*) => {
        $(
            impl Primitive for $ty {
                const SIZE: usize = std::mem::size_of::<$ty>();

                #[inline]
                fn from_le(bytes: &[u8]) -> Self {
                    let mut buf = [0u8; std::mem::size_of::<$ty>()];
                    buf.copy_from_slice(&bytes[..Self::SIZE]);
                    <$ty>::from_le_bytes(buf)
                }

                #[inline]
                fn from_be(bytes: &[u8]) -> Self {
                    let mut buf = [0u8; std::mem::size_of::<$ty>()];
                    buf.copy_from_slice(&bytes[..Self::SIZE]);
                    <$ty>::from_be_bytes(buf)
                }
            }
        )*
    };
}

impl_primitive!(u8, u16, u32, u64, i8, i16, i32, i64);

enum Backend {
    Memory(Arc<[u8]>),
    #[cfg(feature = "mmap")]
    Mapped(crate::mmap::MappedFile),
    Reader {
        source: Box<dyn Source>,
        /// Where the source cursor actually is, to skip redundant seeks.
        source_position: u64,
    },
}

/// A seekable, sized byte source with a cursor.
pub struct ByteStream {
    backend: Backend,
    position: u64,
    size: u64,
}

impl fmt::Debug for ByteStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let backend = match &self.backend {
            Backend::Memory(_) => "memory",
            #[cfg(feature = "mmap")]
            Backend::Mapped(_) => "mmap",
            Backend::Reader { .. } => "reader",
        };
        f.debug_struct("ByteStream")
            .field("backend", &backend)
            .field("position", &self.position)
            .field("size", &self.size)
            .finish()
    }
}

impl Default for ByteStream {
    fn default() -> Self {
        Self::from_bytes(Vec::new())
    }
}

impl ByteStream {
    /// Create an in-memory stream.
    pub fn from_bytes(data: impl Into<Vec<u8>>) -> Self {
        let data: Arc<[u8]> = Arc::from(data.into());
        let size = data.len() as u64;
        Self {
            backend: Backend::Memory(data),
            position: 0,
            size,
        }
    }

    /// Wrap any seekable reader. The size is taken by seeking to its end.
    pub fn from_reader<R: Source + 'static>(mut reader: R) -> Result<Self> {
        let size = reader.seek(SeekFrom::End(0))?;
        reader.seek(SeekFrom::Start(0))?;
        Ok(Self {
            backend: Backend::Reader {
                source: Box::new(reader),
                source_position: 0,
            },
            position: 0,
            size,
        })
    }

    /// Open a file through a buffered reader.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        Self::from_reader(BufReader::new(file))
    }

    /// Open a file through a read-only memory map.
    #[cfg(feature = "mmap")]
    pub fn open_mmap<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mapped = crate::mmap::MappedFile::open(path)?;
        let size = mapped.len() as u64;
        Ok(Self {
            backend: Backend::Mapped(mapped),
            position: 0,
            size,
        })
    }

    /// Total size of the stream in bytes.
    #[inline]
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Current cursor position.
    #[inline]
    pub fn tell(&self) -> u64 {
        self.position
    }

    /// Bytes between the cursor and the end (zero when past the end).
    #[inline]
    pub fn left(&self) -> u64 {
        self.size.saturating_sub(self.position)
    }

    /// Whether the cursor is at or past the end.
    #[inline]
    pub fn eof(&self) -> bool {
        self.position >= self.size
    }

    /// Move the cursor to an absolute position.
    ///
    /// Positions past the end are accepted; the next read fails.
    pub fn seek(&mut self, position: u64) -> &mut Self {
        self.position = position;
        self
    }

    /// Move the cursor forward.
    pub fn skip(&mut self, count: u64) -> &mut Self {
        self.position = self.position.saturating_add(count);
        self
    }

    fn check_available(&self, count: u64) -> Result<()> {
        if self.position.saturating_add(count) > self.size {
            return Err(VnArcError::unexpected_eof(
                self.position,
                count,
                self.left(),
            ));
        }
        Ok(())
    }

    /// Fill `buf` completely from the cursor.
    pub fn read_into(&mut self, buf: &mut [u8]) -> Result<()> {
        let count = buf.len() as u64;
        self.check_available(count)?;
        let start = self.position as usize;

        match &mut self.backend {
            Backend::Memory(data) => buf.copy_from_slice(&data[start..start + buf.len()]),
            #[cfg(feature = "mmap")]
            Backend::Mapped(mapped) => {
                buf.copy_from_slice(&mapped.as_slice()[start..start + buf.len()])
            }
            Backend::Reader {
                source,
                source_position,
            } => {
                if *source_position != self.position {
                    source.seek(SeekFrom::Start(self.position))?;
                    *source_position = self.position;
                }
                if let Err(e) = source.read_exact(buf) {
                    // The source cursor is unknown after a partial read.
                    *source_position = u64::MAX;
                    return Err(e.into());
                }
                *source_position += count;
            }
        }

        self.position += count;
        Ok(())
    }

    /// Read exactly `count` bytes.
    pub fn read(&mut self, count: usize) -> Result<Vec<u8>> {
        self.check_available(count as u64)?;
        let mut buf = vec![0u8; count];
        self.read_into(&mut buf)?;
        Ok(buf)
    }

    /// Read one byte.
    #[inline]
    pub fn read_u8(&mut self) -> Result<u8> {
        let mut buf = [0u8; 1];
        self.read_into(&mut buf)?;
        Ok(buf[0])
    }

    /// Read a little-endian integer.
    pub fn read_le<T: Primitive>(&mut self) -> Result<T> {
        let mut buf = [0u8; 8];
        self.read_into(&mut buf[..T::SIZE])?;
        Ok(T::from_le(&buf[..T::SIZE]))
    }

    /// Read a big-endian integer.
    pub fn read_be<T: Primitive>(&mut self) -> Result<T> {
        let mut buf = [0u8; 8];
        self.read_into(&mut buf[..T::SIZE])?;
        Ok(T::from_be(&buf[..T::SIZE]))
    }

    /// Read a little-endian `u16`.
    pub fn read_u16_le(&mut self) -> Result<u16> {
        self.read_le()
    }

    /// Read a big-endian `u16`.
    pub fn read_u16_be(&mut self) -> Result<u16> {
        self.read_be()
    }

    /// Read a little-endian `u32`.
    pub fn read_u32_le(&mut self) -> Result<u32> {
        self.read_le()
    }

    /// Read a big-endian `u32`.
    pub fn read_u32_be(&mut self) -> Result<u32> {
        self.read_be()
    }

    /// Read a little-endian `u64`.
    pub fn read_u64_le(&mut self) -> Result<u64> {
        self.read_le()
    }

    /// Read bytes up to (not including) the next zero byte.
    ///
    /// Stops quietly at the end of the stream if no terminator follows.
    pub fn read_to_zero(&mut self) -> Result<Vec<u8>> {
        let mut output = Vec::new();
        while !self.eof() {
            let byte = self.read_u8()?;
            if byte == 0 {
                break;
            }
            output.push(byte);
        }
        Ok(output)
    }

    /// Read a fixed-width field of `max` bytes and cut it at the first zero.
    ///
    /// The cursor always advances by `max`; the result never holds more than
    /// `max` bytes and never includes the terminator.
    pub fn read_to_zero_max(&mut self, max: usize) -> Result<Vec<u8>> {
        let mut output = self.read(max)?;
        if let Some(end) = output.iter().position(|&b| b == 0) {
            output.truncate(end);
        }
        Ok(output)
    }

    /// Read everything between the cursor and the end.
    pub fn read_to_eof(&mut self) -> Result<Vec<u8>> {
        let count = self.left() as usize;
        self.read(count)
    }

    /// Read a text line, stopping at `\n` or a zero byte and dropping `\r`.
    pub fn read_line(&mut self) -> Result<Vec<u8>> {
        let mut output = Vec::new();
        while !self.eof() {
            match self.read_u8()? {
                0 | b'\n' => break,
                b'\r' => {}
                byte => output.push(byte),
            }
        }
        Ok(output)
    }

    /// Run `f` with the cursor at `position`, then restore the cursor.
    ///
    /// The original position is restored whether `f` succeeds or fails,
    /// which keeps format sniffing free of side effects.
    pub fn peek<T>(&mut self, position: u64, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let saved = self.position;
        self.position = position;
        let result = f(self);
        self.position = saved;
        result
    }

    /// Copy `size` bytes starting at `offset` into an independent in-memory
    /// stream. The cursor of `self` is left unchanged.
    pub fn substream(&mut self, offset: u64, size: u64) -> Result<ByteStream> {
        let data = self.peek(offset, |s| s.read(size as usize))?;
        Ok(ByteStream::from_bytes(data))
    }

    /// An independent cursor over the same data.
    ///
    /// Only memory and mmap backed streams can be shared; reader-backed
    /// streams return `None`.
    pub fn try_clone(&self) -> Option<ByteStream> {
        let backend = match &self.backend {
            Backend::Memory(data) => Backend::Memory(Arc::clone(data)),
            #[cfg(feature = "mmap")]
            Backend::Mapped(mapped) => Backend::Mapped(mapped.clone()),
            Backend::Reader { .. } => return None,
        };
        Some(Self {
            backend,
            position: 0,
            size: self.size,
        })
    }

    /// Consume the stream and return its full contents.
    pub fn into_bytes(mut self) -> Result<Vec<u8>> {
        if let Backend::Memory(data) = &self.backend {
            return Ok(data.to_vec());
        }
        self.seek(0);
        self.read_to_eof()
    }
}

impl From<Vec<u8>> for ByteStream {
    fn from(data: Vec<u8>) -> Self {
        Self::from_bytes(data)
    }
}

impl From<&[u8]> for ByteStream {
    fn from(data: &[u8]) -> Self {
        Self::from_bytes(data.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_typed_reads() {
        let mut stream = ByteStream::from_bytes(vec![
            0x01, 0x02, 0x03, 0x04, 0x01, 0x02, 0x03, 0x04, 0xFF, 0xFE,
        ]);
        assert_eq!(stream.read_le::<u32>().unwrap(), 0x04030201);
        assert_eq!(stream.read_be::<u32>().unwrap(), 0x01020304);
        assert_eq!(stream.read_le::<i16>().unwrap(), -257);
        assert!(stream.eof());
    }

    #[test]
    fn test_read_past_end_fails_without_moving() {
        let mut stream = ByteStream::from_bytes(vec![1, 2, 3]);
        stream.seek(1);
        let err = stream.read(5).unwrap_err();
        assert!(matches!(
            err,
            VnArcError::UnexpectedEof {
                position: 1,
                requested: 5,
                available: 2
            }
        ));
        assert_eq!(stream.tell(), 1);
        assert_eq!(stream.read(2).unwrap(), vec![2, 3]);
    }

    #[test]
    fn test_seek_past_end_is_lazy() {
        let mut stream = ByteStream::from_bytes(vec![1, 2, 3]);
        stream.seek(10);
        assert_eq!(stream.tell(), 10);
        assert!(stream.eof());
        assert_eq!(stream.left(), 0);
        assert!(stream.read_u8().is_err());
        assert!(stream.read_to_eof().unwrap().is_empty());
    }

    #[test]
    fn test_read_to_zero() {
        let mut stream = ByteStream::from_bytes(b"abc\0def".to_vec());
        assert_eq!(stream.read_to_zero().unwrap(), b"abc");
        assert_eq!(stream.tell(), 4);
        // No terminator: stop at the end.
        assert_eq!(stream.read_to_zero().unwrap(), b"def");
        assert!(stream.eof());
    }

    #[test]
    fn test_read_to_zero_max() {
        let mut stream = ByteStream::from_bytes(b"ab\0cdefgh".to_vec());
        assert_eq!(stream.read_to_zero_max(4).unwrap(), b"ab");
        assert_eq!(stream.tell(), 4);
        assert_eq!(stream.read_to_zero_max(3).unwrap(), b"efg");
        assert!(stream.read_to_zero_max(5).is_err());
    }

    #[test]
    fn test_read_line() {
        let mut stream = ByteStream::from_bytes(b"first\r\nsecond\0third".to_vec());
        assert_eq!(stream.read_line().unwrap(), b"first");
        assert_eq!(stream.read_line().unwrap(), b"second");
        assert_eq!(stream.read_line().unwrap(), b"third");
    }

    #[test]
    fn test_peek_restores_on_error() {
        let mut stream = ByteStream::from_bytes(vec![0u8; 8]);
        stream.seek(3);
        let result = stream.peek(6, |s| s.read(4));
        assert!(result.is_err());
        assert_eq!(stream.tell(), 3);

        let result = stream.peek(0, |s| {
            s.read(2)?;
            Err::<(), _>(VnArcError::corrupted(2, "nope"))
        });
        assert!(result.is_err());
        assert_eq!(stream.tell(), 3);
    }

    #[test]
    fn test_reader_backend() {
        let data: Vec<u8> = (0..=255).collect();
        let mut stream = ByteStream::from_reader(Cursor::new(data)).unwrap();
        assert_eq!(stream.size(), 256);
        stream.seek(250);
        assert_eq!(stream.read(3).unwrap(), vec![250, 251, 252]);
        stream.seek(10);
        assert_eq!(stream.read_u8().unwrap(), 10);
        assert!(stream.try_clone().is_none());
        assert_eq!(stream.into_bytes().unwrap().len(), 256);
    }

    #[test]
    fn test_substream_and_clone() {
        let mut stream = ByteStream::from_bytes(b"0123456789".to_vec());
        stream.seek(2);
        let mut sub = stream.substream(5, 3).unwrap();
        assert_eq!(stream.tell(), 2);
        assert_eq!(sub.read_to_eof().unwrap(), b"567");

        let mut other = stream.try_clone().unwrap();
        assert_eq!(other.tell(), 0);
        assert_eq!(other.read(2).unwrap(), b"01");
        assert_eq!(stream.tell(), 2);
    }

    #[test]
    fn test_open_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("input.bin");
        std::fs::write(&path, b"hello file").unwrap();

        let mut stream = ByteStream::open(&path).unwrap();
        assert_eq!(stream.size(), 10);
        stream.seek(6);
        assert_eq!(stream.read_to_eof().unwrap(), b"file");
    }

    proptest::proptest! {
        #[test]
        fn prop_read_to_zero_max_bounded(
            data in proptest::collection::vec(proptest::num::u8::ANY, 0..64),
            max in 0usize..80,
        ) {
            let mut stream = ByteStream::from_bytes(data.clone());
            match stream.read_to_zero_max(max) {
                Ok(text) => {
                    proptest::prop_assert!(text.len() <= max);
                    proptest::prop_assert!(!text.contains(&0));
                    proptest::prop_assert_eq!(stream.tell(), max as u64);
                }
                Err(e) => proptest::prop_assert!(max > data.len() && e.is_eof()),
            }
        }

        #[test]
        fn prop_peek_restores_position(
            len in 0usize..32,
            start in 0u64..40,
            at in 0u64..40,
            count in 0usize..40,
        ) {
            let mut stream = ByteStream::from_bytes(vec![7u8; len]);
            stream.seek(start);
            let _ = stream.peek(at, |s| s.read(count));
            proptest::prop_assert_eq!(stream.tell(), start);
        }
    }
}
