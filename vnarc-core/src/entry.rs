//! Archive entries, archive directories and virtual files.
//!
//! An [`ArchiveEntry`] is one row of an archive's directory as parsed by a
//! decoder. [`ArchiveMeta`] holds the rows in directory order. A
//! [`VirtualFile`] is a named byte stream: the input of a decoder and the
//! output of a single extraction.

use crate::error::{Result, VnArcError};
use crate::stream::ByteStream;
use std::fmt;
use std::path::{Component, Path};

/// How an entry's bytes are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EntryMethod {
    /// Raw copy.
    #[default]
    Stored,
    /// Bit-packed LZSS.
    BitwiseLzss,
    /// Byte-framed LZSS with a 4 KiB window.
    BytewiseLzss,
    /// A method code only the producing decoder understands.
    Custom(u32),
}

impl EntryMethod {
    /// Whether the entry is stored without transformation.
    pub fn is_stored(&self) -> bool {
        matches!(self, Self::Stored)
    }

    /// Short name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Stored => "stored",
            Self::BitwiseLzss => "lzss-bitwise",
            Self::BytewiseLzss => "lzss-bytewise",
            Self::Custom(_) => "custom",
        }
    }
}

impl fmt::Display for EntryMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Custom(code) => write!(f, "custom({code})"),
            _ => f.write_str(self.name()),
        }
    }
}

/// One file described by an archive's directory.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ArchiveEntry {
    /// Output path, with `\` separators turned into `/`.
    pub path: String,
    /// Absolute offset of the stored bytes in the archive.
    pub offset: u64,
    /// Number of stored bytes.
    pub size_comp: u64,
    /// Size after decompression, when the format records it.
    pub size_orig: Option<u64>,
    /// Storage method.
    pub method: EntryMethod,
    /// Per-entry key for obfuscated formats.
    pub key: Option<u32>,
    /// Checksum as stored in the directory.
    pub checksum: Option<u32>,
}

impl ArchiveEntry {
    /// Create a stored entry.
    pub fn new(path: impl Into<String>, offset: u64, size: u64) -> Self {
        Self {
            path: normalize_separators(path.into()),
            offset,
            size_comp: size,
            ..Default::default()
        }
    }

    /// Set the storage method.
    pub fn with_method(mut self, method: EntryMethod) -> Self {
        self.method = method;
        self
    }

    /// Set the decompressed size.
    pub fn with_original_size(mut self, size: u64) -> Self {
        self.size_orig = Some(size);
        self
    }

    /// Set the per-entry key.
    pub fn with_key(mut self, key: u32) -> Self {
        self.key = Some(key);
        self
    }

    /// Set the stored checksum.
    pub fn with_checksum(mut self, checksum: u32) -> Self {
        self.checksum = Some(checksum);
        self
    }

    /// Decompressed size, falling back to the stored size.
    pub fn original_size(&self) -> u64 {
        self.size_orig.unwrap_or(self.size_comp)
    }

    /// Offset one past the last stored byte.
    pub fn end(&self) -> u64 {
        self.offset.saturating_add(self.size_comp)
    }
}

impl fmt::Display for ArchiveEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:>10} {:>10} {:>10} {:<14} {}",
            self.offset,
            self.size_comp,
            self.original_size(),
            self.method.to_string(),
            self.path
        )
    }
}

fn normalize_separators(path: String) -> String {
    if path.contains('\\') {
        path.replace('\\', "/")
    } else {
        path
    }
}

/// Reject paths that would escape an output directory.
///
/// Backslashes count as separators. Absolute paths and `..` components fail
/// with `PathTraversal`.
pub fn validate_path(path: &str) -> Result<()> {
    let normalized = path.replace('\\', "/");
    let escapes = Path::new(&normalized).components().any(|c| {
        matches!(
            c,
            Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    });
    if escapes {
        return Err(VnArcError::path_traversal(normalized));
    }
    Ok(())
}

/// Turn an arbitrary archive path into a safe relative path.
pub fn sanitize_path(path: &str) -> String {
    let normalized = path.replace('\\', "/");
    let mut result = String::new();
    for component in Path::new(&normalized).components() {
        if let Component::Normal(s) = component {
            if !result.is_empty() {
                result.push('/');
            }
            result.push_str(&s.to_string_lossy().replace('\0', "_"));
        }
    }
    result
}

/// An archive's directory, in the order the archive lists it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchiveMeta {
    /// Entries in directory order.
    pub entries: Vec<ArchiveEntry>,
}

impl ArchiveMeta {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create from a list of entries.
    pub fn from_entries(entries: Vec<ArchiveEntry>) -> Self {
        Self { entries }
    }

    /// Append an entry.
    pub fn push(&mut self, entry: ArchiveEntry) {
        self.entries.push(entry);
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in directory order.
    pub fn iter(&self) -> std::slice::Iter<'_, ArchiveEntry> {
        self.entries.iter()
    }

    /// Set each entry's stored size from the offset of the entry after it.
    ///
    /// The last entry extends to `end`. Offsets must not decrease.
    pub fn infer_sizes_from_offsets(&mut self, end: u64) -> Result<()> {
        let count = self.entries.len();
        for i in 0..count {
            let next = if i + 1 < count {
                self.entries[i + 1].offset
            } else {
                end
            };
            let entry = &mut self.entries[i];
            if next < entry.offset {
                return Err(VnArcError::corrupted(
                    entry.offset,
                    format!("entry '{}' starts after its successor", entry.path),
                ));
            }
            entry.size_comp = next - entry.offset;
        }
        Ok(())
    }

    /// Whether every entry lies inside a source of `size` bytes.
    pub fn fits_within(&self, size: u64) -> bool {
        self.entries.iter().all(|e| e.end() <= size)
    }
}

impl<'a> IntoIterator for &'a ArchiveMeta {
    type Item = &'a ArchiveEntry;
    type IntoIter = std::slice::Iter<'a, ArchiveEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// A named byte stream.
#[derive(Debug, Default)]
pub struct VirtualFile {
    /// Path of the file, `/`-separated.
    pub path: String,
    /// Contents.
    pub stream: ByteStream,
}

impl VirtualFile {
    /// Create from a path and a stream.
    pub fn new(path: impl Into<String>, stream: ByteStream) -> Self {
        Self {
            path: normalize_separators(path.into()),
            stream,
        }
    }

    /// Create an in-memory file.
    pub fn from_bytes(path: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self::new(path, ByteStream::from_bytes(data))
    }

    /// Open a file from disk. The virtual path is the file name.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self::new(name, ByteStream::open(path)?))
    }

    /// Size of the contents.
    pub fn size(&self) -> u64 {
        self.stream.size()
    }

    /// File name without directories.
    pub fn name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    /// Extension of the file name in lowercase, without the dot.
    pub fn extension(&self) -> Option<String> {
        let name = self.name();
        let dot = name.rfind('.')?;
        if dot == 0 || dot + 1 == name.len() {
            return None;
        }
        Some(name[dot + 1..].to_ascii_lowercase())
    }

    /// Consume the file and return its contents.
    pub fn into_bytes(self) -> Result<Vec<u8>> {
        self.stream.into_bytes()
    }
}
