//! Unpacking sessions over a small test format.
//!
//! Layout of `test/two` archives:
//!
//! ```text
//! 0   "TWO\0"
//! 4   u32 entry count
//! 8   u32 table offset
//! 12  padding
//! 16  entry data
//! ..  table: zero-terminated name, u32 offset, u32 size
//! ```

use vnarc_archive::{
    ArchiveDecoder, DecoderRegistry, FileSaver, MemorySaver, UnpackOptions, Unpacker,
};
use vnarc_core::entry::{ArchiveEntry, ArchiveMeta, VirtualFile};
use vnarc_core::error::{Result, VnArcError};

const MAGIC: &[u8] = b"TWO\0";

struct TwoDecoder;

impl ArchiveDecoder for TwoDecoder {
    fn recognize(&self, input: &mut VirtualFile) -> Result<bool> {
        Ok(input.stream.read(MAGIC.len())? == MAGIC)
    }

    fn read_meta(&self, input: &mut VirtualFile) -> Result<ArchiveMeta> {
        let stream = input.stream.seek(4);
        let count = stream.read_u32_le()?;
        let table_offset = stream.read_u32_le()?;
        stream.seek(u64::from(table_offset));
        let mut meta = ArchiveMeta::new();
        for _ in 0..count {
            let name = String::from_utf8_lossy(&stream.read_to_zero()?).into_owned();
            let offset = stream.read_u32_le()?;
            let size = stream.read_u32_le()?;
            meta.push(ArchiveEntry::new(name, u64::from(offset), u64::from(size)));
        }
        Ok(meta)
    }

    fn read_file(
        &self,
        input: &mut VirtualFile,
        _meta: &ArchiveMeta,
        entry: &ArchiveEntry,
    ) -> Result<VirtualFile> {
        let data = input
            .stream
            .seek(entry.offset)
            .read(entry.size_comp as usize)?;
        Ok(VirtualFile::from_bytes(entry.path.clone(), data))
    }
}

fn build(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let data_len: usize = entries.iter().map(|(_, body)| body.len()).sum();
    let mut data = MAGIC.to_vec();
    data.extend_from_slice(&(entries.len() as u32).to_le_bytes());
    data.extend_from_slice(&((16 + data_len) as u32).to_le_bytes());
    data.resize(16, 0);
    for (_, body) in entries {
        data.extend_from_slice(body);
    }
    let mut offset = 16u32;
    for (name, body) in entries {
        data.extend_from_slice(name.as_bytes());
        data.push(0);
        data.extend_from_slice(&offset.to_le_bytes());
        data.extend_from_slice(&(body.len() as u32).to_le_bytes());
        offset += body.len() as u32;
    }
    data
}

fn two_entries() -> Vec<u8> {
    build(&[("A", b"1234567890"), ("B", b"abcdefghijklmnopqrstuvwxyz")])
}

fn registry() -> DecoderRegistry {
    let mut registry = DecoderRegistry::new();
    registry.register("test/two", || Box::new(TwoDecoder)).unwrap();
    registry
}

#[test]
fn test_unpack_two_entries() {
    let registry = registry();
    let mut input = VirtualFile::from_bytes("two.bin", two_entries());

    let meta = TwoDecoder.read_meta(&mut input).unwrap();
    assert_eq!(meta.entries[0].offset, 16);
    assert_eq!(meta.entries[1].offset, 26);

    let mut saver = MemorySaver::new();
    let report = Unpacker::new(&registry, UnpackOptions::default())
        .unpack(&mut input, None, &mut saver)
        .unwrap();

    assert_eq!(report.format, "test/two");
    assert!(report.is_complete());
    assert_eq!(report.saved, ["A", "B"]);
    assert_eq!(saver.get("A").unwrap().data, b"1234567890");
    assert_eq!(saver.get("B").unwrap().data, b"abcdefghijklmnopqrstuvwxyz");
}

/// Keeps only files whose name is in `wanted`.
struct PickySaver {
    wanted: &'static [&'static str],
    inner: MemorySaver,
}

impl FileSaver for PickySaver {
    fn save(&mut self, file: VirtualFile) -> Result<Option<String>> {
        if !self.wanted.contains(&file.path.as_str()) {
            return Ok(None);
        }
        self.inner.save(file)
    }
}

#[test]
fn test_declined_files_are_not_reported_saved() {
    let registry = registry();
    let mut input = VirtualFile::from_bytes("two.bin", two_entries());
    let mut saver = PickySaver {
        wanted: &["B"],
        inner: MemorySaver::new(),
    };

    let report = Unpacker::new(&registry, UnpackOptions::default())
        .unpack(&mut input, None, &mut saver)
        .unwrap();

    assert!(report.is_complete());
    assert_eq!(report.saved, ["B"]);
    assert_eq!(report.skipped, ["A"]);
    assert_eq!(saver.inner.files().len(), 1);
}

#[test]
fn test_detection_keeps_cursor() {
    let registry = registry();
    let mut input = VirtualFile::from_bytes("two.bin", two_entries());
    input.stream.seek(5);
    let (id, _) = registry.detect(&mut input, &[]).unwrap();
    assert_eq!(id, "test/two");
    assert_eq!(input.stream.tell(), 5);
}

#[test]
fn test_explicit_format() {
    let registry = registry();
    let unpacker = Unpacker::new(&registry, UnpackOptions::default());
    let mut saver = MemorySaver::new();

    let mut input = VirtualFile::from_bytes("two.bin", two_entries());
    let report = unpacker
        .unpack(&mut input, Some("test/two"), &mut saver)
        .unwrap();
    assert_eq!(report.saved.len(), 2);

    let mut garbage = VirtualFile::from_bytes("x.bin", b"nothing here".to_vec());
    let err = unpacker
        .unpack(&mut garbage, Some("test/two"), &mut saver)
        .unwrap_err();
    assert!(matches!(err, VnArcError::NotRecognized { .. }));

    let err = unpacker
        .unpack(&mut input, Some("test/missing"), &mut saver)
        .unwrap_err();
    assert!(matches!(err, VnArcError::UnknownDecoder { .. }));
}

#[test]
fn test_entry_failure_is_reported() {
    let mut data = two_entries();
    // Make B claim 200 bytes.
    let size_field = data.len() - 4;
    data[size_field..].copy_from_slice(&200u32.to_le_bytes());

    let registry = registry();
    let mut input = VirtualFile::from_bytes("two.bin", data);
    let mut saver = MemorySaver::new();
    let report = Unpacker::new(&registry, UnpackOptions::default())
        .unpack(&mut input, None, &mut saver)
        .unwrap();

    assert_eq!(report.saved, ["A"]);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].path, "B");
    assert!(report.failures[0].error.is_eof());
}

#[test]
fn test_numeric_names() {
    let registry = registry();
    let png = b"\x89PNG\r\n\x1a\n".as_slice();
    let mut input = VirtualFile::from_bytes("two.bin", build(&[("x", b"text"), ("y", png)]));
    let mut saver = MemorySaver::new();
    let options = UnpackOptions::default().with_numeric_file_names(true);
    let report = Unpacker::new(&registry, options)
        .unpack(&mut input, None, &mut saver)
        .unwrap();
    assert_eq!(report.saved, ["0000", "0001.png"]);
}

#[test]
fn test_nested_archive() {
    let inner = two_entries();
    let outer = build(&[("readme", b"top"), ("inner.two", &inner)]);
    let registry = registry();

    let mut saver = MemorySaver::new();
    let mut input = VirtualFile::from_bytes("outer.two", outer.clone());
    let report = Unpacker::new(&registry, UnpackOptions::default())
        .unpack(&mut input, None, &mut saver)
        .unwrap();
    assert_eq!(report.saved, ["readme", "inner.two/A", "inner.two/B"]);
    assert_eq!(report.nested, 1);
    assert!(!report.recursion_limit_reached);

    let mut saver = MemorySaver::new();
    let mut input = VirtualFile::from_bytes("outer.two", outer);
    let report = Unpacker::new(&registry, UnpackOptions::default().with_recurse(false))
        .unpack(&mut input, None, &mut saver)
        .unwrap();
    assert_eq!(report.saved, ["readme", "inner.two"]);
    assert_eq!(saver.get("inner.two").unwrap().data, inner);
}

fn nest(depth: usize) -> Vec<u8> {
    let mut data = build(&[("leaf", b"payload")]);
    for _ in 0..depth {
        data = build(&[("level", &data)]);
    }
    data
}

#[test]
fn test_recursion_limit() {
    let registry = registry();
    let mut saver = MemorySaver::new();
    let mut input = VirtualFile::from_bytes("deep.two", nest(3));
    let report = Unpacker::new(&registry, UnpackOptions::default().with_recursion_limit(2))
        .unpack(&mut input, None, &mut saver)
        .unwrap();

    // Two nested levels are unpacked; the third is saved as is.
    assert_eq!(report.saved, ["level/level/level"]);
    assert_eq!(report.nested, 2);
    assert!(report.recursion_limit_reached);
    assert_eq!(saver.files()[0].data, build(&[("leaf", b"payload")]));
}

#[test]
fn test_recursion_with_stack_size() {
    let registry = registry();
    let mut saver = MemorySaver::new();
    let mut input = VirtualFile::from_bytes("deep.two", nest(4));
    let options = UnpackOptions::default().with_stack_size(512 * 1024);
    let report = Unpacker::new(&registry, options)
        .unpack(&mut input, None, &mut saver)
        .unwrap();
    assert_eq!(report.saved, ["level/level/level/level/leaf"]);
    assert_eq!(saver.files()[0].data, b"payload");
}
