//! Entry names: Shift_JIS decoding, extension sniffing and numeric names.

use crate::detect::{MAGIC_LEN, PayloadFormat};
use encoding_rs::SHIFT_JIS;
use vnarc_core::entry::VirtualFile;
use vnarc_core::error::{Result, VnArcError};

/// Decode a Shift_JIS name, falling back to lossy UTF-8.
pub fn decode_sjis(bytes: &[u8]) -> String {
    let (decoded, _, had_errors) = SHIFT_JIS.decode(bytes);
    if !had_errors {
        return decoded.into_owned();
    }
    String::from_utf8_lossy(bytes).into_owned()
}

/// Decode a Shift_JIS name, failing on malformed input.
pub fn decode_sjis_strict(bytes: &[u8]) -> Result<String> {
    let (decoded, _, had_errors) = SHIFT_JIS.decode(bytes);
    if had_errors {
        return Err(VnArcError::encoding_error(format!(
            "invalid Shift_JIS name {bytes:02x?}"
        )));
    }
    Ok(decoded.into_owned())
}

/// Guess an extension from the payload's leading bytes.
pub fn guess_extension(data: &[u8]) -> Option<&'static str> {
    PayloadFormat::from_magic(data).extension()
}

/// Sniff `file` and give it the matching extension.
///
/// An existing extension is replaced; the cursor is left untouched.
/// Returns whether the path changed.
pub fn apply_guessed_extension(file: &mut VirtualFile) -> bool {
    let head_len = MAGIC_LEN.min(file.size() as usize);
    let Ok(head) = file.stream.peek(0, |s| s.read(head_len)) else {
        return false;
    };
    let Some(extension) = guess_extension(&head) else {
        return false;
    };
    if file.extension().as_deref() == Some(extension) {
        return false;
    }
    file.path = replace_extension(&file.path, extension);
    true
}

/// Replace (or append) the extension of the last path component.
pub fn replace_extension(path: &str, extension: &str) -> String {
    let name_start = path.rfind('/').map_or(0, |i| i + 1);
    let stem_end = match path[name_start..].rfind('.') {
        Some(dot) if dot > 0 => name_start + dot,
        _ => path.len(),
    };
    format!("{}.{}", &path[..stem_end], extension)
}

/// Name for the entry at `index` in an archive of `count` entries.
///
/// Indices are zero-padded to at least four digits so names sort in
/// directory order.
pub fn numeric_name(index: usize, count: usize) -> String {
    let width = count.to_string().len().max(4);
    format!("{index:0width$}")
}
