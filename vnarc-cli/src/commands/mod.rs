//! Command implementations for the vnarc CLI.

pub mod detect;
pub mod extract;
pub mod formats;
pub mod list;

use std::path::Path;
use vnarc_archive::{ArchiveDecoder, DecoderRegistry};
use vnarc_core::entry::VirtualFile;
use vnarc_core::error::{Result, VnArcError};

pub use detect::cmd_detect;
pub use extract::{ExtractOptions, cmd_extract};
pub use formats::cmd_formats;
pub use list::{ListOptions, cmd_list};

/// Open an input archive, memory-mapped when the `mmap` feature is on.
pub(crate) fn open_input(path: &Path) -> Result<VirtualFile> {
    #[cfg(feature = "mmap")]
    {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let stream = vnarc_core::stream::ByteStream::open_mmap(path)?;
        Ok(VirtualFile::new(name, stream))
    }
    #[cfg(not(feature = "mmap"))]
    {
        VirtualFile::open(path)
    }
}

/// The requested decoder, or the detected one.
pub(crate) fn resolve_decoder(
    registry: &DecoderRegistry,
    input: &mut VirtualFile,
    format: Option<&str>,
) -> Result<(String, Box<dyn ArchiveDecoder>)> {
    match format {
        Some(id) => {
            let decoder = registry.create(id)?;
            if !decoder.is_recognized(input) {
                return Err(VnArcError::not_recognized(id));
            }
            Ok((id.to_string(), decoder))
        }
        None => {
            let (id, decoder) = registry.detect(input, &[])?;
            Ok((id.to_string(), decoder))
        }
    }
}
