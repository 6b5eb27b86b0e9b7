//! Built-in decoders for engine archive formats.
//!
//! | Identifier                 | Engine / game        | Entry coding          |
//! |----------------------------|----------------------|-----------------------|
//! | `team-shanghai-alice/pbg3` | Touhou 6-7           | bitwise LZSS 13/4/3   |
//! | `gs/pak`                   | GsWin                | stored, LZSS table    |
//! | `kid/lnk`                  | KID                  | LND, scrambled media  |
//! | `amuse-craft/pac`          | Amuse Craft          | stored                |
//! | `nscripter/sar`            | NScripter            | stored                |
//! | `kiss/arc`                 | KISS                 | stored                |
//! | `nscripter/nsa`            | NScripter            | bitwise LZSS 8/4/2    |
//! | `libido/arc`               | Libido               | bytewise LZSS         |

pub mod amuse_pac;
pub mod gs_pak;
pub mod kid_lnd;
pub mod kid_lnk;
pub mod kiss_arc;
pub mod libido_arc;
pub mod nscripter;
pub mod pbg3;

use crate::registry::DecoderRegistry;
use vnarc_core::entry::{ArchiveEntry, VirtualFile};
use vnarc_core::error::{Result, VnArcError};
use vnarc_core::stream::ByteStream;

pub use amuse_pac::AmusePacArchiveDecoder;
pub use gs_pak::GsPakArchiveDecoder;
pub use kid_lnk::KidLnkArchiveDecoder;
pub use kiss_arc::KissArcArchiveDecoder;
pub use libido_arc::LibidoArcArchiveDecoder;
pub use nscripter::{NsaArchiveDecoder, SarArchiveDecoder};
pub use pbg3::Pbg3ArchiveDecoder;

/// Register every built-in decoder, formats with a magic first.
pub fn register_builtin(registry: &mut DecoderRegistry) {
    let builtin: [(&str, fn() -> Box<dyn crate::decoder::ArchiveDecoder>); 8] = [
        (pbg3::ID, || Box::new(Pbg3ArchiveDecoder)),
        (gs_pak::ID, || Box::new(GsPakArchiveDecoder)),
        (kid_lnk::ID, || Box::new(KidLnkArchiveDecoder)),
        (amuse_pac::ID, || Box::new(AmusePacArchiveDecoder)),
        (nscripter::SAR_ID, || Box::new(SarArchiveDecoder)),
        (kiss_arc::ID, || Box::new(KissArcArchiveDecoder)),
        (nscripter::NSA_ID, || Box::new(NsaArchiveDecoder)),
        (libido_arc::ID, || Box::new(LibidoArcArchiveDecoder)),
    ];
    for (id, factory) in builtin {
        // Only fails if the caller registered the id first.
        if registry.register(id, factory).is_err() {
            tracing::debug!(decoder = id, "built-in decoder already registered");
        }
    }
}

/// Fail with `InvalidMagic` unless the stream continues with `magic`.
pub(crate) fn expect_magic(stream: &mut ByteStream, magic: &[u8]) -> Result<()> {
    let found = stream.read(magic.len())?;
    if found != magic {
        return Err(VnArcError::invalid_magic(magic, found));
    }
    Ok(())
}

/// The stored bytes of `entry`.
pub(crate) fn read_stored(input: &mut VirtualFile, entry: &ArchiveEntry) -> Result<Vec<u8>> {
    input.stream.seek(entry.offset).read(stored_len(entry)?)
}

/// `entry.size_comp` as a buffer length.
pub(crate) fn stored_len(entry: &ArchiveEntry) -> Result<usize> {
    usize::try_from(entry.size_comp)
        .map_err(|_| VnArcError::corrupted(entry.offset, "entry too large"))
}

/// `entry`'s decompressed size as a buffer length.
pub(crate) fn original_len(entry: &ArchiveEntry) -> Result<usize> {
    usize::try_from(entry.original_size())
        .map_err(|_| VnArcError::corrupted(entry.offset, "entry too large"))
}
