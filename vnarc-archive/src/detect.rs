//! Payload sniffing by magic bytes.
//!
//! Extracted entries often carry no usable extension. [`PayloadFormat`]
//! recognizes the common media payloads and the archive signatures of the
//! built-in decoders from the first few bytes.

/// Number of leading bytes [`PayloadFormat::from_magic`] looks at.
pub const MAGIC_LEN: usize = 16;

/// Payload kinds recognizable from their first bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadFormat {
    /// PNG image.
    Png,
    /// Windows bitmap.
    Bmp,
    /// JPEG image.
    Jpeg,
    /// GIF image.
    Gif,
    /// Ogg container.
    Ogg,
    /// RIFF WAVE audio.
    Wav,
    /// Touhou PBG3 archive.
    Pbg3,
    /// GsWin DataPack5 archive.
    GsPak,
    /// KID LNK archive.
    KidLnk,
    /// KID LND compressed file.
    KidLnd,
    /// Amuse Craft PAC archive (second layout).
    AmusePac,
    /// Unknown payload.
    Unknown,
}

impl PayloadFormat {
    /// Detect the payload kind from its leading bytes.
    pub fn from_magic(magic: &[u8]) -> Self {
        if magic.starts_with(b"\x89PNG") {
            return Self::Png;
        }
        if magic.starts_with(b"BM") && magic.len() >= 6 {
            return Self::Bmp;
        }
        if magic.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Self::Jpeg;
        }
        if magic.starts_with(b"GIF8") {
            return Self::Gif;
        }
        if magic.starts_with(b"OggS") {
            return Self::Ogg;
        }
        if magic.len() >= 12 && magic.starts_with(b"RIFF") && &magic[8..12] == b"WAVE" {
            return Self::Wav;
        }
        if magic.starts_with(b"PBG3") {
            return Self::Pbg3;
        }
        if magic.starts_with(b"DataPack5") {
            return Self::GsPak;
        }
        if magic.starts_with(b"LNK\0") {
            return Self::KidLnk;
        }
        if magic.starts_with(b"lnd\0") {
            return Self::KidLnd;
        }
        if magic.starts_with(b"PAC ") {
            return Self::AmusePac;
        }
        Self::Unknown
    }

    /// Typical file extension, without the dot.
    pub fn extension(&self) -> Option<&'static str> {
        match self {
            Self::Png => Some("png"),
            Self::Bmp => Some("bmp"),
            Self::Jpeg => Some("jpg"),
            Self::Gif => Some("gif"),
            Self::Ogg => Some("ogg"),
            Self::Wav => Some("wav"),
            Self::Pbg3 => Some("dat"),
            Self::GsPak => Some("pak"),
            Self::KidLnk => Some("lnk"),
            Self::KidLnd => Some("lnd"),
            Self::AmusePac => Some("pac"),
            Self::Unknown => None,
        }
    }

    /// Identifier of the built-in decoder for archive payloads.
    pub fn decoder_id(&self) -> Option<&'static str> {
        match self {
            Self::Pbg3 => Some("team-shanghai-alice/pbg3"),
            Self::GsPak => Some("gs/pak"),
            Self::KidLnk => Some("kid/lnk"),
            Self::AmusePac => Some("amuse-craft/pac"),
            _ => None,
        }
    }
}

impl std::fmt::Display for PayloadFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Png => "PNG",
            Self::Bmp => "BMP",
            Self::Jpeg => "JPEG",
            Self::Gif => "GIF",
            Self::Ogg => "Ogg",
            Self::Wav => "WAVE",
            Self::Pbg3 => "PBG3",
            Self::GsPak => "DataPack5",
            Self::KidLnk => "LNK",
            Self::KidLnd => "LND",
            Self::AmusePac => "PAC",
            Self::Unknown => "Unknown",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_media() {
        assert_eq!(
            PayloadFormat::from_magic(b"\x89PNG\r\n\x1a\n"),
            PayloadFormat::Png
        );
        assert_eq!(
            PayloadFormat::from_magic(&[0xFF, 0xD8, 0xFF, 0xE0]),
            PayloadFormat::Jpeg
        );
        assert_eq!(
            PayloadFormat::from_magic(b"RIFF\x24\x00\x00\x00WAVEfmt "),
            PayloadFormat::Wav
        );
        assert_eq!(PayloadFormat::from_magic(b"OggS\0\x02"), PayloadFormat::Ogg);
        assert_eq!(PayloadFormat::from_magic(b"BM\x36\x00\x00\x00"), PayloadFormat::Bmp);
    }

    #[test]
    fn test_detect_archives() {
        let format = PayloadFormat::from_magic(b"PBG3\x00");
        assert_eq!(format, PayloadFormat::Pbg3);
        assert_eq!(format.decoder_id(), Some("team-shanghai-alice/pbg3"));
        assert!(PayloadFormat::from_magic(b"lnd\0").extension() == Some("lnd"));
        assert_eq!(PayloadFormat::KidLnd.decoder_id(), None);
    }

    #[test]
    fn test_detect_unknown() {
        assert_eq!(PayloadFormat::from_magic(b"BM"), PayloadFormat::Unknown);
        assert_eq!(PayloadFormat::from_magic(b"RIFF"), PayloadFormat::Unknown);
        assert_eq!(PayloadFormat::from_magic(&[]), PayloadFormat::Unknown);
        assert_eq!(PayloadFormat::Unknown.extension(), None);
        assert_eq!(PayloadFormat::Wav.to_string(), "WAVE");
    }
}
