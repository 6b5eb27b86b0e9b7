//! Error types for vnarc operations.
//!
//! Every failure maps onto one of a handful of [`ErrorKind`] classes. The
//! class decides how a caller reacts: recognition failures drive format
//! detection fallthrough, bounds errors are swallowed inside recognition
//! peeks, and everything else aborts the entry (or archive) being decoded.

use std::io;
use thiserror::Error;

/// Coarse classification of a [`VnArcError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The input is not in the expected format. Expected and non-fatal
    /// during detection.
    Recognition,
    /// The format matched but a sub-version or feature is not implemented.
    UnsupportedVersion,
    /// A structural invariant was violated.
    CorruptData,
    /// A read or seek went past the end of the stream.
    Bounds,
    /// The caller supplied bad parameters or forgot a required one.
    Usage,
    /// Error from the underlying reader or writer.
    Io,
}

/// The main error type for vnarc operations.
#[derive(Debug, Error)]
pub enum VnArcError {
    /// I/O error from underlying reader/writer.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Input was not recognized as the requested format.
    #[error("Not recognized as {format}")]
    NotRecognized {
        /// Format identifier (or a description of the candidate set).
        format: String,
    },

    /// Invalid magic number in archive header.
    #[error("Invalid magic number: expected {expected:02x?}, found {found:02x?}")]
    InvalidMagic {
        /// Expected magic bytes.
        expected: Vec<u8>,
        /// Actual magic bytes found.
        found: Vec<u8>,
    },

    /// Structurally matched, but the version is not implemented.
    #[error("Unsupported {format} version: {version}")]
    UnsupportedVersion {
        /// Format identifier.
        format: String,
        /// Version as found in the input.
        version: String,
    },

    /// Unsupported compression method.
    #[error("Unsupported compression method: {method}")]
    UnsupportedMethod {
        /// The compression method identifier.
        method: String,
    },

    /// Corrupted data in archive.
    #[error("Corrupted data at offset {offset}: {message}")]
    CorruptedData {
        /// Byte offset where corruption was detected.
        offset: u64,
        /// Description of the corruption.
        message: String,
    },

    /// Read past the end of the stream.
    #[error("Unexpected end of stream: wanted {requested} bytes at {position}, {available} available")]
    UnexpectedEof {
        /// Stream position of the failed read.
        position: u64,
        /// Number of bytes requested.
        requested: u64,
        /// Number of bytes left in the stream.
        available: u64,
    },

    /// Invalid back-reference into an LZ dictionary or output history.
    #[error("Invalid back-reference distance: {distance} exceeds history size {history_size}")]
    InvalidDistance {
        /// The invalid distance value.
        distance: usize,
        /// Current history size.
        history_size: usize,
    },

    /// Path traversal attempt (e.g., "../" in an entry name).
    #[error("Path traversal detected in entry: {path}")]
    PathTraversal {
        /// The suspicious path.
        path: String,
    },

    /// Encoding error (e.g., invalid Shift_JIS).
    #[error("Encoding error: {message}")]
    EncodingError {
        /// Description of the encoding error.
        message: String,
    },

    /// No decoder registered under this identifier.
    #[error("Unknown decoder: {id}")]
    UnknownDecoder {
        /// Requested identifier.
        id: String,
    },

    /// A decoder with this identifier is already registered.
    #[error("Decoder already registered: {id}")]
    DuplicateDecoder {
        /// Conflicting identifier.
        id: String,
    },

    /// Bad or missing caller-supplied parameter.
    #[error("Usage error: {message}")]
    Usage {
        /// What the caller needs to fix.
        message: String,
    },
}

/// Result type alias for vnarc operations.
pub type Result<T> = std::result::Result<T, VnArcError>;

impl VnArcError {
    /// Create a recognition failure.
    pub fn not_recognized(format: impl Into<String>) -> Self {
        Self::NotRecognized {
            format: format.into(),
        }
    }

    /// Create an invalid magic error.
    pub fn invalid_magic(expected: impl Into<Vec<u8>>, found: impl Into<Vec<u8>>) -> Self {
        Self::InvalidMagic {
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Create an unsupported version error.
    pub fn unsupported_version(format: impl Into<String>, version: impl ToString) -> Self {
        Self::UnsupportedVersion {
            format: format.into(),
            version: version.to_string(),
        }
    }

    /// Create an unsupported method error.
    pub fn unsupported_method(method: impl Into<String>) -> Self {
        Self::UnsupportedMethod {
            method: method.into(),
        }
    }

    /// Create a corrupted data error.
    pub fn corrupted(offset: u64, message: impl Into<String>) -> Self {
        Self::CorruptedData {
            offset,
            message: message.into(),
        }
    }

    /// Create an unexpected EOF error.
    pub fn unexpected_eof(position: u64, requested: u64, available: u64) -> Self {
        Self::UnexpectedEof {
            position,
            requested,
            available,
        }
    }

    /// Create an invalid distance error.
    pub fn invalid_distance(distance: usize, history_size: usize) -> Self {
        Self::InvalidDistance {
            distance,
            history_size,
        }
    }

    /// Create a path traversal error.
    pub fn path_traversal(path: impl Into<String>) -> Self {
        Self::PathTraversal { path: path.into() }
    }

    /// Create an encoding error.
    pub fn encoding_error(message: impl Into<String>) -> Self {
        Self::EncodingError {
            message: message.into(),
        }
    }

    /// Create an unknown decoder error.
    pub fn unknown_decoder(id: impl Into<String>) -> Self {
        Self::UnknownDecoder { id: id.into() }
    }

    /// Create a duplicate decoder error.
    pub fn duplicate_decoder(id: impl Into<String>) -> Self {
        Self::DuplicateDecoder { id: id.into() }
    }

    /// Create a usage error.
    pub fn usage(message: impl Into<String>) -> Self {
        Self::Usage {
            message: message.into(),
        }
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotRecognized { .. } | Self::InvalidMagic { .. } => ErrorKind::Recognition,
            Self::UnsupportedVersion { .. } | Self::UnsupportedMethod { .. } => {
                ErrorKind::UnsupportedVersion
            }
            Self::CorruptedData { .. }
            | Self::InvalidDistance { .. }
            | Self::PathTraversal { .. }
            | Self::EncodingError { .. } => ErrorKind::CorruptData,
            Self::UnexpectedEof { .. } => ErrorKind::Bounds,
            Self::Io(e) if e.kind() == io::ErrorKind::UnexpectedEof => ErrorKind::Bounds,
            Self::Io(_) => ErrorKind::Io,
            Self::UnknownDecoder { .. }
            | Self::DuplicateDecoder { .. }
            | Self::Usage { .. } => ErrorKind::Usage,
        }
    }

    /// Whether this error means "ran out of input".
    pub fn is_eof(&self) -> bool {
        self.kind() == ErrorKind::Bounds
    }
}
