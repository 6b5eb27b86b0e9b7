//! Unpacking driver: decode an archive, name its entries, descend into
//! nested archives and hand everything else to a [`FileSaver`].

use crate::decoder::{ArchiveDecoder, NamingStrategy};
use crate::naming::{apply_guessed_extension, numeric_name};
use crate::registry::DecoderRegistry;
use crate::saver::FileSaver;
use tracing::{debug, info, warn};
use vnarc_core::entry::VirtualFile;
use vnarc_core::error::{Result, VnArcError};
use vnarc_core::recursion::{DEFAULT_RECURSION_LIMIT, RecursionGuard};

/// Options for an unpacking session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnpackOptions {
    /// Try to unpack extracted entries as archives themselves.
    pub recurse: bool,
    /// Name entries by index instead of their stored names.
    pub numeric_file_names: bool,
    /// Maximum nesting depth below the top-level archive.
    pub recursion_limit: usize,
    /// Stack size for each nested level, if nested levels should run on
    /// dedicated threads.
    pub stack_size: Option<usize>,
}

impl Default for UnpackOptions {
    fn default() -> Self {
        Self {
            recurse: true,
            numeric_file_names: false,
            recursion_limit: DEFAULT_RECURSION_LIMIT,
            stack_size: None,
        }
    }
}

impl UnpackOptions {
    /// Create default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable nested unpacking.
    pub fn with_recurse(mut self, recurse: bool) -> Self {
        self.recurse = recurse;
        self
    }

    /// Enable or disable numeric entry names.
    pub fn with_numeric_file_names(mut self, numeric: bool) -> Self {
        self.numeric_file_names = numeric;
        self
    }

    /// Set the nesting ceiling.
    pub fn with_recursion_limit(mut self, limit: usize) -> Self {
        self.recursion_limit = limit;
        self
    }

    /// Run nested levels on threads with `stack_size` bytes of stack.
    pub fn with_stack_size(mut self, stack_size: usize) -> Self {
        self.stack_size = Some(stack_size);
        self
    }
}

/// An entry that could not be extracted or saved.
#[derive(Debug)]
pub struct EntryFailure {
    /// Path of the entry, prefixed with its containers.
    pub path: String,
    /// Decoder that produced the entry.
    pub format: String,
    /// What went wrong.
    pub error: VnArcError,
}

/// Outcome of an unpacking session.
#[derive(Debug, Default)]
pub struct UnpackReport {
    /// Decoder used for the top-level archive.
    pub format: String,
    /// Stored paths, in save order.
    pub saved: Vec<String>,
    /// Paths the saver declined to store.
    pub skipped: Vec<String>,
    /// Entries skipped because of an error.
    pub failures: Vec<EntryFailure>,
    /// Number of nested archives unpacked.
    pub nested: usize,
    /// Whether some nested archive was saved verbatim because the depth
    /// ceiling was hit.
    pub recursion_limit_reached: bool,
}

impl UnpackReport {
    /// Whether every entry was extracted and saved.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Unpacks archives using the decoders of a registry.
///
/// One `Unpacker` is one session: its recursion guard counts depth across
/// every archive it unpacks.
#[derive(Debug)]
pub struct Unpacker<'r> {
    registry: &'r DecoderRegistry,
    options: UnpackOptions,
    guard: RecursionGuard,
}

impl<'r> Unpacker<'r> {
    /// Create a session over `registry`.
    pub fn new(registry: &'r DecoderRegistry, options: UnpackOptions) -> Self {
        let mut guard = RecursionGuard::new(options.recursion_limit);
        if let Some(stack_size) = options.stack_size {
            guard = guard.with_stack_size(stack_size);
        }
        Self {
            registry,
            options,
            guard,
        }
    }

    /// Session options.
    pub fn options(&self) -> &UnpackOptions {
        &self.options
    }

    /// Unpack `input` into `saver`.
    ///
    /// With `format` set, that decoder must recognize the input; otherwise
    /// the format is detected. Failures of single entries are logged and
    /// reported; failures to read the archive directory are returned.
    pub fn unpack(
        &self,
        input: &mut VirtualFile,
        format: Option<&str>,
        saver: &mut dyn FileSaver,
    ) -> Result<UnpackReport> {
        let (id, decoder) = match format {
            Some(id) => {
                let decoder = self.registry.create(id)?;
                if !decoder.is_recognized(input) {
                    return Err(VnArcError::not_recognized(id));
                }
                (id, decoder)
            }
            None => self.registry.detect(input, &[])?,
        };
        info!(path = %input.path, format = id, "unpacking");

        let mut report = UnpackReport {
            format: id.to_string(),
            ..UnpackReport::default()
        };
        self.unpack_archive(id, decoder.as_ref(), input, "", saver, &mut report)?;
        report.recursion_limit_reached = self.guard.recursion_limit_reached();
        Ok(report)
    }

    fn unpack_archive(
        &self,
        id: &str,
        decoder: &dyn ArchiveDecoder,
        input: &mut VirtualFile,
        prefix: &str,
        saver: &mut dyn FileSaver,
        report: &mut UnpackReport,
    ) -> Result<()> {
        let meta = decoder.read_meta(input)?;
        debug!(path = %input.path, format = id, entries = meta.len(), "read archive directory");
        let numeric = self.options.numeric_file_names
            || decoder.naming_strategy() == NamingStrategy::Numeric;

        for (index, entry) in meta.iter().enumerate() {
            let mut file = match decoder.read_file(input, &meta, entry) {
                Ok(file) => file,
                Err(error) => {
                    warn!(format = id, entry = %entry.path, %error, "failed to extract entry");
                    report.failures.push(EntryFailure {
                        path: join(prefix, &entry.path),
                        format: id.to_string(),
                        error,
                    });
                    continue;
                }
            };

            if numeric {
                file.path = numeric_name(index, meta.len());
                apply_guessed_extension(&mut file);
            }
            file.path = join(prefix, &file.path);

            if self.options.recurse && self.unpack_nested(decoder, &mut file, saver, report) {
                continue;
            }

            let path = file.path.clone();
            match saver.save(file) {
                Ok(Some(stored)) => report.saved.push(stored),
                Ok(None) => report.skipped.push(path),
                Err(error) => {
                    warn!(format = id, entry = %path, %error, "failed to save entry");
                    report.failures.push(EntryFailure {
                        path,
                        format: id.to_string(),
                        error,
                    });
                }
            }
        }
        Ok(())
    }

    /// Unpack `file` as an archive if some decoder recognizes it.
    ///
    /// Returns false when `file` should be saved as is.
    fn unpack_nested(
        &self,
        parent: &dyn ArchiveDecoder,
        file: &mut VirtualFile,
        saver: &mut dyn FileSaver,
        report: &mut UnpackReport,
    ) -> bool {
        let Ok((id, decoder)) = self.registry.detect(file, parent.linked_formats()) else {
            return false;
        };
        let prefix = file.path.clone();
        let outcome = self.guard.recurse(|| {
            self.unpack_archive(id, decoder.as_ref(), file, &prefix, saver, report)
        });

        match outcome {
            Some(Ok(())) => {
                report.nested += 1;
                true
            }
            Some(Err(error)) => {
                warn!(path = %prefix, format = id, %error, "nested archive unreadable, saving as is");
                false
            }
            None => {
                warn!(path = %prefix, format = id, "recursion limit reached, saving as is");
                false
            }
        }
    }
}

fn join(prefix: &str, path: &str) -> String {
    if prefix.is_empty() {
        path.to_string()
    } else {
        format!("{prefix}/{path}")
    }
}
