//! Decoder registry and format auto-detection.

use crate::decoder::ArchiveDecoder;
use crate::formats;
use std::fmt;
use tracing::{debug, trace};
use vnarc_core::entry::VirtualFile;
use vnarc_core::error::{Result, VnArcError};

type Factory = Box<dyn Fn() -> Box<dyn ArchiveDecoder> + Send + Sync>;

/// Decoder identifiers mapped to factories, in registration order.
///
/// Detection tries decoders in registration order, so register the most
/// specific formats (those with a magic) before permissive ones.
#[derive(Default)]
pub struct DecoderRegistry {
    factories: Vec<(String, Factory)>,
}

impl DecoderRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding every built-in decoder.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        formats::register_builtin(&mut registry);
        registry
    }

    /// Register a factory under `id`.
    pub fn register<F>(&mut self, id: impl Into<String>, factory: F) -> Result<()>
    where
        F: Fn() -> Box<dyn ArchiveDecoder> + Send + Sync + 'static,
    {
        let id = id.into();
        if self.contains(&id) {
            return Err(VnArcError::duplicate_decoder(id));
        }
        self.factories.push((id, Box::new(factory)));
        Ok(())
    }

    /// Whether a decoder is registered under `id`.
    pub fn contains(&self, id: &str) -> bool {
        self.factories.iter().any(|(known, _)| known == id)
    }

    /// Registered identifiers, in registration order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.factories.iter().map(|(id, _)| id.as_str())
    }

    /// Number of registered decoders.
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Instantiate the decoder registered under `id`.
    pub fn create(&self, id: &str) -> Result<Box<dyn ArchiveDecoder>> {
        self.factories
            .iter()
            .find(|(known, _)| known == id)
            .map(|(_, factory)| factory())
            .ok_or_else(|| VnArcError::unknown_decoder(id))
    }

    /// Find the decoder that recognizes `input`.
    ///
    /// Registered `hints` are tried first, then every other decoder in
    /// registration order. Unknown hints are skipped. The cursor of
    /// `input` is left where it was.
    pub fn detect(
        &self,
        input: &mut VirtualFile,
        hints: &[&str],
    ) -> Result<(&str, Box<dyn ArchiveDecoder>)> {
        let hinted = hints
            .iter()
            .filter_map(|hint| self.factories.iter().find(|(id, _)| id.as_str() == *hint));
        let rest = self
            .factories
            .iter()
            .filter(|(id, _)| !hints.contains(&id.as_str()));

        for (id, factory) in hinted.chain(rest) {
            let decoder = factory();
            trace!(decoder = %id, path = %input.path, "trying decoder");
            if decoder.is_recognized(input) {
                debug!(decoder = %id, path = %input.path, "recognized");
                return Ok((id.as_str(), decoder));
            }
        }
        Err(VnArcError::not_recognized(format!(
            "any of {} registered formats",
            self.factories.len()
        )))
    }
}

impl fmt::Debug for DecoderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.ids()).finish()
    }
}
