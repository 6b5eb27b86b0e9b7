//! Destinations for extracted files.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use vnarc_core::entry::{VirtualFile, sanitize_path, validate_path};
use vnarc_core::error::{Result, VnArcError};

/// Receives extracted files.
pub trait FileSaver: Send {
    /// Store `file` and return the path it was stored under, or `None` if
    /// the saver chose not to store it.
    ///
    /// Implementations may rename the file to avoid collisions.
    fn save(&mut self, file: VirtualFile) -> Result<Option<String>>;
}

/// A file kept in memory by [`MemorySaver`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedFile {
    /// Path the file was stored under.
    pub path: String,
    /// Contents.
    pub data: Vec<u8>,
}

/// Collects extracted files in memory.
#[derive(Debug, Default)]
pub struct MemorySaver {
    files: Vec<SavedFile>,
    taken: HashSet<String>,
}

impl MemorySaver {
    /// Create an empty saver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Files saved so far, in save order.
    pub fn files(&self) -> &[SavedFile] {
        &self.files
    }

    /// Look a file up by its stored path.
    pub fn get(&self, path: &str) -> Option<&SavedFile> {
        self.files.iter().find(|f| f.path == path)
    }

    /// Consume the saver and return its files.
    pub fn into_files(self) -> Vec<SavedFile> {
        self.files
    }
}

impl FileSaver for MemorySaver {
    fn save(&mut self, file: VirtualFile) -> Result<Option<String>> {
        let path = unique_path(&file.path, |candidate| self.taken.contains(candidate));
        self.taken.insert(path.clone());
        let data = file.into_bytes()?;
        self.files.push(SavedFile {
            path: path.clone(),
            data,
        });
        Ok(Some(path))
    }
}

/// Writes extracted files below a root directory.
///
/// Paths that escape the root are rejected. Paths that already exist on
/// disk get a ` (n)` suffix.
#[derive(Debug)]
pub struct DirectorySaver {
    root: PathBuf,
    taken: HashSet<String>,
}

impl DirectorySaver {
    /// Create a saver writing below `root`. The directory is created lazily.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            taken: HashSet::new(),
        }
    }

    /// The output root.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl FileSaver for DirectorySaver {
    fn save(&mut self, file: VirtualFile) -> Result<Option<String>> {
        validate_path(&file.path)?;
        let mut relative = sanitize_path(&file.path);
        if relative.is_empty() {
            relative = String::from("unnamed");
        }

        let root = &self.root;
        let taken = &self.taken;
        let relative = unique_path(&relative, |candidate| {
            taken.contains(candidate) || root.join(candidate).exists()
        });
        let target = self.root.join(&relative);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }

        let data = file.into_bytes()?;
        fs::write(&target, &data)?;
        debug!(path = %target.display(), size = data.len(), "saved");
        self.taken.insert(relative.clone());
        Ok(Some(relative))
    }
}

/// `path`, or the first `stem (n).ext` for which `taken` is false.
fn unique_path(path: &str, taken: impl Fn(&str) -> bool) -> String {
    if !taken(path) {
        return path.to_string();
    }
    let name_start = path.rfind('/').map_or(0, |i| i + 1);
    let (stem, extension) = match path[name_start..].rfind('.') {
        Some(dot) if dot > 0 => path.split_at(name_start + dot),
        _ => (path, ""),
    };
    (1..)
        .map(|n| format!("{stem} ({n}){extension}"))
        .find(|candidate| !taken(candidate))
        .unwrap_or_else(|| path.to_string())
}
