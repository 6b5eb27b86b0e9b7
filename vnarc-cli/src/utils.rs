//! Utility functions for the CLI.

use glob::Pattern;
use indicatif::{ProgressBar, ProgressStyle};
use vnarc_archive::FileSaver;
use vnarc_core::entry::{ArchiveEntry, VirtualFile};
use vnarc_core::error::Result;

/// Create a progress bar with standard styling.
pub fn create_progress_bar(len: u64, enable: bool) -> ProgressBar {
    if !enable {
        return ProgressBar::hidden();
    }

    let style = ProgressStyle::default_bar()
        .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .map(|style| style.progress_chars("█▓▒░ "))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    let pb = ProgressBar::new(len);
    pb.set_style(style);
    pb
}

/// Check if a path matches the filter patterns.
/// - If include patterns are specified, the path must match at least one
/// - If exclude patterns are specified, the path must not match any
pub fn matches_filters(path: &str, include: &[String], exclude: &[String]) -> bool {
    let matches = |patterns: &[String]| {
        patterns
            .iter()
            .filter_map(|p| Pattern::new(p).ok())
            .any(|p| p.matches(path))
    };

    if matches(exclude) {
        return false;
    }
    include.is_empty() || matches(include)
}

/// Filter archive entries by include/exclude patterns.
pub fn filter_entries<'a>(
    entries: impl IntoIterator<Item = &'a ArchiveEntry>,
    include: &[String],
    exclude: &[String],
) -> Vec<&'a ArchiveEntry> {
    entries
        .into_iter()
        .filter(|e| matches_filters(&e.path, include, exclude))
        .collect()
}

/// Saver wrapper that declines filtered paths and ticks a progress bar.
pub struct FilteredSaver<'a, S> {
    inner: S,
    include: &'a [String],
    exclude: &'a [String],
    progress: ProgressBar,
}

impl<'a, S: FileSaver> FilteredSaver<'a, S> {
    pub fn new(inner: S, include: &'a [String], exclude: &'a [String], progress: ProgressBar) -> Self {
        Self {
            inner,
            include,
            exclude,
            progress,
        }
    }

    pub fn finish(&self) {
        self.progress.finish_and_clear();
    }
}

impl<S: FileSaver> FileSaver for FilteredSaver<'_, S> {
    fn save(&mut self, file: VirtualFile) -> Result<Option<String>> {
        if self.progress.position() >= self.progress.length().unwrap_or(0) {
            // Entries of nested archives were not counted up front.
            self.progress.inc_length(1);
        }
        self.progress.inc(1);

        if !matches_filters(&file.path, self.include, self.exclude) {
            return Ok(None);
        }
        self.progress.set_message(file.name().to_string());
        self.inner.save(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vnarc_archive::MemorySaver;

    fn strings(patterns: &[&str]) -> Vec<String> {
        patterns.iter().map(|p| p.to_string()).collect()
    }

    #[test]
    fn test_matches_filters() {
        let none = strings(&[]);
        assert!(matches_filters("bg/a.png", &none, &none));
        assert!(matches_filters("bg/a.png", &strings(&["*.png"]), &none));
        assert!(!matches_filters("bg/a.png", &strings(&["*.ogg"]), &none));
        assert!(!matches_filters("bg/a.png", &none, &strings(&["bg/*"])));
        assert!(!matches_filters("bg/a.png", &strings(&["*.png"]), &strings(&["bg/*"])));
    }

    #[test]
    fn test_filtered_saver() {
        let include = strings(&["*.txt"]);
        let exclude = strings(&[]);
        let mut saver = FilteredSaver::new(MemorySaver::new(), &include, &exclude, ProgressBar::hidden());
        let kept = saver.save(VirtualFile::from_bytes("a.txt", b"a".to_vec())).unwrap();
        let dropped = saver.save(VirtualFile::from_bytes("b.png", b"b".to_vec())).unwrap();
        assert_eq!(kept.as_deref(), Some("a.txt"));
        assert_eq!(dropped, None);
        assert_eq!(saver.inner.files().len(), 1);
        assert_eq!(saver.progress.position(), 2);
    }
}
