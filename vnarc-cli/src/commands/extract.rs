//! Extract command implementation.

use super::{open_input, resolve_decoder};
use crate::utils::{FilteredSaver, create_progress_bar};
use std::fs;
use std::path::PathBuf;
use tracing::debug;
use vnarc_archive::{DecoderRegistry, DirectorySaver, UnpackOptions, Unpacker};

/// Options for extracting archive contents.
pub struct ExtractOptions<'a> {
    pub output: &'a PathBuf,
    pub format: Option<&'a str>,
    pub recurse: bool,
    pub numeric_names: bool,
    pub recursion_limit: usize,
    pub include: &'a [String],
    pub exclude: &'a [String],
    pub progress: bool,
}

pub fn cmd_extract(
    archive: &PathBuf,
    options: &ExtractOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut input = open_input(archive)?;
    let registry = DecoderRegistry::with_builtin();

    // Resolve up front so the progress bar knows the top-level entry count.
    let (format, decoder) = resolve_decoder(&registry, &mut input, options.format)?;
    let entry_count = decoder.read_meta(&mut input)?.len() as u64;
    debug!(archive = %archive.display(), format = %format, entries = entry_count, "resolved decoder");

    fs::create_dir_all(options.output)?;
    let pb = create_progress_bar(entry_count, options.progress);
    let mut saver = FilteredSaver::new(
        DirectorySaver::new(options.output),
        options.include,
        options.exclude,
        pb,
    );

    let unpack_options = UnpackOptions::new()
        .with_recurse(options.recurse)
        .with_numeric_file_names(options.numeric_names)
        .with_recursion_limit(options.recursion_limit);
    let report = Unpacker::new(&registry, unpack_options).unpack(&mut input, Some(format.as_str()), &mut saver);
    saver.finish();
    let report = report?;

    println!(
        "Extracted {} files from {} ({}) to {}",
        report.saved.len(),
        archive.display(),
        report.format,
        options.output.display()
    );
    if !report.skipped.is_empty() {
        println!("Skipped {} files by filter", report.skipped.len());
    }
    if report.nested > 0 {
        println!("Unpacked {} nested archives", report.nested);
    }
    if report.recursion_limit_reached {
        println!(
            "Recursion limit of {} reached; deeper archives were saved as they are",
            options.recursion_limit
        );
    }
    if !report.failures.is_empty() {
        eprintln!("Failed to extract {} entries:", report.failures.len());
        for failure in &report.failures {
            eprintln!("  {} [{}]: {}", failure.path, failure.format, failure.error);
        }
        return Err(format!("{} entries failed", report.failures.len()).into());
    }

    Ok(())
}
