//! List command implementation.

use super::{open_input, resolve_decoder};
use crate::utils::filter_entries;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use vnarc_archive::DecoderRegistry;
use vnarc_core::entry::ArchiveEntry;

/// JSON serializable entry data for archive listings.
#[derive(Debug, Serialize, Deserialize)]
struct EntryJson {
    path: String,
    offset: u64,
    size: u64,
    original_size: u64,
    method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    key: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    checksum: Option<u32>,
}

impl EntryJson {
    fn from_entry(entry: &ArchiveEntry) -> Self {
        Self {
            path: entry.path.clone(),
            offset: entry.offset,
            size: entry.size_comp,
            original_size: entry.original_size(),
            method: entry.method.to_string(),
            key: entry.key,
            checksum: entry.checksum,
        }
    }
}

/// JSON output for archive listing.
#[derive(Debug, Serialize, Deserialize)]
struct ArchiveListJson {
    archive: String,
    format: String,
    entries: Vec<EntryJson>,
}

/// Options for listing archive contents.
pub struct ListOptions<'a> {
    pub format: Option<&'a str>,
    pub json: bool,
    pub include: &'a [String],
    pub exclude: &'a [String],
}

pub fn cmd_list(
    archive: &PathBuf,
    options: &ListOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut input = open_input(archive)?;
    let registry = DecoderRegistry::with_builtin();
    let (format, decoder) = resolve_decoder(&registry, &mut input, options.format)?;

    let meta = decoder.read_meta(&mut input)?;
    let entries = filter_entries(meta.iter(), options.include, options.exclude);

    if options.json {
        let listing = ArchiveListJson {
            archive: archive.display().to_string(),
            format,
            entries: entries.iter().map(|e| EntryJson::from_entry(e)).collect(),
        };
        println!("{}", serde_json::to_string_pretty(&listing)?);
        return Ok(());
    }

    println!("Archive: {} ({})", archive.display(), format);
    println!();
    print_entries(&entries);
    Ok(())
}

fn print_entries(entries: &[&ArchiveEntry]) {
    println!(
        "{:>10} {:>10} {:>10} {:<14} Name",
        "Offset", "Size", "Original", "Method"
    );
    println!("{}", "-".repeat(60));

    let mut total_comp = 0u64;
    let mut total_orig = 0u64;
    for entry in entries {
        println!(
            "{:>10} {:>10} {:>10} {:<14} {}",
            entry.offset,
            entry.size_comp,
            entry.original_size(),
            entry.method.to_string(),
            entry.path
        );
        total_comp += entry.size_comp;
        total_orig += entry.original_size();
    }

    println!("{}", "-".repeat(60));
    println!(
        "{:>10} {:>10} {:>10} {} files",
        "", total_comp, total_orig, entries.len()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use vnarc_core::entry::EntryMethod;

    #[test]
    fn test_entry_json() {
        let entry = ArchiveEntry::new("bg/a.png", 32, 10)
            .with_method(EntryMethod::BytewiseLzss)
            .with_original_size(20);
        let json = serde_json::to_value(EntryJson::from_entry(&entry)).unwrap();
        assert_eq!(json["path"], "bg/a.png");
        assert_eq!(json["size"], 10);
        assert_eq!(json["original_size"], 20);
        assert_eq!(json["method"], "lzss-bytewise");
        assert!(json.get("key").is_none());
    }
}
