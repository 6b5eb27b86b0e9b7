//! Detect command implementation.

use super::open_input;
use std::path::PathBuf;
use vnarc_archive::{DecoderRegistry, PayloadFormat};
use vnarc_archive::detect::MAGIC_LEN;

pub fn cmd_detect(file: &PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let mut input = open_input(file)?;
    let registry = DecoderRegistry::with_builtin();

    let head_len = MAGIC_LEN.min(input.size() as usize);
    let magic = input.stream.peek(0, |s| s.read(head_len))?;
    let payload = PayloadFormat::from_magic(&magic);

    println!("File: {}", file.display());
    match registry.detect(&mut input, &[]) {
        Ok((id, decoder)) => {
            println!("Format: {}", id);
            let linked = decoder.linked_formats();
            if !linked.is_empty() {
                println!("Linked formats: {}", linked.join(", "));
            }
        }
        Err(e) => {
            if let Some(id) = payload.decoder_id() {
                return Err(format!("{} signature found but the archive is unreadable: {}", id, e).into());
            }
            if payload == PayloadFormat::Unknown {
                return Err(e.into());
            }
            println!("Format: not an archive");
        }
    }
    println!("Payload: {}", payload);
    if let Some(extension) = payload.extension() {
        println!("Extension: .{}", extension);
    }
    println!("Magic bytes: {:02X?}", magic);

    Ok(())
}
