//! Formats command implementation.

use vnarc_archive::DecoderRegistry;

pub fn cmd_formats() -> Result<(), Box<dyn std::error::Error>> {
    let registry = DecoderRegistry::with_builtin();
    println!("Registered decoders (detection order):");
    for id in registry.ids() {
        println!("  {}", id);
    }
    Ok(())
}
