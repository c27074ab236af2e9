use anyhow::Result;

use crate::config::Config;
use crate::registry::Registry;
use crate::sink::ChunkSink;

/// Prints corpus, registry, and chunk sink health.
pub fn show_status(config: &Config) -> Result<()> {
    let root = &config.source.root;
    let root_status = if root.exists() { "OK" } else { "MISSING" };

    let registry = Registry::load(&config.store.registry_path)?;
    let sink = ChunkSink::new(&config.store.chunks_dir);

    println!("{:<14} {} ({})", "corpus root", root.display(), root_status);
    println!(
        "{:<14} {} ({} entries)",
        "registry",
        config.store.registry_path.display(),
        registry.len()
    );
    println!(
        "{:<14} {} ({} chunks)",
        "chunk sink",
        config.store.chunks_dir.display(),
        sink.count()
    );

    Ok(())
}
