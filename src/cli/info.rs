use anyhow::{Context, Result};
use emstar::star::StarReader;
use std::path::PathBuf;

/// Display the blocks of a STAR file
pub fn run(file: PathBuf) -> Result<()> {
    if !file.exists() {
        anyhow::bail!("File does not exist: {}", file.display());
    }

    let names = StarReader::open(&file)
        .context("Failed to open file")?
        .block_names()
        .context("Failed to scan blocks")?;

    println!("STAR File Information");
    println!("=====================");
    println!("File: {}", file.display());
    println!("Blocks: {}", names.len());
    println!();

    for name in &names {
        let mut block = StarReader::open(&file)?
            .read_block(name)
            .with_context(|| format!("Failed to read block data_{}", name))?;

        let columns: Vec<String> = block
            .columns()
            .iter()
            .map(|column| format!("{} ({:?})", column.label, column.kind))
            .collect();

        let mut rows = 0usize;
        while block
            .next_row()
            .with_context(|| format!("Failed to parse row {} of data_{}", rows + 1, name))?
            .is_some()
        {
            rows += 1;
        }

        println!("data_{}: {} rows", name, rows);
        for (i, column) in columns.iter().enumerate() {
            println!("  {:3}. {}", i + 1, column);
        }
        println!();
    }

    Ok(())
}
