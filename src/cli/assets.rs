use anyhow::{Context, Result};
use emstar::assets::{AssetPlanner, ProcessRunner};
use log::info;
use std::collections::BTreeSet;
use std::path::PathBuf;

use super::Config;

/// Plan, optionally materialize, and print the path mapping as JSON
pub fn run(
    files: Vec<PathBuf>,
    output_dir: Option<PathBuf>,
    extension: Option<String>,
    force_convert: bool,
    dry_run: bool,
    config: Option<PathBuf>,
) -> Result<()> {
    let mut assets = Config::load(config.as_deref())?.assets;
    if let Some(dir) = output_dir {
        assets.output_dir = dir;
    }
    if let Some(extension) = extension {
        assets = assets.with_extension(extension);
    }
    if force_convert {
        assets = assets.with_force_convert(true);
    }

    let files: BTreeSet<PathBuf> = files.into_iter().collect();
    let plan = AssetPlanner::new(assets)
        .plan(&files)
        .context("Failed to plan binary assets")?;

    if !dry_run {
        let stats = plan
            .materialize(&ProcessRunner)
            .context("Failed to materialize binary assets")?;
        info!("{}", stats);
    }

    let json = serde_json::to_string_pretty(&plan).context("Failed to serialize plan")?;
    println!("{}", json);
    Ok(())
}
