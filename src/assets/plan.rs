use std::collections::btree_map;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::error::AssetError;
use super::runner::JobRunner;

/// Mapping from original binary paths to materialized paths
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetMap(BTreeMap<PathBuf, PathBuf>);

impl AssetMap {
    /// Create an empty mapping
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a mapping
    pub fn insert(&mut self, source: PathBuf, target: PathBuf) {
        self.0.insert(source, target);
    }

    /// Materialized path of `source`, if mapped
    pub fn get(&self, source: &Path) -> Option<&Path> {
        self.0.get(source).map(PathBuf::as_path)
    }

    /// Materialized path of `path`, or `path` itself when unmapped
    pub fn map_path<'a>(&'a self, path: &'a Path) -> &'a Path {
        self.get(path).unwrap_or(path)
    }

    /// Iterate over `(source, target)` pairs in source order
    pub fn iter(&self) -> btree_map::Iter<'_, PathBuf, PathBuf> {
        self.0.iter()
    }

    /// Number of mapped files
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether nothing is mapped
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Materialization chosen for a batch of binary files
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum AssetAction {
    /// Files are usable as they are
    PassThrough,
    /// One directory link from the output root to the common source root
    Relocate {
        /// Deepest directory containing every source file
        source_root: PathBuf,
    },
    /// One file link per source under a stack extension
    Link,
    /// External conversion of every file
    Convert {
        /// Converter program
        program: String,
    },
}

impl fmt::Display for AssetAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetAction::PassThrough => write!(f, "pass-through"),
            AssetAction::Relocate { source_root } => {
                write!(f, "relocate {}", source_root.display())
            }
            AssetAction::Link => write!(f, "link"),
            AssetAction::Convert { program } => write!(f, "convert with {}", program),
        }
    }
}

/// Statistics from materializing a plan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssetStats {
    /// Links created by this run
    pub links_created: usize,
    /// Links skipped because the destination already existed
    pub links_skipped: usize,
    /// Files converted
    pub files_converted: usize,
}

impl fmt::Display for AssetStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} links created, {} already present, {} files converted",
            self.links_created, self.links_skipped, self.files_converted
        )
    }
}

/// Result of planning: what to do, where, and the resulting path mapping
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetPlan {
    /// Materialization action
    #[serde(flatten)]
    pub action: AssetAction,
    /// Output root, `<output_dir>/input`
    pub root: PathBuf,
    /// Original → materialized paths; empty for pass-through
    pub mapping: AssetMap,
}

impl AssetPlan {
    /// Perform the planned links or conversions.
    ///
    /// Existing link destinations are left alone, so running a plan twice
    /// creates nothing new.
    pub fn materialize(&self, runner: &dyn JobRunner) -> Result<AssetStats, AssetError> {
        let mut stats = AssetStats::default();
        match &self.action {
            AssetAction::PassThrough => {}
            AssetAction::Relocate { source_root } => {
                if let Some(parent) = self.root.parent() {
                    fs::create_dir_all(parent)?;
                }
                if exists_no_follow(&self.root) {
                    stats.links_skipped += 1;
                } else {
                    let target = fs::canonicalize(source_root)?;
                    log::debug!("{} -> {}", self.root.display(), target.display());
                    symlink_dir(&target, &self.root)?;
                    stats.links_created += 1;
                }
            }
            AssetAction::Link => {
                fs::create_dir_all(&self.root)?;
                for (source, target) in self.mapping.iter() {
                    if exists_no_follow(target) {
                        stats.links_skipped += 1;
                        continue;
                    }
                    let source = fs::canonicalize(source)?;
                    log::debug!("{} -> {}", target.display(), source.display());
                    symlink_file(&source, target)?;
                    stats.links_created += 1;
                }
            }
            AssetAction::Convert { program } => {
                fs::create_dir_all(&self.root)?;
                for (source, target) in self.mapping.iter() {
                    let args = vec![
                        "--i".to_string(),
                        source.display().to_string(),
                        "--o".to_string(),
                        target.display().to_string(),
                    ];
                    log::debug!("Converting {} -> {}", source.display(), target.display());
                    runner.run(program, &args)?;
                    stats.files_converted += 1;
                }
            }
        }
        log::info!("Assets ({}): {}", self.action, stats);
        Ok(stats)
    }
}

fn exists_no_follow(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

#[cfg(unix)]
fn symlink_file(original: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(original, link)
}

#[cfg(unix)]
fn symlink_dir(original: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(original, link)
}

#[cfg(windows)]
fn symlink_file(original: &Path, link: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_file(original, link)
}

#[cfg(windows)]
fn symlink_dir(original: &Path, link: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_dir(original, link)
}
