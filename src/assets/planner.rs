use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::error::AssetError;
use super::plan::{AssetAction, AssetMap, AssetPlan};

/// Largest numeric suffix tried when resolving name collisions
pub const MAX_COLLISION_SUFFIX: u32 = 99_999;

/// Default external converter
pub const DEFAULT_CONVERTER: &str = "relion_image_handler";

/// Configuration for binary asset materialization
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    /// Directory receiving the `input` root
    pub output_dir: PathBuf,
    /// Target extension, without the dot
    pub extension: String,
    /// Convert every file regardless of its format
    pub force_convert: bool,
    /// Converter program for the convert action
    pub converter_program: String,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            extension: "mrcs".to_string(),
            force_convert: false,
            converter_program: DEFAULT_CONVERTER.to_string(),
        }
    }
}

impl AssetConfig {
    /// Config writing into `output_dir` with the default extension
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            ..Default::default()
        }
    }

    /// Override the target extension
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// Force conversion of every file
    pub fn with_force_convert(mut self, force: bool) -> Self {
        self.force_convert = force;
        self
    }
}

/// Decides how a batch of binary files becomes usable by the toolchain
#[derive(Debug, Clone)]
pub struct AssetPlanner {
    config: AssetConfig,
}

impl AssetPlanner {
    /// Create a planner
    pub fn new(config: AssetConfig) -> Self {
        Self { config }
    }

    /// Planner configuration
    pub fn config(&self) -> &AssetConfig {
        &self.config
    }

    /// Output root, `<output_dir>/input`
    pub fn root(&self) -> PathBuf {
        self.config.output_dir.join("input")
    }

    /// Plan materialization of `files`.
    ///
    /// Touches no filesystem state; the same inputs always give the same plan.
    pub fn plan(&self, files: &BTreeSet<PathBuf>) -> Result<AssetPlan, AssetError> {
        let root = self.root();
        let target_ext = self.config.extension.trim_start_matches('.');

        let Some(first) = files.iter().next() else {
            return Ok(AssetPlan {
                action: AssetAction::PassThrough,
                root,
                mapping: AssetMap::new(),
            });
        };
        let source_ext = extension(first);
        if files.iter().any(|f| extension(f) != source_ext) {
            log::warn!(
                "Mixed binary extensions, planning for '.{}' after {}",
                source_ext,
                first.display()
            );
        }

        let convert = AssetAction::Convert {
            program: self.config.converter_program.clone(),
        };
        let (action, mapping) = if self.config.force_convert {
            (convert, unique_names(files, &root, target_ext)?)
        } else if source_ext == target_ext {
            let source_root = common_root(files).ok_or(AssetError::NoCommonRoot)?;
            let mapping = relocate(files, &source_root, &root)?;
            (AssetAction::Relocate { source_root }, mapping)
        } else if source_ext == "mrc" && target_ext == "mrcs" {
            (AssetAction::Link, unique_names(files, &root, target_ext)?)
        } else if source_ext.ends_with("hdf") {
            (convert, unique_names(files, &root, target_ext)?)
        } else {
            (AssetAction::PassThrough, AssetMap::new())
        };

        log::info!(
            "Planned {} for {} binary files into {}",
            action,
            files.len(),
            root.display()
        );
        Ok(AssetPlan {
            action,
            root,
            mapping,
        })
    }
}

fn extension(path: &Path) -> &str {
    path.extension().and_then(|e| e.to_str()).unwrap_or_default()
}

/// Map every file to `root/<stem>.<ext>`, suffixing `_NNNNN` on collision
fn unique_names(
    files: &BTreeSet<PathBuf>,
    root: &Path,
    ext: &str,
) -> Result<AssetMap, AssetError> {
    let mut mapping = AssetMap::new();
    let mut used = HashSet::new();

    for file in files {
        let stem = file
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mut candidate = root.join(format!("{}.{}", stem, ext));
        let mut counter = 1;
        while used.contains(&candidate) {
            counter += 1;
            if counter > MAX_COLLISION_SUFFIX {
                return Err(AssetError::CollisionExhausted(file.clone()));
            }
            candidate = root.join(format!("{}_{:05}.{}", stem, counter, ext));
        }
        used.insert(candidate.clone());
        mapping.insert(file.clone(), candidate);
    }
    Ok(mapping)
}

/// Deepest directory that contains every file
fn common_root(files: &BTreeSet<PathBuf>) -> Option<PathBuf> {
    let mut parents = files.iter().map(|f| f.parent().unwrap_or(Path::new("")));
    let mut root: PathBuf = parents.next()?.to_path_buf();
    for parent in parents {
        while !parent.starts_with(&root) {
            if !root.pop() {
                return None;
            }
        }
    }
    if root.as_os_str().is_empty() {
        None
    } else {
        Some(root)
    }
}

/// Replace `source_root` with `root` in every path
fn relocate(
    files: &BTreeSet<PathBuf>,
    source_root: &Path,
    root: &Path,
) -> Result<AssetMap, AssetError> {
    let mut mapping = AssetMap::new();
    for file in files {
        let relative = file
            .strip_prefix(source_root)
            .map_err(|_| AssetError::NoCommonRoot)?;
        mapping.insert(file.clone(), root.join(relative));
    }
    Ok(mapping)
}
