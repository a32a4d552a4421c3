use serde::Deserialize;

use crate::assets::AssetConfig;
use crate::star::DEFAULT_STAR_VERSION;
use crate::transform::AlignType;

/// Configuration for [`SetWriter`](super::SetWriter)
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct WriterConfig {
    /// Alignment written with each particle
    pub align: AlignType,

    /// Additional labels copied from `record.extra` when the first record
    /// carries them
    pub extra_labels: Vec<String>,

    /// Assign alternating half sets to particles that carry none
    pub fill_random_subset: bool,

    /// Provenance comment at the top of the file; a generated one when unset
    pub comment: Option<String>,

    /// Number written in each `# version` line
    pub star_version: u32,

    /// Main block name; the default for the record kind when unset
    pub block_name: Option<String>,

    /// Binary asset materialization
    pub assets: AssetConfig,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            align: AlignType::None,
            extra_labels: Vec::new(),
            fill_random_subset: false,
            comment: None,
            star_version: DEFAULT_STAR_VERSION,
            block_name: None,
            assets: AssetConfig::default(),
        }
    }
}

impl WriterConfig {
    /// Set the alignment mode
    pub fn with_align(mut self, align: AlignType) -> Self {
        self.align = align;
        self
    }

    /// Declare additional labels to copy
    pub fn with_extra_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra_labels = labels.into_iter().map(Into::into).collect();
        self
    }

    /// Enable or disable half-set filling
    pub fn with_fill_random_subset(mut self, fill: bool) -> Self {
        self.fill_random_subset = fill;
        self
    }

    /// Use a fixed provenance comment
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Write the main block under a different name
    pub fn with_block_name(mut self, name: impl Into<String>) -> Self {
        self.block_name = Some(name.into());
        self
    }

    /// Set the asset configuration
    pub fn with_assets(mut self, assets: AssetConfig) -> Self {
        self.assets = assets;
        self
    }
}

/// Configuration for [`SetReader`](super::SetReader)
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    /// Alignment expected in the main block
    pub align: AlignType,

    /// Additional labels copied onto `record.extra` when present
    pub extra_labels: Vec<String>,

    /// Main block name; the default for the record kind when unset
    pub block_name: Option<String>,
}

impl ReaderConfig {
    /// Set the alignment mode
    pub fn with_align(mut self, align: AlignType) -> Self {
        self.align = align;
        self
    }

    /// Declare additional labels to copy
    pub fn with_extra_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra_labels = labels.into_iter().map(Into::into).collect();
        self
    }

    /// Read a differently named main block
    pub fn with_block_name(mut self, name: impl Into<String>) -> Self {
        self.block_name = Some(name.into());
        self
    }
}
