use std::fmt;

use crate::model::SetKind;

/// Statistics from a completed conversion pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConversionStats {
    /// Kind of record set written
    pub kind: SetKind,
    /// Number of records written to the main block
    pub records_written: usize,
    /// Number of distinct optics groups
    pub optics_groups: usize,
    /// Number of data blocks in the file
    pub blocks_written: usize,
}

impl fmt::Display for ConversionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Wrote {} {} in {} optics groups ({} blocks)",
            self.records_written, self.kind, self.optics_groups, self.blocks_written
        )
    }
}
