//! # Convert Module
//!
//! Transcoding between record sets and STAR files.
//!
//! ## Write Path
//!
//! ```text
//! records ──▶ first record ──▶ schema flags + prototype row
//!    │                                  │
//!    └──▶ Row ──▶ OpticsGroups ──▶ BlockWriter ──▶ data_<kind>
//!                      │
//!                      └──────────────────────────▶ data_optics
//! ```
//!
//! ## Design Principles
//!
//! 1. **One Pass**: Records are pulled one at a time and streamed; only the
//!    optics groups are buffered.
//!
//! 2. **Schema From The First Record**: Optional columns (CTF, coordinates,
//!    class, half set, extra labels) are chosen from the first record on
//!    write and from the block's columns on read, never per row.
//!
//! 3. **Pass-Owned State**: The optics groups and the asset mapping belong
//!    to one writer or reader and are never shared.

mod config;
mod error;
mod reader;
mod stats;
mod writer;

#[cfg(test)]
mod tests;

pub use config::{ReaderConfig, WriterConfig};
pub use error::ConvertError;
pub use reader::{MicrographIter, MovieIter, ParticleIter, SetReader};
pub use stats::ConversionStats;
pub use writer::SetWriter;
