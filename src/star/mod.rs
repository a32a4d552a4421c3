//! # STAR Table Module
//!
//! Reading and writing of block-structured STAR metadata files.
//!
//! ## Layout
//!
//! ```text
//! # provenance comment
//! # version 30001
//! data_particles
//!
//! loop_
//! _rlnImageName
//! _rlnOpticsGroup
//! 000001@Extract/particles.mrcs 1
//! ```
//!
//! ## Design Principles
//!
//! 1. **Frozen Schemas**: A block's column set is fixed once its header is
//!    written or parsed. Rows with unknown labels are rejected, rows missing
//!    labels get per-kind defaults.
//!
//! 2. **Streaming**: [`BlockWriter`] emits rows as they arrive and
//!    [`BlockReader`] parses them lazily, so the large particle block is
//!    never held in memory. [`StarReader::read_table`] materializes small
//!    blocks such as `optics` for random access.
//!
//! 3. **Lossless Text**: Values are kept as their raw tokens on the read
//!    side and floats are written in shortest round-trip form.

mod error;
mod location;
mod reader;
mod table;
mod writer;

#[cfg(test)]
mod tests;

pub use error::{SchemaError, StarError};
pub use location::{location_to_star, star_to_location, Location};
pub use reader::{BlockReader, StarReader};
pub use table::{Column, ColumnSet, Row, Table, TableRow, Value, ValueKind};
pub use writer::{BlockWriter, StarWriter, StarWriterStats, DEFAULT_STAR_VERSION};
