//! # Optics Module
//!
//! Deduplication of acquisition parameters into numbered optics groups.
//!
//! On write, [`OpticsGroups`] maps every record to a group id and buffers
//! one [`OpticsGroup`] per distinct acquisition; the buffered groups become
//! the `optics` block after the main block is streamed. On read,
//! [`OpticsTable`] indexes the parsed `optics` block by id.

mod group;
mod resolver;


pub use group::{default_group_name, GroupSnapshot, OpticsGroup};
pub use resolver::{OpticsGroups, OpticsTable};
