//! # emstar - Streaming STAR Metadata for Cryo-EM Pipelines
//!
//! `emstar` reads and writes the block-structured STAR text tables used by
//! cryo-EM image processing packages, and transcodes particle, micrograph
//! and movie sets to and from them.
//!
//! ## Key Features
//!
//! - **Streaming Tables**: Large `loop_` blocks are written and parsed row by
//!   row with a frozen column schema; only small blocks are materialized.
//!
//! - **Rigid Transforms**: 4×4 alignment matrices are encoded as Euler
//!   angles and Ångström shifts for in-plane (2-D) and projection
//!   alignments, with the sign and inversion conventions downstream tools
//!   expect.
//!
//! - **Optics Groups**: Acquisition parameters are deduplicated into a
//!   separate `optics` block and resolved again on read.
//!
//! - **Binary Assets**: Referenced image stacks can be symlinked, relocated
//!   or converted into a job directory before the table is written.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use emstar::convert::{ReaderConfig, SetReader, SetWriter, WriterConfig};
//! use emstar::model::{Acquisition, Particle};
//! use emstar::star::Location;
//! use emstar::transform::{AlignType, Transform};
//!
//! let particles: Vec<Particle> = (1..=2)
//!     .map(|i| {
//!         Particle::new(
//!             Location::indexed(i, "Extract/stack.mrcs"),
//!             1.0,
//!             Acquisition::new(300.0, 2.7, 0.1),
//!         )
//!         .with_transform(Transform::in_plane(30.0, 2.0, 3.0))
//!     })
//!     .collect();
//!
//! let writer = SetWriter::new(WriterConfig::default().with_align(AlignType::TwoD))?;
//! writer.write_particles(&particles, "particles.star")?;
//!
//! let reader = SetReader::new(ReaderConfig::default().with_align(AlignType::TwoD))?;
//! for particle in reader.read_particles("particles.star")? {
//!     let particle = particle?;
//!     println!("{} in group {:?}", particle.location, particle.optics_group);
//! }
//! # Ok::<(), emstar::convert::ConvertError>(())
//! ```
//!
//! This produces:
//! ```text
//! # Generated by emstar ...
//! # version 30001
//! data_particles
//!
//! loop_
//! _rlnImageName
//! _rlnOpticsGroup
//! _rlnAnglePsi
//! _rlnOriginXAngst
//! _rlnOriginYAngst
//! 000001@Extract/stack.mrcs 1 -30.0 2.0 3.0
//! 000002@Extract/stack.mrcs 1 -30.0 2.0 3.0
//!
//! # version 30001
//! data_optics
//! ...
//! ```
//!
//! ## Architecture
//!
//! - [`star`]: STAR table model, streaming reader and writer
//! - [`transform`]: rigid transforms, Euler math and the alignment codec
//! - [`optics`]: optics group deduplication and lookup
//! - [`assets`]: binary asset planning and materialization
//! - [`model`]: record types exchanged with callers
//! - [`convert`]: set writer and reader tying the above together
//! - [`labels`]: block names and column labels

// Documentation lints - enforce complete documentation for publication
#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]

pub mod assets;
pub mod convert;
pub mod labels;
pub mod model;
pub mod optics;
pub mod star;
pub mod transform;

/// Re-export commonly used types for convenience
pub mod prelude {
    pub use crate::assets::{
        AssetAction, AssetConfig, AssetError, AssetMap, AssetPlan, AssetPlanner, AssetStats,
        JobRunner, ProcessRunner,
    };
    pub use crate::convert::{
        ConversionStats, ConvertError, ReaderConfig, SetReader, SetWriter, WriterConfig,
    };
    pub use crate::model::{Acquisition, Coordinate, CtfModel, Micrograph, Movie, Particle, SetKind};
    pub use crate::optics::{OpticsGroup, OpticsGroups, OpticsTable};
    pub use crate::star::{
        Location, Row, SchemaError, StarError, StarReader, StarWriter, Table, TableRow, Value,
    };
    pub use crate::transform::{AlignType, AlignmentCodec, Transform, TransformError};
}
