//! # Assets Module
//!
//! Planning and materialization of the binary files a STAR file refers to.
//!
//! ## Design Principles
//!
//! 1. **Pure Planning**: [`AssetPlanner::plan`] looks only at the sorted set of
//!    distinct paths and the configuration, so a plan can be computed before
//!    a write pass and reused for every record.
//!
//! 2. **Convergent Materialization**: [`AssetPlan::materialize`] skips link
//!    destinations that already exist. Re-running over the same inputs
//!    yields the same mapping and no new filesystem entries.
//!
//! 3. **Narrow Converter Boundary**: Conversions go through the
//!    [`JobRunner`] trait, with [`ProcessRunner`] spawning the real program.
//!
//! | Source | Target | Action |
//! |--------|--------|--------|
//! | any (forced) | any | convert |
//! | `ext` | `ext` | relocate the common root |
//! | `mrc` | `mrcs` | link each file |
//! | `*hdf` | any | convert |
//! | other | other | pass through |

mod error;
mod plan;
mod planner;
mod runner;


pub use error::AssetError;
pub use plan::{AssetAction, AssetMap, AssetPlan, AssetStats};
pub use planner::{AssetConfig, AssetPlanner, DEFAULT_CONVERTER, MAX_COLLISION_SUFFIX};
pub use runner::{JobRunner, ProcessRunner};
