//! # Model Module
//!
//! Plain domain records exchanged with the transcoder: movies, micrographs
//! and particles together with their acquisition and CTF parameters.
//!
//! Records are built with `new` plus `with_*` methods. Optional fields stay
//! `None` until set; the writer decides from the first record of a set which
//! optional columns the whole set carries.

mod records;


pub use records::{Acquisition, Coordinate, CtfModel, Micrograph, Movie, Particle, SetKind};
