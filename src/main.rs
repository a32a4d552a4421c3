//! # emstar
//!
//! Command-line tooling around STAR metadata files.
//!
//! ## Usage
//!
//! ```bash
//! # List blocks and columns
//! emstar info particles.star
//!
//! # Stream a particle set with projection alignment
//! emstar validate particles.star --align projection
//!
//! # Link referenced stacks into a job directory
//! emstar assets -o Job042 Extract/*.mrc
//! ```

use anyhow::Result;
use clap::Parser;

mod cli;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli::init_logging(cli.verbosity());
    cli::dispatch(cli)
}
