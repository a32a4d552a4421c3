use std::process::Command;

use super::error::AssetError;

/// Boundary to the external image converter
pub trait JobRunner {
    /// Run `program` with `args` and wait for it to finish
    fn run(&self, program: &str, args: &[String]) -> Result<(), AssetError>;
}

/// [`JobRunner`] that spawns a local process
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl JobRunner for ProcessRunner {
    fn run(&self, program: &str, args: &[String]) -> Result<(), AssetError> {
        log::debug!("Running {} {}", program, args.join(" "));
        let status = Command::new(program)
            .args(args)
            .status()
            .map_err(|e| AssetError::JobFailed {
                program: program.to_string(),
                message: e.to_string(),
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(AssetError::JobFailed {
                program: program.to_string(),
                message: status.to_string(),
            })
        }
    }
}
