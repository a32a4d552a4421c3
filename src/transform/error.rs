use thiserror::Error;

use super::codec::AlignType;
use crate::star::SchemaError;

/// Errors that can occur while encoding or decoding alignments
#[derive(Debug, Error)]
pub enum TransformError {
    /// Requested alignment mode has no codec
    #[error("Unsupported alignment mode: {0}")]
    UnsupportedAlignment(AlignType),

    /// Matrix cannot be inverted
    #[error("Transform matrix is singular")]
    Singular,

    /// Pixel size is zero, negative or not finite
    #[error("Invalid pixel size: {0}")]
    InvalidPixelSize(f64),

    /// Alignment column could not be read
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),
}
