use crate::assets::AssetError;
use crate::model::SetKind;
use crate::star::{SchemaError, StarError};
use crate::transform::TransformError;

/// Errors that abort a conversion pass
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    /// Error from the STAR reader or writer
    #[error("STAR error: {0}")]
    StarError(#[from] StarError),

    /// Row disagrees with the block schema
    #[error("Schema error: {0}")]
    SchemaError(#[from] SchemaError),

    /// Alignment could not be encoded or decoded
    #[error("Transform error: {0}")]
    TransformError(#[from] TransformError),

    /// Binary assets could not be prepared
    #[error("Asset error: {0}")]
    AssetError(#[from] AssetError),

    /// Record set was empty, so no schema could be derived
    #[error("No {0} to write")]
    EmptyInput(SetKind),
}
