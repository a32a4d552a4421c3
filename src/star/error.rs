/// Errors raised when a row or lookup disagrees with a table's frozen schema
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchemaError {
    /// A row introduced a label after the column set was frozen
    #[error("Unknown column '{label}' in block '{block}'")]
    UnknownColumn {
        /// Offending label
        label: String,
        /// Block whose schema rejected it
        block: String,
    },

    /// The same label was declared twice
    #[error("Duplicate column: {0}")]
    DuplicateColumn(String),

    /// A required label is absent
    #[error("Missing required column '{label}' in block '{block}'")]
    MissingColumn {
        /// Required label
        label: String,
        /// Block that lacks it
        block: String,
    },

    /// A value could not be interpreted as the requested kind
    #[error("Invalid value '{value}' for column '{label}': expected {expected}")]
    InvalidValue {
        /// Column label
        label: String,
        /// Raw text token
        value: String,
        /// Expected kind
        expected: &'static str,
    },

    /// A row referenced an optics group that the optics block does not define
    #[error("Unknown optics group id: {0}")]
    UnknownOpticsGroup(i64),
}

/// Errors that can occur while reading or writing STAR files
#[derive(Debug, thiserror::Error)]
pub enum StarError {
    /// I/O error during file operations
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The named data block does not exist in the source
    #[error("Block not found: data_{0}")]
    BlockNotFound(String),

    /// Structurally invalid text
    #[error("Malformed STAR input at line {line}: {message}")]
    Malformed {
        /// 1-based line number
        line: usize,
        /// What went wrong
        message: String,
    },

    /// Schema violation
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),
}
