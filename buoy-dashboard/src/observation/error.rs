//! Observation parse errors.

/// Errors from parsing an observation file.
///
/// `Schema` aborts the parse of the whole file; `Value` concerns one row,
/// which is skipped while the rest of the file is still parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// The file does not have the expected layout or columns
    #[error("schema error: {message}")]
    Schema { message: String },

    /// A single row holds an unusable value
    #[error("row {row}: {message}")]
    Value { row: usize, message: String },
}

impl ParseError {
    pub(crate) fn schema(message: impl Into<String>) -> Self {
        ParseError::Schema {
            message: message.into(),
        }
    }

    pub(crate) fn value(row: usize, message: impl Into<String>) -> Self {
        ParseError::Value {
            row,
            message: message.into(),
        }
    }
}
