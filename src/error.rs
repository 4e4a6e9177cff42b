//! Error types for the export decoders.
//!
//! Decoders return [`Result<T>`]; the loader and binaries wrap these in
//! `anyhow` with file context.

use thiserror::Error;

/// Result type alias for decode operations.
pub type Result<T> = std::result::Result<T, DecodeError>;

/// Fatal conditions raised while decoding an instrument export.
///
/// Recoverable problems (garbage cells, incomplete rows) never show up here;
/// they are coerced or dropped locally by each decoder.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The file is shorter than the fixed offsets of its layout.
    #[error("{format} export needs at least {needed} lines, found {found}")]
    TooShort {
        /// Layout name (`JV`, `MPPT`).
        format: &'static str,
        /// Minimum line count for the layout.
        needed: usize,
        /// Lines actually present.
        found: usize,
    },

    /// A format-defining row or column is absent.
    #[error("missing field '{field}' in {block} block")]
    MissingField {
        /// Block the field was looked up in.
        block: &'static str,
        /// Field or column name.
        field: String,
    },

    /// None of the separator/header combinations produced two columns.
    #[error("could not find two data columns with {header_lines} header lines")]
    NoColumns {
        /// Header line count supplied by the caller.
        header_lines: usize,
    },

    /// Too few numeric rows left to normalise and interpolate.
    #[error("EQE table has {found} numeric rows, need at least 3")]
    NotEnoughPoints {
        /// Rows that survived numeric coercion.
        found: usize,
    },

    /// Tokenizer failure.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl DecodeError {
    pub(crate) fn missing(block: &'static str, field: impl Into<String>) -> Self {
        DecodeError::MissingField {
            block,
            field: field.into(),
        }
    }
}
