use thiserror::Error;

/// Domain errors of the consolidation pipeline.
///
/// Carried through `anyhow::Result`; the run driver downcasts where a
/// scoping decision depends on the kind (skip the file, abort the run,
/// skip the sheet).
#[derive(Debug, Error)]
pub enum StatementError {
    /// A required source column is absent; scoped to one file.
    #[error("{bank} file missing column: {column}")]
    MissingColumn { bank: &'static str, column: String },

    /// Unknown or missing bank tag; scoped to one file.
    #[error("unsupported bank or missing bank name: '{tag}'")]
    UnsupportedBank { tag: String },

    /// Nothing parsed for the period; fatal, no publication happens.
    #[error("no data found for period {period}")]
    EmptyBatch { period: String },

    /// One named sheet failed to publish; the others are still written.
    #[error("failed writing sheet '{sheet}': {message}")]
    Publish { sheet: String, message: String },
}
