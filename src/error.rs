use thiserror::Error;

use crate::band::Branch;

/// Error types for the rovib-rs library.
#[derive(Error, Debug)]
pub enum RovibError {
    /// Invalid input data (mismatched lengths, empty arrays, bad windows).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Too few peak candidates survived detection to split into branches.
    #[error("Insufficient peaks: found {found}, need at least {needed}")]
    InsufficientPeaks { found: usize, needed: usize },

    /// A branch came out empty after splitting at the band origin.
    #[error("Branch {0} contains no peaks after splitting")]
    EmptyBranch(Branch),

    /// Fewer (J, wavenumber) pairs than model parameters.
    #[error("Underdetermined fit: {points} points for {params} parameters")]
    UnderdeterminedFit { points: usize, params: usize },

    /// The optimizer failed to converge on a branch model.
    #[error("Fit failed to converge with parameter order {parameter_order}: {message}")]
    FitConvergence {
        message: String,
        /// Internal parameter order attempted by the optimizer.
        parameter_order: &'static str,
    },

    /// Error indicating a mismatch in matrix dimensions.
    #[error("Matrix dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// Linear algebra error.
    #[error("Linear algebra error: {0}")]
    LinearAlgebraError(String),

    /// Non-finite values produced during computation.
    #[error("Numerical error: {0}")]
    NumericalError(String),

    /// A spectrum file row that could not be parsed.
    #[error("Ingest error at line {line}: {message}")]
    Ingest { line: usize, message: String },

    /// Plot rendering error.
    #[error("Plot error: {0}")]
    PlotError(String),

    /// I/O error wrapper.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// CSV parsing error wrapper.
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Generic error for cases that don't fit the other categories.
    #[error("Error: {0}")]
    Other(String),
}

/// Result type alias for rovib-rs operations.
pub type Result<T> = std::result::Result<T, RovibError>;

/// Extensions for converting from other error types.
impl From<String> for RovibError {
    fn from(s: String) -> Self {
        RovibError::Other(s)
    }
}

impl From<&str> for RovibError {
    fn from(s: &str) -> Self {
        RovibError::Other(s.to_string())
    }
}
