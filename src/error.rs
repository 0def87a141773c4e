use thiserror::Error;

/// Errors surfaced by the harness, the aggregation layer, and the chart
/// renderer.
#[derive(Debug, Error)]
pub enum BenchError {
    /// `run` was asked for zero iterations; the timed loop never starts.
    #[error("iteration count must be at least 1")]
    InvalidIterations,

    /// A measured primitive failed mid-run. Propagated without retry.
    #[error("crypto operation failed: {0}")]
    Crypto(String),

    #[error("chart rendering failed: {0}")]
    Chart(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, BenchError>;
