use thiserror::Error;

/// Failures that abort the whole scan
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Benchmark data unavailable: {0}")]
    BenchmarkUnavailable(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Per-ticker failures. A skip drops the ticker from the report and the
/// scan continues with the next one; it never aborts the batch.
#[derive(Error, Debug)]
pub enum SkipReason {
    #[error("fetch failed: {0}")]
    Fetch(String),

    #[error("no usable price data")]
    NoData,

    #[error("insufficient history: {got} points, need {need}")]
    InsufficientHistory { got: usize, need: usize },

    #[error("momentum oscillator undefined after warm-up")]
    MomentumUnavailable,

    #[error("no overlapping return dates with benchmark")]
    BetaUnavailable,
}
