/// All errors that can occur while driving the benchmark.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Tensor-core failure (shape validation, conv execution).
    #[error(transparent)]
    Core(#[from] convbench_core::Error),

    /// The two sweeps do not describe the same grid.
    #[error("sweep mismatch: {0}")]
    SweepMismatch(String),

    /// A timing-line field failed to parse as a float.
    #[error("invalid timing value {field:?} at position {index}")]
    ParseTiming {
        index: usize,
        field: String,
        #[source]
        source: std::num::ParseFloatError,
    },

    /// Heat-map rendering failure.
    #[error("render error: {0}")]
    Render(String),

    /// Filesystem failure (creating the output directory, writing images).
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Convenience Result type used throughout the benchmark crate.
pub type Result<T> = std::result::Result<T, Error>;
