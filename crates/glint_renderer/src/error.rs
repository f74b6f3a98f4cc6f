//! Errors raised when a render request cannot be honored.

use thiserror::Error;

/// Errors that can occur before a render starts.
#[derive(Error, Debug)]
pub enum RenderError {
    /// Pixel coordinates are normalized by `dimension - 1`, so both sides
    /// must be at least 2.
    #[error("image must be at least 2x2 pixels, got {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("samples per pixel must be at least 1")]
    ZeroSamples,

    #[error("output buffer holds {actual} bytes, expected {expected}")]
    BufferSizeMismatch { expected: usize, actual: usize },

    #[error("frame buffer is {actual_width}x{actual_height}, render needs {width}x{height}")]
    FrameSizeMismatch {
        width: u32,
        height: u32,
        actual_width: u32,
        actual_height: u32,
    },

    #[error("failed to build render thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("failed to spawn render thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Result type for render operations.
pub type RenderResult<T> = Result<T, RenderError>;
