use thiserror::Error;

/// Errors that can occur while segmenting an image into subwords.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum SegmentError {
    /// A collaborator broke a documented contract (unknown primary id,
    /// missing classification flag, degenerate group geometry, ...).
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to load image: {0}")]
    ImageLoad(String),

    #[error("failed to write image: {0}")]
    ImageWrite(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl SegmentError {
    pub(crate) fn invariant(msg: impl Into<String>) -> Self {
        SegmentError::InvariantViolation(msg.into())
    }
}
