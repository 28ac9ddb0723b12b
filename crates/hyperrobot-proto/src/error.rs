//! Error types shared across crate boundaries.

/// Errors crossing the puzzle-source and outbox seams.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The puzzle source could not produce a puzzle.
    #[error("puzzle generation failed: {0}")]
    Puzzle(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// An outbound message could not be delivered.
    #[error("delivery failed: {0}")]
    Delivery(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Wraps any error raised while producing a puzzle.
    pub fn puzzle<E>(source: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::Puzzle(source.into())
    }
}

/// Result alias using the shared [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
