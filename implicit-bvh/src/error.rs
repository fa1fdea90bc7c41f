use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("cannot build a hierarchy from an empty set of leaf volumes")]
    NoLeaves,

    #[error("tree layout mismatch: expected {expected} {what}, got {got}")]
    LayoutMismatch {
        what: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("serialization error: {0}")]
    SerializationError(Box<dyn std::error::Error + Send + Sync>),

    #[error("deserialization error: {0}")]
    DeserializationError(Box<dyn std::error::Error + Send + Sync>),

    #[error("failed to spawn the traversal thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

pub type Result<T> = std::result::Result<T, Error>;
