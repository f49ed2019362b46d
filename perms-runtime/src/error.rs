//! Runtime error types

use thiserror::Error;

/// Errors raised while setting up the host runtime glue.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// The designated worker thread could not be started
    #[error("Failed to spawn context thread: {0}")]
    Spawn(#[from] std::io::Error),

    /// A task pump was driven from a thread other than the one it is bound to
    #[error("Task pump driven off its bound thread")]
    WrongThread,
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
