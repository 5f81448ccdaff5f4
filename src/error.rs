//! Error types for the agents and their components.

use thiserror::Error;

/// Main error type for agents, replay buffers and networks.
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Tensor error: {0}")]
    Tensor(#[from] candle_core::Error),

    #[error("Shape mismatch for {what}: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        what: &'static str,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("Cannot sample from an empty replay buffer")]
    EmptyBuffer,

    #[error("Cannot sample proportionally with a total priority of {0}")]
    DegeneratePriorities(f64),

    #[error("Invalid priority {0}: priorities must be finite and non-negative")]
    InvalidPriority(f64),

    #[error("Index {index} out of range for a buffer holding {size} transitions")]
    IndexOutOfRange {
        index: usize,
        size: usize,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for agent operations.
pub type Result<T> = std::result::Result<T, AgentError>;

/// Check that `tensor` has exactly the `expected` dimensions.
pub(crate) fn check_dims(
    what: &'static str,
    tensor: &candle_core::Tensor,
    expected: &[usize],
) -> Result<()> {
    if tensor.dims() != expected {
        return Err(AgentError::ShapeMismatch {
            what,
            expected: expected.to_vec(),
            actual: tensor.dims().to_vec(),
        });
    }
    Ok(())
}
