//! Error types for the protocol layer.

/// Errors raised while interpreting protocol values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    /// A difficulty name that is not `easy`, `medium` or `hard`.
    #[error("unknown difficulty: {0}")]
    UnknownDifficulty(String),

    /// A rematch answer that is neither accept nor decline.
    #[error("unknown rematch decision: {0}")]
    UnknownDecision(String),
}
