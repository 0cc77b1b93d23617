/// Error types for mesh construction, deformation stages and scene scripts
use thiserror::Error;

/// Errors raised by the mesh builders and the deformation pipeline.
///
/// All of these are construction-time errors: they are reported to the caller
/// immediately and never retried or papered over.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MeshError {
    /// A builder or stage was given an argument outside its domain.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// A vertex set does not have the length its topology expects.
    #[error("shape mismatch: expected {expected} vertices, found {found}")]
    ShapeMismatch { expected: usize, found: usize },

    /// A stage name outside the deformation catalogue.
    #[error("unknown stage '{0}'")]
    UnknownStage(String),

    /// A recovery stage ran before the snapshot it recovers to was recorded.
    #[error("stage '{0}' has no baseline snapshot to recover to")]
    MissingBaseline(&'static str),

    /// A scene script line could not be parsed.
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },
}

impl MeshError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidParameter(message.into())
    }
}

pub type MeshResult<T> = Result<T, MeshError>;
