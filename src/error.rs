use thiserror::Error;

/// Crate-wide error type.
///
/// Parse, registry, and structure errors are raised before any stage runs.
/// The remaining variants carry the 1-based step number and name of the
/// offending stage plus the underlying cause.
#[derive(Error, Debug)]
pub enum Error {
    #[error("parse error: {0}")]
    Parse(String),

    #[error("unknown stage '{0}'")]
    UnknownStage(String),

    #[error("invalid pipeline structure: {0}")]
    Structure(String),

    #[error("stage {step} ('{stage}'): expects {expected} input, got {actual}")]
    State {
        step: usize,
        stage: String,
        expected: String,
        actual: String,
    },

    #[error("stage {step} ('{stage}'): {message}")]
    Param {
        step: usize,
        stage: String,
        message: String,
    },

    #[error("stage {step} ('{stage}'): {source}")]
    Capability {
        step: usize,
        stage: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
