use hecs::Entity;
use thiserror::Error;

/// Errors that mean the engine was used wrong. Gaps in the player's choices
/// are never errors, they end up in a `ValidationReport`.
#[derive(Debug, Error)]
pub enum ProgressionError {
    #[error("Entity {0:?} does not carry a character")]
    MissingCharacter(Entity),

    #[error("Refusing to commit invalid character: {0}")]
    InvalidCommittedState(String),

    #[error("Invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("Value at '{path}' does not fit the staged data: {source}")]
    TypeMismatch {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ProgressionError {
    pub(crate) fn invalid_path(path: &str, reason: impl Into<String>) -> Self {
        ProgressionError::InvalidPath {
            path: path.to_string(),
            reason: reason.into(),
        }
    }
}
