use thiserror::Error;

#[derive(Debug, Error)]
pub enum EgoviewError {
    #[error("cannot parse language model output {output:?}: {reason}")]
    Parse { output: String, reason: String },
    #[error("central perspective {label:?} is not one of the scene labels {available:?}")]
    NotFound { label: String, available: Vec<String> },
    #[error("segmentation mask has no foreground pixels")]
    EmptyMask,
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),
    #[error("unsupported: {0}")]
    Unsupported(String),
    #[error("invalid configuration: {0}")]
    Config(String),
    // collaborator failures travel through untouched
    #[error(transparent)]
    External(#[from] anyhow::Error),
}

impl EgoviewError {
    pub fn parse(output: impl Into<String>, reason: impl Into<String>) -> Self {
        EgoviewError::Parse {
            output: output.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T, E = EgoviewError> = std::result::Result<T, E>;
