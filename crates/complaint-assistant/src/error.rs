use sahayak_common::error::CommonError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Common(#[from] CommonError),

    #[error("config error: {0}")]
    Config(String),

    /// Catalogue inconsistency detected at load time. Fatal at startup.
    #[error("data integrity error: {0}")]
    DataIntegrity(String),

    #[error("catalogue has no entries")]
    EmptyCatalog,

    #[error("transcription failed: {0}")]
    Transcription(String),

    #[error("render failed for template {template}: {message}")]
    Render { template: String, message: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
