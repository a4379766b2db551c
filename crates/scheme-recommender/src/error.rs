use sahayak_common::error::CommonError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Common(#[from] CommonError),

    #[error("config error: {0}")]
    Config(String),

    /// Malformed scheme table. Fatal at startup.
    #[error("data integrity error: {0}")]
    DataIntegrity(String),

    #[error("scheme catalogue has no entries")]
    EmptyCatalog,
}
