use thiserror::Error;

#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("tier backend failed: {0}")]
    Backend(String),
    #[error("tier unavailable: {0}")]
    Unavailable(String),
}
