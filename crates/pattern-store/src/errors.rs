use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("outcome log I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("outcome log writer is gone")]
    WriterGone,
}
