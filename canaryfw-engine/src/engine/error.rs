use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Failed to install signal handler: {0}")]
    Signal(#[source] io::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
