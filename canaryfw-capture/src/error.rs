use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("capture process has no stdout pipe")]
    MissingStdout,

    #[error("error reading capture output: {0}")]
    Stream(#[source] io::Error),

    #[error("failed to stop capture process: {0}")]
    Terminate(#[source] io::Error),
}
