mod error;
mod pipeline;
mod shutdown;
mod supervisor;

pub use self::{
    error::EngineError,
    pipeline::{LineOutcome, ProbePipeline, UNRECOGNIZED},
    shutdown::{listen_for_signals, ShutdownController, ShutdownState},
    supervisor::{CaptureSupervisor, SessionEnd, DEFAULT_RESTART_BACKOFF},
};
