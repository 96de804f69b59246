pub mod engine;
pub mod runtime;

// Entry points for frontends.
pub use engine::{EngineError, ShutdownController};
pub use runtime::{build_pipeline, resolve_host, run_daemon, run_replay};
