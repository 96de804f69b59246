//! Scripted capture sessions for exercising supervisors without tcpdump.

use std::collections::VecDeque;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::time::Instant;

use crate::error::CaptureError;
use crate::session::{CaptureLauncher, CaptureSession};

/// How a scripted session behaves once its lines are consumed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScriptEnd {
    /// Output closes, as if the process exited.
    Exit,
    /// Blocks until terminated, like an idle capture.
    Hang,
    /// Reading output fails.
    StreamError,
}

/// Behaviour of one launch.
#[derive(Clone, Debug)]
pub enum Script {
    Run { lines: Vec<String>, end: ScriptEnd },
    SpawnFailure,
}

impl Script {
    pub fn exits<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::run(lines, ScriptEnd::Exit)
    }

    pub fn hangs<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::run(lines, ScriptEnd::Hang)
    }

    pub fn fails<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::run(lines, ScriptEnd::StreamError)
    }

    fn run<I, S>(lines: I, end: ScriptEnd) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Script::Run {
            lines: lines.into_iter().map(Into::into).collect(),
            end,
        }
    }
}

#[derive(Debug, Default)]
struct Counters {
    launches: Mutex<Vec<Instant>>,
    terminations: AtomicUsize,
}

/// Plays back one [`Script`] per launch. Once the queue is empty every
/// further launch hangs with no output.
#[derive(Clone, Debug, Default)]
pub struct ScriptedLauncher {
    scripts: Arc<Mutex<VecDeque<Script>>>,
    counters: Arc<Counters>,
}

impl ScriptedLauncher {
    pub fn new<I: IntoIterator<Item = Script>>(scripts: I) -> Self {
        Self {
            scripts: Arc::new(Mutex::new(scripts.into_iter().collect())),
            counters: Arc::default(),
        }
    }

    /// Launch attempts so far, including failed spawns.
    pub fn launches(&self) -> usize {
        self.counters.launches.lock().len()
    }

    /// Instants of each launch attempt on the tokio clock.
    pub fn launch_times(&self) -> Vec<Instant> {
        self.counters.launches.lock().clone()
    }

    pub fn terminations(&self) -> usize {
        self.counters.terminations.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CaptureLauncher for ScriptedLauncher {
    async fn launch(&self) -> Result<Box<dyn CaptureSession>, CaptureError> {
        self.counters.launches.lock().push(Instant::now());
        let script = self
            .scripts
            .lock()
            .pop_front()
            .unwrap_or(Script::Run {
                lines: Vec::new(),
                end: ScriptEnd::Hang,
            });

        match script {
            Script::SpawnFailure => Err(CaptureError::Spawn {
                program: "scripted".to_string(),
                source: io::Error::new(io::ErrorKind::NotFound, "scripted spawn failure"),
            }),
            Script::Run { lines, end } => Ok(Box::new(ScriptedSession {
                lines: lines.into(),
                end,
                counters: self.counters.clone(),
            })),
        }
    }
}

struct ScriptedSession {
    lines: VecDeque<String>,
    end: ScriptEnd,
    counters: Arc<Counters>,
}

#[async_trait]
impl CaptureSession for ScriptedSession {
    async fn next_line(&mut self) -> Result<Option<String>, CaptureError> {
        if let Some(line) = self.lines.pop_front() {
            return Ok(Some(line));
        }
        match self.end {
            ScriptEnd::Exit => Ok(None),
            ScriptEnd::Hang => std::future::pending().await,
            ScriptEnd::StreamError => Err(CaptureError::Stream(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "scripted stream failure",
            ))),
        }
    }

    async fn terminate(&mut self) -> Result<(), CaptureError> {
        self.counters.terminations.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
