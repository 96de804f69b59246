//! Capture sessions backed by a child process.

use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use async_trait::async_trait;
use nix::errno::Errno;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use tokio::io::{AsyncBufReadExt, BufReader, Lines};
use tokio::process::{Child, ChildStdout, Command};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::command::CaptureCommand;
use crate::error::CaptureError;
use crate::session::{CaptureLauncher, CaptureSession};

/// How long a child may take to exit after SIGTERM before it is killed.
pub const DEFAULT_TERMINATE_GRACE: Duration = Duration::from_secs(2);

/// Spawns `program args...` for every session.
#[derive(Clone, Debug)]
pub struct ProcessLauncher {
    program: String,
    args: Vec<String>,
    grace: Duration,
}

impl ProcessLauncher {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            grace: DEFAULT_TERMINATE_GRACE,
        }
    }

    pub fn terminate_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    /// Spawns the child with stdout and stderr piped. Must run inside a
    /// tokio runtime, which drives the stderr forwarding task.
    pub fn spawn(&self) -> Result<ProcessSession, CaptureError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| CaptureError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let stdout = child.stdout.take().ok_or(CaptureError::MissingStdout)?;

        // tcpdump reports "listening on ..." and drop counts on stderr.
        let diagnostics = child.stderr.take().map(|stderr| {
            let program = self.program.clone();
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    info!(%program, "{}", line);
                }
            })
        });

        debug!(program = %self.program, pid = ?child.id(), "capture process spawned");

        Ok(ProcessSession {
            child,
            stdout: BufReader::new(stdout).lines(),
            diagnostics,
            grace: self.grace,
            status: None,
        })
    }
}

impl From<&CaptureCommand> for ProcessLauncher {
    fn from(command: &CaptureCommand) -> Self {
        Self::new(command.program(), command.args())
    }
}

#[async_trait]
impl CaptureLauncher for ProcessLauncher {
    async fn launch(&self) -> Result<Box<dyn CaptureSession>, CaptureError> {
        Ok(Box::new(self.spawn()?))
    }
}

/// A running capture child and its line reader.
pub struct ProcessSession {
    child: Child,
    stdout: Lines<BufReader<ChildStdout>>,
    diagnostics: Option<JoinHandle<()>>,
    grace: Duration,
    status: Option<ExitStatus>,
}

impl ProcessSession {
    /// Exit status, once the child has been reaped.
    pub fn exit_status(&self) -> Option<ExitStatus> {
        self.status
    }

    async fn reap(&mut self) {
        if self.status.is_some() {
            return;
        }
        match self.child.wait().await {
            Ok(status) => {
                if status.success() {
                    debug!("capture process exited cleanly");
                } else {
                    warn!("capture process exited with {}", status);
                }
                self.status = Some(status);
            }
            Err(e) => warn!("failed to reap capture process: {}", e),
        }
        if let Some(handle) = self.diagnostics.take() {
            let _ = handle.await;
        }
    }

    /// SIGTERM, then wait up to the grace period. `Ok(None)` means the
    /// child is still running.
    async fn request_exit(&mut self) -> Result<Option<ExitStatus>, CaptureError> {
        let Some(id) = self.child.id() else {
            return self.child.try_wait().map_err(CaptureError::Terminate);
        };
        let pid = Pid::from_raw(id as i32);
        match kill(pid, Signal::SIGTERM) {
            Ok(()) | Err(Errno::ESRCH) => {}
            Err(errno) => return Err(CaptureError::Terminate(errno.into())),
        }
        match timeout(self.grace, self.child.wait()).await {
            Ok(status) => status.map(Some).map_err(CaptureError::Terminate),
            Err(_) => Ok(None),
        }
    }
}

#[async_trait]
impl CaptureSession for ProcessSession {
    async fn next_line(&mut self) -> Result<Option<String>, CaptureError> {
        match self.stdout.next_line().await {
            Ok(Some(line)) => Ok(Some(line)),
            Ok(None) => {
                self.reap().await;
                Ok(None)
            }
            Err(e) => Err(CaptureError::Stream(e)),
        }
    }

    async fn terminate(&mut self) -> Result<(), CaptureError> {
        if self.status.is_some() {
            return Ok(());
        }
        let status = match self.request_exit().await? {
            Some(status) => status,
            None => {
                warn!(grace = ?self.grace, "capture process ignored SIGTERM, killing it");
                // An already exited child is not an error here.
                if let Err(e) = self.child.kill().await {
                    if self.child.try_wait().map_err(CaptureError::Terminate)?.is_none() {
                        return Err(CaptureError::Terminate(e));
                    }
                }
                self.child.wait().await.map_err(CaptureError::Terminate)?
            }
        };
        debug!("capture process stopped with {}", status);
        self.status = Some(status);
        if let Some(handle) = self.diagnostics.take() {
            handle.abort();
        }
        Ok(())
    }
}
