use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::process::{Child, Command};
use tracing::{info, warn};

use super::command::CaptureCommand;
use crate::error::SessionError;

/// How a capture process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Exited after the graceful stop signal.
    Graceful(ExitStatus),
    /// Ignored the stop signal past the grace period and was killed.
    Forced { grace: Duration },
    /// Had already exited before it was asked to stop.
    AlreadyExited(ExitStatus),
}

/// Exclusive ownership of a running capture process.
///
/// The child is killed if this value is dropped without `terminate`.
#[derive(Debug)]
pub struct CaptureProcess {
    child: Child,
}

impl CaptureProcess {
    pub fn spawn(command: &CaptureCommand) -> std::io::Result<Self> {
        let child = Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .spawn()?;

        info!("spawned capture process {:?}", child.id());
        Ok(Self { child })
    }

    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// Returns the exit status if the process has already exited.
    pub fn try_exit_status(&mut self) -> std::io::Result<Option<ExitStatus>> {
        self.child.try_wait()
    }

    /// Asks the process to stop and waits at most `grace` for it; escalates
    /// to a kill afterwards.
    pub async fn terminate(mut self, grace: Duration) -> Result<Termination, SessionError> {
        if let Some(status) = self.child.try_wait().map_err(SessionError::TerminationFailed)? {
            return Ok(Termination::AlreadyExited(status));
        }

        if let Some(pid) = self.child.id() {
            if let Err(e) = request_graceful_stop(pid) {
                warn!("failed to send SIGTERM to {}: {}", pid, e);
            }
        }

        match tokio::time::timeout(grace, self.child.wait()).await {
            Ok(Ok(status)) => {
                info!("capture process exited: {}", status);
                Ok(Termination::Graceful(status))
            }
            Ok(Err(e)) => Err(SessionError::TerminationFailed(e)),
            Err(_) => {
                warn!("{}, killing it", SessionError::TerminationTimeout(grace));
                self.child
                    .kill()
                    .await
                    .map_err(SessionError::TerminationFailed)?;
                Ok(Termination::Forced { grace })
            }
        }
    }
}

fn request_graceful_stop(pid: u32) -> std::io::Result<()> {
    let res = unsafe { libc::kill(pid as libc::pid_t, libc::SIGTERM) };
    if res == 0 {
        Ok(())
    } else {
        Err(std::io::Error::last_os_error())
    }
}
