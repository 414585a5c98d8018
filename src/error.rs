use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Failures of the recording session lifecycle.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no active window to record")]
    NoActiveWindow,

    #[error("failed to launch capture process: {0}")]
    SpawnFailed(#[source] io::Error),

    #[error("not recording")]
    NotRecording,

    #[error("already recording")]
    AlreadyRecording,

    #[error("capture process did not exit within {0:?}")]
    TerminationTimeout(Duration),

    #[error("failed to terminate capture process: {0}")]
    TerminationFailed(#[source] io::Error),

    #[error("cannot query X display: {0}")]
    Display(String),

    #[error("cannot create output directory {0:?}: {1}")]
    OutputDir(PathBuf, #[source] io::Error),

    #[error("no unused output file name near {0:?}")]
    OutputExists(PathBuf),
}
