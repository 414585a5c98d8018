use anyhow::Result;
use chrono::{DateTime, Duration as ChronoDuration, Local};
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::capture::{
    AudioInput, CaptureBackend, CaptureProcess, FfmpegCommandBuilder, Termination,
};
use crate::config::{AudioConfig, CaptureConfig, Config};
use crate::error::SessionError;
use crate::settings::{CaptureArea, Framerate, Settings};

/// Everything a session needs besides the user's settings.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub output_dir: PathBuf,
    pub container: String,
    pub capture: CaptureConfig,
    pub audio: AudioConfig,
    pub stop_timeout: Duration,
    pub authorize_display: bool,
}

impl SessionOptions {
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            output_dir: config.resolved_output_dir()?,
            container: config.container.clone(),
            capture: config.capture.clone(),
            audio: config.audio.clone(),
            stop_timeout: Duration::from_millis(config.session.stop_timeout_ms),
            authorize_display: config.session.authorize_display,
        })
    }
}

/// Parameters a session was started with.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionInfo {
    pub output_path: PathBuf,
    pub dimensions: String,
    pub area: CaptureArea,
    pub framerate: Framerate,
    pub with_sound: bool,
    pub started_at: DateTime<Local>,
}

/// Result of a completed `stop`.
#[derive(Debug)]
pub struct Stopped {
    pub info: SessionInfo,
    pub termination: Termination,
}

enum SessionState {
    Idle,
    Recording {
        info: SessionInfo,
        process: CaptureProcess,
    },
}

/// Idle/Recording state machine around one capture process at a time.
pub struct RecordingSession<B> {
    backend: B,
    options: SessionOptions,
    state: SessionState,
}

impl<B: CaptureBackend> RecordingSession<B> {
    pub fn new(backend: B, options: SessionOptions) -> Self {
        Self {
            backend,
            options,
            state: SessionState::Idle,
        }
    }

    pub fn is_recording(&self) -> bool {
        matches!(self.state, SessionState::Recording { .. })
    }

    /// The active session's parameters, if recording.
    pub fn current(&self) -> Option<&SessionInfo> {
        match &self.state {
            SessionState::Recording { info, .. } => Some(info),
            SessionState::Idle => None,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub async fn start(&mut self, settings: &Settings) -> Result<SessionInfo, SessionError> {
        if self.is_recording() {
            return Err(SessionError::AlreadyRecording);
        }

        let (region, dimensions) = match settings.area {
            CaptureArea::FullScreen => {
                let dimensions = match self.backend.display_size().await {
                    Ok((w, h)) => format!("{}x{}", w, h),
                    Err(e) => {
                        warn!(
                            "display size unknown ({}), assuming {}",
                            e, self.options.capture.fallback_resolution
                        );
                        self.options.capture.fallback_resolution.clone()
                    }
                };
                (None, dimensions)
            }
            CaptureArea::ActiveWindow => {
                let geometry = self.backend.active_window().await?;
                (Some(geometry), geometry.dimensions())
            }
        };

        let started_at = Local::now();

        std::fs::create_dir_all(&self.options.output_dir)
            .map_err(|e| SessionError::OutputDir(self.options.output_dir.clone(), e))?;

        let output_path =
            unused_output_path(&self.options.output_dir, started_at, &self.options.container)?;

        if self.options.authorize_display {
            if let Err(e) = self.backend.authorize_display().await {
                warn!("display authorization failed: {:#}", e);
            }
        }

        let audio = settings.with_sound.then(|| AudioInput {
            backend: self.options.audio.backend.clone(),
            device: self.options.audio.device.clone(),
            channels: self.options.audio.channels,
            codec: self.options.audio.codec.clone(),
        });

        let command = FfmpegCommandBuilder::new(&output_path)
            .with_ffmpeg_path(self.options.capture.ffmpeg_path.clone())
            .with_display(self.options.capture.display.clone())
            .with_framerate(settings.framerate.fps())
            .with_region(region)
            .with_audio(audio)
            .with_video_codec(self.options.capture.video_codec.clone())
            .with_preset(self.options.capture.preset.clone())
            .with_loglevel(self.options.capture.loglevel.clone())
            .build();

        info!("starting capture: {}", command);
        let process = self
            .backend
            .spawn(&command)
            .map_err(SessionError::SpawnFailed)?;

        let info = SessionInfo {
            output_path,
            dimensions,
            area: settings.area,
            framerate: settings.framerate,
            with_sound: settings.with_sound,
            started_at,
        };

        self.state = SessionState::Recording {
            info: info.clone(),
            process,
        };
        Ok(info)
    }

    /// Stops the active recording. The session is Idle afterwards whatever
    /// the outcome of the termination.
    pub async fn stop(&mut self) -> Result<Stopped, SessionError> {
        let (info, process) = match std::mem::replace(&mut self.state, SessionState::Idle) {
            SessionState::Idle => return Err(SessionError::NotRecording),
            SessionState::Recording { info, process } => (info, process),
        };

        info!("stopping recording {:?}", info.output_path);
        let termination = process.terminate(self.options.stop_timeout).await?;

        Ok(Stopped { info, termination })
    }

    /// Detects a capture process that exited on its own; the session goes
    /// back to Idle and the ended session is returned.
    pub fn poll_exit(&mut self) -> Option<(SessionInfo, ExitStatus)> {
        let status = match &mut self.state {
            SessionState::Recording { process, .. } => match process.try_exit_status() {
                Ok(Some(status)) => status,
                Ok(None) => return None,
                Err(e) => {
                    warn!("failed to poll capture process: {}", e);
                    return None;
                }
            },
            SessionState::Idle => return None,
        };

        match std::mem::replace(&mut self.state, SessionState::Idle) {
            SessionState::Recording { info, .. } => {
                warn!("capture process exited unexpectedly: {}", status);
                Some((info, status))
            }
            SessionState::Idle => None,
        }
    }
}

/// `<dir>/<YYYYMMDDHHMMSS>_recording.<ext>`
pub fn output_path(dir: &Path, at: DateTime<Local>, container: &str) -> PathBuf {
    dir.join(format!("{}_recording.{}", at.format("%Y%m%d%H%M%S"), container))
}

const NAME_ATTEMPTS: i64 = 60;

/// Names only resolve to the second, so a session started in the same second
/// as a previous one takes the next free second instead of reusing its file.
fn unused_output_path(dir: &Path, at: DateTime<Local>, container: &str) -> Result<PathBuf, SessionError> {
    for offset in 0..NAME_ATTEMPTS {
        let path = output_path(dir, at + ChronoDuration::seconds(offset), container);
        if !path.exists() {
            return Ok(path);
        }
        debug!("{:?} already exists", path);
    }
    Err(SessionError::OutputExists(output_path(dir, at, container)))
}
