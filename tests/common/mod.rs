// Shared fixtures for the integration tests

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::path::Path;
use std::time::Duration;

use tray_recorder::config::{AudioConfig, CaptureConfig};
use tray_recorder::{CaptureBackend, CaptureCommand, CaptureProcess, SessionError, SessionOptions, WindowGeometry};

/// Stands in for the X server and ffmpeg. Spawned "capture" processes are
/// plain `sleep`s so stop/terminate behave like a real child.
pub struct FakeBackend {
    pub window: Option<WindowGeometry>,
    pub ignore_term: bool,
    pub fail_spawn: bool,
    pub exits_at_once: bool,
    pub spawned: RefCell<Vec<CaptureCommand>>,
    pub authorizations: Cell<u32>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self {
            window: None,
            ignore_term: false,
            fail_spawn: false,
            exits_at_once: false,
            spawned: RefCell::new(Vec::new()),
            authorizations: Cell::new(0),
        }
    }

    pub fn with_window(mut self, x: i32, y: i32, width: u32, height: u32) -> Self {
        self.window = Some(WindowGeometry { x, y, width, height });
        self
    }

    pub fn ignoring_term(mut self) -> Self {
        self.ignore_term = true;
        self
    }

    pub fn failing_spawn(mut self) -> Self {
        self.fail_spawn = true;
        self
    }

    /// The capture process dies right after launch.
    pub fn exiting(mut self) -> Self {
        self.exits_at_once = true;
        self
    }

    pub fn spawn_count(&self) -> usize {
        self.spawned.borrow().len()
    }

    pub fn last_command(&self) -> CaptureCommand {
        self.spawned.borrow().last().cloned().expect("nothing spawned")
    }
}

impl CaptureBackend for FakeBackend {
    async fn display_size(&self) -> Result<(u32, u32), SessionError> {
        Ok((2560, 1440))
    }

    async fn active_window(&self) -> Result<WindowGeometry, SessionError> {
        self.window.ok_or(SessionError::NoActiveWindow)
    }

    async fn authorize_display(&self) -> anyhow::Result<()> {
        self.authorizations.set(self.authorizations.get() + 1);
        anyhow::bail!("xhost not available in tests")
    }

    fn spawn(&self, command: &CaptureCommand) -> std::io::Result<CaptureProcess> {
        if self.fail_spawn {
            return CaptureProcess::spawn(&CaptureCommand::new("/nonexistent/ffmpeg"));
        }

        self.spawned.borrow_mut().push(command.clone());
        let script = if self.exits_at_once {
            "exit 1"
        } else if self.ignore_term {
            "trap '' TERM; exec sleep 30"
        } else {
            "exec sleep 30"
        };
        CaptureProcess::spawn(&CaptureCommand::new("sh").arg("-c").arg(script))
    }
}

pub fn options(output_dir: &Path) -> SessionOptions {
    SessionOptions {
        output_dir: output_dir.to_path_buf(),
        container: "mp4".to_string(),
        capture: CaptureConfig::default(),
        audio: AudioConfig::default(),
        stop_timeout: Duration::from_millis(500),
        authorize_display: true,
    }
}

/// True for names like `20240309070502_recording.mp4`.
pub fn is_recording_file_name(name: &str) -> bool {
    match name.strip_suffix("_recording.mp4") {
        Some(stamp) => stamp.len() == 14 && stamp.chars().all(|c| c.is_ascii_digit()),
        None => false,
    }
}
