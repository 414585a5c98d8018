use chrono::Local;
use std::process::ExitStatus;
use tracing::{error, info};

use crate::capture::{CaptureBackend, Termination};
use crate::config::SettingsStore;
use crate::error::SessionError;
use crate::session::{RecordingSession, SessionInfo, Stopped};
use crate::settings::{CaptureArea, Framerate, Settings};

pub const APP_NAME: &str = "Tray Screen Recorder";

/// Everything a user can ask the tray to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    SelectArea(CaptureArea),
    SelectFramerate(Framerate),
    ToggleSound,
    Start,
    Stop,
    /// Start when idle, stop when recording.
    Trigger,
    ShowInfo,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub body: String,
}

/// What the GUI should show in response to an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Done,
    Notify(Notification),
    Failed(String),
    About(String),
    Quit,
}

/// Snapshot the GUI renders: tooltip, icon state and menu checkmarks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrayView {
    pub tooltip: String,
    pub recording: bool,
    pub settings: Settings,
}

pub struct TrayController<B> {
    settings: Settings,
    store: SettingsStore,
    session: RecordingSession<B>,
}

impl<B: CaptureBackend> TrayController<B> {
    pub fn new(store: SettingsStore, session: RecordingSession<B>) -> Self {
        let settings = Settings::load(&store);
        info!("loaded settings from {:?}: {:?}", store.path(), settings);

        Self {
            settings,
            store,
            session,
        }
    }

    pub fn settings(&self) -> Settings {
        self.settings
    }

    pub fn is_recording(&self) -> bool {
        self.session.is_recording()
    }

    pub fn session(&self) -> &RecordingSession<B> {
        &self.session
    }

    pub fn view(&self) -> TrayView {
        TrayView {
            tooltip: self.status_text(),
            recording: self.is_recording(),
            settings: self.settings,
        }
    }

    pub fn status_text(&self) -> String {
        let mut text = format!(
            "{}\nArea: {}\nFramerate: {}\nWith Sound: {}",
            APP_NAME,
            self.settings.area,
            self.settings.framerate,
            yes_no(self.settings.with_sound)
        );

        if let Some(info) = self.session.current() {
            let elapsed = (Local::now() - info.started_at).num_seconds().max(0);
            let file = info
                .output_path
                .file_name()
                .map(|f| f.to_string_lossy().to_string())
                .unwrap_or_default();
            text.push_str(&format!(
                "\nRecording: {} ({:02}:{:02})",
                file,
                elapsed / 60,
                elapsed % 60
            ));
        }

        text
    }

    pub async fn dispatch(&mut self, action: Action) -> Outcome {
        info!("action: {:?}", action);

        match action {
            Action::SelectArea(area) => self.update(|s| s.area = area),
            Action::SelectFramerate(framerate) => self.update(|s| s.framerate = framerate),
            Action::ToggleSound => self.update(|s| s.with_sound = !s.with_sound),
            Action::Start => self.start().await,
            Action::Stop => self.stop().await,
            Action::Trigger => {
                if self.session.is_recording() {
                    self.stop().await
                } else {
                    self.start().await
                }
            }
            Action::ShowInfo => Outcome::About(self.about_text()),
            Action::Quit => {
                self.shutdown().await;
                Outcome::Quit
            }
        }
    }

    /// Periodic housekeeping: notices a capture process that died on its own.
    pub fn tick(&mut self) -> Outcome {
        match self.session.poll_exit() {
            Some((info, status)) => ended_unexpectedly(&info, status),
            None => Outcome::Done,
        }
    }

    /// Stops any active recording and persists settings.
    pub async fn shutdown(&mut self) {
        if self.session.is_recording() {
            match self.session.stop().await {
                Ok(stopped) => info!("recording stopped on shutdown: {:?}", stopped.info.output_path),
                Err(e) => error!("failed to stop recording on shutdown: {}", e),
            }
        }

        if let Err(e) = self.settings.save(&mut self.store) {
            error!("failed to save settings on shutdown: {:#}", e);
        }
    }

    fn update(&mut self, change: impl FnOnce(&mut Settings)) -> Outcome {
        change(&mut self.settings);

        match self.settings.save(&mut self.store) {
            Ok(()) => {
                info!("settings saved: {:?}", self.settings);
                Outcome::Done
            }
            Err(e) => {
                error!("failed to save settings: {:#}", e);
                Outcome::Failed(format!("Could not save settings: {:#}", e))
            }
        }
    }

    async fn start(&mut self) -> Outcome {
        match self.session.start(&self.settings).await {
            Ok(info) => {
                info!(
                    "recording {} at {} fps to {:?}",
                    info.dimensions, info.framerate, info.output_path
                );
                Outcome::Done
            }
            Err(e) => failed("Could not start recording", e),
        }
    }

    async fn stop(&mut self) -> Outcome {
        match self.session.stop().await {
            // died before the stop request and did not finish cleanly
            Ok(Stopped {
                info,
                termination: Termination::AlreadyExited(status),
            }) if !status.success() => ended_unexpectedly(&info, status),
            Ok(stopped) => Outcome::Notify(completion_notice(&stopped)),
            Err(e) => failed("Could not stop recording", e),
        }
    }

    fn about_text(&self) -> String {
        format!(
            "{} {}\n{}\n\n{}",
            APP_NAME,
            env!("CARGO_PKG_VERSION"),
            env!("CARGO_PKG_DESCRIPTION"),
            self.status_text()
        )
    }
}

fn failed(context: &str, e: SessionError) -> Outcome {
    error!("{}: {}", context, e);
    Outcome::Failed(format!("{}: {}", context, e))
}

fn ended_unexpectedly(info: &SessionInfo, status: ExitStatus) -> Outcome {
    Outcome::Failed(format!(
        "Recording ended unexpectedly ({})\nFile: {}",
        status,
        info.output_path.display()
    ))
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "Yes"
    } else {
        "No"
    }
}

pub fn completion_notice(stopped: &Stopped) -> Notification {
    let info: &SessionInfo = &stopped.info;
    let location = info
        .output_path
        .parent()
        .map(|p| p.display().to_string())
        .unwrap_or_default();

    let mut body = format!(
        "File saved: {}\nLocation: {}\nDimensions: {}\nFramerate: {} FPS\nWith Sound: {}",
        info.output_path.display(),
        location,
        info.dimensions,
        info.framerate,
        yes_no(info.with_sound)
    );

    if let Termination::Forced { grace } = stopped.termination {
        body.push_str(&format!(
            "\n{}; it was killed and the file may be incomplete",
            SessionError::TerminationTimeout(grace)
        ));
    }

    Notification {
        title: "Recording Stopped".to_string(),
        body,
    }
}
