pub mod capture;
pub mod config;
pub mod controller;
pub mod error;
pub mod notify;
pub mod session;
pub mod settings;
pub mod tray;

pub use capture::{CaptureBackend, CaptureCommand, CaptureProcess, Termination, WindowGeometry, X11Backend};
pub use config::{Config, SettingsStore};
pub use controller::{Action, Notification, Outcome, TrayController, TrayView};
pub use error::SessionError;
pub use session::{RecordingSession, SessionInfo, SessionOptions, Stopped};
pub use settings::{CaptureArea, Framerate, Settings};
