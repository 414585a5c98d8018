use super::command::CaptureCommand;
use super::process::CaptureProcess;
use crate::error::SessionError;

/// Position and size of a window in root-window coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowGeometry {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl WindowGeometry {
    /// "WxH", as ffmpeg's `-video_size` expects it.
    pub fn dimensions(&self) -> String {
        format!("{}x{}", self.width, self.height)
    }
}

/// The display server and process launcher a recording session talks to.
///
/// Queries are async so implementations keep blocking display I/O off the
/// controller task.
#[allow(async_fn_in_trait)]
pub trait CaptureBackend {
    /// Resolution of the whole display as (width, height).
    async fn display_size(&self) -> Result<(u32, u32), SessionError>;

    /// Geometry of the focused window, or `NoActiveWindow`.
    async fn active_window(&self) -> Result<WindowGeometry, SessionError>;

    /// Grants the capture process access to the display. Best-effort.
    async fn authorize_display(&self) -> anyhow::Result<()>;

    fn spawn(&self, command: &CaptureCommand) -> std::io::Result<CaptureProcess>;
}
