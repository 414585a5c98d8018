use anyhow::{bail, Context};
use tracing::debug;
use x11rb::connection::Connection;
use x11rb::protocol::xproto::{AtomEnum, ConnectionExt};
use x11rb::rust_connection::RustConnection;

use super::backend::{CaptureBackend, WindowGeometry};
use super::command::CaptureCommand;
use super::process::CaptureProcess;
use crate::error::SessionError;

/// Talks to the X server directly and launches ffmpeg's x11grab.
#[derive(Debug, Clone)]
pub struct X11Backend {
    display: String,
}

impl X11Backend {
    pub fn new(display: impl Into<String>) -> Self {
        Self {
            display: display.into(),
        }
    }

    /// Runs a blocking X11 query on the blocking pool.
    async fn query<T, F>(&self, f: F) -> Result<T, SessionError>
    where
        T: Send + 'static,
        F: FnOnce(&str) -> Result<T, SessionError> + Send + 'static,
    {
        let display = self.display.clone();
        tokio::task::spawn_blocking(move || f(&display))
            .await
            .map_err(display_err)?
    }
}

fn display_err(e: impl std::fmt::Display) -> SessionError {
    SessionError::Display(e.to_string())
}

fn connect(display: &str) -> Result<(RustConnection, usize), SessionError> {
    x11rb::connect(Some(display)).map_err(display_err)
}

fn query_display_size(display: &str) -> Result<(u32, u32), SessionError> {
    let (conn, screen_num) = connect(display)?;
    let screen = &conn.setup().roots[screen_num];
    Ok((
        u32::from(screen.width_in_pixels),
        u32::from(screen.height_in_pixels),
    ))
}

fn query_active_window(display: &str) -> Result<WindowGeometry, SessionError> {
    let (conn, screen_num) = connect(display)?;
    let screen = &conn.setup().roots[screen_num];
    let root = screen.root;

    let atom = conn
        .intern_atom(false, b"_NET_ACTIVE_WINDOW")
        .map_err(display_err)?
        .reply()
        .map_err(display_err)?
        .atom;
    let reply = conn
        .get_property(false, root, atom, AtomEnum::WINDOW, 0, 1)
        .map_err(display_err)?
        .reply()
        .map_err(display_err)?;

    let window = reply
        .value32()
        .and_then(|mut values| values.next())
        .filter(|&w| w != 0)
        .ok_or(SessionError::NoActiveWindow)?;

    let geometry = conn
        .get_geometry(window)
        .map_err(display_err)?
        .reply()
        .map_err(|_| SessionError::NoActiveWindow)?;
    let origin = conn
        .translate_coordinates(window, root, 0, 0)
        .map_err(display_err)?
        .reply()
        .map_err(|_| SessionError::NoActiveWindow)?;

    debug!(
        "active window {:#x} at {},{} size {}x{}",
        window, origin.dst_x, origin.dst_y, geometry.width, geometry.height
    );

    clip_to_screen(
        WindowGeometry {
            x: i32::from(origin.dst_x),
            y: i32::from(origin.dst_y),
            width: u32::from(geometry.width),
            height: u32::from(geometry.height),
        },
        u32::from(screen.width_in_pixels),
        u32::from(screen.height_in_pixels),
    )
    .ok_or(SessionError::NoActiveWindow)
}

impl CaptureBackend for X11Backend {
    async fn display_size(&self) -> Result<(u32, u32), SessionError> {
        self.query(query_display_size).await
    }

    async fn active_window(&self) -> Result<WindowGeometry, SessionError> {
        self.query(query_active_window).await
    }

    async fn authorize_display(&self) -> anyhow::Result<()> {
        let user = std::env::var("USER")
            .or_else(|_| std::env::var("LOGNAME"))
            .context("cannot determine local user")?;

        let status = tokio::process::Command::new("xhost")
            .arg(format!("+SI:localuser:{}", user))
            .env("DISPLAY", &self.display)
            .stdout(std::process::Stdio::null())
            .status()
            .await
            .context("failed to run xhost")?;

        if !status.success() {
            bail!("xhost exited with {}", status);
        }
        Ok(())
    }

    fn spawn(&self, command: &CaptureCommand) -> std::io::Result<CaptureProcess> {
        CaptureProcess::spawn(command)
    }
}

/// x11grab refuses regions that leave the screen, so partially visible
/// windows are cut down to their on-screen part.
fn clip_to_screen(geometry: WindowGeometry, screen_w: u32, screen_h: u32) -> Option<WindowGeometry> {
    let left = geometry.x.max(0);
    let top = geometry.y.max(0);
    let right = (geometry.x + geometry.width as i32).min(screen_w as i32);
    let bottom = (geometry.y + geometry.height as i32).min(screen_h as i32);

    if right <= left || bottom <= top {
        return None;
    }

    Some(WindowGeometry {
        x: left,
        y: top,
        width: (right - left) as u32,
        height: (bottom - top) as u32,
    })
}
