//! Everything that touches the outside world during a recording: building the
//! ffmpeg command line, querying the X server, and owning the child process.

mod backend;
mod command;
mod process;
mod x11;

pub use backend::{CaptureBackend, WindowGeometry};
pub use command::{AudioInput, CaptureCommand, FfmpegCommandBuilder};
pub use process::{CaptureProcess, Termination};
pub use x11::X11Backend;
