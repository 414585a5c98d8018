use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

use super::backend::WindowGeometry;

/// A program and its argument list, ready to be spawned.
///
/// Arguments are kept as `OsString` so paths reach the process byte for byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureCommand {
    pub program: String,
    pub args: Vec<OsString>,
}

impl CaptureCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// True if `flag` is immediately followed by `value` somewhere in the args.
    pub fn has_pair(&self, flag: &str, value: &str) -> bool {
        self.args.windows(2).any(|w| w[0] == flag && w[1] == value)
    }
}

impl fmt::Display for CaptureCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// Audio track captured alongside the screen.
#[derive(Debug, Clone)]
pub struct AudioInput {
    pub backend: String,
    pub device: String,
    pub channels: u16,
    pub codec: String,
}

#[derive(Debug, Clone)]
pub struct FfmpegCommandBuilder {
    ffmpeg_path: String,
    display: String,
    framerate: u32,
    region: Option<WindowGeometry>,
    audio: Option<AudioInput>,
    video_codec: String,
    preset: String,
    loglevel: String,
    output_path: PathBuf,
}

impl FfmpegCommandBuilder {
    pub fn new(output_path: &Path) -> Self {
        Self {
            ffmpeg_path: "ffmpeg".to_string(),
            display: ":0.0".to_string(),
            framerate: 30,
            region: None,
            audio: None,
            video_codec: "libx264".to_string(),
            preset: "ultrafast".to_string(),
            loglevel: "error".to_string(),
            output_path: output_path.to_path_buf(),
        }
    }

    pub fn with_ffmpeg_path(mut self, path: String) -> Self {
        self.ffmpeg_path = path;
        self
    }

    pub fn with_display(mut self, display: String) -> Self {
        self.display = display;
        self
    }

    pub fn with_framerate(mut self, framerate: u32) -> Self {
        self.framerate = framerate;
        self
    }

    /// Restrict capture to a window's bounds; `None` records the whole display.
    pub fn with_region(mut self, region: Option<WindowGeometry>) -> Self {
        self.region = region;
        self
    }

    pub fn with_audio(mut self, audio: Option<AudioInput>) -> Self {
        self.audio = audio;
        self
    }

    pub fn with_video_codec(mut self, codec: String) -> Self {
        self.video_codec = codec;
        self
    }

    pub fn with_preset(mut self, preset: String) -> Self {
        self.preset = preset;
        self
    }

    pub fn with_loglevel(mut self, loglevel: String) -> Self {
        self.loglevel = loglevel;
        self
    }

    pub fn build(&self) -> CaptureCommand {
        let mut cmd = CaptureCommand::new(self.ffmpeg_path.clone())
            .arg("-n")
            .arg("-nostdin")
            .arg("-loglevel")
            .arg(self.loglevel.clone())
            .arg("-f")
            .arg("x11grab");

        let input = match &self.region {
            Some(region) => {
                cmd = cmd.arg("-video_size").arg(region.dimensions());
                format!("{}+{},{}", self.display, region.x, region.y)
            }
            None => self.display.clone(),
        };

        cmd = cmd
            .arg("-framerate")
            .arg(self.framerate.to_string())
            .arg("-i")
            .arg(input);

        if let Some(audio) = &self.audio {
            cmd = cmd
                .arg("-f")
                .arg(audio.backend.clone())
                .arg("-ac")
                .arg(audio.channels.to_string())
                .arg("-i")
                .arg(audio.device.clone());
        }

        // yuv420p needs even dimensions
        if let Some(region) = &self.region {
            if region.width % 2 != 0 || region.height % 2 != 0 {
                cmd = cmd.arg("-vf").arg("scale=trunc(iw/2)*2:trunc(ih/2)*2");
            }
        }

        cmd = cmd
            .arg("-c:v")
            .arg(self.video_codec.clone())
            .arg("-preset")
            .arg(self.preset.clone())
            .arg("-pix_fmt")
            .arg("yuv420p");

        if let Some(audio) = &self.audio {
            cmd = cmd.arg("-c:a").arg(audio.codec.clone());
        }

        cmd.arg(self.output_path.clone())
    }
}
