use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::SettingsStore;

const AREA_KEY: &str = "area";
const FRAMERATE_KEY: &str = "framerate";
const WITH_SOUND_KEY: &str = "with_sound";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CaptureArea {
    #[default]
    #[serde(rename = "Full Screen")]
    FullScreen,
    #[serde(rename = "Active Window")]
    ActiveWindow,
}

impl CaptureArea {
    pub const ALL: [CaptureArea; 2] = [CaptureArea::FullScreen, CaptureArea::ActiveWindow];

    pub fn label(self) -> &'static str {
        match self {
            CaptureArea::FullScreen => "Full Screen",
            CaptureArea::ActiveWindow => "Active Window",
        }
    }
}

impl fmt::Display for CaptureArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One of the framerates the capture menu offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum Framerate {
    Fps15,
    Fps24,
    #[default]
    Fps30,
    Fps60,
}

impl Framerate {
    pub const ALL: [Framerate; 4] = [
        Framerate::Fps15,
        Framerate::Fps24,
        Framerate::Fps30,
        Framerate::Fps60,
    ];

    pub fn fps(self) -> u32 {
        match self {
            Framerate::Fps15 => 15,
            Framerate::Fps24 => 24,
            Framerate::Fps30 => 30,
            Framerate::Fps60 => 60,
        }
    }
}

impl TryFrom<u32> for Framerate {
    type Error = String;

    fn try_from(fps: u32) -> Result<Self, Self::Error> {
        Framerate::ALL
            .into_iter()
            .find(|f| f.fps() == fps)
            .ok_or_else(|| format!("unsupported framerate {}", fps))
    }
}

impl From<Framerate> for u32 {
    fn from(framerate: Framerate) -> Self {
        framerate.fps()
    }
}

impl fmt::Display for Framerate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.fps())
    }
}

/// User-selected recording options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    pub area: CaptureArea,
    pub framerate: Framerate,
    pub with_sound: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            area: CaptureArea::FullScreen,
            framerate: Framerate::Fps30,
            with_sound: true,
        }
    }
}

impl Settings {
    pub fn load(store: &SettingsStore) -> Self {
        let defaults = Self::default();
        Self {
            area: store.get(AREA_KEY, defaults.area),
            framerate: store.get(FRAMERATE_KEY, defaults.framerate),
            with_sound: store.get(WITH_SOUND_KEY, defaults.with_sound),
        }
    }

    pub fn save(&self, store: &mut SettingsStore) -> Result<()> {
        store.set(AREA_KEY, self.area)?;
        store.set(FRAMERATE_KEY, self.framerate)?;
        store.set(WITH_SOUND_KEY, self.with_sound)?;
        Ok(())
    }
}
