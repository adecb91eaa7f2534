//! Shared JSON configuration document.
//!
//! The control panel owns the file; the display process only reads it, at
//! startup and whenever `ConfigWatermark` sees its modification time move.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use serde::{Deserialize, Deserializer};
use tracing::{debug, warn};

use crate::error::FrameError;

pub const DEFAULT_CLOCK_FORMAT: &str = "%H:%M";
pub const DEFAULT_DATE_FORMAT: &str = "%A, %B %d";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub display: DisplaySettings,
    pub sources: SourceSettings,
    pub overlays: OverlaySettings,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    pub resolution: (u32, u32),
    pub fullscreen: bool,
    /// Seconds between automatic image changes.
    pub slideshow_interval: f64,
    pub enable_power_save: bool,
    pub power_save_slideshow_duration: f64,
    pub power_save_blank_duration: f64,
    pub font: Option<PathBuf>,
    #[serde(default = "default_monitor_commands")]
    pub monitor_commands: Option<MonitorCommands>,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            resolution: (1920, 1080),
            fullscreen: true,
            slideshow_interval: 10.0,
            enable_power_save: false,
            power_save_slideshow_duration: 60.0,
            power_save_blank_duration: 30.0,
            font: None,
            monitor_commands: default_monitor_commands(),
        }
    }
}

impl DisplaySettings {
    pub fn slideshow_interval(&self) -> Duration {
        seconds(self.slideshow_interval)
    }

    pub fn power_save_slideshow_duration(&self) -> Duration {
        seconds(self.power_save_slideshow_duration)
    }

    pub fn power_save_blank_duration(&self) -> Duration {
        seconds(self.power_save_blank_duration)
    }
}

fn seconds(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or(Duration::MAX)
}

/// Argument vectors run to switch the monitor off and back on.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MonitorCommands {
    pub off: Vec<String>,
    pub on: Vec<String>,
}

fn default_monitor_commands() -> Option<MonitorCommands> {
    let xset = |state: &str| ["xset", "dpms", "force", state].map(String::from).to_vec();
    Some(MonitorCommands { off: xset("off"), on: xset("on") })
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SourceSettings {
    pub local_paths: Vec<PathBuf>,
    pub unraid_shares: Vec<PathBuf>,
}

impl SourceSettings {
    /// Every configured root, local paths first.
    pub fn roots(&self) -> impl Iterator<Item = &Path> {
        self.local_paths.iter().chain(self.unraid_shares.iter()).map(PathBuf::as_path)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct OverlaySettings {
    pub clock: TextOverlay,
    pub date: TextOverlay,
    pub weather: PositionedOverlay,
    pub system_stats: PositionedOverlay,
}

impl Default for OverlaySettings {
    fn default() -> Self {
        Self {
            clock: TextOverlay { font_size: 48.0, ..TextOverlay::default() },
            date: TextOverlay { font_size: 32.0, ..TextOverlay::default() },
            weather: PositionedOverlay { position: Position::TopRight, ..PositionedOverlay::default() },
            system_stats: PositionedOverlay { position: Position::BottomLeft, ..PositionedOverlay::default() },
        }
    }
}

/// Clock or date text drawn in the shared top bar.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TextOverlay {
    pub enabled: bool,
    /// strftime pattern; the overlay's built-in pattern applies when absent.
    pub format: Option<String>,
    pub font_size: f32,
    pub contrast: TextContrast,
}

impl Default for TextOverlay {
    fn default() -> Self {
        Self { enabled: true, format: None, font_size: 36.0, contrast: TextContrast::White }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextContrast {
    #[default]
    White,
    Average,
    Complementary,
}

/// Weather or system stats text placed at one of the frame's anchors.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PositionedOverlay {
    pub enabled: bool,
    pub position: Position,
    pub font_size: f32,
    #[serde(deserialize_with = "deserialize_color")]
    pub color: [u8; 4],
    pub api_key: Option<String>,
}

impl Default for PositionedOverlay {
    fn default() -> Self {
        Self {
            enabled: false,
            position: Position::TopLeft,
            font_size: 24.0,
            color: [255, 255, 255, 255],
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum Position {
    #[default]
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
    Center,
}

impl From<String> for Position {
    fn from(name: String) -> Self {
        match name.as_str() {
            "top-right" => Position::TopRight,
            "bottom-left" => Position::BottomLeft,
            "bottom-right" => Position::BottomRight,
            "center" => Position::Center,
            _ => Position::TopLeft,
        }
    }
}

fn deserialize_color<'de, D>(deserializer: D) -> Result<[u8; 4], D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum ColorValue {
        Rgb([u8; 3]),
        Rgba([u8; 4]),
    }

    Ok(match ColorValue::deserialize(deserializer)? {
        ColorValue::Rgb([r, g, b]) => [r, g, b, 255],
        ColorValue::Rgba(rgba) => rgba,
    })
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, FrameError> {
        let contents = fs::read_to_string(path).map_err(|e| FrameError::config(path, e))?;
        Self::parse(path, &contents)
    }

    pub fn parse(path: &Path, contents: &str) -> Result<Self, FrameError> {
        let config: Config = serde_json::from_str(contents).map_err(|e| FrameError::config(path, e))?;
        config.validate().map_err(|reason| FrameError::config(path, reason))?;
        debug!(path = %path.display(), "parsed config");
        Ok(config)
    }

    fn validate(&self) -> Result<(), String> {
        let display = &self.display;
        let (width, height) = display.resolution;
        if width == 0 || height == 0 {
            return Err(format!("resolution {width}x{height} has a zero dimension"));
        }
        if !(display.slideshow_interval.is_finite() && display.slideshow_interval > 0.0) {
            return Err(format!("slideshow_interval must be positive, got {}", display.slideshow_interval));
        }
        for (name, value) in [
            ("power_save_slideshow_duration", display.power_save_slideshow_duration),
            ("power_save_blank_duration", display.power_save_blank_duration),
        ] {
            if value.is_nan() || value < 0.0 {
                return Err(format!("{name} must not be negative, got {value}"));
            }
        }
        Ok(())
    }
}

/// Last observed modification time of the config file.
#[derive(Debug)]
pub struct ConfigWatermark {
    path: PathBuf,
    seen: Option<SystemTime>,
    failed: Option<SystemTime>,
}

impl ConfigWatermark {
    pub fn new(path: impl Into<PathBuf>, seen: Option<SystemTime>) -> Self {
        Self { path: path.into(), seen, failed: None }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn modified(&self) -> Option<SystemTime> {
        fs::metadata(&self.path).and_then(|m| m.modified()).ok()
    }

    /// Returns the new modification time when it differs from the watermark.
    /// A file that is briefly missing (editor replacing it) reads as unchanged.
    pub fn poll(&self) -> Option<SystemTime> {
        match self.modified() {
            Some(mtime) if Some(mtime) != self.seen => Some(mtime),
            Some(_) => None,
            None => {
                debug!(path = %self.path.display(), "config file not readable, skipping change check");
                None
            }
        }
    }

    pub fn mark_loaded(&mut self, mtime: SystemTime) {
        self.seen = Some(mtime);
        self.failed = None;
    }

    /// Records a failed reload. Returns true the first time a given mtime fails,
    /// so the caller logs once while retrying every tick.
    pub fn mark_failed(&mut self, mtime: SystemTime) -> bool {
        if self.failed == Some(mtime) {
            return false;
        }
        if self.failed.is_some() {
            warn!(path = %self.path.display(), "config still failing after another edit");
        }
        self.failed = Some(mtime);
        true
    }
}
