use crate::error::{CoreError, Result};
use crate::track::{LyricLine, LyricTrack};
use crate::window::DEFAULT_WINDOW_CAPACITY;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KaraokeConfig {
    /// Timed cues, in any order
    #[serde(default)]
    pub lyrics: Vec<LyricLine>,
    /// Lyrics file (`.lrc`, or a JSON cue array), used when `lyrics` is empty
    #[serde(default)]
    pub lyrics_file: Option<PathBuf>,
    /// Inline LRC text, used when neither `lyrics` nor `lyrics_file` is set
    #[serde(default)]
    pub lyrics_lrc: Option<String>,
    /// Media identifier understood by the player loader
    #[serde(default)]
    pub video_id: String,
    /// Mount point id; also scopes the generated stylesheet
    #[serde(default = "default_container_id")]
    pub container_id: String,
    #[serde(default)]
    pub theme: ThemeConfig,
    #[serde(default)]
    pub sync: SyncConfig,
}

fn default_container_id() -> String {
    "karaoke".to_string()
}

impl Default for KaraokeConfig {
    fn default() -> Self {
        Self {
            lyrics: Vec::new(),
            lyrics_file: None,
            lyrics_lrc: None,
            video_id: String::new(),
            container_id: default_container_id(),
            theme: ThemeConfig::default(),
            sync: SyncConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_window_capacity")]
    pub window_capacity: usize,
}

const fn default_poll_interval() -> u64 {
    100
}

const fn default_window_capacity() -> usize {
    DEFAULT_WINDOW_CAPACITY
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval(),
            window_capacity: default_window_capacity(),
        }
    }
}

impl SyncConfig {
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Cosmetic settings. None of these affect synchronization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeConfig {
    #[serde(default)]
    pub colors: ColorConfig,
    #[serde(default = "default_font")]
    pub font: String,
    #[serde(default)]
    pub shadows: ShadowConfig,
    #[serde(default = "default_floating_symbol")]
    pub floating_symbol: String,
}

fn default_font() -> String {
    "Dancing Script".to_string()
}

fn default_floating_symbol() -> String {
    "\u{2665}".to_string()
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            colors: ColorConfig::default(),
            font: default_font(),
            shadows: ShadowConfig::default(),
            floating_symbol: default_floating_symbol(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorConfig {
    #[serde(default = "default_primary_color")]
    pub primary: String,
    #[serde(default = "default_secondary_color")]
    pub secondary: String,
    #[serde(default = "default_accent_color")]
    pub accent: String,
    #[serde(default = "default_background_color")]
    pub background: String,
    #[serde(default = "default_text_color")]
    pub text: String,
    #[serde(default = "default_glow1")]
    pub glow1: String,
    #[serde(default = "default_glow2")]
    pub glow2: String,
}

fn default_primary_color() -> String {
    "#ff69b4".to_string()
}

fn default_secondary_color() -> String {
    "#ff1493".to_string()
}

fn default_accent_color() -> String {
    "#ff8faf".to_string()
}

fn default_background_color() -> String {
    "#1a0f1f".to_string()
}

fn default_text_color() -> String {
    "#fff".to_string()
}

fn default_glow1() -> String {
    "#ffd700".to_string()
}

fn default_glow2() -> String {
    "#fff200".to_string()
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            primary: default_primary_color(),
            secondary: default_secondary_color(),
            accent: default_accent_color(),
            background: default_background_color(),
            text: default_text_color(),
            glow1: default_glow1(),
            glow2: default_glow2(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShadowConfig {
    #[serde(default = "default_box_shadow")]
    pub default_box_shadow: String,
    #[serde(default = "default_hover_box_shadow")]
    pub hover_box_shadow: String,
}

fn default_box_shadow() -> String {
    "0 0 20px rgba(255, 215, 0, 0.2), 0 0 40px rgba(255, 105, 180, 0.2), inset 0 0 60px rgba(255, 242, 0, 0.1)"
        .to_string()
}

fn default_hover_box_shadow() -> String {
    "0 5px 15px rgba(0, 0, 0, 0.5), 0 10px 20px rgba(255, 105, 180, 0.4), inset 0 0 60px rgba(255, 242, 0, 0.1)"
        .to_string()
}

impl Default for ShadowConfig {
    fn default() -> Self {
        Self {
            default_box_shadow: default_box_shadow(),
            hover_box_shadow: default_hover_box_shadow(),
        }
    }
}

impl KaraokeConfig {
    /// Get the config file path (~/.config/karaoke/config.toml)
    #[must_use]
    pub fn config_path() -> PathBuf {
        crate::paths::config_path()
    }

    /// Load config from file or create template on first run
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ConfigNotFound`] after writing the template, or an
    /// error if the file cannot be read, parsed or validated.
    pub fn load_or_create() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            if let Some(parent) = config_path.parent() {
                fs::create_dir_all(parent)?;
            }

            fs::write(&config_path, CONFIG_TEMPLATE)?;

            return Err(CoreError::ConfigNotFound { path: config_path });
        }

        let content = fs::read_to_string(&config_path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate a TOML document
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed or a setting is out of range.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check settings that serde alone cannot enforce
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ConfigInvalid`] describing the first bad field.
    pub fn validate(&self) -> Result<()> {
        if self.container_id.trim().is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "container_id must not be empty".to_string(),
            });
        }
        if self.sync.poll_interval_ms == 0 {
            return Err(CoreError::ConfigInvalid {
                message: "sync.poll_interval_ms must be at least 1".to_string(),
            });
        }
        if self.sync.window_capacity == 0 {
            return Err(CoreError::ConfigInvalid {
                message: "sync.window_capacity must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Build the lyric track from the first configured source: `lyrics`,
    /// then `lyrics_file`, then `lyrics_lrc`
    ///
    /// # Errors
    ///
    /// Returns an error if the lyrics file cannot be read or the lyrics
    /// cannot be parsed.
    pub fn track(&self) -> Result<LyricTrack> {
        if !self.lyrics.is_empty() {
            return Ok(LyricTrack::new(self.lyrics.clone()));
        }
        if let Some(path) = &self.lyrics_file {
            return LyricTrack::from_file(path);
        }
        match &self.lyrics_lrc {
            Some(lrc) => LyricTrack::from_lrc(lrc),
            None => Ok(LyricTrack::default()),
        }
    }
}

pub const CONFIG_TEMPLATE: &str = r##"# Karaoke Configuration
# ~/.config/karaoke/config.toml

# Media identifier passed to the player loader
video_id = ""
# Mount point id; also scopes the generated stylesheet
container_id = "karaoke"

# Cues as seconds + text. Text may contain inline markup.
# lyrics = [
#   { time = 0.0, text = "First line" },
#   { time = 2.5, text = "Second <em>line</em>" },
# ]

# Or a lyrics file: .lrc, or a JSON array of { "time": ..., "text": ... }
# lyrics_file = "/path/to/song.lrc"

# Or inline LRC (used when neither of the above is set)
# lyrics_lrc = """
# [00:00.00]First line
# [00:02.50]Second line
# """

[sync]
poll_interval_ms = 100
window_capacity = 3

[theme]
font = "Dancing Script"
floating_symbol = "♥"

[theme.colors]
primary = "#ff69b4"
secondary = "#ff1493"
accent = "#ff8faf"
background = "#1a0f1f"
text = "#fff"
glow1 = "#ffd700"
glow2 = "#fff200"

[theme.shadows]
default_box_shadow = "0 0 20px rgba(255, 215, 0, 0.2), 0 0 40px rgba(255, 105, 180, 0.2), inset 0 0 60px rgba(255, 242, 0, 0.1)"
hover_box_shadow = "0 5px 15px rgba(0, 0, 0, 0.5), 0 10px 20px rgba(255, 105, 180, 0.4), inset 0 0 60px rgba(255, 242, 0, 0.1)"
"##;
