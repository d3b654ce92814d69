pub mod config;
pub mod error;
pub mod host;
pub mod lrc;
pub mod paths;
pub mod player;
pub mod sync;
pub mod theme;
pub mod time;
pub mod track;
pub mod widget;
pub mod window;

pub use config::{
    ColorConfig, KaraokeConfig, ShadowConfig, SyncConfig, ThemeConfig, CONFIG_TEMPLATE,
};

/// Re-export toml error type for config parsing error handling
pub use toml::de::Error as TomlParseError;
pub use error::{CoreError, PlayerError};
pub use host::Host;
pub use paths::{config_dir, config_path, CONFIG_DIR_NAME, CONFIG_FILE_NAME};
pub use player::{PlayerAdapter, PlayerLoader, PlayerSignal};
pub use sync::{DriverState, KaraokeEvent, SyncDriver, SyncState, TickOutcome};
pub use theme::{render_line, render_markup, render_stylesheet, InstanceIds};
pub use time::{position_from_secs, DurationExt};
pub use track::{select_line, LyricLine, LyricTrack};
pub use widget::{KaraokeSession, KaraokeWidget};
pub use window::{
    Advance, LineStatus, RenderWindow, RenderedLine, RenderedLineId, DEFAULT_WINDOW_CAPACITY,
};
