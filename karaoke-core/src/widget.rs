//! Widget bootstrap: mount point checks, stylesheet injection, player loading.

use crate::config::KaraokeConfig;
use crate::error::{CoreError, Result};
use crate::host::Host;
use crate::player::{PlayerAdapter, PlayerLoader, PlayerSignal};
use crate::sync::{KaraokeEvent, SyncDriver};
use crate::theme::{render_markup, render_stylesheet, InstanceIds};
use crate::track::LyricTrack;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// A configured but not yet mounted karaoke widget.
pub struct KaraokeWidget {
    config: KaraokeConfig,
    track: Arc<LyricTrack>,
    ids: InstanceIds,
}

impl KaraokeWidget {
    /// Validate configuration and build the lyric track.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the lyrics cannot
    /// be parsed.
    pub fn new(config: KaraokeConfig) -> Result<Self> {
        config.validate()?;
        let track = Arc::new(config.track()?);
        let ids = InstanceIds::new(config.container_id.clone());

        Ok(Self { config, track, ids })
    }

    #[must_use]
    pub const fn ids(&self) -> &InstanceIds {
        &self.ids
    }

    #[must_use]
    pub fn track(&self) -> &LyricTrack {
        &self.track
    }

    /// Mount the widget and bring up its player.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MissingMountPoint`] if the container does not
    /// exist, or [`CoreError::PlayerLoadFailed`] if the player cannot be
    /// loaded. Either way the widget stays inert; nothing is retried.
    pub async fn mount(
        self,
        host: Arc<dyn Host>,
        loader: &dyn PlayerLoader,
        cancel_token: Option<CancellationToken>,
    ) -> Result<KaraokeSession> {
        let container_id = &self.config.container_id;

        if !host.has_element(container_id) {
            error!("Container with id \"{}\" not found", container_id);
            return Err(CoreError::MissingMountPoint {
                container_id: container_id.clone(),
            });
        }

        let style_id = self.ids.style();
        if host.has_element(&style_id) {
            debug!("Stylesheet {} already present", style_id);
        } else {
            let css = render_stylesheet(&self.ids.instance, &self.config.theme);
            host.inject_stylesheet(&style_id, &css);
        }

        host.mount(container_id, &render_markup(&self.ids));

        let player = match loader
            .load(&self.ids.player_slot(), &self.config.video_id)
            .await
        {
            Ok(player) => player,
            Err(e) => {
                error!("Failed to load the media player: {}", e);
                return Err(CoreError::PlayerLoadFailed(e));
            }
        };

        info!(
            "Karaoke widget mounted in \"{}\" with {} cues",
            container_id,
            self.track.len()
        );

        let signals = player.subscribe();
        let driver = SyncDriver::new(self.track, &self.config.sync, cancel_token)
            .with_host(host, self.ids);
        Ok(KaraokeSession {
            driver,
            player,
            signals,
        })
    }
}

/// A mounted widget bound to a ready player.
pub struct KaraokeSession {
    driver: SyncDriver,
    player: Arc<dyn PlayerAdapter>,
    signals: broadcast::Receiver<PlayerSignal>,
}

impl KaraokeSession {
    /// Subscribe to karaoke events
    pub fn subscribe(&self) -> broadcast::Receiver<KaraokeEvent> {
        self.driver.subscribe()
    }

    /// Token that tears the session down when cancelled
    #[must_use]
    pub fn cancel_token(&self) -> CancellationToken {
        self.driver.cancel_token()
    }

    #[must_use]
    pub const fn driver(&self) -> &SyncDriver {
        &self.driver
    }

    /// Run until cancelled. Returns the session for inspection.
    pub async fn run(self) -> Self {
        let Self {
            mut driver,
            player,
            signals,
        } = self;

        driver.run(player.as_ref(), signals).await;

        let signals = player.subscribe();
        Self {
            driver,
            player,
            signals,
        }
    }

    /// Start the session in a background task
    #[must_use]
    pub fn start(self) -> tokio::task::JoinHandle<Self> {
        tokio::spawn(self.run())
    }
}
