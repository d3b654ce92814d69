//! A clock-driven stand-in for an embedded media player.

use async_trait::async_trait;
use karaoke_core::{PlayerAdapter, PlayerError, PlayerLoader, PlayerSignal};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::Instant;
use tracing::{debug, info};

/// Plays silently for `duration`, reporting wall-clock progress.
pub struct SimulatedPlayer {
    media_id: String,
    duration: Duration,
    started_at: Mutex<Option<Instant>>,
    signals: broadcast::Sender<PlayerSignal>,
}

impl SimulatedPlayer {
    #[must_use]
    pub fn new(media_id: impl Into<String>, duration: Duration) -> Self {
        let (signals, _) = broadcast::channel(16);
        Self {
            media_id: media_id.into(),
            duration,
            started_at: Mutex::new(None),
            signals,
        }
    }

    /// Start playback and schedule the end-of-media signal
    pub fn play(self: &Arc<Self>) {
        if let Ok(mut started_at) = self.started_at.lock() {
            *started_at = Some(Instant::now());
        }
        info!("Playing \"{}\" ({:?})", self.media_id, self.duration);
        let _ = self.signals.send(PlayerSignal::Started);

        let player = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(player.duration).await;
            let _ = player.signals.send(PlayerSignal::Ended);
        });
    }
}

impl PlayerAdapter for SimulatedPlayer {
    fn current_time(&self) -> Result<f64, PlayerError> {
        let started_at = self
            .started_at
            .lock()
            .map_err(|_| PlayerError::Unavailable {
                reason: "clock lock poisoned".to_string(),
            })?;

        let start = (*started_at).ok_or(PlayerError::NotReady)?;
        Ok(start.elapsed().min(self.duration).as_secs_f64())
    }

    fn subscribe(&self) -> broadcast::Receiver<PlayerSignal> {
        self.signals.subscribe()
    }
}

/// Hands out a [`SimulatedPlayer`] after a short simulated API load.
pub struct SimulatedLoader {
    duration: Duration,
    load_delay: Duration,
    player: Mutex<Option<Arc<SimulatedPlayer>>>,
}

impl SimulatedLoader {
    #[must_use]
    pub fn new(duration: Duration, load_delay: Duration) -> Self {
        Self {
            duration,
            load_delay,
            player: Mutex::new(None),
        }
    }

    /// The player created by the last successful load
    #[must_use]
    pub fn player(&self) -> Option<Arc<SimulatedPlayer>> {
        self.player.lock().ok().and_then(|player| player.clone())
    }
}

#[async_trait]
impl PlayerLoader for SimulatedLoader {
    async fn load(
        &self,
        slot_id: &str,
        media_id: &str,
    ) -> Result<Arc<dyn PlayerAdapter>, PlayerError> {
        debug!("Loading simulated player into #{}", slot_id);
        tokio::time::sleep(self.load_delay).await;

        let player = Arc::new(SimulatedPlayer::new(media_id, self.duration));
        let mut slot = self.player.lock().map_err(|_| PlayerError::LoadFailed {
            reason: "player slot lock poisoned".to_string(),
        })?;
        *slot = Some(player.clone());

        Ok(player)
    }
}
