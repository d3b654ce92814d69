//! Media player capability traits.

use crate::error::PlayerError;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Playback state notifications delivered by a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlayerSignal {
    /// Playback started or resumed
    Started,
    /// Playback paused
    Paused,
    /// Player is buffering
    Buffering,
    /// End of media reached
    Ended,
}

/// A media player the sync engine can read positions from.
///
/// Implementations wrap a concrete player (an embedded video, a local audio
/// pipeline, a simulated clock) and should:
///
/// - Answer [`current_time`](PlayerAdapter::current_time) without blocking
/// - Broadcast a [`PlayerSignal`] whenever playback state changes
pub trait PlayerAdapter: Send + Sync {
    /// Latest known playback position in seconds.
    ///
    /// # Errors
    ///
    /// Returns an error if the position cannot be read right now. The engine
    /// treats this as transient and tries again on its next poll.
    fn current_time(&self) -> Result<f64, PlayerError>;

    /// Subscribe to playback state notifications.
    fn subscribe(&self) -> broadcast::Receiver<PlayerSignal>;
}

/// Asynchronously brings up a player inside a mounted slot.
#[async_trait]
pub trait PlayerLoader: Send + Sync {
    /// Load the player API and create a player for `media_id` in `slot_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the player API cannot be made available.
    async fn load(
        &self,
        slot_id: &str,
        media_id: &str,
    ) -> Result<Arc<dyn PlayerAdapter>, PlayerError>;
}
