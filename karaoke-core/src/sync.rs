use crate::config::SyncConfig;
use crate::host::Host;
use crate::player::{PlayerAdapter, PlayerSignal};
use crate::theme::{render_line, InstanceIds};
use crate::time::{position_from_secs, DurationExt};
use crate::track::{LyricLine, LyricTrack};
use crate::window::{Advance, LineStatus, RenderWindow, RenderedLine};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Events emitted by the sync driver
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KaraokeEvent {
    /// The lyric surface was revealed. Fired once per session, before the
    /// first `LineChanged`.
    Expand,
    /// A new cue became current and has been highlighted
    LineChanged {
        index: usize,
        line: LyricLine,
        rendered: RenderedLine,
    },
    /// The player reported end of media
    VideoEnded,
}

/// Which cue is current
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncState {
    /// `None` until the first cue starts
    pub current_line: Option<usize>,
    /// Set once the expand transition has fired
    pub initialized: bool,
}

/// Lifecycle of the polling loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    /// Waiting for playback to start
    Idle,
    /// Polling the player
    Running,
    /// Polling finished or cancelled; terminal
    Stopped,
}

/// Result of a single poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The driver is not running, or was stopped before a new cue was highlighted
    Inactive,
    /// The player position could not be read
    Skipped,
    /// No visible change
    Unchanged,
    /// A new cue became current
    Advanced(usize),
    /// The final cue became current and polling ended
    Finished(usize),
}

/// Mounted markup mirrored from the render window
struct Surface {
    host: Arc<dyn Host>,
    ids: InstanceIds,
}

impl Surface {
    fn show_advance(&self, advance: &Advance, pending: Option<&RenderedLine>) {
        if let Some(line) = pending {
            self.host
                .append_line(&self.ids.lyrics_container(), &render_line(line));
        }
        if advance.expand {
            self.host.add_class(&self.ids.karaoke_box(), "expand");
        }
        for id in &advance.demoted {
            self.host.set_line_status(*id, LineStatus::Waiting);
        }
        for id in &advance.evicted {
            self.host.remove_line(*id);
        }
    }
}

/// Polls a player and keeps the render window in step with its position.
pub struct SyncDriver {
    track: Arc<LyricTrack>,
    state: SyncState,
    window: RenderWindow,
    surface: Option<Surface>,
    driver_state: DriverState,
    poll_interval: Duration,
    event_tx: broadcast::Sender<KaraokeEvent>,
    cancel_token: CancellationToken,
}

impl SyncDriver {
    /// Create a new driver
    ///
    /// # Arguments
    /// * `track` - Cues to synchronize
    /// * `config` - Poll cadence and window capacity
    /// * `cancel_token` - Optional external cancellation token for teardown
    #[must_use]
    pub fn new(
        track: Arc<LyricTrack>,
        config: &SyncConfig,
        cancel_token: Option<CancellationToken>,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(64);

        Self {
            track,
            state: SyncState::default(),
            window: RenderWindow::new(config.window_capacity),
            surface: None,
            driver_state: DriverState::Idle,
            poll_interval: config.poll_interval(),
            event_tx,
            cancel_token: cancel_token.unwrap_or_default(),
        }
    }

    /// Mirror every window change onto the markup mounted on `host`
    #[must_use]
    pub fn with_host(mut self, host: Arc<dyn Host>, ids: InstanceIds) -> Self {
        self.surface = Some(Surface { host, ids });
        self
    }

    /// Subscribe to karaoke events
    pub fn subscribe(&self) -> broadcast::Receiver<KaraokeEvent> {
        self.event_tx.subscribe()
    }

    #[must_use]
    pub fn track(&self) -> &LyricTrack {
        &self.track
    }

    #[must_use]
    pub const fn state(&self) -> SyncState {
        self.state
    }

    #[must_use]
    pub const fn driver_state(&self) -> DriverState {
        self.driver_state
    }

    #[must_use]
    pub const fn window(&self) -> &RenderWindow {
        &self.window
    }

    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Get a clone of the cancellation token
    #[must_use]
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    /// Begin polling. Returns false if the driver was not idle.
    pub fn start(&mut self) -> bool {
        if self.cancel_token.is_cancelled() {
            self.driver_state = DriverState::Stopped;
        }
        if self.driver_state != DriverState::Idle {
            return false;
        }

        info!("Starting lyrics sync ({} cues)", self.track.len());
        self.driver_state = DriverState::Running;
        true
    }

    /// Stop polling for good. Calling this more than once has no further effect.
    pub fn stop(&mut self) {
        self.cancel_token.cancel();
        if self.driver_state != DriverState::Stopped {
            info!("Lyrics sync stopped");
            self.driver_state = DriverState::Stopped;
        }
    }

    /// Poll the player once and advance the render window on a cue change.
    pub async fn tick(&mut self, player: &dyn PlayerAdapter) -> TickOutcome {
        if self.cancel_token.is_cancelled() {
            self.driver_state = DriverState::Stopped;
        }
        if self.driver_state != DriverState::Running {
            return TickOutcome::Inactive;
        }

        let position = match player.current_time() {
            Ok(seconds) => match position_from_secs(seconds) {
                Some(position) => position,
                None => {
                    debug!("Skipping poll: invalid player position {}", seconds);
                    return TickOutcome::Skipped;
                }
            },
            Err(e) => {
                debug!("Skipping poll: {}", e);
                return TickOutcome::Skipped;
            }
        };

        let Some(index) = self.track.select_line(position) else {
            return TickOutcome::Unchanged;
        };
        if self.state.current_line == Some(index) {
            return TickOutcome::Unchanged;
        }

        if !self.advance(index, position).await {
            return TickOutcome::Inactive;
        }

        if Some(index) == self.track.last_index() {
            info!("Reached final cue at {}ms", position.as_millis_u64());
            self.driver_state = DriverState::Stopped;
            return TickOutcome::Finished(index);
        }

        TickOutcome::Advanced(index)
    }

    /// Returns false if the new line was left pending because the driver
    /// was cancelled while yielding.
    async fn advance(&mut self, index: usize, position: Duration) -> bool {
        let Some(line) = self.track.get(index).cloned() else {
            return false;
        };

        debug!(
            "Advancing to cue {} at {}ms: {}",
            index,
            position.as_millis_u64(),
            line.text
        );

        let advance = self.window.advance_to(index, line.clone());
        self.state.current_line = Some(index);

        if let Some(surface) = &self.surface {
            surface.show_advance(&advance, self.window.get(advance.id));
        }

        if advance.expand {
            self.state.initialized = true;
            let _ = self.event_tx.send(KaraokeEvent::Expand);
        }

        // Let the host place the pending line before it is highlighted
        tokio::task::yield_now().await;

        if self.cancel_token.is_cancelled() {
            debug!("Cancelled before highlighting cue {}", index);
            self.stop();
            return false;
        }

        let Some(rendered) = self.window.promote(advance.id) else {
            return false;
        };

        if let Some(surface) = &self.surface {
            surface
                .host
                .set_line_status(rendered.id, LineStatus::Highlighted);
        }

        let _ = self.event_tx.send(KaraokeEvent::LineChanged {
            index,
            line,
            rendered,
        });
        true
    }

    /// Drive the session until cancelled.
    ///
    /// Waits for [`PlayerSignal::Started`], then polls the player every
    /// `poll_interval` until the final cue is reached. [`PlayerSignal::Ended`]
    /// is forwarded as [`KaraokeEvent::VideoEnded`] for the whole session.
    /// `signals` should be subscribed before the player can start, so that
    /// no early notification is missed.
    pub async fn run(
        &mut self,
        player: &dyn PlayerAdapter,
        mut signals: broadcast::Receiver<PlayerSignal>,
    ) {
        let cancel_token = self.cancel_token.clone();
        let mut signals_open = true;
        let mut interval: Option<Interval> = None;

        loop {
            if !signals_open && interval.is_none() {
                debug!("Player signal channel closed and not polling, sync finished");
                break;
            }

            tokio::select! {
                () = cancel_token.cancelled() => {
                    self.stop();
                    break;
                }
                signal = signals.recv(), if signals_open => {
                    match signal {
                        Ok(PlayerSignal::Started) => {
                            if self.start() {
                                interval = Some(self.new_interval());
                            } else {
                                debug!("Ignoring playback start, driver is {:?}", self.driver_state);
                            }
                        }
                        Ok(PlayerSignal::Ended) => {
                            info!("Media ended");
                            let _ = self.event_tx.send(KaraokeEvent::VideoEnded);
                        }
                        Ok(PlayerSignal::Paused | PlayerSignal::Buffering) => {}
                        Err(broadcast::error::RecvError::Lagged(n)) => {
                            warn!("Missed {} player signals", n);
                        }
                        Err(broadcast::error::RecvError::Closed) => {
                            signals_open = false;
                        }
                    }
                }
                Some(_) = next_tick(&mut interval) => {
                    let outcome = self.tick(player).await;
                    if self.driver_state != DriverState::Running {
                        debug!("Polling ended with {:?}", outcome);
                        interval = None;
                    }
                }
            }
        }
    }

    fn new_interval(&self) -> Interval {
        let mut interval = tokio::time::interval(self.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        interval
    }
}

/// Resolve on the next interval tick, or never when not polling.
async fn next_tick(interval: &mut Option<Interval>) -> Option<Instant> {
    match interval {
        Some(interval) => Some(interval.tick().await),
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PlayerError;
    use crate::window::LineStatus;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays a fixed list of positions, repeating the last one forever.
    struct ScriptedPlayer {
        times: Mutex<VecDeque<Result<f64, PlayerError>>>,
        last: Mutex<Result<f64, PlayerError>>,
        signals: broadcast::Sender<PlayerSignal>,
    }

    impl ScriptedPlayer {
        fn new(times: impl IntoIterator<Item = f64>) -> Self {
            Self::with_results(times.into_iter().map(Ok))
        }

        fn with_results(results: impl IntoIterator<Item = Result<f64, PlayerError>>) -> Self {
            let (signals, _) = broadcast::channel(16);
            Self {
                times: Mutex::new(results.into_iter().collect()),
                last: Mutex::new(Ok(0.0)),
                signals,
            }
        }

        fn signal(&self, signal: PlayerSignal) {
            let _ = self.signals.send(signal);
        }
    }

    impl PlayerAdapter for ScriptedPlayer {
        fn current_time(&self) -> Result<f64, PlayerError> {
            let mut last = self.last.lock().unwrap();
            if let Some(next) = self.times.lock().unwrap().pop_front() {
                *last = next;
            }
            last.clone()
        }

        fn subscribe(&self) -> broadcast::Receiver<PlayerSignal> {
            self.signals.subscribe()
        }
    }

    fn sample_track() -> Arc<LyricTrack> {
        Arc::new(LyricTrack::new(vec![
            LyricLine::new(Duration::from_secs(0), "a"),
            LyricLine::new(Duration::from_secs(2), "b"),
            LyricLine::new(Duration::from_secs(5), "c"),
        ]))
    }

    fn driver(track: Arc<LyricTrack>) -> SyncDriver {
        SyncDriver::new(track, &SyncConfig::default(), None)
    }

    fn drain(rx: &mut broadcast::Receiver<KaraokeEvent>) -> Vec<KaraokeEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    fn changed_indices(events: &[KaraokeEvent]) -> Vec<usize> {
        events
            .iter()
            .filter_map(|e| match e {
                KaraokeEvent::LineChanged { index, .. } => Some(*index),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_scenario_three_cues() {
        let player = ScriptedPlayer::new([0.0, 1.0, 2.0, 3.0, 5.0, 6.0]);
        let mut driver = driver(sample_track());
        let mut rx = driver.subscribe();
        assert!(driver.start());

        let mut outcomes = Vec::new();
        for _ in 0..6 {
            outcomes.push(driver.tick(&player).await);
        }

        assert_eq!(
            outcomes,
            vec![
                TickOutcome::Advanced(0),
                TickOutcome::Unchanged,
                TickOutcome::Advanced(1),
                TickOutcome::Unchanged,
                TickOutcome::Finished(2),
                TickOutcome::Inactive,
            ]
        );

        let events = drain(&mut rx);
        assert_eq!(events.iter().filter(|e| **e == KaraokeEvent::Expand).count(), 1);
        assert_eq!(events[0], KaraokeEvent::Expand);
        assert_eq!(changed_indices(&events), vec![0, 1, 2]);
        assert_eq!(driver.driver_state(), DriverState::Stopped);
        assert_eq!(driver.state().current_line, Some(2));
    }

    #[tokio::test]
    async fn test_line_changed_carries_highlighted_line() {
        let player = ScriptedPlayer::new([2.5]);
        let mut driver = driver(sample_track());
        let mut rx = driver.subscribe();
        driver.start();
        driver.tick(&player).await;

        let events = drain(&mut rx);
        let KaraokeEvent::LineChanged {
            index,
            line,
            rendered,
        } = &events[1]
        else {
            panic!("expected LineChanged, got {events:?}");
        };
        assert_eq!(*index, 1);
        assert_eq!(line.text, "b");
        assert_eq!(rendered.status, LineStatus::Highlighted);
        assert_eq!(rendered.line, *line);
    }

    #[tokio::test]
    async fn test_repeated_index_is_idempotent() {
        let player = ScriptedPlayer::new([2.0, 2.1, 2.2, 2.3, 4.9]);
        let mut driver = driver(sample_track());
        let mut rx = driver.subscribe();
        driver.start();

        for _ in 0..5 {
            driver.tick(&player).await;
        }

        assert_eq!(changed_indices(&drain(&mut rx)), vec![1]);
    }

    #[tokio::test]
    async fn test_none_after_valid_index_never_renders() {
        let track = Arc::new(LyricTrack::new(vec![
            LyricLine::new(Duration::from_secs(3), "x"),
            LyricLine::new(Duration::from_secs(8), "y"),
        ]));
        let player = ScriptedPlayer::new([3.0, 1.0, 0.0, 3.5]);
        let mut driver = driver(track);
        let mut rx = driver.subscribe();
        driver.start();

        let outcomes = [
            driver.tick(&player).await,
            driver.tick(&player).await,
            driver.tick(&player).await,
            driver.tick(&player).await,
        ];

        assert_eq!(outcomes[0], TickOutcome::Advanced(0));
        assert_eq!(outcomes[1], TickOutcome::Unchanged);
        assert_eq!(outcomes[2], TickOutcome::Unchanged);
        assert_eq!(outcomes[3], TickOutcome::Unchanged);
        assert_eq!(driver.state().current_line, Some(0));
        assert_eq!(changed_indices(&drain(&mut rx)), vec![0]);
    }

    #[tokio::test]
    async fn test_backward_seek_renders_lower_index() {
        let track = Arc::new(LyricTrack::new(vec![
            LyricLine::new(Duration::from_secs(0), "a"),
            LyricLine::new(Duration::from_secs(2), "b"),
            LyricLine::new(Duration::from_secs(9), "c"),
        ]));
        let player = ScriptedPlayer::new([3.0, 0.5]);
        let mut driver = driver(track);
        let mut rx = driver.subscribe();
        driver.start();

        let outcomes = [driver.tick(&player).await, driver.tick(&player).await];

        assert_eq!(outcomes, [TickOutcome::Advanced(1), TickOutcome::Advanced(0)]);
        assert_eq!(driver.state().current_line, Some(0));

        let events = drain(&mut rx);
        assert_eq!(events.iter().filter(|e| **e == KaraokeEvent::Expand).count(), 1);
        assert_eq!(changed_indices(&events), vec![1, 0]);

        let indices: Vec<_> = driver.window().lines().map(|l| (l.index, l.status)).collect();
        assert_eq!(
            indices,
            vec![(1, LineStatus::Waiting), (0, LineStatus::Highlighted)]
        );
    }

    #[tokio::test]
    async fn test_cancel_before_highlight_emits_nothing_more() {
        let player = ScriptedPlayer::new([0.5]);
        let mut driver = driver(sample_track());
        let mut rx = driver.subscribe();
        driver.start();

        // Runs while the driver yields between appending and highlighting
        let cancel = driver.cancel_token();
        let canceller = tokio::spawn(async move { cancel.cancel() });

        assert_eq!(driver.tick(&player).await, TickOutcome::Inactive);
        canceller.await.unwrap();

        assert_eq!(drain(&mut rx), vec![KaraokeEvent::Expand]);
        let statuses: Vec<_> = driver.window().lines().map(|l| l.status).collect();
        assert_eq!(statuses, vec![LineStatus::Pending]);
        assert_eq!(driver.driver_state(), DriverState::Stopped);
        assert_eq!(driver.tick(&player).await, TickOutcome::Inactive);
    }

    #[tokio::test]
    async fn test_read_failures_are_skipped() {
        let player = ScriptedPlayer::with_results([
            Err(PlayerError::NotReady),
            Ok(f64::NAN),
            Ok(f64::INFINITY),
            Ok(-1.0),
            Ok(0.5),
        ]);
        let mut driver = driver(sample_track());
        driver.start();

        for _ in 0..4 {
            assert_eq!(driver.tick(&player).await, TickOutcome::Skipped);
        }
        assert_eq!(driver.tick(&player).await, TickOutcome::Advanced(0));
        assert_eq!(driver.driver_state(), DriverState::Running);
    }

    #[tokio::test]
    async fn test_window_bounded_by_capacity() {
        let track = Arc::new(LyricTrack::new(
            (0..10_u64)
                .map(|i| LyricLine::new(Duration::from_secs(i), format!("line {i}")))
                .collect(),
        ));
        let config = SyncConfig {
            window_capacity: 2,
            ..SyncConfig::default()
        };
        let player = ScriptedPlayer::new((0..10).map(f64::from));
        let mut driver = SyncDriver::new(track, &config, None);
        driver.start();

        for _ in 0..10 {
            driver.tick(&player).await;
            assert!(driver.window().len() <= 2);
        }

        let statuses: Vec<_> = driver.window().lines().map(|l| l.status).collect();
        assert_eq!(statuses, vec![LineStatus::Waiting, LineStatus::Highlighted]);
    }

    #[tokio::test]
    async fn test_tick_before_start_is_inactive() {
        let player = ScriptedPlayer::new([1.0]);
        let mut driver = driver(sample_track());
        assert_eq!(driver.tick(&player).await, TickOutcome::Inactive);
        assert_eq!(driver.state(), SyncState::default());
    }

    #[tokio::test]
    async fn test_stop_is_idempotent_and_final() {
        let player = ScriptedPlayer::new([0.0, 2.0]);
        let mut driver = driver(sample_track());
        driver.start();
        driver.tick(&player).await;

        driver.stop();
        driver.stop();

        assert_eq!(driver.driver_state(), DriverState::Stopped);
        assert_eq!(driver.tick(&player).await, TickOutcome::Inactive);
        assert_eq!(driver.state().current_line, Some(0));
        assert!(!driver.start());
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_waits_for_start_and_forwards_end() {
        let player = Arc::new(ScriptedPlayer::new([0.0, 1.0, 2.0, 3.0, 5.0, 6.0]));
        let mut driver = driver(sample_track());
        let mut rx = driver.subscribe();
        let cancel = driver.cancel_token();

        let task_player = player.clone();
        let signals = player.subscribe();
        let handle = tokio::spawn(async move {
            driver.run(task_player.as_ref(), signals).await;
            driver
        });

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(drain(&mut rx).is_empty());

        player.signal(PlayerSignal::Started);
        tokio::time::sleep(Duration::from_secs(2)).await;
        player.signal(PlayerSignal::Ended);
        tokio::time::sleep(Duration::from_millis(10)).await;

        cancel.cancel();
        let driver = handle.await.unwrap();

        let events = drain(&mut rx);
        assert_eq!(events.first(), Some(&KaraokeEvent::Expand));
        assert_eq!(changed_indices(&events), vec![0, 1, 2]);
        assert_eq!(events.last(), Some(&KaraokeEvent::VideoEnded));
        assert_eq!(driver.driver_state(), DriverState::Stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_empty_track_polls_until_cancelled() {
        let player = Arc::new(ScriptedPlayer::new([0.0, 10.0, 100.0]));
        let mut driver = driver(Arc::new(LyricTrack::default()));
        let mut rx = driver.subscribe();
        let cancel = driver.cancel_token();

        let task_player = player.clone();
        let signals = player.subscribe();
        let handle = tokio::spawn(async move {
            driver.run(task_player.as_ref(), signals).await;
            driver
        });

        tokio::time::sleep(Duration::from_millis(10)).await;
        player.signal(PlayerSignal::Started);
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(!handle.is_finished());

        cancel.cancel();
        let driver = handle.await.unwrap();

        assert!(drain(&mut rx).is_empty());
        assert_eq!(driver.driver_state(), DriverState::Stopped);
        assert!(!driver.state().initialized);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_ignores_repeated_start() {
        let player = Arc::new(ScriptedPlayer::new([0.0]));
        let mut driver = driver(sample_track());
        let mut rx = driver.subscribe();
        let cancel = driver.cancel_token();

        let task_player = player.clone();
        let signals = player.subscribe();
        let handle = tokio::spawn(async move {
            driver.run(task_player.as_ref(), signals).await;
            driver
        });

        tokio::time::sleep(Duration::from_millis(10)).await;
        player.signal(PlayerSignal::Started);
        tokio::time::sleep(Duration::from_millis(350)).await;
        player.signal(PlayerSignal::Paused);
        player.signal(PlayerSignal::Started);
        tokio::time::sleep(Duration::from_millis(350)).await;

        cancel.cancel();
        let driver = handle.await.unwrap();

        let events = drain(&mut rx);
        assert_eq!(events.iter().filter(|e| **e == KaraokeEvent::Expand).count(), 1);
        assert_eq!(changed_indices(&events), vec![0]);
        assert_eq!(driver.state().current_line, Some(0));
    }
}
