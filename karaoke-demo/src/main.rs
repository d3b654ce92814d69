mod host;
mod simulated;

use crate::host::LogHost;
use crate::simulated::SimulatedLoader;
use karaoke_core::{
    render_line, CoreError, KaraokeConfig, KaraokeEvent, KaraokeSession, KaraokeWidget,
    LyricTrack, SyncDriver,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Lyrics played when the config file has none
const DEMO_LRC: &str = r"
[00:00.50]Twinkle, twinkle, little star
[00:03.00]How I wonder <em>what</em> you are
[00:05.50]Up above the world so high
[00:08.00]Like a diamond in the sky
";

/// Extra playback after the final cue before the media ends
const OUTRO: Duration = Duration::from_secs(3);

fn main() {
    init_tracing();

    let mut config = match KaraokeConfig::load_or_create() {
        Ok(config) => config,
        Err(CoreError::ConfigNotFound { path }) => {
            info!("Created config template at {}", path.display());
            KaraokeConfig::default()
        }
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    };

    if config.lyrics.is_empty() && config.lyrics_file.is_none() && config.lyrics_lrc.is_none() {
        info!("No lyrics configured, using the built-in demo song");
        config.lyrics_lrc = Some(DEMO_LRC.to_string());
    }
    if config.video_id.is_empty() {
        config.video_id = "demo".to_string();
    }

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            error!("Failed to create tokio runtime: {e}");
            std::process::exit(1);
        }
    };

    // Create shared cancellation token for graceful shutdown
    let cancel_token = CancellationToken::new();

    let ctrlc_token = cancel_token.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        info!("Received Ctrl+C, shutting down gracefully...");
        ctrlc_token.cancel();
    }) {
        error!("Failed to set Ctrl+C handler: {}", e);
    }

    if let Err(e) = runtime.block_on(run(config, cancel_token)) {
        error!("{e}");
        std::process::exit(1);
    }
}

async fn run(config: KaraokeConfig, cancel_token: CancellationToken) -> Result<(), CoreError> {
    let host = Arc::new(LogHost::new(config.container_id.clone()));
    let widget = KaraokeWidget::new(config)?;
    let duration = media_duration(widget.track());
    let loader = SimulatedLoader::new(duration, Duration::from_millis(300));

    let session = widget
        .mount(host, &loader, Some(cancel_token.clone()))
        .await?;

    let events = tokio::spawn(log_karaoke_events(session.subscribe(), cancel_token.clone()));
    let handle = session.start();

    if let Some(player) = loader.player() {
        player.play();
    }

    match handle.await {
        Ok(session) => log_summary(&session),
        Err(e) => warn!("Session task failed: {}", e),
    }
    if let Err(e) = events.await {
        warn!("Event logger task failed: {}", e);
    }

    Ok(())
}

fn media_duration(track: &LyricTrack) -> Duration {
    track
        .lines()
        .last()
        .map_or(Duration::ZERO, |line| line.time)
        + OUTRO
}

async fn log_karaoke_events(
    mut rx: broadcast::Receiver<KaraokeEvent>,
    cancel_token: CancellationToken,
) {
    loop {
        match rx.recv().await {
            Ok(KaraokeEvent::Expand) => {
                info!("Lyrics revealed");
            }
            Ok(KaraokeEvent::LineChanged {
                index, rendered, ..
            }) => {
                info!("[{}] {}", index, render_line(&rendered));
            }
            Ok(KaraokeEvent::VideoEnded) => {
                info!("Video ended");
                cancel_token.cancel();
            }
            Err(broadcast::error::RecvError::Closed) => {
                info!("Karaoke event channel closed");
                break;
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!("Missed {} karaoke events", n);
            }
        }
    }
}

fn log_summary(session: &KaraokeSession) {
    let driver: &SyncDriver = session.driver();
    info!(
        "Session finished: state={:?}, current line={:?}",
        driver.driver_state(),
        driver.state().current_line
    );
    for line in driver.window().lines() {
        info!("  {}", render_line(line));
    }
}

/// Initialize tracing with console output
fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
