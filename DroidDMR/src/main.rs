use std::sync::Arc;

use anyhow::Result;
use dmrconfig::get_config;
use dmrenderer::{
    ChannelBackend, HttpProbe, LastChangeSink, MediaRenderer, PlaybackBackend, PlaybackEvent,
    PlayerCommand,
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// Stand-in player: confirms every command immediately.
///
/// A real deployment replaces this task with the platform media player,
/// speaking the same `PlayerCommand`/`PlaybackEvent` messages.
async fn loopback_player(
    instance_id: u32,
    mut commands: mpsc::UnboundedReceiver<PlayerCommand>,
    events: mpsc::UnboundedSender<PlaybackEvent>,
) {
    while let Some(command) = commands.recv().await {
        debug!(instance_id, ?command, "Player command");
        let reply = match command {
            PlayerCommand::Load { display_name, .. } => {
                info!(instance_id, "🎵 Loaded '{}'", display_name);
                None
            }
            PlayerCommand::Play => Some(PlaybackEvent::Started),
            PlayerCommand::Pause => Some(PlaybackEvent::Paused),
            PlayerCommand::Stop => Some(PlaybackEvent::Stopped),
            PlayerCommand::Seek { position_ms } => Some(PlaybackEvent::Position(position_ms)),
            PlayerCommand::SetVolume { .. } => None,
        };

        if let Some(event) = reply {
            if events.send(event).is_err() {
                break;
            }
        }
    }
    debug!(instance_id, "Player stopped");
}

#[tokio::main]
async fn main() -> Result<()> {
    // ========== PHASE 1 : Configuration et logs ==========
    let config = get_config();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.get_log_min_level().to_lowercase()))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!(config_dir = %config.config_dir(), "⚙️ Configuration loaded");

    // ========== PHASE 2 : Renderer ==========
    let sink = Arc::new(LastChangeSink::new());
    let probe = Arc::new(HttpProbe::new(config.get_probe_timeout())?);

    let mut players = Vec::new();
    let renderer = MediaRenderer::from_config(
        &config,
        sink.clone(),
        |instance_id| {
            let (backend, commands) = ChannelBackend::new();
            players.push((instance_id, commands));
            Arc::new(backend) as Arc<dyn PlaybackBackend>
        },
        probe,
    );

    info!("🔊 Starting players...");
    for (instance_id, commands) in players {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        renderer.attach_player(instance_id, events_rx)?;
        tokio::spawn(loopback_player(instance_id, commands, events_tx));
    }

    // ========== PHASE 3 : Événements ==========
    sink.start_notifier(config.get_event_moderation(), |service, xml| {
        info!(%service, "📡 LastChange {}", xml);
    });

    match serde_json::to_string_pretty(&renderer.status()) {
        Ok(status) => info!("✅ MediaRenderer '{}' ready\n{}", renderer.friendly_name(), status),
        Err(e) => warn!("⚠️ Failed to serialize renderer status: {}", e),
    }

    tokio::signal::ctrl_c().await?;
    info!("👋 Shutting down");
    Ok(())
}
