//! Frontière avec le moteur de lecture.
//!
//! Le renderer ne décode rien lui-même : il envoie des commandes
//! ([`PlayerCommand`]) à un lecteur qui vit ailleurs (autre tâche, autre
//! processus) et reçoit en retour des notifications ([`PlaybackEvent`]).
//! Aucun état mutable n'est partagé entre les deux côtés, seulement des
//! messages.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::instance::RendererInstance;

/// Commands understood by the playback engine.
///
/// Every method is fire-and-forget: results come back as [`PlaybackEvent`]s.
pub trait PlaybackBackend: Send + Sync {
    fn load(&self, uri: &str, mime_class: &str, display_name: &str, metadata: &str);
    fn play(&self);
    fn pause(&self);
    fn stop(&self);
    fn seek(&self, position_ms: u64);
    fn set_volume(&self, volume: f64);
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlayerCommand {
    Load {
        uri: String,
        mime_class: String,
        display_name: String,
        metadata: String,
    },
    Play,
    Pause,
    Stop,
    Seek { position_ms: u64 },
    SetVolume { volume: f64 },
}

/// Asynchronous notifications from the playback engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlaybackEvent {
    Started,
    Paused,
    Stopped,
    EndOfMedia,
    /// Current position, in milliseconds.
    Position(u64),
    /// Media duration, in milliseconds.
    Duration(u64),
    /// Output level changed outside the renderer (hardware keys, mixer).
    Volume(f64),
}

/// Backend forwarding commands to the player over an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelBackend {
    tx: mpsc::UnboundedSender<PlayerCommand>,
}

impl ChannelBackend {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<PlayerCommand>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Returns `false` when the player side is gone and the command was dropped.
    fn send(&self, command: PlayerCommand) -> bool {
        debug!(?command, "Sending player command");
        match self.tx.send(command) {
            Ok(()) => true,
            Err(e) => {
                warn!("Player is gone, dropping command {:?}", e.0);
                false
            }
        }
    }
}

impl PlaybackBackend for ChannelBackend {
    fn load(&self, uri: &str, mime_class: &str, display_name: &str, metadata: &str) {
        self.send(PlayerCommand::Load {
            uri: uri.to_string(),
            mime_class: mime_class.to_string(),
            display_name: display_name.to_string(),
            metadata: metadata.to_string(),
        });
    }

    fn play(&self) {
        self.send(PlayerCommand::Play);
    }

    fn pause(&self) {
        self.send(PlayerCommand::Pause);
    }

    fn stop(&self) {
        self.send(PlayerCommand::Stop);
    }

    fn seek(&self, position_ms: u64) {
        self.send(PlayerCommand::Seek { position_ms });
    }

    fn set_volume(&self, volume: f64) {
        self.send(PlayerCommand::SetVolume { volume });
    }
}

/// Drains player notifications into `instance` until the sender side closes.
pub fn spawn_event_pump(
    instance: Arc<RendererInstance>,
    mut events: mpsc::UnboundedReceiver<PlaybackEvent>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            instance.handle_playback_event(event);
        }
        debug!(
            instance_id = instance.instance_id(),
            "Playback event stream closed"
        );
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_backend_commands() {
        let (backend, mut rx) = ChannelBackend::new();
        backend.load("file:///a.flac", "audio", "A", "<DIDL-Lite/>");
        backend.seek(90_000);
        backend.set_volume(0.5);

        assert!(matches!(rx.try_recv(), Ok(PlayerCommand::Load { ref uri, .. }) if uri == "file:///a.flac"));
        assert_eq!(rx.try_recv().unwrap(), PlayerCommand::Seek { position_ms: 90_000 });
        assert_eq!(rx.try_recv().unwrap(), PlayerCommand::SetVolume { volume: 0.5 });
    }

    #[test]
    fn test_channel_backend_player_gone() {
        let (backend, mut rx) = ChannelBackend::new();
        assert!(backend.send(PlayerCommand::Stop));
        assert_eq!(rx.try_recv().unwrap(), PlayerCommand::Stop);

        rx.close();
        assert!(!backend.send(PlayerCommand::Play));
        // the trait methods swallow the failure
        backend.pause();
        backend.seek(1000);

        // nothing was queued behind the closed receiver
        assert!(matches!(
            rx.try_recv(),
            Err(mpsc::error::TryRecvError::Disconnected)
        ));
    }
}
