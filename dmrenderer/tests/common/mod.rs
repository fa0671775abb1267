//! Doublures partagées par les tests d'intégration.
#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use dmrconfig::RendererSettings;
use dmrenderer::probe::ProbeError;
use dmrenderer::{
    ChannelBackend, ChannelEventSink, EventBatch, MediaRenderer, PlaybackBackend, PlaybackEvent,
    PlayerCommand, RendererInstance, ResourceProbe,
};
use parking_lot::Mutex;
use tokio::sync::mpsc::UnboundedReceiver;
use url::Url;

pub const TRACK_URI: &str = "http://192.168.1.20:9000/music/track01.flac";

pub const AUDIO_METADATA: &str = r#"<DIDL-Lite xmlns="urn:schemas-upnp-org:metadata-1-0/DIDL-Lite/" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:upnp="urn:schemas-upnp-org:metadata-1-0/upnp/"><item id="1" parentID="0" restricted="1"><dc:title>Kind of Blue &amp; more</dc:title><upnp:class>object.item.audioItem.musicTrack</upnp:class><res protocolInfo="http-get:*:audio/flac:*">http://192.168.1.20:9000/music/track01.flac</res></item></DIDL-Lite>"#;

pub const VIDEO_METADATA: &str = r#"<DIDL-Lite xmlns="urn:schemas-upnp-org:metadata-1-0/DIDL-Lite/" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:upnp="urn:schemas-upnp-org:metadata-1-0/upnp/"><item id="2" parentID="0" restricted="1"><dc:title>Movie</dc:title><upnp:class>object.item.videoItem.movie</upnp:class></item></DIDL-Lite>"#;

pub const UNTITLED_METADATA: &str = r#"<DIDL-Lite xmlns:upnp="urn:schemas-upnp-org:metadata-1-0/upnp/"><item><upnp:class>object.item.audioItem</upnp:class></item></DIDL-Lite>"#;

/// Probe answering from a fixed list of unreachable hosts, recording calls.
#[derive(Debug, Default)]
pub struct StubProbe {
    unreachable_hosts: Vec<String>,
    calls: Mutex<Vec<String>>,
}

impl StubProbe {
    pub fn reachable() -> Self {
        Self::default()
    }

    pub fn unreachable(host: &str) -> Self {
        Self {
            unreachable_hosts: vec![host.to_string()],
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl ResourceProbe for StubProbe {
    async fn probe(&self, url: &Url) -> Result<(), ProbeError> {
        self.calls.lock().push(url.to_string());
        match url.host_str() {
            Some(host) if self.unreachable_hosts.iter().any(|h| h == host) => {
                Err(ProbeError::Status(404))
            }
            _ => Ok(()),
        }
    }
}

/// Renderer wired to channel doubles.
pub struct Harness {
    pub renderer: MediaRenderer,
    pub probe: Arc<StubProbe>,
    pub events: UnboundedReceiver<EventBatch>,
    pub commands: UnboundedReceiver<PlayerCommand>,
}

impl Harness {
    pub fn new(instances: &[u32], initial_volume: u16) -> Self {
        Self::with_probe(instances, initial_volume, StubProbe::reachable())
    }

    pub fn with_probe(instances: &[u32], initial_volume: u16, probe: StubProbe) -> Self {
        let settings = RendererSettings {
            instances: instances.to_vec(),
            initial_volume,
            ..RendererSettings::default()
        };
        let (sink, events) = ChannelEventSink::new();
        let (backend, commands) = ChannelBackend::new();
        let backend: Arc<dyn PlaybackBackend> = Arc::new(backend);
        let probe = Arc::new(probe);

        let renderer = MediaRenderer::new(
            &settings,
            Arc::new(sink),
            |_| backend.clone(),
            probe.clone(),
        );

        Self {
            renderer,
            probe,
            events,
            commands,
        }
    }

    pub fn instance(&self, instance_id: u32) -> Arc<RendererInstance> {
        self.renderer.registry().get(instance_id).unwrap()
    }

    /// Simulates a player notification for `instance_id`.
    pub fn confirm(&self, instance_id: u32, event: PlaybackEvent) {
        self.instance(instance_id).handle_playback_event(event);
    }

    pub fn drain_events(&mut self) -> Vec<EventBatch> {
        let mut out = Vec::new();
        while let Ok(batch) = self.events.try_recv() {
            out.push(batch);
        }
        out
    }

    pub fn drain_commands(&mut self) -> Vec<PlayerCommand> {
        let mut out = Vec::new();
        while let Ok(command) = self.commands.try_recv() {
            out.push(command);
        }
        out
    }
}
