//! Assemblage du MediaRenderer.
//!
//! [`MediaRenderer`] regroupe le registre d'instances et les deux services
//! AV qui le partagent. La configuration vient de `dmrconfig`.

use std::sync::Arc;

use dmrconfig::{Config, RendererSettings};
use serde::Serialize;
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::info;

use crate::avtransport::TransportService;
use crate::backend::{PlaybackBackend, PlaybackEvent, spawn_event_pump};
use crate::errors::RendererError;
use crate::events::EventSink;
use crate::instance::RendererInstance;
use crate::model::TransportSnapshot;
use crate::probe::ResourceProbe;
use crate::registry::InstanceRegistry;
use crate::renderingcontrol::RenderingControlService;

/// Audio MediaRenderer with its AVTransport and RenderingControl services.
///
/// Cloning is cheap; every clone shares the same instances.
///
/// # Exemple
///
/// ```ignore
/// let renderer = MediaRenderer::from_config(&get_config(), sink, |_| backend.clone(), probe);
/// renderer.transport().play(0, "1")?;
/// ```
#[derive(Debug, Clone)]
pub struct MediaRenderer {
    friendly_name: String,
    registry: InstanceRegistry,
    transport: TransportService,
    rendering_control: RenderingControlService,
}

/// Serializable view of the whole renderer.
#[derive(Debug, Clone, Serialize)]
pub struct RendererStatus {
    pub friendly_name: String,
    pub instances: Vec<TransportSnapshot>,
}

impl MediaRenderer {
    /// Builds one instance per configured id. `backend_for` is called once
    /// per instance id.
    pub fn new<B>(
        settings: &RendererSettings,
        events: Arc<dyn EventSink>,
        mut backend_for: B,
        probe: Arc<dyn ResourceProbe>,
    ) -> Self
    where
        B: FnMut(u32) -> Arc<dyn PlaybackBackend>,
    {
        let initial_volume = f64::from(settings.initial_volume.min(100)) / 100.0;
        let registry = InstanceRegistry::with_ids(&settings.instances, |id| {
            RendererInstance::new(id, initial_volume, events.clone(), backend_for(id))
        });

        info!(
            friendly_name = %settings.friendly_name,
            instances = ?registry.instance_ids(),
            initial_volume = settings.initial_volume,
            "MediaRenderer ready"
        );

        Self {
            friendly_name: settings.friendly_name.clone(),
            transport: TransportService::new(registry.clone(), probe),
            rendering_control: RenderingControlService::new(registry.clone()),
            registry,
        }
    }

    pub fn from_config<B>(
        config: &Config,
        events: Arc<dyn EventSink>,
        backend_for: B,
        probe: Arc<dyn ResourceProbe>,
    ) -> Self
    where
        B: FnMut(u32) -> Arc<dyn PlaybackBackend>,
    {
        Self::new(&config.get_renderer_settings(), events, backend_for, probe)
    }

    pub fn friendly_name(&self) -> &str {
        &self.friendly_name
    }

    pub fn registry(&self) -> &InstanceRegistry {
        &self.registry
    }

    pub fn transport(&self) -> &TransportService {
        &self.transport
    }

    pub fn rendering_control(&self) -> &RenderingControlService {
        &self.rendering_control
    }

    /// Routes the player notifications of `instance_id` into its state machine.
    pub fn attach_player(
        &self,
        instance_id: u32,
        events: mpsc::UnboundedReceiver<PlaybackEvent>,
    ) -> Result<JoinHandle<()>, RendererError> {
        let instance = self.registry.get(instance_id)?;
        Ok(spawn_event_pump(instance, events))
    }

    pub fn status(&self) -> RendererStatus {
        RendererStatus {
            friendly_name: self.friendly_name.clone(),
            instances: self.registry.instances().map(|i| i.snapshot()).collect(),
        }
    }
}
