//! # AVTransport Service - Adaptateur du service de contrôle de transport
//!
//! Ce module implémente la partie métier du service AVTransport:1 pour un
//! MediaRenderer **audio**. La couche protocole (SOAP, GENA) appelle
//! [`TransportService`] avec des arguments déjà désérialisés et reçoit soit
//! un résultat typé, soit un [`ActionFault`] prêt à être encodé.
//!
//! ## Actions
//!
//! - **Contrôle de lecture** : Play, Pause, Stop, Seek (`REL_TIME` uniquement)
//! - **Gestion des URIs** : SetAVTransportURI (`http:` et `file:`, items audio)
//! - **Information d'état** : GetTransportInfo, GetPositionInfo, GetMediaInfo,
//!   GetDeviceCapabilities, GetTransportSettings, GetCurrentTransportActions
//!
//! Les actions Record, Next, Previous, SetNextAVTransportURI, SetPlayMode et
//! SetRecordQualityMode sont acceptées mais sans effet.

pub mod uri;

use std::sync::Arc;

use tracing::{debug, info};

use crate::didl::{AUDIO_MIME_CLASS, extract_title, is_audio_item};
use crate::errors::{ActionFault, RendererError};
use crate::instance::{MediaSource, RendererInstance};
use crate::model::{
    DeviceCapabilities, MediaInfo, PositionInfo, SeekMode, TransportAction, TransportInfo,
    TransportSettings,
};
use crate::probe::ResourceProbe;
use crate::registry::InstanceRegistry;
use crate::time_utils::parse_time;

use uri::{UriKind, parse_current_uri};

pub type AvtResult<T> = Result<T, ActionFault>;

#[derive(Clone)]
pub struct TransportService {
    registry: InstanceRegistry,
    probe: Arc<dyn ResourceProbe>,
}

impl std::fmt::Debug for TransportService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportService")
            .field("registry", &self.registry)
            .finish()
    }
}

impl TransportService {
    pub fn new(registry: InstanceRegistry, probe: Arc<dyn ResourceProbe>) -> Self {
        Self { registry, probe }
    }

    fn instance(&self, instance_id: u32) -> AvtResult<Arc<RendererInstance>> {
        self.registry.get(instance_id).map_err(ActionFault::from_avtransport)
    }

    pub fn current_instance_ids(&self) -> Vec<u32> {
        self.registry.instance_ids()
    }

    /// `SetAVTransportURI`.
    ///
    /// The reachability probe of `http:` resources runs before the instance
    /// lock is taken.
    pub async fn set_av_transport_uri(
        &self,
        instance_id: u32,
        current_uri: &str,
        current_uri_metadata: &str,
    ) -> AvtResult<()> {
        debug!(instance_id, "{}---{}", current_uri, current_uri_metadata);
        let instance = self.instance(instance_id)?;

        let (url, kind) = parse_current_uri(current_uri).map_err(ActionFault::from_avtransport)?;

        if kind == UriKind::Http {
            self.probe.probe(&url).await.map_err(|e| {
                ActionFault::from_avtransport(RendererError::UnreachableResource {
                    uri: current_uri.to_string(),
                    reason: e.to_string(),
                })
            })?;
        }

        if !is_audio_item(current_uri_metadata) {
            return Err(ActionFault::from_avtransport(
                RendererError::UnsupportedMediaType,
            ));
        }

        let display_name = extract_title(current_uri_metadata);
        instance.set_uri(MediaSource {
            uri: current_uri.trim().to_string(),
            mime_class: AUDIO_MIME_CLASS.to_string(),
            display_name,
            metadata: current_uri_metadata.to_string(),
        });
        Ok(())
    }

    pub fn get_media_info(&self, instance_id: u32) -> AvtResult<MediaInfo> {
        Ok(self.instance(instance_id)?.media_info())
    }

    pub fn get_transport_info(&self, instance_id: u32) -> AvtResult<TransportInfo> {
        Ok(self.instance(instance_id)?.transport_info())
    }

    pub fn get_position_info(&self, instance_id: u32) -> AvtResult<PositionInfo> {
        Ok(self.instance(instance_id)?.position_info())
    }

    pub fn get_device_capabilities(&self, instance_id: u32) -> AvtResult<DeviceCapabilities> {
        self.instance(instance_id)?;
        Ok(DeviceCapabilities::default())
    }

    pub fn get_transport_settings(&self, instance_id: u32) -> AvtResult<TransportSettings> {
        self.instance(instance_id)?;
        Ok(TransportSettings::default())
    }

    pub fn get_current_transport_actions(
        &self,
        instance_id: u32,
    ) -> AvtResult<Vec<TransportAction>> {
        Ok(self.instance(instance_id)?.current_transport_actions())
    }

    /// `Play`. The requested speed is accepted and ignored.
    pub fn play(&self, instance_id: u32, speed: &str) -> AvtResult<()> {
        debug!(instance_id, speed, "Play requested");
        self.instance(instance_id)?
            .play()
            .map_err(ActionFault::from_avtransport)
    }

    pub fn pause(&self, instance_id: u32) -> AvtResult<()> {
        self.instance(instance_id)?
            .pause()
            .map_err(ActionFault::from_avtransport)
    }

    pub fn stop(&self, instance_id: u32) -> AvtResult<()> {
        self.instance(instance_id)?
            .stop()
            .map_err(ActionFault::from_avtransport)
    }

    /// `Seek`. Only `REL_TIME` is supported; a malformed target is reported
    /// with the same fault as an unsupported unit.
    pub fn seek(&self, instance_id: u32, unit: &str, target: &str) -> AvtResult<()> {
        let instance = self.instance(instance_id)?;

        let unsupported =
            || ActionFault::from_avtransport(RendererError::UnsupportedSeekMode(unit.to_string()));

        match unit.parse::<SeekMode>() {
            Ok(SeekMode::RelTime) => {}
            _ => return Err(unsupported()),
        }
        let position_ms = parse_time(target)
            .ok()
            .and_then(|seconds| seconds.checked_mul(1000))
            .ok_or_else(unsupported)?;

        instance
            .seek(position_ms)
            .map_err(ActionFault::from_avtransport)
    }

    // Actions acceptées sans effet.

    pub fn record(&self, instance_id: u32) -> AvtResult<()> {
        self.ignored(instance_id, "Record")
    }

    pub fn next(&self, instance_id: u32) -> AvtResult<()> {
        self.ignored(instance_id, "Next")
    }

    pub fn previous(&self, instance_id: u32) -> AvtResult<()> {
        self.ignored(instance_id, "Previous")
    }

    pub fn set_next_av_transport_uri(
        &self,
        instance_id: u32,
        _next_uri: &str,
        _next_uri_metadata: &str,
    ) -> AvtResult<()> {
        self.ignored(instance_id, "SetNextAVTransportURI")
    }

    pub fn set_play_mode(&self, instance_id: u32, _new_play_mode: &str) -> AvtResult<()> {
        self.ignored(instance_id, "SetPlayMode")
    }

    pub fn set_record_quality_mode(
        &self,
        instance_id: u32,
        _new_record_quality_mode: &str,
    ) -> AvtResult<()> {
        self.ignored(instance_id, "SetRecordQualityMode")
    }

    fn ignored(&self, instance_id: u32, action: &str) -> AvtResult<()> {
        self.instance(instance_id)?;
        info!(instance_id, action, "Action not implemented, ignoring");
        Ok(())
    }
}
