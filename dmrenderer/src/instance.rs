//! Per-instance transport and volume state machine.
//!
//! A [`RendererInstance`] owns the transport state, media/position info and
//! volume of one rendering pipeline. Every read and write goes through a
//! single mutex so that derived values (the action set of the current state,
//! mute computed from volume) are never observed torn.
//!
//! Commands from control points are validated against the current state and
//! forwarded to the [`PlaybackBackend`]; they do not change the transport
//! state themselves. State changes come from the backend's confirmations
//! ([`PlaybackEvent`]), except `set_uri` which always stops the transport.
//!
//! ```text
//!                 Play                    Pause
//!   STOPPED ───────────────▶ PLAYING ───────────────▶ PAUSED_PLAYBACK
//!      ▲                       │  ▲                        │
//!      └────────── Stop ───────┘  └────────── Play ────────┘
//! ```

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::backend::{PlaybackBackend, PlaybackEvent};
use crate::errors::RendererError;
use crate::events::{
    AV_TRANSPORT_URI, CURRENT_MEDIA_DURATION, CURRENT_TRACK_DURATION, CURRENT_TRACK_URI,
    CURRENT_TRANSPORT_ACTIONS, EventBatch, EventService, EventSink, MUTE, StateChange,
    TRANSPORT_STATE, VOLUME,
};
use crate::model::{
    Channel, MediaInfo, PositionInfo, TransportAction, TransportInfo, TransportSnapshot,
    TransportState, format_transport_actions,
};
use crate::time_utils::format_time_ms;

/// A validated media resource ready to be loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaSource {
    pub uri: String,
    pub mime_class: String,
    pub display_name: String,
    pub metadata: String,
}

#[derive(Debug)]
struct InstanceState {
    transport_state: TransportState,
    media_info: MediaInfo,
    position_info: PositionInfo,
    /// Last level applied, in [0.0, 1.0].
    volume: f64,
    /// Level before the last volume change, restored on unmute.
    stored_volume: f64,
}

pub struct RendererInstance {
    instance_id: u32,
    state: Mutex<InstanceState>,
    events: Arc<dyn EventSink>,
    backend: Arc<dyn PlaybackBackend>,
}

impl std::fmt::Debug for RendererInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RendererInstance")
            .field("instance_id", &self.instance_id)
            .field("state", &*self.state.lock())
            .finish()
    }
}

/// Volume fraction to the integer percentage used on the wire.
pub fn volume_to_percent(volume: f64) -> u16 {
    (volume.clamp(0.0, 1.0) * 100.0).round() as u16
}

impl RendererInstance {
    pub fn new(
        instance_id: u32,
        initial_volume: f64,
        events: Arc<dyn EventSink>,
        backend: Arc<dyn PlaybackBackend>,
    ) -> Self {
        let volume = initial_volume.clamp(0.0, 1.0);
        Self {
            instance_id,
            state: Mutex::new(InstanceState {
                transport_state: TransportState::Stopped,
                media_info: MediaInfo::default(),
                position_info: PositionInfo::default(),
                volume,
                stored_volume: volume,
            }),
            events,
            backend,
        }
    }

    pub fn instance_id(&self) -> u32 {
        self.instance_id
    }

    // ------------------------------------------------------------------
    // Projections
    // ------------------------------------------------------------------

    pub fn transport_state(&self) -> TransportState {
        self.state.lock().transport_state
    }

    pub fn transport_info(&self) -> TransportInfo {
        TransportInfo::new(self.state.lock().transport_state)
    }

    pub fn media_info(&self) -> MediaInfo {
        self.state.lock().media_info.clone()
    }

    pub fn position_info(&self) -> PositionInfo {
        self.state.lock().position_info.clone()
    }

    pub fn current_transport_actions(&self) -> Vec<TransportAction> {
        self.state.lock().transport_state.allowed_actions().to_vec()
    }

    pub fn snapshot(&self) -> TransportSnapshot {
        let state = self.state.lock();
        TransportSnapshot {
            instance_id: self.instance_id,
            state: state.transport_state,
            actions: state.transport_state.allowed_actions().to_vec(),
            volume: volume_to_percent(state.volume),
            mute: state.volume == 0.0,
        }
    }

    pub fn volume(&self) -> f64 {
        self.state.lock().volume
    }

    pub fn volume_percent(&self) -> u16 {
        volume_to_percent(self.volume())
    }

    pub fn mute(&self) -> bool {
        self.state.lock().volume == 0.0
    }

    // ------------------------------------------------------------------
    // AVTransport commands
    // ------------------------------------------------------------------

    /// Loads a new resource. The transport always ends up STOPPED.
    pub fn set_uri(&self, source: MediaSource) {
        info!(instance_id = self.instance_id, uri = %source.uri, "setURI");
        let mut state = self.state.lock();

        state.media_info = MediaInfo::loaded(&source.uri, &source.metadata);
        state.position_info = PositionInfo::loaded(&source.uri, &source.metadata);

        self.publish(
            EventService::AVTransport,
            vec![
                StateChange::new(AV_TRANSPORT_URI, source.uri.as_str()),
                StateChange::new(CURRENT_TRACK_URI, source.uri.as_str()),
            ],
        );

        self.transition(&mut state, TransportState::Stopped);

        self.backend.load(
            &source.uri,
            &source.mime_class,
            &source.display_name,
            &source.metadata,
        );
    }

    pub fn play(&self) -> Result<(), RendererError> {
        let state = self.state.lock();
        Self::check_action(&state, TransportAction::Play)?;
        info!(instance_id = self.instance_id, "play");
        self.backend.play();
        Ok(())
    }

    pub fn pause(&self) -> Result<(), RendererError> {
        let state = self.state.lock();
        Self::check_action(&state, TransportAction::Pause)?;
        if state.transport_state == TransportState::PausedPlayback {
            debug!(instance_id = self.instance_id, "Already paused, ignoring pause");
            return Ok(());
        }
        info!(instance_id = self.instance_id, "pause");
        self.backend.pause();
        Ok(())
    }

    pub fn stop(&self) -> Result<(), RendererError> {
        let state = self.state.lock();
        Self::check_action(&state, TransportAction::Stop)?;
        info!(instance_id = self.instance_id, "stop");
        self.backend.stop();
        Ok(())
    }

    pub fn seek(&self, position_ms: u64) -> Result<(), RendererError> {
        let state = self.state.lock();
        Self::check_action(&state, TransportAction::Seek)?;
        info!(instance_id = self.instance_id, position_ms, "seek");
        self.backend.seek(position_ms);
        Ok(())
    }

    fn check_action(state: &InstanceState, action: TransportAction) -> Result<(), RendererError> {
        if state.transport_state.allows(action) {
            Ok(())
        } else {
            Err(RendererError::IllegalTransportAction {
                action,
                state: state.transport_state,
            })
        }
    }

    // ------------------------------------------------------------------
    // RenderingControl commands
    // ------------------------------------------------------------------

    /// Applies `volume` (a fraction in [0.0, 1.0]) and forwards it to the backend.
    pub fn set_volume(&self, volume: f64) {
        info!(instance_id = self.instance_id, volume, "setVolume");
        let mut state = self.state.lock();
        self.apply_volume(&mut state, volume, true);
    }

    /// Mute is volume zero: muting drops the volume, unmuting restores the
    /// level stored before the drop.
    pub fn set_mute(&self, desired_mute: bool) {
        let mut state = self.state.lock();
        if desired_mute && state.volume > 0.0 {
            debug!(instance_id = self.instance_id, "Switching mute ON");
            self.apply_volume(&mut state, 0.0, true);
        } else if !desired_mute && state.volume == 0.0 {
            let restored = state.stored_volume;
            debug!(instance_id = self.instance_id, restored, "Switching mute OFF");
            self.apply_volume(&mut state, restored, true);
        }
    }

    fn apply_volume(&self, state: &mut InstanceState, volume: f64, command_backend: bool) {
        let volume = volume.clamp(0.0, 1.0);
        let previous = state.volume;
        state.stored_volume = previous;
        state.volume = volume;

        if command_backend {
            self.backend.set_volume(volume);
        }

        let mut changes = vec![StateChange::on_channel(
            VOLUME,
            Channel::Master,
            volume_to_percent(volume).to_string(),
        )];

        let crossed_zero = (previous == 0.0 && volume > 0.0) || (previous > 0.0 && volume == 0.0);
        if crossed_zero {
            let muted = previous > 0.0;
            changes.push(StateChange::on_channel(
                MUTE,
                Channel::Master,
                if muted { "1" } else { "0" },
            ));
        }

        self.publish(EventService::RenderingControl, changes);
    }

    // ------------------------------------------------------------------
    // Backend callbacks
    // ------------------------------------------------------------------

    pub fn handle_playback_event(&self, event: PlaybackEvent) {
        let mut state = self.state.lock();
        match event {
            PlaybackEvent::Started => self.transition(&mut state, TransportState::Playing),
            PlaybackEvent::Paused => self.transition(&mut state, TransportState::PausedPlayback),
            PlaybackEvent::Stopped => self.transition(&mut state, TransportState::Stopped),
            PlaybackEvent::EndOfMedia => {
                debug!(instance_id = self.instance_id, "End of media");
                self.transition(&mut state, TransportState::NoMediaPresent);
            }
            PlaybackEvent::Position(position_ms) => {
                let time = format_time_ms(position_ms);
                let duration = state.media_info.media_duration.clone();
                let position = &mut state.position_info;
                position.track_duration = duration;
                position.rel_time = time.clone();
                position.abs_time = time;
            }
            PlaybackEvent::Duration(duration_ms) => {
                let duration = format_time_ms(duration_ms);
                debug!(instance_id = self.instance_id, %duration, "Duration known");
                state.media_info.media_duration = duration.clone();
                state.position_info.track_duration = duration.clone();
                self.publish(
                    EventService::AVTransport,
                    vec![
                        StateChange::new(CURRENT_TRACK_DURATION, duration.as_str()),
                        StateChange::new(CURRENT_MEDIA_DURATION, duration),
                    ],
                );
            }
            PlaybackEvent::Volume(volume) => {
                if volume.clamp(0.0, 1.0) != state.volume {
                    self.apply_volume(&mut state, volume, false);
                }
            }
        }
    }

    fn transition(&self, state: &mut InstanceState, new_state: TransportState) {
        debug!(
            instance_id = self.instance_id,
            "Current state is: {}, changing to new state: {}", state.transport_state, new_state
        );
        state.transport_state = new_state;

        self.publish(
            EventService::AVTransport,
            vec![
                StateChange::new(TRANSPORT_STATE, new_state.as_str()),
                StateChange::new(
                    CURRENT_TRANSPORT_ACTIONS,
                    format_transport_actions(new_state.allowed_actions()),
                ),
            ],
        );
    }

    fn publish(&self, service: EventService, changes: Vec<StateChange>) {
        let batch = EventBatch::new(self.instance_id, service, changes);
        if let Err(e) = self.events.publish(batch) {
            warn!(
                instance_id = self.instance_id,
                %service, "Failed to publish event: {}", e
            );
        }
    }
}
