//! Types du modèle AVTransport / RenderingControl manipulés par le renderer.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::time_utils::ZERO_TIME;

/// AVTransport `TransportState`.
///
/// `Transitioning` and `Recording` belong to the service vocabulary but are
/// never entered by this renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransportState {
    NoMediaPresent,
    Stopped,
    Playing,
    PausedPlayback,
    Transitioning,
    Recording,
}

impl TransportState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportState::NoMediaPresent => "NO_MEDIA_PRESENT",
            TransportState::Stopped => "STOPPED",
            TransportState::Playing => "PLAYING",
            TransportState::PausedPlayback => "PAUSED_PLAYBACK",
            TransportState::Transitioning => "TRANSITIONING",
            TransportState::Recording => "RECORDING",
        }
    }

    /// Actions accepted while in this state, in the order they are evented.
    pub fn allowed_actions(&self) -> &'static [TransportAction] {
        match self {
            TransportState::Stopped => &[TransportAction::Play],
            TransportState::Playing => &[
                TransportAction::Stop,
                TransportAction::Pause,
                TransportAction::Seek,
            ],
            TransportState::PausedPlayback => &[
                TransportAction::Stop,
                TransportAction::Pause,
                TransportAction::Seek,
                TransportAction::Play,
            ],
            TransportState::NoMediaPresent
            | TransportState::Transitioning
            | TransportState::Recording => &[],
        }
    }

    pub fn allows(&self, action: TransportAction) -> bool {
        self.allowed_actions().contains(&action)
    }
}

impl fmt::Display for TransportState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransportAction {
    Play,
    Stop,
    Pause,
    Seek,
    Next,
    Previous,
    Record,
}

impl TransportAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportAction::Play => "Play",
            TransportAction::Stop => "Stop",
            TransportAction::Pause => "Pause",
            TransportAction::Seek => "Seek",
            TransportAction::Next => "Next",
            TransportAction::Previous => "Previous",
            TransportAction::Record => "Record",
        }
    }
}

impl fmt::Display for TransportAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Valeur de la variable `CurrentTransportActions` (liste CSV).
pub fn format_transport_actions(actions: &[TransportAction]) -> String {
    actions
        .iter()
        .map(TransportAction::as_str)
        .collect::<Vec<_>>()
        .join(",")
}

/// RenderingControl audio channel. Only `Master` is supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Channel {
    Master,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Master => "Master",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Channel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Master" => Ok(Channel::Master),
            other => Err(other.to_string()),
        }
    }
}

/// AVTransport `A_ARG_TYPE_SeekMode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeekMode {
    TrackNr,
    RelTime,
    AbsTime,
}

impl FromStr for SeekMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "TRACK_NR" => Ok(SeekMode::TrackNr),
            "REL_TIME" => Ok(SeekMode::RelTime),
            "ABS_TIME" => Ok(SeekMode::AbsTime),
            other => Err(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StorageMedium {
    None,
    Network,
    NotImplemented,
}

impl StorageMedium {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageMedium::None => "NONE",
            StorageMedium::Network => "NETWORK",
            StorageMedium::NotImplemented => "NOT_IMPLEMENTED",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlayMode {
    Normal,
}

/// Résultat de `GetMediaInfo`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaInfo {
    pub current_uri: String,
    pub current_uri_metadata: String,
    pub media_duration: String,
    pub number_of_tracks: u32,
    pub play_medium: StorageMedium,
}

impl Default for MediaInfo {
    fn default() -> Self {
        Self {
            current_uri: String::new(),
            current_uri_metadata: String::new(),
            media_duration: ZERO_TIME.to_string(),
            number_of_tracks: 0,
            play_medium: StorageMedium::None,
        }
    }
}

impl MediaInfo {
    /// Media freshly loaded from the network, duration still unknown.
    pub fn loaded(uri: &str, metadata: &str) -> Self {
        Self {
            current_uri: uri.to_string(),
            current_uri_metadata: metadata.to_string(),
            media_duration: ZERO_TIME.to_string(),
            number_of_tracks: 1,
            play_medium: StorageMedium::Network,
        }
    }
}

/// Résultat de `GetPositionInfo`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionInfo {
    pub track: u32,
    pub track_duration: String,
    pub track_metadata: String,
    pub track_uri: String,
    pub rel_time: String,
    pub abs_time: String,
}

impl Default for PositionInfo {
    fn default() -> Self {
        Self {
            track: 0,
            track_duration: ZERO_TIME.to_string(),
            track_metadata: String::new(),
            track_uri: String::new(),
            rel_time: ZERO_TIME.to_string(),
            abs_time: ZERO_TIME.to_string(),
        }
    }
}

impl PositionInfo {
    pub fn loaded(uri: &str, metadata: &str) -> Self {
        Self {
            track: 1,
            track_metadata: metadata.to_string(),
            track_uri: uri.to_string(),
            ..Self::default()
        }
    }
}

/// Résultat de `GetTransportInfo`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportInfo {
    pub current_transport_state: TransportState,
    pub current_transport_status: String,
    pub current_speed: String,
}

impl TransportInfo {
    pub fn new(state: TransportState) -> Self {
        Self {
            current_transport_state: state,
            current_transport_status: "OK".to_string(),
            current_speed: "1".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceCapabilities {
    pub play_media: Vec<StorageMedium>,
    pub rec_media: Vec<StorageMedium>,
    pub rec_quality_modes: Vec<String>,
}

impl Default for DeviceCapabilities {
    fn default() -> Self {
        Self {
            play_media: vec![StorageMedium::Network],
            rec_media: vec![StorageMedium::NotImplemented],
            rec_quality_modes: vec!["NOT_IMPLEMENTED".to_string()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportSettings {
    pub play_mode: PlayMode,
    pub rec_quality_mode: String,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            play_mode: PlayMode::Normal,
            rec_quality_mode: "NOT_IMPLEMENTED".to_string(),
        }
    }
}

/// State and derived action set, read together under the instance lock.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransportSnapshot {
    pub instance_id: u32,
    pub state: TransportState,
    pub actions: Vec<TransportAction>,
    pub volume: u16,
    pub mute: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_actions() {
        assert_eq!(
            TransportState::Stopped.allowed_actions(),
            &[TransportAction::Play]
        );
        assert!(TransportState::Playing.allows(TransportAction::Seek));
        assert!(!TransportState::Playing.allows(TransportAction::Play));
        assert!(TransportState::PausedPlayback.allows(TransportAction::Pause));
        assert!(TransportState::NoMediaPresent.allowed_actions().is_empty());
    }

    #[test]
    fn test_format_transport_actions() {
        assert_eq!(
            format_transport_actions(TransportState::PausedPlayback.allowed_actions()),
            "Stop,Pause,Seek,Play"
        );
        assert_eq!(
            format_transport_actions(TransportState::NoMediaPresent.allowed_actions()),
            ""
        );
    }

    #[test]
    fn test_parse_vocabularies() {
        assert_eq!("REL_TIME".parse::<SeekMode>(), Ok(SeekMode::RelTime));
        assert!("rel_time".parse::<SeekMode>().is_err());
        assert_eq!("Master".parse::<Channel>(), Ok(Channel::Master));
        assert!("LF".parse::<Channel>().is_err());
    }
}
