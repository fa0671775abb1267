//! Erreurs du renderer et codes d'erreur UPnP.
//!
//! [`RendererError`] décrit les échecs internes (validation, état de transport).
//! Les adaptateurs de service les traduisent en [`ActionFault`], qui porte un
//! [`UpnpErrorCode`] directement exploitable par la couche SOAP.

use std::fmt;

use thiserror::Error;

use crate::model::{TransportAction, TransportState};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RendererError {
    #[error("Unknown instance id {0}")]
    InstanceNotFound(u32),

    #[error("Unsupported audio channel: {0}")]
    InvalidChannel(String),

    #[error("Volume {0} is out of range 0..=100")]
    VolumeOutOfRange(u16),

    #[error("CurrentURI can not be null or malformed: {0}")]
    InvalidUri(String),

    #[error("Only HTTP and file: resource identifiers are supported, got '{0}'")]
    UnsupportedScheme(String),

    #[error("Resource {uri} is not reachable: {reason}")]
    UnreachableResource { uri: String, reason: String },

    #[error("Only support audio type")]
    UnsupportedMediaType,

    #[error("Unsupported seek mode: {0}")]
    UnsupportedSeekMode(String),

    #[error("Transport action {action} is not allowed in state {state}")]
    IllegalTransportAction {
        action: TransportAction,
        state: TransportState,
    },
}

/// Codes d'erreur UPnP utilisés par AVTransport et RenderingControl.
///
/// Les deux services n'attribuent pas le même code à `INVALID_INSTANCE_ID`,
/// d'où les deux variantes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpnpErrorCode {
    InvalidArgs,
    ActionFailed,
    ArgumentValueInvalid,
    ArgumentValueOutOfRange,
    TransitionNotAvailable,
    SeekModeNotSupported,
    IllegalMimeType,
    ResourceNotFound,
    AvtInvalidInstanceId,
    RcsInvalidInstanceId,
}

impl UpnpErrorCode {
    pub fn code(&self) -> u16 {
        match self {
            UpnpErrorCode::InvalidArgs => 402,
            UpnpErrorCode::ActionFailed => 501,
            UpnpErrorCode::ArgumentValueInvalid => 600,
            UpnpErrorCode::ArgumentValueOutOfRange => 601,
            UpnpErrorCode::TransitionNotAvailable => 701,
            UpnpErrorCode::RcsInvalidInstanceId => 702,
            UpnpErrorCode::SeekModeNotSupported => 710,
            UpnpErrorCode::IllegalMimeType => 714,
            UpnpErrorCode::ResourceNotFound => 716,
            UpnpErrorCode::AvtInvalidInstanceId => 718,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            UpnpErrorCode::InvalidArgs => "Invalid Args",
            UpnpErrorCode::ActionFailed => "Action Failed",
            UpnpErrorCode::ArgumentValueInvalid => "Argument Value Invalid",
            UpnpErrorCode::ArgumentValueOutOfRange => "Argument Value Out of Range",
            UpnpErrorCode::TransitionNotAvailable => "Transition not available",
            UpnpErrorCode::SeekModeNotSupported => "Seek mode not supported",
            UpnpErrorCode::IllegalMimeType => "Illegal MIME-type",
            UpnpErrorCode::ResourceNotFound => "Resource not found",
            UpnpErrorCode::AvtInvalidInstanceId | UpnpErrorCode::RcsInvalidInstanceId => {
                "Invalid InstanceID"
            }
        }
    }
}

impl fmt::Display for UpnpErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code(), self.description())
    }
}

/// Fault renvoyé à la couche protocole (équivalent d'un `UPnPError` SOAP).
#[derive(Error, Debug, Clone, PartialEq)]
#[error("UPnP error {code}: {description}")]
pub struct ActionFault {
    pub code: UpnpErrorCode,
    pub description: String,
}

impl ActionFault {
    pub fn new(code: UpnpErrorCode, description: impl Into<String>) -> Self {
        Self {
            code,
            description: description.into(),
        }
    }

    /// Traduction pour le service AVTransport.
    pub fn from_avtransport(err: RendererError) -> Self {
        let code = match &err {
            RendererError::InstanceNotFound(_) => UpnpErrorCode::AvtInvalidInstanceId,
            RendererError::InvalidUri(_) | RendererError::UnsupportedScheme(_) => {
                UpnpErrorCode::InvalidArgs
            }
            RendererError::UnreachableResource { .. } => UpnpErrorCode::ResourceNotFound,
            RendererError::UnsupportedMediaType => UpnpErrorCode::IllegalMimeType,
            RendererError::UnsupportedSeekMode(_) => UpnpErrorCode::SeekModeNotSupported,
            RendererError::IllegalTransportAction { .. } => UpnpErrorCode::TransitionNotAvailable,
            RendererError::InvalidChannel(_) | RendererError::VolumeOutOfRange(_) => {
                UpnpErrorCode::ActionFailed
            }
        };
        Self::new(code, err.to_string())
    }

    /// Traduction pour le service RenderingControl.
    pub fn from_rendering_control(err: RendererError) -> Self {
        let code = match &err {
            RendererError::InstanceNotFound(_) => UpnpErrorCode::RcsInvalidInstanceId,
            RendererError::InvalidChannel(_) => UpnpErrorCode::ArgumentValueInvalid,
            RendererError::VolumeOutOfRange(_) => UpnpErrorCode::ArgumentValueOutOfRange,
            _ => UpnpErrorCode::ActionFailed,
        };
        Self::new(code, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_avtransport_mapping() {
        let fault = ActionFault::from_avtransport(RendererError::InstanceNotFound(3));
        assert_eq!(fault.code.code(), 718);

        let fault = ActionFault::from_avtransport(RendererError::UnsupportedSeekMode(
            "ABS_TIME".to_string(),
        ));
        assert_eq!(fault.code, UpnpErrorCode::SeekModeNotSupported);
        assert!(fault.description.contains("ABS_TIME"));

        let fault = ActionFault::from_avtransport(RendererError::IllegalTransportAction {
            action: TransportAction::Seek,
            state: TransportState::Stopped,
        });
        assert_eq!(fault.code.code(), 701);
        assert_eq!(
            fault.description,
            "Transport action Seek is not allowed in state STOPPED"
        );
    }

    #[test]
    fn test_rendering_control_mapping() {
        let fault = ActionFault::from_rendering_control(RendererError::InstanceNotFound(1));
        assert_eq!(fault.code.code(), 702);

        let fault =
            ActionFault::from_rendering_control(RendererError::InvalidChannel("LF".to_string()));
        assert_eq!(fault.code.code(), 600);

        let fault = ActionFault::from_rendering_control(RendererError::VolumeOutOfRange(120));
        assert_eq!(fault.code.code(), 601);
    }
}
