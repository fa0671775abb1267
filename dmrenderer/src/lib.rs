//! Cœur d'un MediaRenderer UPnP/DLNA audio.
//!
//! Ce crate implémente la logique métier d'un MediaRenderer audio-only :
//! une machine d'états de transport par instance, le contrôle du volume et
//! du mute, et le calcul des variables événementées.
//!
//! # Architecture
//!
//! - **AVTransport** ([`TransportService`]) : SetAVTransportURI, Play, Pause,
//!   Stop, Seek et les requêtes d'état
//! - **RenderingControl** ([`RenderingControlService`]) : volume et mute sur
//!   le canal `Master`
//! - **Instances** ([`RendererInstance`], [`InstanceRegistry`]) : un verrou par
//!   instance, aucune contention entre instances
//! - **Événements** ([`EventSink`], [`LastChangeSink`]) : lots de changements
//!   publiés dans l'ordre de validation
//! - **Lecteur** ([`PlaybackBackend`]) : commandes envoyées par messages,
//!   confirmations reçues sous forme de [`PlaybackEvent`]
//!
//! La couche protocole (SSDP, SOAP, GENA) n'est pas ici : elle appelle les
//! services avec des arguments déjà désérialisés.
//!
//! # Utilisation
//!
//! ```ignore
//! use dmrenderer::{ChannelBackend, LastChangeSink, HttpProbe, MediaRenderer};
//!
//! let sink = Arc::new(LastChangeSink::new());
//! let (backend, commands) = ChannelBackend::new();
//! let backend: Arc<dyn PlaybackBackend> = Arc::new(backend);
//! let renderer = MediaRenderer::from_config(&config, sink, |_| backend.clone(), probe);
//! ```

pub mod avtransport;
pub mod backend;
pub mod device;
pub mod didl;
pub mod errors;
pub mod events;
pub mod instance;
pub mod lastchange;
pub mod model;
pub mod probe;
pub mod registry;
pub mod renderingcontrol;
pub mod time_utils;

pub use avtransport::TransportService;
pub use backend::{ChannelBackend, PlaybackBackend, PlaybackEvent, PlayerCommand};
pub use device::{MediaRenderer, RendererStatus};
pub use errors::{ActionFault, RendererError, UpnpErrorCode};
pub use events::{ChannelEventSink, EventBatch, EventService, EventSink, MultiSink, StateChange};
pub use instance::{MediaSource, RendererInstance};
pub use lastchange::LastChangeSink;
pub use model::{TransportAction, TransportSnapshot, TransportState};
pub use probe::{HttpProbe, ResourceProbe};
pub use registry::InstanceRegistry;
pub use renderingcontrol::RenderingControlService;
