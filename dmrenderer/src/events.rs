//! Evented state variables leaving the renderer core.
//!
//! A [`RendererInstance`](crate::instance::RendererInstance) computes the
//! changes produced by one operation and hands them to an [`EventSink`] as a
//! single [`EventBatch`]. The sink decides how they reach subscribers (GENA
//! LastChange, an in-process channel, a log...).

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::model::Channel;

// AVTransport evented variables
pub const TRANSPORT_STATE: &str = "TransportState";
pub const CURRENT_TRANSPORT_ACTIONS: &str = "CurrentTransportActions";
pub const AV_TRANSPORT_URI: &str = "AVTransportURI";
pub const CURRENT_TRACK_URI: &str = "CurrentTrackURI";
pub const CURRENT_TRACK_DURATION: &str = "CurrentTrackDuration";
pub const CURRENT_MEDIA_DURATION: &str = "CurrentMediaDuration";

// RenderingControl evented variables
pub const VOLUME: &str = "Volume";
pub const MUTE: &str = "Mute";

/// Service whose LastChange variable carries the batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum EventService {
    AVTransport,
    RenderingControl,
}

impl fmt::Display for EventService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventService::AVTransport => f.write_str("AVTransport"),
            EventService::RenderingControl => f.write_str("RenderingControl"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StateChange {
    pub variable: &'static str,
    pub channel: Option<Channel>,
    pub value: String,
}

impl StateChange {
    pub fn new(variable: &'static str, value: impl Into<String>) -> Self {
        Self {
            variable,
            channel: None,
            value: value.into(),
        }
    }

    pub fn on_channel(variable: &'static str, channel: Channel, value: impl Into<String>) -> Self {
        Self {
            variable,
            channel: Some(channel),
            value: value.into(),
        }
    }
}

/// Changes committed together for one instance; delivered as one notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventBatch {
    pub instance_id: u32,
    pub service: EventService,
    pub changes: Vec<StateChange>,
}

impl EventBatch {
    pub fn new(instance_id: u32, service: EventService, changes: Vec<StateChange>) -> Self {
        Self {
            instance_id,
            service,
            changes,
        }
    }

    pub fn value_of(&self, variable: &str) -> Option<&str> {
        self.changes
            .iter()
            .find(|c| c.variable == variable)
            .map(|c| c.value.as_str())
    }
}

#[derive(Error, Debug)]
pub enum EventError {
    #[error("Event channel closed")]
    ChannelClosed,

    #[error("Event delivery error: {0}")]
    Delivery(String),
}

/// Destination of evented-variable changes.
///
/// Implementations must not block: `publish` is called while the instance
/// lock is held so that delivery order matches commit order.
pub trait EventSink: Send + Sync {
    fn publish(&self, batch: EventBatch) -> Result<(), EventError>;
}

/// Sink forwarding batches over an unbounded tokio channel.
#[derive(Debug, Clone)]
pub struct ChannelEventSink {
    tx: mpsc::UnboundedSender<EventBatch>,
}

impl ChannelEventSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<EventBatch>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl EventSink for ChannelEventSink {
    fn publish(&self, batch: EventBatch) -> Result<(), EventError> {
        self.tx.send(batch).map_err(|_| EventError::ChannelClosed)
    }
}

/// Fans a batch out to several sinks; every sink is tried even if one fails.
#[derive(Default)]
pub struct MultiSink {
    sinks: Vec<Arc<dyn EventSink>>,
}

impl MultiSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sinks.push(sink);
        self
    }
}

impl EventSink for MultiSink {
    fn publish(&self, batch: EventBatch) -> Result<(), EventError> {
        let mut failures = Vec::new();
        for sink in &self.sinks {
            if let Err(e) = sink.publish(batch.clone()) {
                failures.push(e.to_string());
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(EventError::Delivery(failures.join("; ")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_channel_sink_preserves_order() {
        let (sink, mut rx) = ChannelEventSink::new();
        for i in 0..3 {
            sink.publish(EventBatch::new(
                0,
                EventService::AVTransport,
                vec![StateChange::new(TRANSPORT_STATE, format!("S{}", i))],
            ))
            .unwrap();
        }

        for i in 0..3 {
            let batch = rx.recv().await.unwrap();
            assert_eq!(batch.value_of(TRANSPORT_STATE), Some(format!("S{}", i).as_str()));
        }
    }

    #[test]
    fn test_channel_sink_closed() {
        let (sink, rx) = ChannelEventSink::new();
        drop(rx);
        let result = sink.publish(EventBatch::new(0, EventService::RenderingControl, vec![]));
        assert!(matches!(result, Err(EventError::ChannelClosed)));
    }

    #[test]
    fn test_multi_sink_reports_failures() {
        let (ok_sink, mut ok_rx) = ChannelEventSink::new();
        let (closed_sink, closed_rx) = ChannelEventSink::new();
        drop(closed_rx);

        let multi = MultiSink::new()
            .with(Arc::new(closed_sink))
            .with(Arc::new(ok_sink));
        let result = multi.publish(EventBatch::new(0, EventService::AVTransport, vec![]));

        assert!(result.is_err());
        assert!(ok_rx.try_recv().is_ok());
    }
}
