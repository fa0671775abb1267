//! Accumulateur `LastChange` pour AVTransport et RenderingControl.
//!
//! Les deux services AV n'événementent qu'une seule variable, `LastChange`,
//! dont la valeur est un document XML regroupant les changements de toutes
//! les instances depuis la dernière notification. [`LastChangeSink`] joue le
//! rôle du buffer de changements : il coalesce les valeurs (la dernière
//! écriture gagne) et produit le document lors du [`flush`](LastChangeSink::flush).
//!
//! ```text
//! <Event xmlns="urn:schemas-upnp-org:metadata-1-0/AVT/">
//!   <InstanceID val="0">
//!     <TransportState val="PLAYING"/>
//!   </InstanceID>
//! </Event>
//! ```

use std::{collections::BTreeMap, sync::Arc, time::Duration};

use parking_lot::Mutex;
use quick_xml::escape::escape;
use tokio::time;
use tracing::{debug, info};

use crate::events::{EventBatch, EventError, EventService, EventSink, StateChange};

const AVT_NAMESPACE: &str = "urn:schemas-upnp-org:metadata-1-0/AVT/";
const RCS_NAMESPACE: &str = "urn:schemas-upnp-org:metadata-1-0/RCS/";

type InstanceChanges = BTreeMap<u32, Vec<StateChange>>;

/// Coalescing LastChange buffer, one per renderer.
#[derive(Debug, Default)]
pub struct LastChangeSink {
    pending: Mutex<BTreeMap<EventService, InstanceChanges>>,
}

impl LastChangeSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_pending(&self, service: EventService) -> bool {
        self.pending
            .lock()
            .get(&service)
            .is_some_and(|instances| !instances.is_empty())
    }

    /// Takes the pending changes of `service` and renders them.
    ///
    /// Returns `None` when nothing changed since the previous flush.
    pub fn flush(&self, service: EventService) -> Option<String> {
        let changes = {
            let mut pending = self.pending.lock();
            pending.remove(&service)?
        };

        if changes.is_empty() {
            return None;
        }
        Some(render(service, &changes))
    }

    /// Spawns a task flushing both services every `interval`.
    ///
    /// `notify` receives the service name and its LastChange document; it is
    /// the hook where the protocol layer sends GENA notifications.
    pub fn start_notifier<F>(
        self: &Arc<Self>,
        interval: Duration,
        notify: F,
    ) -> tokio::task::JoinHandle<()>
    where
        F: Fn(EventService, String) + Send + Sync + 'static,
    {
        let sink = Arc::clone(self);

        tokio::spawn(async move {
            let mut ticker = time::interval(interval);
            info!("Starting LastChange notifier every {:?}", interval);

            loop {
                ticker.tick().await;
                for service in [EventService::AVTransport, EventService::RenderingControl] {
                    if let Some(xml) = sink.flush(service) {
                        debug!(service = %service, "Flushing LastChange");
                        notify(service, xml);
                    }
                }
            }
        })
    }
}

impl EventSink for LastChangeSink {
    fn publish(&self, batch: EventBatch) -> Result<(), EventError> {
        let mut pending = self.pending.lock();
        let slot = pending
            .entry(batch.service)
            .or_default()
            .entry(batch.instance_id)
            .or_default();

        for change in batch.changes {
            match slot
                .iter_mut()
                .find(|c| c.variable == change.variable && c.channel == change.channel)
            {
                Some(existing) => existing.value = change.value,
                None => slot.push(change),
            }
        }
        Ok(())
    }
}

fn render(service: EventService, changes: &InstanceChanges) -> String {
    let namespace = match service {
        EventService::AVTransport => AVT_NAMESPACE,
        EventService::RenderingControl => RCS_NAMESPACE,
    };

    let mut xml = format!(r#"<Event xmlns="{}">"#, namespace);
    for (instance_id, vars) in changes {
        xml.push_str(&format!(r#"<InstanceID val="{}">"#, instance_id));
        for change in vars {
            match change.channel {
                Some(channel) => xml.push_str(&format!(
                    r#"<{0} channel="{1}" val="{2}"/>"#,
                    change.variable,
                    channel,
                    escape(change.value.as_str())
                )),
                None => xml.push_str(&format!(
                    r#"<{0} val="{1}"/>"#,
                    change.variable,
                    escape(change.value.as_str())
                )),
            }
        }
        xml.push_str("</InstanceID>");
    }
    xml.push_str("</Event>");
    xml
}
