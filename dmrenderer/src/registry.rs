//! Registre des instances de rendu.
//!
//! Les identifiants sont fixés à la construction. Le registre lui-même est
//! immuable : il n'y a donc aucun verrou à prendre pour résoudre une
//! instance, et deux instances différentes ne se bloquent jamais.

use std::{collections::BTreeMap, sync::Arc};

use crate::errors::RendererError;
use crate::instance::RendererInstance;

#[derive(Debug, Clone, Default)]
pub struct InstanceRegistry {
    instances: Arc<BTreeMap<u32, Arc<RendererInstance>>>,
}

impl InstanceRegistry {
    /// Builds a registry from already constructed instances.
    ///
    /// When two instances share an id the last one wins.
    pub fn new(instances: impl IntoIterator<Item = RendererInstance>) -> Self {
        let instances = instances
            .into_iter()
            .map(|instance| (instance.instance_id(), Arc::new(instance)))
            .collect();
        Self {
            instances: Arc::new(instances),
        }
    }

    /// Builds one instance per id with `factory`.
    pub fn with_ids<F>(ids: &[u32], mut factory: F) -> Self
    where
        F: FnMut(u32) -> RendererInstance,
    {
        Self::new(ids.iter().map(|&id| factory(id)))
    }

    pub fn get(&self, instance_id: u32) -> Result<Arc<RendererInstance>, RendererError> {
        self.instances
            .get(&instance_id)
            .cloned()
            .ok_or(RendererError::InstanceNotFound(instance_id))
    }

    /// Identifiers in ascending order.
    pub fn instance_ids(&self) -> Vec<u32> {
        self.instances.keys().copied().collect()
    }

    pub fn instances(&self) -> impl Iterator<Item = &Arc<RendererInstance>> {
        self.instances.values()
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}
