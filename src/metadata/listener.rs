use std::sync::Arc;

use crate::cluster::ClusterResource;

/// Callback for code that needs to learn the cluster ID once metadata arrives.
pub trait ClusterResourceListener: Send + Sync {
    fn on_update(&self, cluster_resource: &ClusterResource);
}

/// Registry of [`ClusterResourceListener`]s notified on every metadata update.
#[derive(Default, Clone)]
pub struct ClusterResourceListeners {
    listeners: Vec<Arc<dyn ClusterResourceListener>>,
}

impl ClusterResourceListeners {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, listener: Arc<dyn ClusterResourceListener>) {
        self.listeners.push(listener);
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Notify all listeners in registration order.
    pub fn on_update(&self, cluster_resource: &ClusterResource) {
        for listener in &self.listeners {
            listener.on_update(cluster_resource);
        }
    }
}

impl FromIterator<Arc<dyn ClusterResourceListener>> for ClusterResourceListeners {
    fn from_iter<T: IntoIterator<Item = Arc<dyn ClusterResourceListener>>>(iter: T) -> Self {
        Self {
            listeners: iter.into_iter().collect(),
        }
    }
}

impl std::fmt::Debug for ClusterResourceListeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClusterResourceListeners")
            .field("len", &self.listeners.len())
            .finish_non_exhaustive()
    }
}
