use std::sync::Arc;

use kafka_monitor_fixtures::{
    cluster::{ClusterResource, TopicPartition},
    metadata::ClusterResourceListener,
};
use parking_lot::{Mutex, Once};

/// Build a [`TopicPartition`].
pub fn tp(topic: &str, partition: i32) -> TopicPartition {
    TopicPartition::new(topic, partition)
}

/// Partitions `0..n` of each of the given topics.
#[allow(dead_code)]
pub fn partitions(topics: &[&str], n: i32) -> Vec<TopicPartition> {
    topics
        .iter()
        .flat_map(|t| (0..n).map(move |p| tp(t, p)))
        .collect()
}

/// Listener that remembers every cluster resource it was notified with.
#[derive(Debug, Default)]
pub struct RecordingListener {
    seen: Mutex<Vec<ClusterResource>>,
}

impl RecordingListener {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn seen(&self) -> Vec<ClusterResource> {
        self.seen.lock().clone()
    }
}

impl ClusterResourceListener for RecordingListener {
    fn on_update(&self, cluster_resource: &ClusterResource) {
        self.seen.lock().push(cluster_resource.clone());
    }
}

static LOG_SETUP: Once = Once::new();

/// Enables debug logging if the `RUST_LOG` environment variable is
/// set. Does nothing if `RUST_LOG` is not set.
pub fn maybe_start_logging() {
    if std::env::var("RUST_LOG").is_ok() {
        start_logging()
    }
}

/// Start logging.
pub fn start_logging() {
    use tracing_log::LogTracer;
    use tracing_subscriber::{FmtSubscriber, filter::EnvFilter};

    LOG_SETUP.call_once(|| {
        LogTracer::init().unwrap();

        let subscriber = FmtSubscriber::builder()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .finish();

        tracing::subscriber::set_global_default(subscriber)
            .expect("setting default subscriber failed");
    });
}
