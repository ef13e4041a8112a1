//! Fixed two-node cluster used by monitor tests.
//!
//! Every partition handed to these functions is led by [`NODE_0`] and replicated to (and in sync on) both
//! [`NODE_0`] and [`NODE_1`].
//!
//! ```
//! use kafka_monitor_fixtures::{cluster::TopicPartition, fixture};
//!
//! let partitions = [TopicPartition::new("topicA", 0), TopicPartition::new("topicB", 0)];
//! let metadata = fixture::metadata(&partitions).unwrap();
//!
//! let cluster = metadata.fetch();
//! assert_eq!(cluster.cluster_resource().cluster_id(), Some(fixture::CLUSTER_ID));
//! assert_eq!(cluster.leader_for(&partitions[1]), Some(&*fixture::NODE_0));
//! ```

use std::{
    collections::{BTreeMap, BTreeSet},
    sync::LazyLock,
    time::Duration,
};

use tracing::debug;

use crate::{
    cluster::{Cluster, Node, PartitionInfo, TopicPartition},
    metadata::{self, ClusterResourceListeners, Metadata, MetadataConfig, MetadataUpdate},
    protocol::messages::{MetadataResponse, NO_CONTROLLER_ID, PartitionMetadata, TopicMetadata},
    utils::{REQUEST_VERSION_UPDATE, prepare_metadata_response},
};

pub const METADATA_REFRESH_BACKOFF: Duration = Duration::from_millis(10);
pub const METADATA_EXPIRY: Duration = Duration::from_millis(10);
pub const CLUSTER_ID: &str = "cluster_id";

pub static NODE_0: LazyLock<Node> =
    LazyLock::new(|| Node::new(0, "localhost", 100, Some("rack0".to_owned())));
pub static NODE_1: LazyLock<Node> =
    LazyLock::new(|| Node::new(1, "localhost", 100, Some("rack1".to_owned())));

static NODES: LazyLock<[Node; 2]> = LazyLock::new(|| [NODE_0.clone(), NODE_1.clone()]);

/// The nodes of the fixture cluster. Every call returns a fresh copy.
pub fn nodes() -> [Node; 2] {
    NODES.clone()
}

/// Settings of the [`Metadata`] built by [`metadata`].
pub fn metadata_config() -> MetadataConfig {
    MetadataConfig {
        refresh_backoff: METADATA_REFRESH_BACKOFF,
        metadata_expiry: METADATA_EXPIRY,
    }
}

/// Cluster made of [`NODE_0`] and [`NODE_1`] hosting the given partitions.
///
/// Duplicate partitions are collapsed into one record.
pub fn cluster<'a>(partitions: impl IntoIterator<Item = &'a TopicPartition>) -> Cluster {
    let partition_info = partitions.into_iter().map(|tp| {
        PartitionInfo::new(
            tp.topic.clone(),
            tp.partition,
            Some(NODE_0.clone()),
            nodes().to_vec(),
            nodes().to_vec(),
        )
    });

    Cluster::new(Some(CLUSTER_ID.to_owned()), nodes(), partition_info)
}

/// Metadata response describing [`cluster`] for the given partitions.
pub fn metadata_response<'a>(
    partitions: impl IntoIterator<Item = &'a TopicPartition>,
) -> MetadataResponse {
    let partitions: BTreeSet<&TopicPartition> = partitions.into_iter().collect();
    let cluster = cluster(partitions.iter().copied());

    let mut topic_to_partitions: BTreeMap<&str, Vec<&TopicPartition>> = BTreeMap::new();
    for tp in &partitions {
        topic_to_partitions
            .entry(tp.topic.as_str())
            .or_default()
            .push(tp);
    }

    let topic_metadata: Vec<_> = topic_to_partitions
        .into_iter()
        .map(|(topic, tps)| TopicMetadata {
            error: None,
            topic: topic.to_owned(),
            is_internal: false,
            partitions: tps
                .into_iter()
                .map(|tp| PartitionMetadata {
                    error: None,
                    partition: tp.partition,
                    leader: cluster.leader_for(tp).cloned(),
                    leader_epoch: None,
                    replicas: nodes().to_vec(),
                    isr: nodes().to_vec(),
                    offline_replicas: vec![],
                })
                .collect(),
        })
        .collect();

    prepare_metadata_response(
        cluster.nodes(),
        cluster.cluster_resource().cluster_id(),
        NO_CONTROLLER_ID,
        &topic_metadata,
    )
}

/// Apply the fixture response for the given partitions to `target`, as a single update at timestamp 0.
pub fn populate<'a, M>(
    target: &M,
    partitions: impl IntoIterator<Item = &'a TopicPartition>,
) -> metadata::Result<()>
where
    M: MetadataUpdate + ?Sized,
{
    let response = metadata_response(partitions);
    debug!(topics = response.topics.len(), "populating metadata from fixture");
    target.update(REQUEST_VERSION_UPDATE, &response, 0)
}

/// Fresh [`Metadata`] populated with [`cluster`] for the given partitions.
pub fn metadata<'a>(
    partitions: impl IntoIterator<Item = &'a TopicPartition>,
) -> metadata::Result<Metadata> {
    metadata_with_listeners(partitions, ClusterResourceListeners::new())
}

/// Like [`metadata`], notifying `listeners` of the fixture cluster ID.
pub fn metadata_with_listeners<'a>(
    partitions: impl IntoIterator<Item = &'a TopicPartition>,
    listeners: ClusterResourceListeners,
) -> metadata::Result<Metadata> {
    let metadata = Metadata::new(metadata_config(), listeners);
    populate(&metadata, partitions)?;
    Ok(metadata)
}
