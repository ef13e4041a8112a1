use std::collections::BTreeMap;

use crate::{cluster::Node, protocol::error::Error as ProtocolError};

/// Controller ID reported when the cluster has no active controller.
pub const NO_CONTROLLER_ID: i32 = -1;

/// Authorized operations value used when the client did not ask for them.
pub const AUTHORIZED_OPERATIONS_OMITTED: i32 = i32::MIN;

/// Leader epoch reported when the partition leader epoch is unknown.
pub const NO_PARTITION_LEADER_EPOCH: i32 = -1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataResponse {
    /// The duration in milliseconds for which the request was throttled due to
    /// a quota violation, or zero if the request did not violate any quota.
    pub throttle_time_ms: i32,

    /// Each broker in the response
    pub brokers: Vec<MetadataResponseBroker>,

    /// The cluster ID that responding broker belongs to.
    pub cluster_id: Option<String>,

    /// The ID of the controller broker, [`NO_CONTROLLER_ID`] if there is none.
    pub controller_id: i32,

    /// 32-bit bitfield of the operations authorized on the cluster.
    pub cluster_authorized_operations: i32,

    /// Each topic in the response
    pub topics: Vec<MetadataResponseTopic>,
}

impl MetadataResponse {
    /// Brokers of the response, keyed by node ID.
    pub fn brokers_by_id(&self) -> BTreeMap<i32, Node> {
        self.brokers.iter().map(|b| (b.node_id, Node::from(b))).collect()
    }

    pub fn controller(&self) -> Option<Node> {
        self.brokers
            .iter()
            .find(|b| b.node_id == self.controller_id)
            .map(Node::from)
    }

    pub fn topic(&self, name: &str) -> Option<&MetadataResponseTopic> {
        self.topics.iter().find(|t| t.name == name)
    }

    /// Topic-level errors keyed by topic name.
    pub fn errors(&self) -> BTreeMap<String, ProtocolError> {
        self.topics
            .iter()
            .filter_map(|t| t.error.map(|e| (t.name.clone(), e)))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataResponseBroker {
    /// The broker ID
    pub node_id: i32,
    /// The broker hostname
    pub host: String,
    /// The broker port
    pub port: i32,
    /// The rack of the broker
    pub rack: Option<String>,
}

impl<'a> From<&'a MetadataResponseBroker> for Node {
    fn from(b: &'a MetadataResponseBroker) -> Self {
        Self::new(b.node_id, b.host.clone(), b.port, b.rack.clone())
    }
}

impl<'a> From<&'a Node> for MetadataResponseBroker {
    fn from(n: &'a Node) -> Self {
        Self {
            node_id: n.id,
            host: n.host.clone(),
            port: n.port,
            rack: n.rack.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataResponseTopic {
    /// The topic error, `None` if there was no error
    pub error: Option<ProtocolError>,
    /// The topic name
    pub name: String,
    /// True if the topic is internal
    pub is_internal: bool,
    /// Each partition in the topic
    pub partitions: Vec<MetadataResponsePartition>,
    /// 32-bit bitfield of the operations authorized on this topic.
    pub topic_authorized_operations: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataResponsePartition {
    /// The partition error, `None` if there was no error
    pub error: Option<ProtocolError>,
    /// The partition index
    pub partition_index: i32,
    /// The ID of the leader broker, `-1` if there is no leader
    pub leader_id: i32,
    /// The leader epoch, [`NO_PARTITION_LEADER_EPOCH`] if unknown
    pub leader_epoch: i32,
    /// The set of all nodes that host this partition
    pub replica_nodes: Vec<i32>,
    /// The set of all nodes that are in sync with the leader for this partition
    pub isr_nodes: Vec<i32>,
    /// The set of offline replicas of this partition
    pub offline_replicas: Vec<i32>,
}

impl MetadataResponsePartition {
    /// The leader epoch, `None` if unknown.
    pub fn leader_epoch(&self) -> Option<i32> {
        (self.leader_epoch != NO_PARTITION_LEADER_EPOCH).then_some(self.leader_epoch)
    }
}

/// Topic metadata with its partitions resolved to [`Node`]s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicMetadata {
    pub error: Option<ProtocolError>,
    pub topic: String,
    pub is_internal: bool,
    pub partitions: Vec<PartitionMetadata>,
}

/// Partition metadata with leader and replicas resolved to [`Node`]s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionMetadata {
    pub error: Option<ProtocolError>,
    pub partition: i32,
    pub leader: Option<Node>,
    pub leader_epoch: Option<i32>,
    pub replicas: Vec<Node>,
    pub isr: Vec<Node>,
    pub offline_replicas: Vec<Node>,
}

impl From<&TopicMetadata> for MetadataResponseTopic {
    fn from(t: &TopicMetadata) -> Self {
        Self {
            error: t.error,
            name: t.topic.clone(),
            is_internal: t.is_internal,
            partitions: t.partitions.iter().map(Into::into).collect(),
            topic_authorized_operations: AUTHORIZED_OPERATIONS_OMITTED,
        }
    }
}

impl From<&PartitionMetadata> for MetadataResponsePartition {
    fn from(p: &PartitionMetadata) -> Self {
        fn ids(nodes: &[Node]) -> Vec<i32> {
            nodes.iter().map(|n| n.id).collect()
        }

        Self {
            error: p.error,
            partition_index: p.partition,
            leader_id: p.leader.as_ref().map(|n| n.id).unwrap_or(-1),
            leader_epoch: p.leader_epoch.unwrap_or(NO_PARTITION_LEADER_EPOCH),
            replica_nodes: ids(&p.replicas),
            isr_nodes: ids(&p.isr),
            offline_replicas: ids(&p.offline_replicas),
        }
    }
}
