//! Cluster topology: brokers, partitions and their assignment.

use std::{
    collections::{BTreeMap, BTreeSet},
    fmt::Display,
};

mod node;
mod partition;

pub use node::Node;
pub use partition::{PartitionInfo, TopicPartition};

/// Identity of the cluster a topology or metadata snapshot belongs to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ClusterResource {
    cluster_id: Option<String>,
}

impl ClusterResource {
    /// The cluster ID may be `None` if the metadata was fetched from a cluster that predates cluster IDs.
    pub fn new(cluster_id: Option<String>) -> Self {
        Self { cluster_id }
    }

    pub fn cluster_id(&self) -> Option<&str> {
        self.cluster_id.as_deref()
    }
}

impl Display for ClusterResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "ClusterResource(clusterId={})",
            self.cluster_id.as_deref().unwrap_or("null")
        )
    }
}

/// Immutable snapshot of the nodes, topics and partitions of a cluster.
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    cluster_resource: ClusterResource,
    nodes: Vec<Node>,
    partitions: BTreeMap<TopicPartition, PartitionInfo>,
    unauthorized_topics: BTreeSet<String>,
    invalid_topics: BTreeSet<String>,
    internal_topics: BTreeSet<String>,
    controller: Option<Node>,
    is_bootstrap_configured: bool,
}

impl Cluster {
    /// Create a cluster from its nodes and partitions.
    ///
    /// Nodes are de-duplicated and ordered by ID. Partitions are keyed by their [`TopicPartition`]; if the same
    /// partition is given more than once the last record wins.
    pub fn new(
        cluster_id: Option<String>,
        nodes: impl IntoIterator<Item = Node>,
        partitions: impl IntoIterator<Item = PartitionInfo>,
    ) -> Self {
        let nodes: BTreeSet<Node> = nodes.into_iter().collect();
        let partitions = partitions
            .into_iter()
            .map(|p| (p.topic_partition(), p))
            .collect();

        Self {
            cluster_resource: ClusterResource::new(cluster_id),
            nodes: nodes.into_iter().collect(),
            partitions,
            unauthorized_topics: BTreeSet::new(),
            invalid_topics: BTreeSet::new(),
            internal_topics: BTreeSet::new(),
            controller: None,
            is_bootstrap_configured: false,
        }
    }

    /// A cluster without any nodes or partitions.
    pub fn empty() -> Self {
        Self::new(None, [], [])
    }

    /// A cluster that only knows the addresses it was bootstrapped from.
    ///
    /// Bootstrap nodes get negative IDs (`-1`, `-2`, ...) so they never collide with real broker IDs.
    pub fn bootstrap(addresses: impl IntoIterator<Item = (String, i32)>) -> Self {
        let nodes = addresses
            .into_iter()
            .zip(1..)
            .map(|((host, port), n)| Node::new(-n, host, port, None));

        let mut cluster = Self::new(None, nodes, []);
        cluster.is_bootstrap_configured = true;
        cluster
    }

    pub fn with_unauthorized_topics(mut self, topics: impl IntoIterator<Item = String>) -> Self {
        self.unauthorized_topics = topics.into_iter().collect();
        self
    }

    pub fn with_invalid_topics(mut self, topics: impl IntoIterator<Item = String>) -> Self {
        self.invalid_topics = topics.into_iter().collect();
        self
    }

    pub fn with_internal_topics(mut self, topics: impl IntoIterator<Item = String>) -> Self {
        self.internal_topics = topics.into_iter().collect();
        self
    }

    pub fn with_controller(mut self, controller: Option<Node>) -> Self {
        self.controller = controller;
        self
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node_by_id(&self, id: i32) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Returns the current leader of the given partition, if the partition is known and has a leader.
    pub fn leader_for(&self, tp: &TopicPartition) -> Option<&Node> {
        self.partitions.get(tp)?.leader.as_ref()
    }

    pub fn partition(&self, tp: &TopicPartition) -> Option<&PartitionInfo> {
        self.partitions.get(tp)
    }

    /// All partitions, ordered by topic and partition index.
    pub fn partitions(&self) -> impl Iterator<Item = &PartitionInfo> {
        self.partitions.values()
    }

    pub fn partitions_for_topic(&self, topic: &str) -> Vec<&PartitionInfo> {
        let range = TopicPartition::new(topic, i32::MIN)..=TopicPartition::new(topic, i32::MAX);
        self.partitions.range(range).map(|(_, p)| p).collect()
    }

    /// Partitions of the topic that currently have a reachable leader.
    pub fn available_partitions_for_topic(&self, topic: &str) -> Vec<&PartitionInfo> {
        self.partitions_for_topic(topic)
            .into_iter()
            .filter(|p| p.leader.as_ref().is_some_and(|l| !l.is_empty()))
            .collect()
    }

    /// Partitions led by the given node.
    pub fn partitions_for_node(&self, node_id: i32) -> Vec<&PartitionInfo> {
        self.partitions
            .values()
            .filter(|p| p.leader.as_ref().is_some_and(|l| l.id == node_id))
            .collect()
    }

    /// Number of known partitions of the topic, `None` if the topic is unknown.
    pub fn partition_count_for_topic(&self, topic: &str) -> Option<usize> {
        match self.partitions_for_topic(topic).len() {
            0 => None,
            n => Some(n),
        }
    }

    pub fn topics(&self) -> BTreeSet<&str> {
        self.partitions.keys().map(|tp| tp.topic.as_str()).collect()
    }

    pub fn unauthorized_topics(&self) -> &BTreeSet<String> {
        &self.unauthorized_topics
    }

    pub fn invalid_topics(&self) -> &BTreeSet<String> {
        &self.invalid_topics
    }

    pub fn internal_topics(&self) -> &BTreeSet<String> {
        &self.internal_topics
    }

    pub fn cluster_resource(&self) -> &ClusterResource {
        &self.cluster_resource
    }

    pub fn controller(&self) -> Option<&Node> {
        self.controller.as_ref()
    }

    pub fn is_bootstrap_configured(&self) -> bool {
        self.is_bootstrap_configured
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: i32) -> Node {
        Node::new(id, format!("broker-{id}"), 9092, None)
    }

    fn cluster() -> Cluster {
        let partitions = [
            PartitionInfo::new("bananas", 0, Some(node(1)), vec![node(1), node(2)], vec![node(1)]),
            PartitionInfo::new("bananas", 1, Some(node(2)), vec![node(2), node(1)], vec![node(2)]),
            PartitionInfo::new("bananas", 2, None, vec![node(1)], vec![]),
            PartitionInfo::new("platanos", 0, Some(node(1)), vec![node(1)], vec![node(1)]),
        ];
        Cluster::new(Some("c1".to_owned()), [node(2), node(1), node(2)], partitions)
    }

    #[test]
    fn test_nodes_deduplicated_and_ordered() {
        let cluster = cluster();
        let ids: Vec<_> = cluster.nodes().iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(cluster.node_by_id(2), Some(&node(2)));
        assert_eq!(cluster.node_by_id(3), None);
    }

    #[test]
    fn test_partition_lookups() {
        let cluster = cluster();

        assert_eq!(
            cluster.leader_for(&TopicPartition::new("bananas", 1)),
            Some(&node(2))
        );
        assert_eq!(cluster.leader_for(&TopicPartition::new("bananas", 2)), None);
        assert_eq!(cluster.leader_for(&TopicPartition::new("goats", 0)), None);

        assert_eq!(cluster.partitions_for_topic("bananas").len(), 3);
        assert_eq!(cluster.available_partitions_for_topic("bananas").len(), 2);
        assert_eq!(cluster.partition_count_for_topic("platanos"), Some(1));
        assert_eq!(cluster.partition_count_for_topic("goats"), None);

        let led_by_1: Vec<_> = cluster
            .partitions_for_node(1)
            .into_iter()
            .map(PartitionInfo::topic_partition)
            .collect();
        assert_eq!(
            led_by_1,
            vec![
                TopicPartition::new("bananas", 0),
                TopicPartition::new("platanos", 0)
            ]
        );

        assert_eq!(cluster.topics(), BTreeSet::from(["bananas", "platanos"]));
    }

    #[test]
    fn test_leader_without_address_is_unavailable() {
        let unreachable = Node {
            id: 3,
            ..Node::no_node()
        };
        let partitions = [
            PartitionInfo::new("goats", 0, Some(unreachable), vec![], vec![]),
            PartitionInfo::new("goats", 1, Some(node(1)), vec![], vec![]),
        ];
        let cluster = Cluster::new(None, [node(1)], partitions);

        let available: Vec<_> = cluster
            .available_partitions_for_topic("goats")
            .into_iter()
            .map(|p| p.partition)
            .collect();
        assert_eq!(available, vec![1]);
    }

    #[test]
    fn test_topic_prefix_does_not_leak() {
        let partitions = [
            PartitionInfo::new("a", 0, None, vec![], vec![]),
            PartitionInfo::new("ab", 0, None, vec![], vec![]),
        ];
        let cluster = Cluster::new(None, [], partitions);
        assert_eq!(cluster.partitions_for_topic("a").len(), 1);
    }

    #[test]
    fn test_duplicate_partition_last_wins() {
        let partitions = [
            PartitionInfo::new("bananas", 0, Some(node(1)), vec![], vec![]),
            PartitionInfo::new("bananas", 0, Some(node(2)), vec![], vec![]),
        ];
        let cluster = Cluster::new(None, [], partitions);
        assert_eq!(cluster.partitions().count(), 1);
        assert_eq!(
            cluster.leader_for(&TopicPartition::new("bananas", 0)),
            Some(&node(2))
        );
    }

    #[test]
    fn test_empty() {
        let cluster = Cluster::empty();
        assert!(cluster.nodes().is_empty());
        assert_eq!(cluster.partitions().count(), 0);
        assert_eq!(cluster.cluster_resource().cluster_id(), None);
        assert!(cluster.controller().is_none());
        assert!(!cluster.is_bootstrap_configured());
    }

    #[test]
    fn test_bootstrap() {
        let cluster = Cluster::bootstrap([("a".to_owned(), 9092), ("b".to_owned(), 9093)]);
        assert!(cluster.is_bootstrap_configured());

        let nodes: Vec<_> = cluster
            .nodes()
            .iter()
            .map(|n| (n.id, n.host.as_str(), n.port))
            .collect();
        assert_eq!(nodes, vec![(-2, "b", 9093), (-1, "a", 9092)]);
    }

    #[test]
    fn test_topic_sets_and_controller() {
        let cluster = Cluster::empty()
            .with_unauthorized_topics(["secret".to_owned()])
            .with_invalid_topics(["bad topic".to_owned()])
            .with_internal_topics(["__consumer_offsets".to_owned()])
            .with_controller(Some(node(1)));

        assert!(cluster.unauthorized_topics().contains("secret"));
        assert!(cluster.invalid_topics().contains("bad topic"));
        assert!(cluster.internal_topics().contains("__consumer_offsets"));
        assert_eq!(cluster.controller(), Some(&node(1)));
    }

    #[test]
    fn test_cluster_resource_display() {
        assert_eq!(
            ClusterResource::new(Some("c1".to_owned())).to_string(),
            "ClusterResource(clusterId=c1)"
        );
        assert_eq!(
            ClusterResource::default().to_string(),
            "ClusterResource(clusterId=null)"
        );
    }
}
