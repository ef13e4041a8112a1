use std::fmt::{Display, Formatter};

use super::node::Node;

/// A single partition of a named topic.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
pub struct TopicPartition {
    // keep the topic space small so generated sets share topics
    #[cfg_attr(test, proptest(regex = "topic[A-D]"))]
    pub topic: String,

    #[cfg_attr(test, proptest(strategy = "0..8i32"))]
    pub partition: i32,
}

impl TopicPartition {
    pub fn new(topic: impl Into<String>, partition: i32) -> Self {
        Self {
            topic: topic.into(),
            partition,
        }
    }
}

impl Display for TopicPartition {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.topic, self.partition)
    }
}

/// Assignment of a partition to its leader and replicas.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PartitionInfo {
    /// The topic name
    pub topic: String,

    /// The partition index
    pub partition: i32,

    /// The current leader, `None` if the partition has no leader right now.
    pub leader: Option<Node>,

    /// The set of all nodes that host this partition
    pub replicas: Vec<Node>,

    /// The set of all nodes that are in sync with the leader for this partition
    pub in_sync_replicas: Vec<Node>,

    /// Replicas that are hosted on offline brokers
    pub offline_replicas: Vec<Node>,
}

impl PartitionInfo {
    pub fn new(
        topic: impl Into<String>,
        partition: i32,
        leader: Option<Node>,
        replicas: Vec<Node>,
        in_sync_replicas: Vec<Node>,
    ) -> Self {
        Self {
            topic: topic.into(),
            partition,
            leader,
            replicas,
            in_sync_replicas,
            offline_replicas: vec![],
        }
    }

    pub fn with_offline_replicas(mut self, offline_replicas: Vec<Node>) -> Self {
        self.offline_replicas = offline_replicas;
        self
    }

    pub fn topic_partition(&self) -> TopicPartition {
        TopicPartition::new(self.topic.clone(), self.partition)
    }
}

impl Display for PartitionInfo {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        fn ids(nodes: &[Node]) -> String {
            let ids: Vec<_> = nodes.iter().map(|n| n.id.to_string()).collect();
            format!("[{}]", ids.join(","))
        }

        let leader = self
            .leader
            .as_ref()
            .map(|n| n.id.to_string())
            .unwrap_or_else(|| "none".to_owned());
        write!(
            f,
            "Partition(topic = {}, partition = {}, leader = {}, replicas = {}, isr = {}, offlineReplicas = {})",
            self.topic,
            self.partition,
            leader,
            ids(&self.replicas),
            ids(&self.in_sync_replicas),
            ids(&self.offline_replicas),
        )
    }
}
