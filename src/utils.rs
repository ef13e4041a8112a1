//! Helpers shared by monitor code that fabricates metadata responses.

use crate::{
    cluster::Node,
    protocol::messages::{
        AUTHORIZED_OPERATIONS_OMITTED, MetadataResponse, MetadataResponseBroker, TopicMetadata,
    },
};

/// Request version used when feeding a prepared response into [`Metadata`](crate::metadata::Metadata).
///
/// Matches the request version of a freshly created instance, so the update satisfies any pending update request.
pub const REQUEST_VERSION_UPDATE: i32 = 0;

/// Assemble a [`MetadataResponse`] from node-resolved topic metadata.
pub fn prepare_metadata_response<'a>(
    brokers: impl IntoIterator<Item = &'a Node>,
    cluster_id: Option<&str>,
    controller_id: i32,
    topic_metadata: &[TopicMetadata],
) -> MetadataResponse {
    MetadataResponse {
        throttle_time_ms: 0,
        brokers: brokers.into_iter().map(MetadataResponseBroker::from).collect(),
        cluster_id: cluster_id.map(ToOwned::to_owned),
        controller_id,
        cluster_authorized_operations: AUTHORIZED_OPERATIONS_OMITTED,
        topics: topic_metadata.iter().map(Into::into).collect(),
    }
}

#[cfg(test)]
mod tests {
    use crate::protocol::{
        error::Error as ProtocolError,
        messages::{NO_CONTROLLER_ID, PartitionMetadata},
    };

    use super::*;

    #[test]
    fn test_prepare_metadata_response() {
        let n0 = Node::new(0, "localhost", 100, Some("rack0".to_owned()));
        let n1 = Node::new(1, "localhost", 100, Some("rack1".to_owned()));
        let topics = vec![
            TopicMetadata {
                error: None,
                topic: "bananas".to_owned(),
                is_internal: false,
                partitions: vec![PartitionMetadata {
                    error: None,
                    partition: 0,
                    leader: Some(n1.clone()),
                    leader_epoch: Some(7),
                    replicas: vec![n1.clone(), n0.clone()],
                    isr: vec![n1.clone()],
                    offline_replicas: vec![n0.clone()],
                }],
            },
            TopicMetadata {
                error: Some(ProtocolError::TopicAuthorizationFailed),
                topic: "secret".to_owned(),
                is_internal: false,
                partitions: vec![],
            },
        ];

        let response =
            prepare_metadata_response([&n0, &n1], Some("c1"), NO_CONTROLLER_ID, &topics);

        assert_eq!(response.throttle_time_ms, 0);
        assert_eq!(response.cluster_id.as_deref(), Some("c1"));
        assert_eq!(response.controller_id, NO_CONTROLLER_ID);
        assert_eq!(
            response.cluster_authorized_operations,
            AUTHORIZED_OPERATIONS_OMITTED
        );

        let brokers: Vec<_> = response.brokers.iter().map(Node::from).collect();
        assert_eq!(brokers, vec![n0, n1]);

        let bananas = response.topic("bananas").unwrap();
        let p = &bananas.partitions[0];
        assert_eq!(p.leader_id, 1);
        assert_eq!(p.leader_epoch(), Some(7));
        assert_eq!(p.replica_nodes, vec![1, 0]);
        assert_eq!(p.isr_nodes, vec![1]);
        assert_eq!(p.offline_replicas, vec![0]);

        assert_eq!(
            response.topic("secret").unwrap().error,
            Some(ProtocolError::TopicAuthorizationFailed)
        );
    }
}
