//! Error codes carried in Kafka responses.
//!
//! # References
//! - <https://kafka.apache.org/protocol#protocol_error_codes>

use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq, Hash, Clone, Copy)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
pub enum Error {
    #[error("The server experienced an unexpected error when processing the request.")]
    UnknownServerError,

    #[error("The requested offset is not within the range of offsets maintained by the server.")]
    OffsetOutOfRange,

    #[error("This message has failed its CRC checksum, exceeds the valid size, has a null key for a compacted topic, or is otherwise corrupt.")]
    CorruptMessage,

    #[error("This server does not host this topic-partition.")]
    UnknownTopicOrPartition,

    #[error("There is no leader for this topic-partition as we are in the middle of a leadership election.")]
    LeaderNotAvailable,

    #[error("For requests intended only for the leader, this error indicates that the broker is not the current leader.")]
    NotLeaderOrFollower,

    #[error("The request timed out.")]
    RequestTimedOut,

    #[error("The broker is not available.")]
    BrokerNotAvailable,

    #[error("The replica is not available for the requested topic-partition.")]
    ReplicaNotAvailable,

    #[error("The server disconnected before a response was received.")]
    NetworkException,

    #[error("The request attempted to perform an operation on an invalid topic.")]
    InvalidTopicException,

    #[error("Messages are rejected since there are fewer in-sync replicas than required.")]
    NotEnoughReplicas,

    #[error("Topic authorization failed.")]
    TopicAuthorizationFailed,

    #[error("Cluster authorization failed.")]
    ClusterAuthorizationFailed,

    #[error("This is not the correct controller for this cluster.")]
    NotController,

    #[error("Disk error when trying to access log file on the disk.")]
    KafkaStorageError,

    #[error("The leader epoch in the request is older than the epoch on the broker.")]
    FencedLeaderEpoch,

    #[error("The leader epoch in the request is newer than the epoch on the broker.")]
    UnknownLeaderEpoch,

    #[error("Unknown error code {0}")]
    Unknown(i16),
}

impl Error {
    /// Map a response error code to an error; `0` means "no error".
    pub fn new(code: i16) -> Option<Self> {
        let err = match code {
            0 => return None,
            -1 => Self::UnknownServerError,
            1 => Self::OffsetOutOfRange,
            2 => Self::CorruptMessage,
            3 => Self::UnknownTopicOrPartition,
            5 => Self::LeaderNotAvailable,
            6 => Self::NotLeaderOrFollower,
            7 => Self::RequestTimedOut,
            8 => Self::BrokerNotAvailable,
            9 => Self::ReplicaNotAvailable,
            13 => Self::NetworkException,
            17 => Self::InvalidTopicException,
            19 => Self::NotEnoughReplicas,
            29 => Self::TopicAuthorizationFailed,
            31 => Self::ClusterAuthorizationFailed,
            41 => Self::NotController,
            56 => Self::KafkaStorageError,
            74 => Self::FencedLeaderEpoch,
            75 => Self::UnknownLeaderEpoch,
            _ => Self::Unknown(code),
        };
        Some(err)
    }

    pub fn code(&self) -> i16 {
        match self {
            Self::UnknownServerError => -1,
            Self::OffsetOutOfRange => 1,
            Self::CorruptMessage => 2,
            Self::UnknownTopicOrPartition => 3,
            Self::LeaderNotAvailable => 5,
            Self::NotLeaderOrFollower => 6,
            Self::RequestTimedOut => 7,
            Self::BrokerNotAvailable => 8,
            Self::ReplicaNotAvailable => 9,
            Self::NetworkException => 13,
            Self::InvalidTopicException => 17,
            Self::NotEnoughReplicas => 19,
            Self::TopicAuthorizationFailed => 29,
            Self::ClusterAuthorizationFailed => 31,
            Self::NotController => 41,
            Self::KafkaStorageError => 56,
            Self::FencedLeaderEpoch => 74,
            Self::UnknownLeaderEpoch => 75,
            Self::Unknown(code) => *code,
        }
    }

    /// Returns `true` if a request failing with this error may succeed when retried, usually after refreshing
    /// metadata.
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            Self::CorruptMessage
                | Self::UnknownTopicOrPartition
                | Self::LeaderNotAvailable
                | Self::NotLeaderOrFollower
                | Self::RequestTimedOut
                | Self::ReplicaNotAvailable
                | Self::NetworkException
                | Self::NotEnoughReplicas
                | Self::NotController
                | Self::KafkaStorageError
                | Self::FencedLeaderEpoch
                | Self::UnknownLeaderEpoch
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    #[test]
    fn test_no_error() {
        assert_eq!(Error::new(0), None);
    }

    #[test]
    fn test_retriable() {
        assert!(Error::LeaderNotAvailable.is_retriable());
        assert!(!Error::TopicAuthorizationFailed.is_retriable());
        assert!(!Error::Unknown(1000).is_retriable());
    }

    proptest! {
        #[test]
        fn test_roundtrip_code(code: i16) {
            match Error::new(code) {
                None => assert_eq!(code, 0),
                Some(err) => assert_eq!(err.code(), code),
            }
        }

        #[test]
        fn test_roundtrip_error(err: Error) {
            let err = match err {
                // Ensure error is actually unknown
                Error::Unknown(0) => return Ok(()),
                Error::Unknown(x) => Error::new(x).unwrap(),
                _ => err,
            };

            let err2 = Error::new(err.code());
            assert_eq!(Some(err), err2);
        }
    }
}
