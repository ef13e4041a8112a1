//! In-memory shapes of the Apache Kafka protocol.
//!
//! # References
//! - <https://kafka.apache.org/protocol>
//! - <https://kafka.apache.org/documentation>
pub mod error;
pub mod messages;
