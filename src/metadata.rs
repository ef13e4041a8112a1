//! Refreshable client-side view of the cluster metadata.

use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    sync::Arc,
    time::Duration,
};

use parking_lot::Mutex;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    cluster::{Cluster, ClusterResource, Node, PartitionInfo, TopicPartition},
    protocol::{
        error::Error as ProtocolError,
        messages::{MetadataResponse, MetadataResponsePartition},
    },
};

mod listener;

pub use listener::{ClusterResourceListener, ClusterResourceListeners};

/// Errors surfaced by [`Metadata`].
#[derive(Error, Debug)]
pub enum Error {
    #[error("Update requested after metadata close")]
    Closed,

    #[error("Invalid topics: {0:?}")]
    InvalidTopics(BTreeSet<String>),

    #[error("Not authorized to access topics: {0:?}")]
    TopicAuthorization(BTreeSet<String>),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Refresh settings of a [`Metadata`] instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetadataConfig {
    /// Minimum time between two refreshes.
    pub refresh_backoff: Duration,

    /// Age after which the metadata is refreshed even if no update was requested.
    pub metadata_expiry: Duration,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            refresh_backoff: Duration::from_millis(100),
            metadata_expiry: Duration::from_secs(5 * 60),
        }
    }
}

/// Anything that can absorb a [`MetadataResponse`].
pub trait MetadataUpdate {
    /// Apply `response`, received at `now_ms`, for the request issued at `request_version`.
    fn update(&self, request_version: i32, response: &MetadataResponse, now_ms: u64) -> Result<()>;
}

/// Leader of a partition together with the last leader epoch seen for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderAndEpoch {
    pub leader: Option<Node>,
    pub epoch: Option<i32>,
}

#[derive(Debug)]
struct State {
    cluster: Arc<Cluster>,
    request_version: i32,
    update_version: i32,
    last_refresh_ms: u64,
    last_successful_refresh_ms: u64,
    need_update: bool,
    last_seen_leader_epochs: HashMap<TopicPartition, i32>,
    pending_error: Option<Error>,
    closed: bool,
}

/// Cluster metadata shared between the components of a client.
///
/// Starts out empty and is refreshed through [`MetadataUpdate::update`]. Readers get immutable [`Cluster`]
/// snapshots via [`fetch`](Self::fetch).
#[derive(Debug)]
pub struct Metadata {
    config: MetadataConfig,
    listeners: ClusterResourceListeners,
    state: Mutex<State>,
}

impl Metadata {
    pub fn new(config: MetadataConfig, listeners: ClusterResourceListeners) -> Self {
        Self {
            config,
            listeners,
            state: Mutex::new(State {
                cluster: Arc::new(Cluster::empty()),
                request_version: 0,
                update_version: 0,
                last_refresh_ms: 0,
                last_successful_refresh_ms: 0,
                need_update: false,
                last_seen_leader_epochs: HashMap::new(),
                pending_error: None,
                closed: false,
            }),
        }
    }

    /// Current cluster snapshot.
    pub fn fetch(&self) -> Arc<Cluster> {
        Arc::clone(&self.state.lock().cluster)
    }

    pub fn cluster_resource(&self) -> ClusterResource {
        self.state.lock().cluster.cluster_resource().clone()
    }

    pub fn refresh_backoff(&self) -> Duration {
        self.config.refresh_backoff
    }

    pub fn metadata_expiry(&self) -> Duration {
        self.config.metadata_expiry
    }

    /// Number of updates applied so far.
    pub fn update_version(&self) -> i32 {
        self.state.lock().update_version
    }

    pub fn request_version(&self) -> i32 {
        self.state.lock().request_version
    }

    /// Timestamp (ms) of the last successful update.
    pub fn last_successful_update(&self) -> u64 {
        self.state.lock().last_successful_refresh_ms
    }

    /// Ask for a refresh as soon as the backoff allows. Returns the current update version.
    pub fn request_update(&self) -> i32 {
        let mut state = self.state.lock();
        state.need_update = true;
        state.update_version
    }

    /// Ask for an immediate refresh because the set of interesting topics changed.
    ///
    /// Responses to requests issued before this call no longer satisfy the update request. Returns the new request
    /// version.
    pub fn request_update_for_new_topics(&self) -> i32 {
        let mut state = self.state.lock();
        state.last_refresh_ms = 0;
        state.request_version += 1;
        state.need_update = true;
        state.request_version
    }

    pub fn update_requested(&self) -> bool {
        self.state.lock().need_update
    }

    /// Time until the refresh backoff has passed.
    pub fn time_to_allow_update(&self, now_ms: u64) -> Duration {
        let state = self.state.lock();
        self.time_to_allow_update_locked(&state, now_ms)
    }

    /// Time until the next refresh is due, considering both expiry and backoff.
    pub fn time_to_next_update(&self, now_ms: u64) -> Duration {
        let state = self.state.lock();
        let time_to_expire = if state.need_update {
            Duration::ZERO
        } else {
            let expires_at_ms = state
                .last_successful_refresh_ms
                .saturating_add(duration_ms(self.config.metadata_expiry));
            Duration::from_millis(expires_at_ms.saturating_sub(now_ms))
        };
        time_to_expire.max(self.time_to_allow_update_locked(&state, now_ms))
    }

    fn time_to_allow_update_locked(&self, state: &State, now_ms: u64) -> Duration {
        let allowed_at_ms = state
            .last_refresh_ms
            .saturating_add(duration_ms(self.config.refresh_backoff));
        Duration::from_millis(allowed_at_ms.saturating_sub(now_ms))
    }

    /// Replace the metadata with a cluster made of the given bootstrap addresses.
    pub fn bootstrap(&self, addresses: impl IntoIterator<Item = (String, i32)>) {
        let mut state = self.state.lock();
        state.need_update = true;
        state.update_version += 1;
        state.cluster = Arc::new(Cluster::bootstrap(addresses));
        debug!(update_version = state.update_version, "bootstrapped metadata");
    }

    pub fn last_seen_leader_epoch(&self, tp: &TopicPartition) -> Option<i32> {
        self.state.lock().last_seen_leader_epochs.get(tp).copied()
    }

    /// Record a leader epoch observed outside of a metadata response, e.g. in a fetch response.
    ///
    /// Only replaces a known epoch with a strictly newer one; a newer epoch also requests a metadata update. Returns
    /// `true` if the epoch was recorded.
    pub fn update_last_seen_epoch_if_newer(&self, tp: &TopicPartition, leader_epoch: i32) -> bool {
        if leader_epoch < 0 {
            debug!(%tp, leader_epoch, "ignoring invalid leader epoch");
            return false;
        }

        let mut state = self.state.lock();
        let updated = match state.last_seen_leader_epochs.get_mut(tp) {
            None => {
                debug!(%tp, leader_epoch, "not replacing unknown epoch");
                false
            }
            Some(old) if leader_epoch > *old => {
                debug!(%tp, old = *old, new = leader_epoch, "updating last seen epoch");
                *old = leader_epoch;
                true
            }
            Some(_) => false,
        };
        state.need_update |= updated;
        updated
    }

    pub fn current_leader(&self, tp: &TopicPartition) -> LeaderAndEpoch {
        let state = self.state.lock();
        LeaderAndEpoch {
            leader: state.cluster.leader_for(tp).cloned(),
            epoch: state.last_seen_leader_epochs.get(tp).copied(),
        }
    }

    /// Return the error recorded by the last update, if any, and clear it.
    pub fn maybe_throw_any_error(&self) -> Result<()> {
        match self.state.lock().pending_error.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    pub fn close(&self) {
        self.state.lock().closed = true;
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }
}

impl MetadataUpdate for Metadata {
    fn update(&self, request_version: i32, response: &MetadataResponse, now_ms: u64) -> Result<()> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(Error::Closed);
        }

        // a response to an outdated request leaves the update request pending
        state.need_update = request_version != state.request_version;
        state.last_refresh_ms = now_ms;
        state.last_successful_refresh_ms = now_ms;
        state.update_version += 1;

        let errors = response.errors();
        if !errors.is_empty() {
            warn!(?errors, "metadata response contains topic errors");
        }

        let previous_cluster_id = state
            .cluster
            .cluster_resource()
            .cluster_id()
            .map(ToOwned::to_owned);

        let cluster = handle_metadata_response(&mut state, response);
        state.pending_error = metadata_error(&cluster);

        let topics = cluster.topics();
        state
            .last_seen_leader_epochs
            .retain(|tp, _| topics.contains(tp.topic.as_str()));

        let cluster_resource = cluster.cluster_resource().clone();
        if previous_cluster_id.as_deref() != cluster_resource.cluster_id() {
            info!(cluster_id = ?cluster_resource.cluster_id(), "cluster ID changed");
        }

        state.cluster = Arc::new(cluster);
        let update_version = state.update_version;
        debug!(update_version, cluster = ?state.cluster, "updated cluster metadata");
        drop(state);

        // listeners may call back into this instance
        self.listeners.on_update(&cluster_resource);
        Ok(())
    }
}

fn handle_metadata_response(state: &mut State, response: &MetadataResponse) -> Cluster {
    let brokers = response.brokers_by_id();

    let mut partitions = vec![];
    let mut internal_topics = BTreeSet::new();
    let mut invalid_topics = BTreeSet::new();
    let mut unauthorized_topics = BTreeSet::new();

    for topic in &response.topics {
        if topic.is_internal {
            internal_topics.insert(topic.name.clone());
        }

        match topic.error {
            None => {}
            Some(ProtocolError::InvalidTopicException) => {
                invalid_topics.insert(topic.name.clone());
                continue;
            }
            Some(ProtocolError::TopicAuthorizationFailed) => {
                unauthorized_topics.insert(topic.name.clone());
                continue;
            }
            Some(e) => {
                debug!(topic = %topic.name, %e, "metadata response reported topic error");
                state.need_update |= e.is_retriable();
                continue;
            }
        }

        for partition in &topic.partitions {
            let tp = TopicPartition::new(topic.name.clone(), partition.partition_index);
            if let Some(e) = partition.error {
                debug!(%tp, %e, "metadata response reported partition error");
                state.need_update |= e.is_retriable();
            }

            if let Some(epoch) = partition.leader_epoch() {
                match state.last_seen_leader_epochs.get(&tp) {
                    Some(&seen) if epoch < seen => {
                        debug!(%tp, epoch, seen, "ignoring stale partition metadata");
                        if let Some(previous) = state.cluster.partition(&tp) {
                            partitions.push(previous.clone());
                        }
                        continue;
                    }
                    _ => {
                        state.last_seen_leader_epochs.insert(tp, epoch);
                    }
                }
            } else {
                state.last_seen_leader_epochs.remove(&tp);
            }

            partitions.push(partition_info(&topic.name, partition, &brokers));
        }
    }

    Cluster::new(
        response.cluster_id.clone(),
        brokers.into_values(),
        partitions,
    )
    .with_internal_topics(internal_topics)
    .with_invalid_topics(invalid_topics)
    .with_unauthorized_topics(unauthorized_topics)
    .with_controller(response.controller())
}

fn partition_info(
    topic: &str,
    partition: &MetadataResponsePartition,
    brokers: &BTreeMap<i32, Node>,
) -> PartitionInfo {
    // replicas on brokers missing from the response keep their ID but have no address
    let resolve = |ids: &[i32]| -> Vec<Node> {
        ids.iter()
            .map(|id| {
                brokers
                    .get(id)
                    .cloned()
                    .unwrap_or_else(|| Node {
                        id: *id,
                        ..Node::no_node()
                    })
            })
            .collect()
    };

    PartitionInfo::new(
        topic,
        partition.partition_index,
        brokers.get(&partition.leader_id).cloned(),
        resolve(&partition.replica_nodes),
        resolve(&partition.isr_nodes),
    )
    .with_offline_replicas(resolve(&partition.offline_replicas))
}

fn metadata_error(cluster: &Cluster) -> Option<Error> {
    if !cluster.invalid_topics().is_empty() {
        Some(Error::InvalidTopics(cluster.invalid_topics().clone()))
    } else if !cluster.unauthorized_topics().is_empty() {
        Some(Error::TopicAuthorization(cluster.unauthorized_topics().clone()))
    } else {
        None
    }
}

fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
