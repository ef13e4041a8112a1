use std::fmt::{Display, Formatter};

/// A broker in a cluster topology.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Node {
    /// The broker ID
    pub id: i32,

    /// The broker hostname
    pub host: String,

    /// The broker port
    pub port: i32,

    /// Rack.
    pub rack: Option<String>,
}

impl Node {
    pub fn new(id: i32, host: impl Into<String>, port: i32, rack: Option<String>) -> Self {
        Self {
            id,
            host: host.into(),
            port,
            rack,
        }
    }

    /// Placeholder used where a broker is expected but none is known, e.g. a partition without a leader.
    pub fn no_node() -> Self {
        Self {
            id: -1,
            host: String::new(),
            port: -1,
            rack: None,
        }
    }

    /// Returns `true` if this node has no usable address.
    pub fn is_empty(&self) -> bool {
        self.host.is_empty() || self.port < 0
    }
}

impl Display for Node {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{} (id: {} rack: {})",
            self.host,
            self.port,
            self.id,
            self.rack.as_deref().unwrap_or("null")
        )
    }
}
