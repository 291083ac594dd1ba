//! Provider-neutral descriptions of what the inventory reports.
//!
//! The Docker adapter converts bollard's API models into these types so
//! that flattening and lookup never depend on a particular client
//! library.  Collections are already ordered by the time they reach
//! here; consumers index them as-is.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Label carrying a swarm task's node affiliation.
pub const SWARM_NODE_LABEL: &str = "com.docker.swarm.node.id";

/// Label naming a public address, on containers and on swarm nodes.
pub const PUBLIC_IP_LABEL: &str = "publicIp";

/// One running container as listed by the inventory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawContainer {
    pub id: String,
    pub created: DateTime<Utc>,
    pub image: String,
    pub status: String,
    pub state: String,
    pub network_mode: String,
    pub labels: BTreeMap<String, String>,
    /// One entry per attached network, in a stable order.
    pub interfaces: Vec<String>,
    pub ports: Vec<PortBinding>,
}

impl RawContainer {
    /// The swarm node this container runs on, if any.
    pub fn node_id(&self) -> Option<&str> {
        self.labels.get(SWARM_NODE_LABEL).map(String::as_str)
    }
}

/// An exposed port. `host_ip` is empty when the port is not bound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortBinding {
    pub host_ip: String,
    pub public_port: Option<u16>,
    pub private_port: u16,
}

/// The part of a node's description used for enrichment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeMetadata {
    pub labels: BTreeMap<String, String>,
}

impl NodeMetadata {
    pub fn public_ip(&self) -> Option<&str> {
        self.labels.get(PUBLIC_IP_LABEL).map(String::as_str)
    }
}

/// Length of Docker's abbreviated container identifier.
pub const SHORT_ID_LEN: usize = 12;

/// The key a container is stored and looked up under: the short form of
/// its identifier. Identifiers already shorter are used whole.
pub fn short_id(id: &str) -> &str {
    id.get(..SHORT_ID_LEN).unwrap_or(id)
}
