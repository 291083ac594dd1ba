//! Flattened container records.
//!
//! A [`ContainerRecord`] keeps the structure of a container (scalars,
//! labels, interfaces, port bindings) and only turns it into the flat
//! `key -> string` shape when serialized.  Existing clients read keys
//! such as `label:<name>`, `ip:<n>` and the `hostBindPort:<n>` /
//! `publicPort:<n>` / `privatePort:<n>` triple, so the wire shape is
//! fixed.

use std::net::IpAddr;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::types::{PortBinding, RawContainer, PUBLIC_IP_LABEL};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerRecord {
    pub id: String,
    pub created: DateTime<Utc>,
    pub image: String,
    pub status: String,
    pub state: String,
    pub network_mode: String,
    /// Effective public address: the container label wins over the node label.
    pub public_ip: Option<String>,
    pub node_public_ip: Option<String>,
    pub label_public_ip: Option<String>,
    pub labels: Vec<(String, String)>,
    pub interfaces: Vec<String>,
    pub ports: Vec<PortBinding>,
}

impl ContainerRecord {
    /// Flattens one container. `node_public_ip` is the public address
    /// advertised by the container's swarm node, when it could be resolved.
    pub fn flatten(raw: &RawContainer, node_public_ip: Option<&str>) -> Self {
        let node_public_ip = node_public_ip.map(str::to_owned);
        let label_public_ip = raw.labels.get(PUBLIC_IP_LABEL).cloned();
        let public_ip = label_public_ip.clone().or_else(|| node_public_ip.clone());

        Self {
            id: raw.id.clone(),
            created: raw.created,
            image: raw.image.clone(),
            status: raw.status.clone(),
            state: raw.state.clone(),
            network_mode: raw.network_mode.clone(),
            public_ip,
            node_public_ip,
            label_public_ip,
            labels: raw
                .labels
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            interfaces: raw.interfaces.clone(),
            ports: raw.ports.clone(),
        }
    }

    /// True if any interface address equals `addr`. Entries that are not
    /// valid addresses (containers without an IP on a network) never match.
    pub fn has_address(&self, addr: IpAddr) -> bool {
        self.interfaces
            .iter()
            .filter_map(|ip| ip.parse::<IpAddr>().ok())
            .any(|ip| ip == addr)
    }
}

impl Serialize for ContainerRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("id", &self.id)?;
        map.serialize_entry(
            "created",
            &self.created.to_rfc3339_opts(SecondsFormat::Secs, true),
        )?;
        map.serialize_entry("image", &self.image)?;
        map.serialize_entry("status", &self.status)?;
        map.serialize_entry("state", &self.state)?;
        map.serialize_entry("networkMode", &self.network_mode)?;

        if let Some(ip) = &self.public_ip {
            map.serialize_entry("publicIp", ip)?;
        }
        if let Some(ip) = &self.node_public_ip {
            map.serialize_entry("nodePublicIp", ip)?;
        }
        if let Some(ip) = &self.label_public_ip {
            map.serialize_entry("labelPublicIp", ip)?;
        }

        for (name, value) in &self.labels {
            map.serialize_entry(&format!("label:{}", name), value)?;
        }
        for (n, ip) in self.interfaces.iter().enumerate() {
            map.serialize_entry(&format!("ip:{}", n), ip)?;
        }
        for (n, port) in self.ports.iter().enumerate() {
            map.serialize_entry(&format!("hostBindPort:{}", n), &port.host_ip)?;
            map.serialize_entry(
                &format!("publicPort:{}", n),
                &port.public_port.unwrap_or(0).to_string(),
            )?;
            map.serialize_entry(&format!("privatePort:{}", n), &port.private_port.to_string())?;
        }
        map.end()
    }
}
