use super::InventoryProvider;
use crate::error::ProviderError;
use crate::types::{NodeMetadata, PortBinding, RawContainer};
use async_trait::async_trait;
use bollard::query_parameters::ListContainersOptions;
use bollard::models::{ContainerSummary, EndpointSettings, Node};
use bollard::Docker;
use chrono::{DateTime, Utc};
use log::debug;
use std::collections::BTreeMap;
use std::time::Duration;

pub struct DockerRuntime {
    docker: Docker,
}

impl DockerRuntime {
    /// Builds a client for the local Docker daemon (unix socket on Linux).
    /// Every request made through it gives up after `timeout`.
    pub fn connect(timeout: Duration) -> Result<Self, ProviderError> {
        let docker = Docker::connect_with_local_defaults()
            .map_err(|e| ProviderError::Unavailable(format!("cannot reach docker daemon: {}", e)))?
            .with_timeout(timeout);
        Ok(Self { docker })
    }
}

#[async_trait]
impl InventoryProvider for DockerRuntime {
    async fn list_containers(&self) -> Result<Vec<RawContainer>, ProviderError> {
        let opts = ListContainersOptions {
            all: false,
            ..Default::default()
        };
        let containers = self.docker.list_containers(Some(opts)).await?;
        debug!("Docker listed {} running containers", containers.len());

        Ok(containers.into_iter().map(raw_container).collect())
    }

    async fn inspect_node(&self, node_id: &str) -> Result<NodeMetadata, ProviderError> {
        let node = self.docker.inspect_node(node_id).await?;
        Ok(node_metadata(node))
    }
}

fn node_metadata(node: Node) -> NodeMetadata {
    let labels = node
        .spec
        .and_then(|spec| spec.labels)
        .unwrap_or_default()
        .into_iter()
        .collect();
    NodeMetadata { labels }
}

fn raw_container(c: ContainerSummary) -> RawContainer {
    // Networks come back as a hash map; order them by name so interface
    // indices stay put across refreshes.
    let networks: BTreeMap<String, EndpointSettings> = c
        .network_settings
        .and_then(|s| s.networks)
        .unwrap_or_default()
        .into_iter()
        .collect();

    let ports = c
        .ports
        .unwrap_or_default()
        .into_iter()
        .map(|p| PortBinding {
            host_ip: p.ip.unwrap_or_default(),
            public_port: p.public_port,
            private_port: p.private_port,
        })
        .collect();

    RawContainer {
        id: c.id.unwrap_or_default(),
        created: c
            .created
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
        image: c.image.unwrap_or_default(),
        status: c.status.unwrap_or_default(),
        state: c.state.map(|s| s.to_string()).unwrap_or_default(),
        network_mode: c
            .host_config
            .and_then(|h| h.network_mode)
            .unwrap_or_default(),
        labels: c.labels.unwrap_or_default().into_iter().collect(),
        interfaces: networks.values().map(interface_address).collect(),
        ports,
    }
}

/// IPv4 address on the network, falling back to the global IPv6 address.
/// Empty when the container has neither.
fn interface_address(net: &EndpointSettings) -> String {
    if let Some(ipv4) = &net.ip_address {
        if !ipv4.is_empty() {
            return ipv4.clone();
        }
    }
    if let Some(ipv6) = &net.global_ipv6_address {
        if !ipv6.is_empty() {
            return ipv6.clone();
        }
    }
    String::new()
}
