use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use futures_util::future::join_all;
use log::{debug, error, warn};
use tokio::time::Instant;

use crate::cache::Snapshot;
use crate::error::ProviderError;
use crate::record::ContainerRecord;
use crate::runtime::InventoryProvider;
use crate::types::{short_id, RawContainer};

/// Rebuilds the whole snapshot from the inventory.
pub struct Refresher {
    provider: Arc<dyn InventoryProvider>,
}

impl Refresher {
    pub fn new(provider: Arc<dyn InventoryProvider>) -> Self {
        Self { provider }
    }

    /// Lists every container, enriches swarm tasks with their node's public
    /// address and flattens the result. Only a failed listing fails the
    /// refresh; node lookups are best effort.
    pub async fn refresh(&self) -> Result<Snapshot, ProviderError> {
        debug!("Refreshing containers snapshot");
        let started = Instant::now();

        let containers = self.provider.list_containers().await.map_err(|e| {
            error!("Error listing containers: {}", e);
            e
        })?;

        let node_ips = self.resolve_node_ips(&containers).await;

        let entries = containers
            .iter()
            .map(|c| {
                let node_ip = c
                    .node_id()
                    .and_then(|node| node_ips.get(node))
                    .map(String::as_str);
                (short_id(&c.id).to_string(), ContainerRecord::flatten(c, node_ip))
            })
            .collect();

        let snapshot = Snapshot::new(entries);
        debug!(
            "Snapshot of {} containers captured at {} in {:?}",
            snapshot.len(),
            snapshot.captured_wall(),
            started.elapsed()
        );
        Ok(snapshot)
    }

    /// Inspects each distinct node once. Nodes that fail to answer or carry
    /// no public address label are left out.
    async fn resolve_node_ips(&self, containers: &[RawContainer]) -> HashMap<String, String> {
        let nodes: BTreeSet<&str> = containers.iter().filter_map(RawContainer::node_id).collect();

        let lookups = nodes.into_iter().map(|node| async move {
            match self.provider.inspect_node(node).await {
                Ok(meta) => match meta.public_ip() {
                    Some(ip) => {
                        debug!("Node {} public ip={}", node, ip);
                        Some((node.to_string(), ip.to_string()))
                    }
                    None => None,
                },
                Err(e) => {
                    warn!("Couldn't get node inspect data for {}: {}", node, e);
                    None
                }
            }
        });

        join_all(lookups).await.into_iter().flatten().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::tests::raw;
    use crate::runtime::mock::MockProvider;
    use crate::types::{PUBLIC_IP_LABEL, SWARM_NODE_LABEL};

    fn on_node(mut container: RawContainer, node: &str) -> RawContainer {
        container.labels.insert(SWARM_NODE_LABEL.into(), node.into());
        container
    }

    #[tokio::test]
    async fn records_are_keyed_by_short_id() {
        let provider = Arc::new(MockProvider::new(vec![
            raw("abcdef1234567890", &["10.0.0.5"]),
            raw("0123456789abcdef", &["10.0.0.6"]),
        ]));

        let snapshot = Refresher::new(provider).refresh().await.unwrap();

        assert_eq!(snapshot.len(), 2);
        assert_eq!(
            snapshot.get("abcdef123456").unwrap().id,
            "abcdef1234567890"
        );
        assert!(snapshot.get("abcdef1234567890").is_none());
        let order: Vec<_> = snapshot.records().map(|r| r.id.as_str()).collect();
        assert_eq!(order, vec!["abcdef1234567890", "0123456789abcdef"]);
    }

    #[tokio::test]
    async fn label_wins_over_node_public_ip() {
        let mut container = on_node(raw("abcdef1234567890", &[]), "node-1");
        container
            .labels
            .insert(PUBLIC_IP_LABEL.into(), "1.2.3.4".into());
        let provider =
            Arc::new(MockProvider::new(vec![container]).with_node_public_ip("node-1", "5.6.7.8"));

        let snapshot = Refresher::new(provider).refresh().await.unwrap();
        let record = snapshot.get("abcdef123456").unwrap();

        assert_eq!(record.public_ip.as_deref(), Some("1.2.3.4"));
        assert_eq!(record.label_public_ip.as_deref(), Some("1.2.3.4"));
        assert_eq!(record.node_public_ip.as_deref(), Some("5.6.7.8"));
    }

    #[tokio::test]
    async fn node_failure_only_drops_enrichment() {
        let provider = Arc::new(MockProvider::new(vec![
            on_node(raw("aaaaaaaaaaaaaaaa", &["10.0.0.1"]), "missing"),
            on_node(raw("bbbbbbbbbbbbbbbb", &["10.0.0.2"]), "node-1"),
        ])
        .with_node_public_ip("node-1", "5.6.7.8"));

        let snapshot = Refresher::new(provider).refresh().await.unwrap();

        let orphan = snapshot.get("aaaaaaaaaaaa").unwrap();
        assert_eq!(orphan.public_ip, None);
        assert_eq!(orphan.node_public_ip, None);
        assert_eq!(orphan.interfaces, vec!["10.0.0.1"]);

        let enriched = snapshot.get("bbbbbbbbbbbb").unwrap();
        assert_eq!(enriched.public_ip.as_deref(), Some("5.6.7.8"));
    }

    #[tokio::test]
    async fn each_node_is_inspected_once() {
        let provider = Arc::new(
            MockProvider::new(vec![
                on_node(raw("aaaaaaaaaaaaaaaa", &[]), "node-1"),
                on_node(raw("bbbbbbbbbbbbbbbb", &[]), "node-1"),
                on_node(raw("cccccccccccccccc", &[]), "node-2"),
                raw("dddddddddddddddd", &[]),
            ])
            .with_node_public_ip("node-1", "5.6.7.8"),
        );

        Refresher::new(provider.clone()).refresh().await.unwrap();
        assert_eq!(provider.node_calls(), 2);
    }

    #[tokio::test]
    async fn list_failure_fails_refresh() {
        let provider = Arc::new(MockProvider::new(vec![raw("abc", &[])]));
        provider.set_failing(true);

        let result = Refresher::new(provider).refresh().await;
        assert!(matches!(result, Err(ProviderError::Unavailable(_))));
    }
}
