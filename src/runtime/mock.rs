//! In-memory inventory used by the tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::InventoryProvider;
use crate::error::ProviderError;
use crate::types::{NodeMetadata, RawContainer, PUBLIC_IP_LABEL};

#[derive(Default)]
pub struct MockProvider {
    containers: Mutex<Vec<RawContainer>>,
    nodes: Mutex<HashMap<String, NodeMetadata>>,
    failing: AtomicBool,
    latency: Option<Duration>,
    list_calls: AtomicUsize,
    node_calls: AtomicUsize,
}

impl MockProvider {
    pub fn new(containers: Vec<RawContainer>) -> Self {
        Self {
            containers: Mutex::new(containers),
            ..Default::default()
        }
    }

    /// Every list call sleeps for `latency` before answering.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn with_node_public_ip(self, node_id: &str, ip: &str) -> Self {
        let mut meta = NodeMetadata::default();
        meta.labels.insert(PUBLIC_IP_LABEL.into(), ip.into());
        self.nodes.lock().unwrap().insert(node_id.into(), meta);
        self
    }

    pub fn set_containers(&self, containers: Vec<RawContainer>) {
        *self.containers.lock().unwrap() = containers;
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn node_calls(&self) -> usize {
        self.node_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl InventoryProvider for MockProvider {
    async fn list_containers(&self) -> Result<Vec<RawContainer>, ProviderError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(ProviderError::Unavailable("connection refused".into()));
        }
        Ok(self.containers.lock().unwrap().clone())
    }

    async fn inspect_node(&self, node_id: &str) -> Result<NodeMetadata, ProviderError> {
        self.node_calls.fetch_add(1, Ordering::SeqCst);
        self.nodes
            .lock()
            .unwrap()
            .get(node_id)
            .cloned()
            .ok_or_else(|| ProviderError::Unavailable(format!("node {} not found", node_id)))
    }
}
