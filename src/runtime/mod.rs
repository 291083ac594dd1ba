use crate::error::ProviderError;
use crate::types::{NodeMetadata, RawContainer};
use async_trait::async_trait;

pub mod docker;
pub use docker::DockerRuntime;

#[cfg(test)]
pub mod mock;

#[async_trait]
pub trait InventoryProvider: Send + Sync {
    /// Enumerate every running container in a single call.
    async fn list_containers(&self) -> Result<Vec<RawContainer>, ProviderError>;

    /// Fetch a swarm node's metadata.
    async fn inspect_node(&self, node_id: &str) -> Result<NodeMetadata, ProviderError>;
}
