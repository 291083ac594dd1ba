use std::net::IpAddr;
use std::sync::Arc;

use thiserror::Error;

/// Failure talking to the container inventory.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("docker api error: {0}")]
    Docker(#[from] bollard::errors::Error),

    #[error("inventory unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum LookupError {
    /// Shared with every caller that waited on the same failed refresh.
    #[error("container inventory could not be loaded: {0}")]
    ProviderUnavailable(#[from] Arc<ProviderError>),

    #[error("no container found for {0}")]
    NotFound(String),

    #[error("no container found with IP {0}")]
    AddressNotFound(IpAddr),

    #[error("caller address could not be determined: {0}")]
    AddressUnresolvable(String),
}
