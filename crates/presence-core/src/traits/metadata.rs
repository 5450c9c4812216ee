// # Instance Metadata Trait
//
// Defines the interface for discovering facts about the instance this
// process runs on: its public and private addresses, and optionally the
// credentials of the role attached to it.
//
// ## Implementations
//
// - EC2 instance metadata service: `presence-ip-metadata` crate

use async_trait::async_trait;

use crate::traits::zone_client::Credentials;

/// Address returned by metadata sources when the service is unreachable
pub const LOOPBACK_SENTINEL: &str = "127.0.0.1";

/// Trait for instance metadata sources
///
/// # Contract
///
/// Address lookups never fail. When the service cannot be reached, they
/// return [`LOOPBACK_SENTINEL`]; callers decide whether that is fatal.
///
/// # Trust Level: Semi-Trusted
///
/// Metadata sources perform HTTP calls to the metadata endpoint only and
/// never cache beyond a single lookup.
#[async_trait]
pub trait InstanceMetadata: Send + Sync {
    /// The instance's public IPv4 address, or the loopback sentinel
    async fn public_address(&self) -> String;

    /// The instance's private IPv4 address, or the loopback sentinel
    async fn local_address(&self) -> String;

    /// Temporary credentials of the role attached to the instance
    ///
    /// Sources without a credential endpoint keep the default, which fails
    /// with an authentication error.
    async fn instance_credentials(&self) -> Result<Credentials, crate::Error> {
        Err(crate::Error::auth(
            "no credentials configured and the metadata source provides none",
        ))
    }

    /// Get the source name (for logging/debugging)
    fn source_name(&self) -> &'static str;
}

/// Helper trait for constructing metadata sources from configuration
pub trait InstanceMetadataFactory: Send + Sync {
    /// Create an InstanceMetadata instance from configuration
    fn create(
        &self,
        config: &crate::config::MetadataConfig,
    ) -> Result<Box<dyn InstanceMetadata>, crate::Error>;
}
