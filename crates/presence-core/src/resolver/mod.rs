//! Address resolution
//!
//! Decides the value a presence record publishes. Two strategies exist:
//!
//! - **Explicit**: a user-supplied value, published verbatim. Used for
//!   split-horizon names or pre-computed hostnames; never validated.
//! - **AutoDiscover**: the instance's public or private address, looked up
//!   through an [`InstanceMetadata`] source. A loopback sentinel answer
//!   means the lookup failed and is rejected, since publishing it would
//!   misroute every consumer of the record.

use tracing::debug;

use crate::config::{IpType, RecordConfig};
use crate::error::{Error, Result};
use crate::traits::{InstanceMetadata, LOOPBACK_SENTINEL};

/// Strategy for computing the published value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressResolver {
    /// Publish this value as-is
    Explicit(String),
    /// Look up the instance address of the given type
    AutoDiscover(IpType),
}

impl AddressResolver {
    /// Select the strategy from configuration
    pub fn from_config(record: &RecordConfig, ip_type: IpType) -> Self {
        match &record.content {
            Some(content) => AddressResolver::Explicit(content.clone()),
            None => AddressResolver::AutoDiscover(ip_type),
        }
    }

    /// Compute the value to publish
    ///
    /// The explicit strategy never touches `metadata`.
    ///
    /// # Errors
    ///
    /// `Error::Resolution` when discovery yields the loopback sentinel or
    /// nothing at all.
    pub async fn resolve(&self, metadata: &dyn InstanceMetadata) -> Result<String> {
        match self {
            AddressResolver::Explicit(content) => {
                debug!("Using explicit record content");
                Ok(content.clone())
            }
            AddressResolver::AutoDiscover(ip_type) => {
                let address = match ip_type {
                    IpType::Public => metadata.public_address().await,
                    IpType::Private => metadata.local_address().await,
                };
                let address = address.trim().to_string();

                debug!(
                    "Metadata source {} reported {} address {}",
                    metadata.source_name(),
                    ip_type.as_str(),
                    address
                );

                if address.is_empty() || address == LOOPBACK_SENTINEL {
                    return Err(Error::resolution(format!(
                        "Unable to get instance {} ip address",
                        ip_type.as_str()
                    )));
                }

                Ok(address)
            }
        }
    }
}
