//! Plugin-based provider registry
//!
//! The registry allows zone clients and metadata sources to be registered
//! dynamically at runtime, avoiding hardcoded if-else chains.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use presence_core::registry::ProviderRegistry;
//!
//! let registry = ProviderRegistry::new();
//! presence_provider_route53::register(&registry);
//! presence_ip_metadata::register(&registry);
//!
//! let zone_client = registry.create_zone_client(&config.provider)?;
//! let metadata = registry.create_metadata(&config.metadata)?;
//! ```

use crate::config::{MetadataConfig, ProviderConfig};
use crate::error::{Error, Result};
use crate::traits::{InstanceMetadata, InstanceMetadataFactory, ZoneClient, ZoneClientFactory};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// Registry for plugin-based zone client and metadata source creation
///
/// ## Thread Safety
///
/// The registry uses interior mutability with RwLock, allowing concurrent
/// reads and exclusive writes.
#[derive(Default)]
pub struct ProviderRegistry {
    /// Registered zone client factories
    zone_clients: RwLock<HashMap<String, Box<dyn ZoneClientFactory>>>,

    /// Registered metadata source factories
    metadata_sources: RwLock<HashMap<String, Box<dyn InstanceMetadataFactory>>>,
}

impl ProviderRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a zone client factory
    ///
    /// # Parameters
    ///
    /// - `name`: Provider type name (e.g., "route53")
    /// - `factory`: Factory object for creating zone client instances
    pub fn register_zone_client(&self, name: impl Into<String>, factory: Box<dyn ZoneClientFactory>) {
        self.zone_clients
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.into(), factory);
    }

    /// Register a metadata source factory
    ///
    /// # Parameters
    ///
    /// - `name`: Metadata source type name (e.g., "ec2")
    /// - `factory`: Factory object for creating metadata source instances
    pub fn register_metadata(
        &self,
        name: impl Into<String>,
        factory: Box<dyn InstanceMetadataFactory>,
    ) {
        self.metadata_sources
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.into(), factory);
    }

    /// Create a zone client from configuration
    ///
    /// # Returns
    ///
    /// - `Ok(Box<dyn ZoneClient>)`: Created client instance
    /// - `Err(Error)`: If the provider type is not registered or creation fails
    pub fn create_zone_client(&self, config: &ProviderConfig) -> Result<Box<dyn ZoneClient>> {
        let provider_type = config.type_name();
        let clients = self.zone_clients.read().unwrap_or_else(PoisonError::into_inner);

        let factory = clients
            .get(provider_type)
            .ok_or_else(|| Error::config(format!("Unknown provider type: {}", provider_type)))?;

        factory.create(config)
    }

    /// Create a metadata source from configuration
    ///
    /// # Returns
    ///
    /// - `Ok(Box<dyn InstanceMetadata>)`: Created metadata source instance
    /// - `Err(Error)`: If the source type is not registered or creation fails
    pub fn create_metadata(&self, config: &MetadataConfig) -> Result<Box<dyn InstanceMetadata>> {
        let source_type = config.type_name();
        let sources = self
            .metadata_sources
            .read()
            .unwrap_or_else(PoisonError::into_inner);

        let factory = sources.get(source_type).ok_or_else(|| {
            Error::config(format!("Unknown metadata source type: {}", source_type))
        })?;

        factory.create(config)
    }

    /// List all registered zone client types
    pub fn list_zone_clients(&self) -> Vec<String> {
        self.zone_clients
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }

    /// List all registered metadata source types
    pub fn list_metadata_sources(&self) -> Vec<String> {
        self.metadata_sources
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }

    /// Check if a zone client type is registered
    pub fn has_zone_client(&self, name: &str) -> bool {
        self.zone_clients
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    /// Check if a metadata source type is registered
    pub fn has_metadata(&self, name: &str) -> bool {
        self.metadata_sources
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }
}
