//! Core traits for the presence system
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`ZoneClient`]: Authenticate and submit record changes to a hosted zone
//! - [`InstanceMetadata`]: Discover the instance's addresses and role credentials

pub mod metadata;
pub mod zone_client;

pub use metadata::{InstanceMetadata, InstanceMetadataFactory, LOOPBACK_SENTINEL};
pub use zone_client::{ChangeAck, Credentials, Session, ZoneClient, ZoneClientFactory};
