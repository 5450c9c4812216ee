// # presence-core
//
// Core library for DNS presence registration.
//
// A process publishes its address as a DNS record in a hosted zone when it
// starts, keeps it published while it runs, and on termination either
// deletes the record or leaves it in place.
//
// ## Architecture Overview
//
// - **ZoneClient**: Trait for authenticating and submitting record changes
// - **InstanceMetadata**: Trait for discovering the instance's addresses
// - **AddressResolver**: Explicit-content or auto-discover strategy
// - **PresenceController**: Lifecycle state machine (register, wait, deregister)
// - **ShutdownTrigger / ShutdownListener**: One-shot termination notification
// - **ProviderRegistry**: Plugin-based registry for zone clients and metadata sources
//
// ## Design Principles
//
// 1. **Immutable configuration**: built once, passed into the controller
// 2. **Single suspension point**: the controller only waits on shutdown
// 3. **Fail fast**: every error is fatal and tagged with its phase
// 4. **Library-first**: the daemon is a thin layer over this crate

pub mod config;
pub mod controller;
pub mod error;
pub mod record;
pub mod registry;
pub mod resolver;
pub mod shutdown;
pub mod traits;

// Re-export core types for convenience
pub use config::{IpType, PresenceConfig, PresenceSettings, RecordConfig, StopPolicy};
pub use controller::{ControllerEvent, PresenceController, PresenceOutcome, PresenceState};
pub use error::{Error, Phase, Result};
pub use record::{ChangeAction, ChangeRequest, PresenceRecord};
pub use registry::ProviderRegistry;
pub use resolver::AddressResolver;
pub use shutdown::{ShutdownListener, ShutdownReason, ShutdownTrigger, shutdown_channel};
pub use traits::{ChangeAck, Credentials, InstanceMetadata, Session, ZoneClient};
