//! Presence controller
//!
//! The PresenceController is responsible for:
//! - Resolving the value to publish via the [`AddressResolver`]
//! - Registering the record with an UPSERT through the [`ZoneClient`]
//! - Waiting for the one-shot termination notification
//! - Applying the [`StopPolicy`] exactly once
//!
//! ## State Machine
//!
//! ```text
//! Init ──▶ Registering ──▶ Registered ──(notification)──▶ Deregistering ──▶ Terminated
//!              │                                               │
//!              └──────────────────▶ Failed ◀───────────────────┘
//! ```
//!
//! ## Event Flow
//!
//! 1. Resolve the address (explicit content or metadata lookup)
//! 2. Build the PresenceRecord and authenticate
//! 3. Submit one UPSERT
//! 4. Suspend on the shutdown listener; nothing else runs meanwhile
//! 5. Submit a DELETE built from the same record, or retain it
//!
//! Every error is fatal. Nothing is retried: the process is expected to run
//! under a supervisor that restarts it.

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::{PresenceConfig, StopPolicy};
use crate::error::{Error, Phase, Result};
use crate::record::{ChangeRequest, PresenceRecord};
use crate::resolver::AddressResolver;
use crate::shutdown::{ShutdownListener, ShutdownReason};
use crate::traits::{ChangeAck, InstanceMetadata, Session, ZoneClient};

/// Lifecycle states of the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenceState {
    Init,
    Registering,
    Registered,
    Deregistering,
    Terminated,
    Failed,
}

impl PresenceState {
    /// Whether no further transition is possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, PresenceState::Terminated | PresenceState::Failed)
    }

    /// Whether moving to `next` is a legal transition
    pub fn can_transition_to(&self, next: PresenceState) -> bool {
        use PresenceState::*;
        match (self, next) {
            (Init, Registering) => true,
            (Registering, Registered) => true,
            (Registered, Deregistering) => true,
            (Deregistering, Terminated) => true,
            (from, Failed) => !from.is_terminal(),
            _ => false,
        }
    }
}

/// Events emitted by the PresenceController
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerEvent {
    /// State transition
    StateChanged {
        from: PresenceState,
        to: PresenceState,
    },

    /// UPSERT accepted by the provider
    Registered {
        record: PresenceRecord,
        ack: ChangeAck,
    },

    /// First termination notification received
    ShutdownReceived { reason: ShutdownReason },

    /// DELETE accepted by the provider
    Deregistered {
        record: PresenceRecord,
        ack: ChangeAck,
    },

    /// Record left in place on shutdown
    Retained { record: PresenceRecord },

    /// Unrecoverable error
    Failed { phase: Option<Phase>, error: String },
}

/// How a successful run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresenceOutcome {
    /// The record was deleted on shutdown
    Deregistered(PresenceRecord),
    /// The record was left published
    Retained(PresenceRecord),
}

impl PresenceOutcome {
    pub fn record(&self) -> &PresenceRecord {
        match self {
            PresenceOutcome::Deregistered(record) | PresenceOutcome::Retained(record) => record,
        }
    }
}

/// What a successful registration leaves behind for deregistration
#[derive(Debug)]
struct Registration {
    session: Session,
    record: PresenceRecord,
}

/// Core presence controller
///
/// ## Lifecycle
///
/// 1. Create with [`PresenceController::new()`]
/// 2. Run with [`PresenceController::run()`], passing the shutdown listener
/// 3. `run` returns once the stop policy has been applied, or on failure
///
/// ## Threading
///
/// Everything runs sequentially on the caller's task. The only suspension
/// point while registered is the shutdown listener.
pub struct PresenceController {
    /// Zone client for submitting changes
    zone_client: Box<dyn ZoneClient>,

    /// Metadata source for address discovery and role credentials
    metadata: Box<dyn InstanceMetadata>,

    /// Immutable configuration
    config: PresenceConfig,

    /// Current lifecycle state
    state: PresenceState,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<ControllerEvent>,
}

impl PresenceController {
    /// Create a new presence controller
    ///
    /// # Returns
    ///
    /// A tuple of (controller, event_receiver) where event_receiver yields
    /// controller events. Dropping the receiver is allowed.
    pub fn new(
        zone_client: Box<dyn ZoneClient>,
        metadata: Box<dyn InstanceMetadata>,
        config: PresenceConfig,
    ) -> Result<(Self, mpsc::Receiver<ControllerEvent>)> {
        config
            .validate()
            .map_err(|e| e.in_phase(Phase::Configuration))?;

        let (tx, rx) = mpsc::channel(config.event_channel_capacity);

        let controller = Self {
            zone_client,
            metadata,
            config,
            state: PresenceState::Init,
            event_tx: tx,
        };

        Ok((controller, rx))
    }

    /// Current lifecycle state
    pub fn state(&self) -> PresenceState {
        self.state
    }

    /// Run the full lifecycle
    ///
    /// Registers the record, suspends until `shutdown` delivers its first
    /// notification, then applies the stop policy.
    ///
    /// # Returns
    ///
    /// - `Ok(PresenceOutcome)`: Clean shutdown
    /// - `Err(Error)`: Fatal error, tagged with the failing [`Phase`]
    pub async fn run(mut self, shutdown: ShutdownListener) -> Result<PresenceOutcome> {
        let registration = match self.register().await {
            Ok(registration) => registration,
            Err(e) => return Err(self.fail(e)),
        };

        let reason = shutdown.wait().await;
        info!("Received shutdown signal: {}", reason);
        self.emit_event(ControllerEvent::ShutdownReceived { reason });

        match self.deregister(registration).await {
            Ok(outcome) => {
                self.transition(PresenceState::Terminated);
                Ok(outcome)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Init → Registering → Registered
    async fn register(&mut self) -> Result<Registration> {
        self.transition(PresenceState::Registering);

        let resolver = AddressResolver::from_config(&self.config.record, self.config.ip_type);
        let value = resolver
            .resolve(self.metadata.as_ref())
            .await
            .map_err(|e| e.in_phase(Phase::Resolution))?;

        let record = PresenceRecord::new(
            self.config.record.name.clone(),
            self.config.record.record_type.clone(),
            value,
            self.config.record.ttl,
            self.config.zone_id.clone(),
        )
        .map_err(|e| e.in_phase(Phase::Resolution))?;

        let session = self
            .authenticate()
            .await
            .map_err(|e| e.in_phase(Phase::Authentication))?;

        let ack = self
            .submit(&session, ChangeRequest::upsert(record.clone()))
            .await
            .map_err(|e| e.in_phase(Phase::Registration))?;

        info!(
            "Registered {} record {} (TTL: {}) with {} zone {}",
            record.record_type(),
            record.name(),
            record.ttl(),
            self.zone_client.provider_name(),
            record.zone_id()
        );

        self.transition(PresenceState::Registered);
        self.emit_event(ControllerEvent::Registered {
            record: record.clone(),
            ack,
        });

        Ok(Registration { session, record })
    }

    /// Registered → Deregistering → (policy applied)
    async fn deregister(&mut self, registration: Registration) -> Result<PresenceOutcome> {
        self.transition(PresenceState::Deregistering);

        let Registration { session, record } = registration;

        match self.config.stop_policy {
            StopPolicy::Delete => {
                let ack = self
                    .submit(&session, ChangeRequest::delete(record.clone()))
                    .await
                    .map_err(|e| e.in_phase(Phase::Deregistration))?;

                info!(
                    "Deregistered {} record {} with {} zone {}",
                    record.record_type(),
                    record.name(),
                    self.zone_client.provider_name(),
                    record.zone_id()
                );
                self.emit_event(ControllerEvent::Deregistered {
                    record: record.clone(),
                    ack,
                });

                Ok(PresenceOutcome::Deregistered(record))
            }
            StopPolicy::Retain => {
                info!(
                    "Stopped but not removed {} record {} with {} zone {}",
                    record.record_type(),
                    record.name(),
                    self.zone_client.provider_name(),
                    record.zone_id()
                );
                self.emit_event(ControllerEvent::Retained {
                    record: record.clone(),
                });

                Ok(PresenceOutcome::Retained(record))
            }
        }
    }

    /// Obtain a provider session, falling back to instance-role credentials
    async fn authenticate(&self) -> Result<Session> {
        let credentials = match &self.config.credentials {
            Some(credentials) => credentials.clone(),
            None => {
                debug!(
                    "No credentials configured, asking metadata source {}",
                    self.metadata.source_name()
                );
                self.metadata.instance_credentials().await?
            }
        };

        self.zone_client.authenticate(&credentials).await
    }

    /// Submit a single change
    async fn submit(&self, session: &Session, change: ChangeRequest) -> Result<ChangeAck> {
        debug!(
            "Submitting {} {} {} -> {} to zone {}",
            change.action,
            change.record.record_type(),
            change.record.name(),
            change.record.value(),
            change.record.zone_id()
        );

        let ack = self
            .zone_client
            .submit_change(session, change.record.zone_id(), &change)
            .await?;

        debug!("Change {} accepted with status {}", ack.id, ack.status);
        Ok(ack)
    }

    /// Move to Failed and hand the error back
    fn fail(&mut self, error: Error) -> Error {
        self.emit_event(ControllerEvent::Failed {
            phase: error.phase(),
            error: error.to_string(),
        });
        self.transition(PresenceState::Failed);
        error
    }

    fn transition(&mut self, next: PresenceState) {
        let from = self.state;
        if !from.can_transition_to(next) {
            warn!("Ignoring illegal state transition {:?} -> {:?}", from, next);
            return;
        }

        debug!("State transition {:?} -> {:?}", from, next);
        self.state = next;
        self.emit_event(ControllerEvent::StateChanged { from, to: next });
    }

    /// Emit a controller event
    fn emit_event(&self, event: ControllerEvent) {
        match self.event_tx.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!("Event channel full, dropping event. Consider increasing event_channel_capacity.");
            }
            // Nobody is listening; events are optional
            Err(mpsc::error::TrySendError::Closed(_)) => {}
        }
    }
}
