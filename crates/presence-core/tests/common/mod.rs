//! Test doubles and common utilities for presence contract tests
//!
//! The doubles record every call so tests can assert on exactly which
//! requests reached the provider and the metadata service.

#![allow(dead_code)]

use presence_core::controller::ControllerEvent;
use presence_core::error::Result;
use presence_core::traits::{ChangeAck, Credentials, InstanceMetadata, Session, ZoneClient};
use presence_core::{ChangeAction, ChangeRequest, Error, PresenceConfig, PresenceSettings};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

/// A zone client that records submitted changes
///
/// Clones share their recordings, so a test can keep one clone and hand
/// the other to the controller.
#[derive(Clone, Default)]
pub struct RecordingZoneClient {
    changes: Arc<Mutex<Vec<(String, ChangeRequest)>>>,
    authenticated: Arc<Mutex<Vec<Credentials>>>,
    fail_on: Option<ChangeAction>,
    reject_auth: bool,
}

impl RecordingZoneClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every submission with this action
    pub fn failing_on(mut self, action: ChangeAction) -> Self {
        self.fail_on = Some(action);
        self
    }

    /// Reject every authentication attempt
    pub fn rejecting_auth(mut self) -> Self {
        self.reject_auth = true;
        self
    }

    /// (zone id, change) pairs in submission order
    pub fn changes(&self) -> Vec<(String, ChangeRequest)> {
        self.changes.lock().unwrap().clone()
    }

    pub fn actions(&self) -> Vec<ChangeAction> {
        self.changes().into_iter().map(|(_, c)| c.action).collect()
    }

    pub fn authenticated_with(&self) -> Vec<Credentials> {
        self.authenticated.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ZoneClient for RecordingZoneClient {
    async fn authenticate(&self, credentials: &Credentials) -> Result<Session> {
        self.authenticated.lock().unwrap().push(credentials.clone());
        if self.reject_auth {
            return Err(Error::auth("The security token included in the request is invalid"));
        }
        Ok(Session::new(credentials.clone()))
    }

    async fn submit_change(
        &self,
        _session: &Session,
        zone_id: &str,
        change: &ChangeRequest,
    ) -> Result<ChangeAck> {
        self.changes
            .lock()
            .unwrap()
            .push((zone_id.to_string(), change.clone()));

        if self.fail_on == Some(change.action) {
            return Err(Error::provider("recording", "InvalidChangeBatch"));
        }

        let n = self.changes.lock().unwrap().len();
        Ok(ChangeAck {
            id: format!("/change/C{}", n),
            status: "PENDING".to_string(),
        })
    }

    fn provider_name(&self) -> &'static str {
        "recording"
    }
}

/// A metadata source with fixed answers that counts lookups
#[derive(Clone)]
pub struct StaticMetadata {
    public: String,
    local: String,
    credentials: Option<Credentials>,
    lookups: Arc<AtomicUsize>,
    credential_lookups: Arc<AtomicUsize>,
}

impl StaticMetadata {
    pub fn new(public: &str, local: &str) -> Self {
        Self {
            public: public.to_string(),
            local: local.to_string(),
            credentials: None,
            lookups: Arc::new(AtomicUsize::new(0)),
            credential_lookups: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A source whose service is unreachable
    pub fn unreachable() -> Self {
        Self::new("127.0.0.1", "127.0.0.1")
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Number of address lookups performed
    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    pub fn credential_lookup_count(&self) -> usize {
        self.credential_lookups.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl InstanceMetadata for StaticMetadata {
    async fn public_address(&self) -> String {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.public.clone()
    }

    async fn local_address(&self) -> String {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.local.clone()
    }

    async fn instance_credentials(&self) -> Result<Credentials> {
        self.credential_lookups.fetch_add(1, Ordering::SeqCst);
        self.credentials
            .clone()
            .ok_or_else(|| Error::auth("no instance role attached"))
    }

    fn source_name(&self) -> &'static str {
        "static"
    }
}

/// Settings for the canonical scenario: svc.internal A record, private
/// address, default ttl, delete on stop
pub fn scenario_settings() -> PresenceSettings {
    PresenceSettings {
        record_name: Some("svc.internal".to_string()),
        record_type: Some("A".to_string()),
        zone_id: Some("Z0123456789".to_string()),
        ip_type: Some("private".to_string()),
        access_key: Some("AKIDEXAMPLE".to_string()),
        secret_key: Some("wJalrXUtnFEMI".to_string()),
        stop_behavior: Some("DELETE".to_string()),
        ..Default::default()
    }
}

pub fn scenario_config() -> PresenceConfig {
    PresenceConfig::from_settings(scenario_settings()).expect("scenario settings are valid")
}

/// Wait until the controller reports a successful registration
pub async fn wait_for_registered(events: &mut mpsc::Receiver<ControllerEvent>) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while let Some(event) = events.recv().await {
            if matches!(event, ControllerEvent::Registered { .. }) {
                return;
            }
        }
        panic!("event channel closed before registration");
    })
    .await
    .expect("registration within 5 seconds");
}

/// Drain whatever events are currently buffered
pub fn drain(events: &mut mpsc::Receiver<ControllerEvent>) -> Vec<ControllerEvent> {
    let mut out = Vec::new();
    while let Ok(event) = events.try_recv() {
        out.push(event);
    }
    out
}
