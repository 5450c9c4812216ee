// # Zone Client Trait
//
// Defines the interface for authenticating against a DNS provider and
// submitting record changes to a hosted zone.
//
// ## Implementations
//
// - Route 53: `presence-provider-route53` crate
//
// ## Usage
//
// ```rust,ignore
// use presence_core::{ChangeRequest, Credentials, PresenceRecord, ZoneClient};
//
// async fn publish(client: &dyn ZoneClient) -> presence_core::Result<()> {
//     let session = client.authenticate(&Credentials::new("AKID", "secret")).await?;
//     let record = PresenceRecord::new("svc.internal", "A", "10.0.1.5", 300, "Z123")?;
//     client.submit_change(&session, "Z123", &ChangeRequest::upsert(record)).await?;
//     Ok(())
// }
// ```

use async_trait::async_trait;
use std::fmt;

use crate::record::ChangeRequest;

/// Provider credentials
///
/// The Debug implementation intentionally does NOT expose the secret key
/// or session token.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub access_key: String,
    pub secret_key: String,
    /// Session token for temporary (instance-role) credentials
    pub session_token: Option<String>,
}

impl Credentials {
    /// Long-lived key pair
    pub fn new(access_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            access_key: access_key.into(),
            secret_key: secret_key.into(),
            session_token: None,
        }
    }

    /// Attach a session token
    pub fn with_session_token(mut self, token: impl Into<String>) -> Self {
        self.session_token = Some(token.into());
        self
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key", &self.access_key)
            .field("secret_key", &"<REDACTED>")
            .field(
                "session_token",
                &self.session_token.as_ref().map(|_| "<REDACTED>"),
            )
            .finish()
    }
}

/// An authenticated provider session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    credentials: Credentials,
}

impl Session {
    pub fn new(credentials: Credentials) -> Self {
        Self { credentials }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }
}

/// Acknowledgement of a submitted change
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeAck {
    /// Provider-assigned change identifier
    pub id: String,
    /// Provider-reported status (e.g. PENDING, INSYNC)
    pub status: String,
}

/// Trait for DNS zone clients
///
/// # Trust Level: Untrusted
///
/// Zone clients perform HTTP calls to their provider endpoint only. They
/// never retry, never spawn tasks, and never decide whether a change is
/// needed; that belongs to the `PresenceController`.
///
/// Any failure is returned to the caller. A swallowed failure would leave
/// the caller unable to tell whether the record is published.
#[async_trait]
pub trait ZoneClient: Send + Sync {
    /// Obtain a session for the given credentials
    ///
    /// # Returns
    ///
    /// - `Ok(Session)`: Session usable with [`ZoneClient::submit_change`]
    /// - `Err(Error::Authentication)`: If the credentials are rejected
    async fn authenticate(&self, credentials: &Credentials) -> Result<Session, crate::Error>;

    /// Submit one change to a hosted zone
    ///
    /// # Idempotency
    ///
    /// UPSERT is create-or-replace: repeating it with identical values is a
    /// no-op to observers. DELETE succeeds only if the submitted value set
    /// matches the published one exactly.
    async fn submit_change(
        &self,
        session: &Session,
        zone_id: &str,
        change: &ChangeRequest,
    ) -> Result<ChangeAck, crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}

/// Helper trait for constructing zone clients from configuration
pub trait ZoneClientFactory: Send + Sync {
    /// Create a ZoneClient instance from configuration
    fn create(
        &self,
        config: &crate::config::ProviderConfig,
    ) -> Result<Box<dyn ZoneClient>, crate::Error>;
}
