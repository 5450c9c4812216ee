//! Presence record and change request types
//!
//! A [`PresenceRecord`] is built once per process run. The registration
//! UPSERT and the optional deregistration DELETE are both built from the
//! same record, so the DELETE always matches the published value set.

use crate::error::{Error, Result};
use std::fmt;

/// The DNS record this process publishes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresenceRecord {
    name: String,
    record_type: String,
    value: String,
    ttl: u32,
    zone_id: String,
}

impl PresenceRecord {
    /// Build a record, validating its invariants
    ///
    /// # Errors
    ///
    /// - `Error::Config` if name, type or zone id is empty, or ttl is 0
    /// - `Error::Resolution` if the value is empty
    pub fn new(
        name: impl Into<String>,
        record_type: impl Into<String>,
        value: impl Into<String>,
        ttl: u32,
        zone_id: impl Into<String>,
    ) -> Result<Self> {
        let record = Self {
            name: name.into(),
            record_type: record_type.into(),
            value: value.into(),
            ttl,
            zone_id: zone_id.into(),
        };

        if record.name.is_empty() {
            return Err(Error::config("record name cannot be empty"));
        }
        if record.record_type.is_empty() {
            return Err(Error::config("record type cannot be empty"));
        }
        if record.zone_id.is_empty() {
            return Err(Error::config("zone id cannot be empty"));
        }
        if record.ttl == 0 {
            return Err(Error::config("ttl must be greater than zero"));
        }
        if record.value.is_empty() {
            return Err(Error::resolution("record value cannot be empty"));
        }

        Ok(record)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn record_type(&self) -> &str {
        &self.record_type
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn ttl(&self) -> u32 {
        self.ttl
    }

    pub fn zone_id(&self) -> &str {
        &self.zone_id
    }
}

/// Mutation applied to a record set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeAction {
    /// Create or replace
    Upsert,
    /// Remove; only succeeds when the value set matches exactly
    Delete,
}

impl ChangeAction {
    /// Wire name of the action
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeAction::Upsert => "UPSERT",
            ChangeAction::Delete => "DELETE",
        }
    }
}

impl fmt::Display for ChangeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One idempotent mutation submitted to a zone
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeRequest {
    pub action: ChangeAction,
    pub record: PresenceRecord,
}

impl ChangeRequest {
    /// Create-or-replace the record
    pub fn upsert(record: PresenceRecord) -> Self {
        Self {
            action: ChangeAction::Upsert,
            record,
        }
    }

    /// Remove the record
    pub fn delete(record: PresenceRecord) -> Self {
        Self {
            action: ChangeAction::Delete,
            record,
        }
    }

    /// The values submitted with this change
    ///
    /// Presence records always carry exactly one value.
    pub fn values(&self) -> Vec<&str> {
        vec![self.record.value()]
    }
}
