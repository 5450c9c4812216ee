//! Error types for the presence system
//!
//! This module defines all error types used throughout the crate.

use std::fmt;
use thiserror::Error;

/// Result type alias for presence operations
pub type Result<T> = std::result::Result<T, Error>;

/// Lifecycle phase an error occurred in
///
/// The daemon reports fatal errors as a single line naming the phase,
/// so every error leaving the controller is tagged with one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Validating configuration
    Configuration,
    /// Computing the value to publish
    Resolution,
    /// Obtaining a provider session
    Authentication,
    /// Building the zone client or metadata source
    ClientSetup,
    /// Submitting the UPSERT
    Registration,
    /// Submitting the DELETE
    Deregistration,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Configuration => "configuration",
            Phase::Resolution => "address resolution",
            Phase::Authentication => "authentication",
            Phase::ClientSetup => "client setup",
            Phase::Registration => "registration",
            Phase::Deregistration => "deregistration",
        };
        f.write_str(name)
    }
}

/// Core error type for the presence system
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed or missing configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// The address to publish could not be determined
    #[error("Resolution error: {0}")]
    Resolution(String),

    /// Authentication errors
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Provider-specific error
    #[error("Provider error ({provider}): {message}")]
    Provider {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },

    /// Hosted zone or record not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limiting errors
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// An error tagged with the lifecycle phase it occurred in
    #[error("{phase} failed: {source}")]
    Phase {
        /// Phase that failed
        phase: Phase,
        /// Underlying cause
        #[source]
        source: Box<Error>,
    },

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a resolution error
    pub fn resolution(msg: impl Into<String>) -> Self {
        Self::Resolution(msg.into())
    }

    /// Create an authentication error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    /// Create a provider-specific error
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create a "not found" error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a rate limit error
    pub fn rate_limited(msg: impl Into<String>) -> Self {
        Self::RateLimited(msg.into())
    }

    /// Tag this error with the phase it occurred in
    ///
    /// Already-tagged errors keep their original phase.
    pub fn in_phase(self, phase: Phase) -> Self {
        match self {
            Self::Phase { .. } => self,
            other => Self::Phase {
                phase,
                source: Box::new(other),
            },
        }
    }

    /// The phase this error was tagged with, if any
    pub fn phase(&self) -> Option<Phase> {
        match self {
            Self::Phase { phase, .. } => Some(*phase),
            _ => None,
        }
    }

    /// The untagged cause of this error
    pub fn root(&self) -> &Error {
        match self {
            Self::Phase { source, .. } => source.root(),
            other => other,
        }
    }

    /// Whether this is a configuration error (tagged or not)
    pub fn is_config(&self) -> bool {
        matches!(self.root(), Self::Config(_))
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
