//! Configuration types for the presence system
//!
//! Options are gathered as raw strings into [`PresenceSettings`] (by the
//! CLI, or directly by embedding code) and validated once into an immutable
//! [`PresenceConfig`] that is handed to the controller.

use crate::error::{Error, Result};
use crate::traits::Credentials;

/// TTL applied when none is configured (seconds)
pub const DEFAULT_TTL: u32 = 300;

/// Raw, unvalidated options as gathered from flags and environment
///
/// Every field is optional here; [`PresenceConfig::from_settings`] decides
/// which ones are required and applies defaults.
#[derive(Debug, Clone, Default)]
pub struct PresenceSettings {
    pub record_name: Option<String>,
    pub record_type: Option<String>,
    pub record_content: Option<String>,
    pub ttl: Option<String>,
    pub zone_id: Option<String>,
    pub ip_type: Option<String>,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub stop_behavior: Option<String>,
    pub endpoint: Option<String>,
    pub metadata_endpoint: Option<String>,
    pub dry_run: bool,
}

/// Main presence configuration
#[derive(Debug, Clone)]
pub struct PresenceConfig {
    /// The record to publish
    pub record: RecordConfig,

    /// Hosted zone identifier
    pub zone_id: String,

    /// Which instance address to publish when no explicit content is set
    pub ip_type: IpType,

    /// Explicit credentials; `None` means ask the metadata source
    pub credentials: Option<Credentials>,

    /// What to do with the record on termination
    pub stop_policy: StopPolicy,

    /// Zone client configuration
    pub provider: ProviderConfig,

    /// Metadata source configuration
    pub metadata: MetadataConfig,

    /// Capacity of the controller event channel
    pub event_channel_capacity: usize,
}

impl PresenceConfig {
    /// Build a configuration with defaults for everything but the record
    pub fn new(record: RecordConfig, zone_id: impl Into<String>) -> Self {
        Self {
            record,
            zone_id: zone_id.into(),
            ip_type: IpType::default(),
            credentials: None,
            stop_policy: StopPolicy::default(),
            provider: ProviderConfig::default(),
            metadata: MetadataConfig::default(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }

    /// Validate raw settings into a configuration
    ///
    /// Performs no I/O, so a malformed ttl is reported before any network
    /// call is attempted.
    pub fn from_settings(settings: PresenceSettings) -> Result<Self> {
        let ttl = parse_ttl(settings.ttl.as_deref())?;

        let name = required(settings.record_name, "record name", "--recordName", "ROUTE53_RECORD_NAME")?;
        let record_type =
            required(settings.record_type, "record type", "--recordType", "ROUTE53_RECORD_TYPE")?;
        let zone_id = required(settings.zone_id, "zone id", "--zoneID", "ROUTE53_ZONE_ID")?;

        let credentials = match (non_empty(settings.access_key), non_empty(settings.secret_key)) {
            (Some(access_key), Some(secret_key)) => Some(Credentials::new(access_key, secret_key)),
            (None, None) => None,
            _ => {
                return Err(Error::config(
                    "access key and secret key must be provided together",
                ));
            }
        };

        let mut record = RecordConfig::new(name, record_type).with_ttl(ttl);
        if let Some(content) = non_empty(settings.record_content) {
            record = record.with_content(content);
        }

        let config = Self {
            record,
            zone_id,
            ip_type: IpType::from_setting(settings.ip_type.as_deref()),
            credentials,
            stop_policy: StopPolicy::from_setting(settings.stop_behavior.as_deref()),
            provider: ProviderConfig::Route53 {
                endpoint: non_empty(settings.endpoint),
                dry_run: settings.dry_run,
            },
            metadata: MetadataConfig::Ec2 {
                endpoint: non_empty(settings.metadata_endpoint),
            },
            event_channel_capacity: default_event_channel_capacity(),
        };

        config.validate()?;
        Ok(config)
    }

    /// Set explicit credentials
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Set the stop policy
    pub fn with_stop_policy(mut self, stop_policy: StopPolicy) -> Self {
        self.stop_policy = stop_policy;
        self
    }

    /// Set the address type to discover
    pub fn with_ip_type(mut self, ip_type: IpType) -> Self {
        self.ip_type = ip_type;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.record.validate()?;

        if self.zone_id.is_empty() {
            return Err(Error::config("zone id cannot be empty"));
        }
        if self.event_channel_capacity == 0 {
            return Err(Error::config("event channel capacity must be > 0"));
        }

        self.provider.validate()?;
        self.metadata.validate()?;

        Ok(())
    }
}

/// DNS record configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordConfig {
    /// DNS record name (e.g. "svc.internal")
    pub name: String,

    /// Record type (A, AAAA, CNAME, ...), passed to the provider verbatim
    pub record_type: String,

    /// Explicit value to publish instead of a discovered address
    pub content: Option<String>,

    /// Time-to-live in seconds
    pub ttl: u32,
}

impl RecordConfig {
    /// Create a record configuration with the default ttl
    pub fn new(name: impl Into<String>, record_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            record_type: record_type.into(),
            content: None,
            ttl: DEFAULT_TTL,
        }
    }

    /// Set the ttl
    pub fn with_ttl(mut self, ttl: u32) -> Self {
        self.ttl = ttl;
        self
    }

    /// Publish this value verbatim
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Validate the record configuration
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(Error::config("record name cannot be empty"));
        }
        if self.record_type.is_empty() {
            return Err(Error::config("record type cannot be empty"));
        }
        if self.ttl == 0 {
            return Err(Error::config("ttl must be greater than zero"));
        }
        if self.content.as_deref() == Some("") {
            return Err(Error::config("record content cannot be empty when set"));
        }
        Ok(())
    }
}

/// Which instance address to publish
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IpType {
    Public,
    #[default]
    Private,
}

impl IpType {
    /// "public" selects the public address; anything else the private one
    pub fn from_setting(value: Option<&str>) -> Self {
        match value {
            Some("public") => IpType::Public,
            _ => IpType::Private,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IpType::Public => "public",
            IpType::Private => "private",
        }
    }
}

/// What happens to the record when the process is told to stop
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StopPolicy {
    /// Submit a DELETE for the registered record
    Delete,
    /// Leave the record published
    #[default]
    Retain,
}

impl StopPolicy {
    /// "DELETE" selects [`StopPolicy::Delete`]; anything else retains
    pub fn from_setting(value: Option<&str>) -> Self {
        match value {
            Some("DELETE") => StopPolicy::Delete,
            _ => StopPolicy::Retain,
        }
    }
}

/// Zone client configuration
#[derive(Debug, Clone)]
pub enum ProviderConfig {
    /// AWS Route 53
    Route53 {
        /// API base URL override
        endpoint: Option<String>,
        /// Log change batches instead of submitting them
        dry_run: bool,
    },
}

impl ProviderConfig {
    /// Validate the provider configuration
    pub fn validate(&self) -> Result<()> {
        match self {
            ProviderConfig::Route53 { endpoint, .. } => validate_endpoint(endpoint.as_deref()),
        }
    }

    /// Get the provider type name
    pub fn type_name(&self) -> &'static str {
        match self {
            ProviderConfig::Route53 { .. } => "route53",
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        ProviderConfig::Route53 {
            endpoint: None,
            dry_run: false,
        }
    }
}

/// Metadata source configuration
#[derive(Debug, Clone)]
pub enum MetadataConfig {
    /// EC2 instance metadata service
    Ec2 {
        /// Base URL override
        endpoint: Option<String>,
    },
}

impl MetadataConfig {
    /// Validate the metadata configuration
    pub fn validate(&self) -> Result<()> {
        match self {
            MetadataConfig::Ec2 { endpoint } => validate_endpoint(endpoint.as_deref()),
        }
    }

    /// Get the metadata source type name
    pub fn type_name(&self) -> &'static str {
        match self {
            MetadataConfig::Ec2 { .. } => "ec2",
        }
    }
}

impl Default for MetadataConfig {
    fn default() -> Self {
        MetadataConfig::Ec2 { endpoint: None }
    }
}

/// Parse a ttl setting
///
/// Absent or empty means [`DEFAULT_TTL`]. Anything else must be a positive
/// integer.
pub fn parse_ttl(value: Option<&str>) -> Result<u32> {
    let raw = match value.map(str::trim) {
        None | Some("") => return Ok(DEFAULT_TTL),
        Some(raw) => raw,
    };

    match raw.parse::<u32>() {
        Ok(0) => Err(Error::config("Invalid TTL '0': must be a positive integer")),
        Ok(ttl) => Ok(ttl),
        Err(e) => Err(Error::config(format!(
            "Invalid TTL '{}': must be a positive integer ({})",
            raw, e
        ))),
    }
}

fn validate_endpoint(endpoint: Option<&str>) -> Result<()> {
    if let Some(url) = endpoint
        && !url.starts_with("https://")
        && !url.starts_with("http://")
    {
        return Err(Error::config(format!(
            "Endpoint must use HTTP or HTTPS scheme. Got: {}",
            url
        )));
    }
    Ok(())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn required(value: Option<String>, what: &str, flag: &str, env: &str) -> Result<String> {
    non_empty(value).ok_or_else(|| {
        Error::config(format!(
            "{} is required. Set it via {} or {}",
            what, flag, env
        ))
    })
}

fn default_event_channel_capacity() -> usize {
    32
}
