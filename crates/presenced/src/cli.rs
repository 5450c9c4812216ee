//! Command-line definition
//!
//! Every option can also be set through its environment variable. Values
//! stay raw strings here; validation happens in `PresenceConfig::from_settings`.

use clap::Parser;
use clap::builder::FalseyValueParser;
use presence_core::PresenceSettings;
use tracing::Level;

/// Legacy variable names accepted when the primary ones are unset
pub const ACCESS_KEY_FALLBACK_ENV: &str = "AWS_ACCESS_KEY_ID";
pub const SECRET_KEY_FALLBACK_ENV: &str = "AWS_SECRET_ACCESS_KEY";

/// Publish this process's address in Route 53 while it runs
///
/// The record is upserted on start. On SIGTERM or SIGINT it is deleted
/// when the stop behavior is DELETE, and left in place otherwise.
#[derive(Parser, Debug)]
#[command(name = "presenced")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Fully-qualified record name
    #[arg(long = "recordName", env = "ROUTE53_RECORD_NAME")]
    pub record_name: Option<String>,

    /// Record type (A, AAAA, CNAME, TXT, ...)
    #[arg(long = "recordType", env = "ROUTE53_RECORD_TYPE")]
    pub record_type: Option<String>,

    /// Explicit record value; skips instance address discovery
    #[arg(long = "recordContent", env = "ROUTE53_RECORD_CONTENT")]
    pub record_content: Option<String>,

    /// Record TTL in seconds [default: 300]
    #[arg(long = "ttl", env = "ROUTE53_TTL")]
    pub ttl: Option<String>,

    /// Hosted zone identifier
    #[arg(long = "zoneID", env = "ROUTE53_ZONE_ID")]
    pub zone_id: Option<String>,

    /// Instance address to publish: "public" or "private"
    #[arg(long = "ipType", env = "ROUTE53_IP_TYPE")]
    pub ip_type: Option<String>,

    /// AWS access key (falls back to AWS_ACCESS_KEY_ID)
    #[arg(long = "accessKey", env = "AWS_ACCESS_KEY", hide_env_values = true)]
    pub access_key: Option<String>,

    /// AWS secret key (falls back to AWS_SECRET_ACCESS_KEY)
    #[arg(long = "secretKey", env = "AWS_SECRET_KEY", hide_env_values = true)]
    pub secret_key: Option<String>,

    /// DELETE removes the record on termination; anything else keeps it
    #[arg(long = "stopBehavior", env = "ROUTE53_STOP_BEHAVIOR")]
    pub stop_behavior: Option<String>,

    /// Route 53 API endpoint [default: https://route53.amazonaws.com]
    #[arg(long = "endpoint", env = "ROUTE53_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Instance metadata endpoint [default: http://169.254.169.254]
    #[arg(long = "metadataEndpoint", env = "ROUTE53_METADATA_ENDPOINT")]
    pub metadata_endpoint: Option<String>,

    /// Log change batches instead of sending them
    #[arg(
        long = "dryRun",
        env = "ROUTE53_DRY_RUN",
        value_parser = FalseyValueParser::new()
    )]
    pub dry_run: bool,

    /// Log level: trace, debug, info, warn, error
    #[arg(long = "logLevel", env = "ROUTE53_LOG_LEVEL", default_value = "info")]
    pub log_level: Level,
}

impl Cli {
    /// Convert into raw settings
    ///
    /// `lookup` reads the fallback credential variables.
    pub fn into_settings(self, lookup: impl Fn(&str) -> Option<String>) -> PresenceSettings {
        PresenceSettings {
            record_name: self.record_name,
            record_type: self.record_type,
            record_content: self.record_content,
            ttl: self.ttl,
            zone_id: self.zone_id,
            ip_type: self.ip_type,
            access_key: self.access_key.or_else(|| lookup(ACCESS_KEY_FALLBACK_ENV)),
            secret_key: self.secret_key.or_else(|| lookup(SECRET_KEY_FALLBACK_ENV)),
            stop_behavior: self.stop_behavior,
            endpoint: self.endpoint,
            metadata_endpoint: self.metadata_endpoint,
            dry_run: self.dry_run,
        }
    }
}
