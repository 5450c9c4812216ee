// # Route 53 Zone Client
//
// This crate provides an AWS Route 53 implementation of `ZoneClient`.
//
// ## Behaviour
//
// - One signed HTTP request per submitted change
// - Full error propagation to the controller
// - HTTP timeout configured (30 seconds)
// - Specific error mapping for Route 53 error codes and HTTP statuses
// - Dry-run mode for safe testing
// - NO retry logic, NO backoff, NO background tasks
//
// ## Security Requirements
//
// - Secret keys and session tokens NEVER appear in logs
// - Authentication fails fast on empty credentials
//
// ## API Reference
//
// - Route 53 API version 2013-04-01
// - Change record sets: POST `/2013-04-01/hostedzone/:zone_id/rrset/`
// - Requests are signed with AWS Signature Version 4

mod sigv4;
mod xml;

use async_trait::async_trait;
use chrono::Utc;
use presence_core::config::ProviderConfig;
use presence_core::traits::{ChangeAck, Credentials, Session, ZoneClient, ZoneClientFactory};
use presence_core::{ChangeRequest, Error, ProviderRegistry, Result};
use reqwest::Url;
use std::time::Duration;

/// Route 53 API base URL
pub const ROUTE53_API_BASE: &str = "https://route53.amazonaws.com";

/// Route 53 API version path segment
const API_VERSION: &str = "2013-04-01";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

const PROVIDER: &str = "route53";

/// Route 53 zone client
///
/// # Trust Level: Untrusted
///
/// This client is isolated, stateless, and single-shot. Coordination is
/// owned by the `PresenceController`.
///
/// # Dry-Run Mode
///
/// When `dry_run` is true, the client will:
/// - Authenticate and sign requests as usual
/// - Log the change batch it would have sent
/// - **NOT** contact Route 53
#[derive(Debug)]
pub struct Route53ZoneClient {
    /// API base URL
    endpoint: Url,

    /// HTTP client for API requests
    client: reqwest::Client,

    /// Dry-run mode: if true, log change batches instead of sending them
    dry_run: bool,
}

impl Route53ZoneClient {
    /// Create a new Route 53 zone client
    ///
    /// # Parameters
    ///
    /// - `endpoint`: API base URL; `None` selects [`ROUTE53_API_BASE`]
    /// - `dry_run`: If true, log change batches instead of sending them
    pub fn new(endpoint: Option<&str>, dry_run: bool) -> Result<Self> {
        let endpoint = endpoint.unwrap_or(ROUTE53_API_BASE);
        let endpoint = Url::parse(endpoint)
            .map_err(|e| Error::config(format!("Invalid Route 53 endpoint '{}': {}", endpoint, e)))?;

        if endpoint.host_str().is_none() {
            return Err(Error::config(format!(
                "Route 53 endpoint has no host: {}",
                endpoint
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::provider(PROVIDER, format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            endpoint,
            client,
            dry_run,
        })
    }

    /// Create a client against the public Route 53 endpoint
    pub fn new_live() -> Result<Self> {
        Self::new(None, false)
    }

    /// Create a dry-run client against the public Route 53 endpoint
    pub fn new_dry_run() -> Result<Self> {
        Self::new(None, true)
    }

    /// Host header value covered by the signature
    fn host(&self) -> String {
        let host = self.endpoint.host_str().unwrap_or_default();
        match self.endpoint.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        }
    }
}

#[async_trait]
impl ZoneClient for Route53ZoneClient {
    /// Route 53 has no login call; requests are signed individually. This
    /// checks the credentials are usable for signing.
    async fn authenticate(&self, credentials: &Credentials) -> Result<Session> {
        if credentials.access_key.trim().is_empty() {
            return Err(Error::auth("AWS access key is empty"));
        }
        if credentials.secret_key.is_empty() {
            return Err(Error::auth("AWS secret key is empty"));
        }

        tracing::debug!(
            "Route 53 session ready (temporary credentials: {})",
            credentials.session_token.is_some()
        );
        Ok(Session::new(credentials.clone()))
    }

    /// Submit one change
    ///
    /// # API Call
    ///
    /// ```http
    /// POST /2013-04-01/hostedzone/:zone_id/rrset/
    /// Authorization: AWS4-HMAC-SHA256 Credential=...
    ///
    /// <ChangeResourceRecordSetsRequest>...</ChangeResourceRecordSetsRequest>
    /// ```
    async fn submit_change(
        &self,
        session: &Session,
        zone_id: &str,
        change: &ChangeRequest,
    ) -> Result<ChangeAck> {
        let zone_id = normalize_zone_id(zone_id);
        if zone_id.is_empty() {
            return Err(Error::config("Route 53 zone id cannot be empty"));
        }

        let path = format!("/{}/hostedzone/{}/rrset/", API_VERSION, zone_id);
        let url = self
            .endpoint
            .join(&path)
            .map_err(|e| Error::config(format!("Invalid zone id '{}': {}", zone_id, e)))?;
        let body = xml::change_batch(change);

        let host = self.host();
        let signed = sigv4::sign(
            session.credentials(),
            &sigv4::SigningRequest {
                method: "POST",
                host: &host,
                path: url.path(),
                content_type: "text/xml",
                body: body.as_bytes(),
            },
            Utc::now(),
        );

        tracing::info!(
            "Submitting Route 53 change: {} {} {} -> {} [mode: {}]",
            change.action,
            change.record.record_type(),
            change.record.name(),
            change.record.value(),
            if self.dry_run { "DRY-RUN" } else { "LIVE" }
        );

        if self.dry_run {
            tracing::info!("[DRY-RUN] Would send POST {} with payload: {}", url, body);
            return Ok(ChangeAck {
                id: "dry-run".to_string(),
                status: "DRY-RUN".to_string(),
            });
        }

        let mut request = self
            .client
            .post(url)
            .header("Content-Type", "text/xml")
            .header("X-Amz-Date", &signed.amz_date)
            .header("Authorization", &signed.authorization);
        if let Some(token) = &signed.security_token {
            request = request.header("X-Amz-Security-Token", token);
        }

        let response = request
            .body(body)
            .send()
            .await
            .map_err(|e| Error::provider(PROVIDER, format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read response".to_string());

        if !status.is_success() {
            return Err(map_error(status.as_u16(), &text));
        }

        let id = xml::element_text(&text, "Id").ok_or_else(|| {
            Error::provider(PROVIDER, "Invalid response format: ChangeInfo.Id missing")
        })?;
        let status = xml::element_text(&text, "Status").ok_or_else(|| {
            Error::provider(PROVIDER, "Invalid response format: ChangeInfo.Status missing")
        })?;

        tracing::debug!("Route 53 accepted change {} ({})", id, status);
        Ok(ChangeAck { id, status })
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER
    }
}

/// Accept both `Z123` and `/hostedzone/Z123`
fn normalize_zone_id(zone_id: &str) -> &str {
    zone_id
        .trim()
        .trim_start_matches("/hostedzone/")
        .trim_matches('/')
}

/// Map a failed response to an error
fn map_error(status: u16, body: &str) -> Error {
    let code = xml::element_text(body, "Code").unwrap_or_default();
    let message = xml::element_text(body, "Message").unwrap_or_else(|| body.trim().to_string());

    match (status, code.as_str()) {
        (_, "Throttling") | (_, "PriorRequestNotComplete") | (429, _) => Error::rate_limited(
            format!("Route 53 throttled the request ({}): {}", status, message),
        ),
        (401 | 403, _)
        | (_, "SignatureDoesNotMatch")
        | (_, "InvalidClientTokenId")
        | (_, "AccessDenied") => Error::auth(format!(
            "Invalid AWS credentials or insufficient permissions ({} {}): {}",
            status, code, message
        )),
        (404, _) | (_, "NoSuchHostedZone") => {
            Error::not_found(format!("Hosted zone not found: {}", message))
        }
        (400, _) => Error::provider(
            PROVIDER,
            format!("Change rejected ({}): {}", code, message),
        ),
        (500..=599, _) => Error::provider(
            PROVIDER,
            format!("Route 53 server error (transient): {} - {}", status, message),
        ),
        _ => Error::provider(
            PROVIDER,
            format!("Change failed: {} {} - {}", status, code, message),
        ),
    }
}

/// Factory for creating Route 53 zone clients
pub struct Route53Factory;

impl ZoneClientFactory for Route53Factory {
    fn create(&self, config: &ProviderConfig) -> Result<Box<dyn ZoneClient>> {
        let ProviderConfig::Route53 { endpoint, dry_run } = config;
        if *dry_run {
            tracing::warn!("Route 53 client running in DRY-RUN mode - no changes will be made");
        }

        Ok(Box::new(Route53ZoneClient::new(
            endpoint.as_deref(),
            *dry_run,
        )?))
    }
}

/// Register the Route 53 zone client with a registry
pub fn register(registry: &ProviderRegistry) {
    registry.register_zone_client(PROVIDER, Box::new(Route53Factory));
}
