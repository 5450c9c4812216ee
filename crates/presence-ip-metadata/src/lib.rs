// # EC2 Instance Metadata Source
//
// This crate provides an `InstanceMetadata` implementation backed by the
// EC2 instance metadata service (IMDS).
//
// ## Behaviour
//
// - Address lookups are one HTTP GET each and never fail: any transport
//   error, non-success status or empty body yields the loopback sentinel
// - IMDSv2 session tokens are requested first; when the token call fails
//   the lookup proceeds without one (IMDSv1)
// - Role credentials are read from the `iam/security-credentials` tree
//
// ## Endpoints
//
// - `PUT /latest/api/token`
// - `GET /latest/meta-data/public-ipv4`
// - `GET /latest/meta-data/local-ipv4`
// - `GET /latest/meta-data/iam/security-credentials/[:role]`

use presence_core::config::MetadataConfig;
use presence_core::traits::{Credentials, InstanceMetadata, InstanceMetadataFactory, LOOPBACK_SENTINEL};
use presence_core::{Error, ProviderRegistry, Result};

use serde::Deserialize;
use std::time::Duration;

/// Link-local address of the metadata service
pub const DEFAULT_METADATA_ENDPOINT: &str = "http://169.254.169.254";

const TOKEN_PATH: &str = "/latest/api/token";
const PUBLIC_IPV4_PATH: &str = "/latest/meta-data/public-ipv4";
const LOCAL_IPV4_PATH: &str = "/latest/meta-data/local-ipv4";
const CREDENTIALS_PATH: &str = "/latest/meta-data/iam/security-credentials/";

const TOKEN_TTL_HEADER: &str = "X-aws-ec2-metadata-token-ttl-seconds";
const TOKEN_HEADER: &str = "X-aws-ec2-metadata-token";
const TOKEN_TTL_SECS: &str = "21600";

/// The service is link-local; anything slower is treated as unreachable
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(5);

const SOURCE: &str = "ec2";

/// Role credentials document
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RoleCredentials {
    access_key_id: String,
    secret_access_key: String,
    #[serde(default)]
    token: Option<String>,
}

/// EC2 instance metadata source
pub struct Ec2Metadata {
    /// Base URL of the metadata service
    endpoint: String,

    /// HTTP client
    client: reqwest::Client,
}

impl Ec2Metadata {
    /// Create a new metadata source
    ///
    /// # Parameters
    ///
    /// - `endpoint`: Base URL override; `None` uses [`DEFAULT_METADATA_ENDPOINT`]
    pub fn new(endpoint: Option<&str>) -> Result<Self> {
        let endpoint = endpoint
            .unwrap_or(DEFAULT_METADATA_ENDPOINT)
            .trim_end_matches('/')
            .to_string();

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::provider(SOURCE, format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { endpoint, client })
    }

    /// Request an IMDSv2 session token
    async fn session_token(&self) -> Option<String> {
        let response = self
            .client
            .put(format!("{}{}", self.endpoint, TOKEN_PATH))
            .header(TOKEN_TTL_HEADER, TOKEN_TTL_SECS)
            .send()
            .await;

        match response {
            Ok(response) if response.status().is_success() => {
                response.text().await.ok().filter(|t| !t.trim().is_empty())
            }
            Ok(response) => {
                tracing::debug!(
                    "IMDSv2 token request returned {}, falling back to IMDSv1",
                    response.status()
                );
                None
            }
            Err(e) => {
                tracing::debug!("IMDSv2 token request failed, falling back to IMDSv1: {}", e);
                None
            }
        }
    }

    /// GET a metadata path and return its trimmed body
    async fn fetch(&self, path: &str) -> Result<String> {
        let mut request = self.client.get(format!("{}{}", self.endpoint, path));
        if let Some(token) = self.session_token().await {
            request = request.header(TOKEN_HEADER, token.trim());
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::provider(SOURCE, format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::provider(
                SOURCE,
                format!("HTTP error for {}: {}", path, response.status()),
            ));
        }

        let text = response
            .text()
            .await
            .map_err(|e| Error::provider(SOURCE, format!("Failed to read response: {}", e)))?;

        Ok(text.trim().to_string())
    }

    /// Address lookup with the sentinel fallback
    async fn address(&self, path: &str) -> String {
        match self.fetch(path).await {
            Ok(address) if !address.is_empty() => address,
            Ok(_) => {
                tracing::warn!("Metadata service returned an empty body for {}", path);
                LOOPBACK_SENTINEL.to_string()
            }
            Err(e) => {
                tracing::warn!("Metadata lookup failed: {}", e);
                LOOPBACK_SENTINEL.to_string()
            }
        }
    }
}

#[async_trait::async_trait]
impl InstanceMetadata for Ec2Metadata {
    async fn public_address(&self) -> String {
        self.address(PUBLIC_IPV4_PATH).await
    }

    async fn local_address(&self) -> String {
        self.address(LOCAL_IPV4_PATH).await
    }

    async fn instance_credentials(&self) -> Result<Credentials> {
        let roles = self.fetch(CREDENTIALS_PATH).await.map_err(|e| {
            Error::auth(format!("No instance role credentials available: {}", e))
        })?;

        let role = roles
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .ok_or_else(|| Error::auth("No IAM role is attached to this instance"))?;

        tracing::debug!("Using credentials of instance role '{}'", role);

        let document = self
            .fetch(&format!("{}{}", CREDENTIALS_PATH, role))
            .await
            .map_err(|e| Error::auth(format!("Failed to read role credentials: {}", e)))?;

        let creds: RoleCredentials = serde_json::from_str(&document)
            .map_err(|e| Error::auth(format!("Malformed role credentials: {}", e)))?;

        let credentials = Credentials::new(creds.access_key_id, creds.secret_access_key);
        Ok(match creds.token {
            Some(token) if !token.is_empty() => credentials.with_session_token(token),
            _ => credentials,
        })
    }

    fn source_name(&self) -> &'static str {
        SOURCE
    }
}

/// Factory for creating EC2 metadata sources
pub struct Ec2MetadataFactory;

impl InstanceMetadataFactory for Ec2MetadataFactory {
    fn create(&self, config: &MetadataConfig) -> Result<Box<dyn InstanceMetadata>> {
        let MetadataConfig::Ec2 { endpoint } = config;
        Ok(Box::new(Ec2Metadata::new(endpoint.as_deref())?))
    }
}

/// Register the EC2 metadata source with a registry
pub fn register(registry: &ProviderRegistry) {
    registry.register_metadata(SOURCE, Box::new(Ec2MetadataFactory));
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    #[test]
    fn test_factory_creation() {
        let config = MetadataConfig::Ec2 { endpoint: None };

        let source = Ec2MetadataFactory.create(&config);
        assert!(source.is_ok());
        assert_eq!(source.unwrap().source_name(), "ec2");
    }

    #[test]
    fn test_register() {
        let registry = ProviderRegistry::new();
        register(&registry);
        assert!(registry.has_metadata("ec2"));
    }

    #[tokio::test]
    async fn test_local_address_with_token() {
        let server = MockServer::start_async().await;
        let token = server
            .mock_async(|when, then| {
                when.method(PUT)
                    .path(TOKEN_PATH)
                    .header("x-aws-ec2-metadata-token-ttl-seconds", "21600");
                then.status(200).body("tok-123");
            })
            .await;
        let address = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path(LOCAL_IPV4_PATH)
                    .header("x-aws-ec2-metadata-token", "tok-123");
                then.status(200).body("10.0.1.5\n");
            })
            .await;

        let metadata = Ec2Metadata::new(Some(&server.base_url())).unwrap();
        assert_eq!(metadata.local_address().await, "10.0.1.5");

        token.assert_async().await;
        address.assert_async().await;
    }

    #[tokio::test]
    async fn test_public_address_without_token() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(PUT).path(TOKEN_PATH);
                then.status(403);
            })
            .await;
        let address = server
            .mock_async(|when, then| {
                when.method(GET).path(PUBLIC_IPV4_PATH);
                then.status(200).body("54.1.2.3");
            })
            .await;

        let metadata = Ec2Metadata::new(Some(&server.base_url())).unwrap();
        assert_eq!(metadata.public_address().await, "54.1.2.3");
        address.assert_async().await;
    }

    #[tokio::test]
    async fn test_missing_address_yields_sentinel() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path(PUBLIC_IPV4_PATH);
                then.status(404);
            })
            .await;

        let metadata = Ec2Metadata::new(Some(&server.base_url())).unwrap();
        assert_eq!(metadata.public_address().await, LOOPBACK_SENTINEL);
    }

    #[tokio::test]
    async fn test_unreachable_service_yields_sentinel() {
        let metadata = Ec2Metadata::new(Some("http://127.0.0.1:1")).unwrap();
        assert_eq!(metadata.local_address().await, LOOPBACK_SENTINEL);
    }

    #[tokio::test]
    async fn test_instance_credentials() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path(CREDENTIALS_PATH);
                then.status(200).body("presence-role\n");
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/latest/meta-data/iam/security-credentials/presence-role");
                then.status(200).body(
                    r#"{
                        "Code": "Success",
                        "Type": "AWS-HMAC",
                        "AccessKeyId": "ASIAEXAMPLE",
                        "SecretAccessKey": "role-secret",
                        "Token": "role-token",
                        "Expiration": "2026-10-19T18:00:00Z"
                    }"#,
                );
            })
            .await;

        let metadata = Ec2Metadata::new(Some(&server.base_url())).unwrap();
        let creds = metadata.instance_credentials().await.unwrap();

        assert_eq!(creds.access_key, "ASIAEXAMPLE");
        assert_eq!(creds.secret_key, "role-secret");
        assert_eq!(creds.session_token.as_deref(), Some("role-token"));
    }

    #[tokio::test]
    async fn test_malformed_role_document_is_auth_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path(CREDENTIALS_PATH);
                then.status(200).body("presence-role");
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/latest/meta-data/iam/security-credentials/presence-role");
                then.status(200).body("{\"Code\": \"Success\"");
            })
            .await;

        let metadata = Ec2Metadata::new(Some(&server.base_url())).unwrap();
        let err = metadata.instance_credentials().await.unwrap_err();

        assert!(matches!(err, Error::Authentication(_)));
        assert!(err.to_string().contains("Malformed role credentials"));
    }

    #[tokio::test]
    async fn test_no_role_is_auth_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path(CREDENTIALS_PATH);
                then.status(404);
            })
            .await;

        let metadata = Ec2Metadata::new(Some(&server.base_url())).unwrap();
        let err = metadata.instance_credentials().await.unwrap_err();
        assert!(matches!(err, Error::Authentication(_)));
    }
}
