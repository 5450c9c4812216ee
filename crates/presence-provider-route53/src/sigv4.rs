//! AWS Signature Version 4 request signing
//!
//! Route 53 is a global service signed against `us-east-1`. Only the
//! pieces this crate needs are implemented: POST requests with an empty
//! query string and a fixed set of signed headers.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use presence_core::Credentials;
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "AWS4-HMAC-SHA256";
pub(crate) const REGION: &str = "us-east-1";
pub(crate) const SERVICE: &str = "route53";

/// The parts of a request that are covered by the signature
pub(crate) struct SigningRequest<'a> {
    pub method: &'a str,
    /// Host header value, including a non-default port
    pub host: &'a str,
    pub path: &'a str,
    pub content_type: &'a str,
    pub body: &'a [u8],
}

/// Headers to attach to a signed request
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SignedHeaders {
    pub authorization: String,
    pub amz_date: String,
    pub security_token: Option<String>,
}

/// Sign a request at the given instant
pub(crate) fn sign(
    credentials: &Credentials,
    request: &SigningRequest<'_>,
    now: DateTime<Utc>,
) -> SignedHeaders {
    let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
    let date_stamp = now.format("%Y%m%d").to_string();

    // Header names must be lowercase and sorted
    let mut headers = vec![
        ("content-type", request.content_type.to_string()),
        ("host", request.host.to_string()),
        ("x-amz-date", amz_date.clone()),
    ];
    if let Some(token) = &credentials.session_token {
        headers.push(("x-amz-security-token", token.clone()));
    }

    let canonical_headers: String = headers
        .iter()
        .map(|(name, value)| format!("{}:{}\n", name, value.trim()))
        .collect();
    let signed_headers = headers
        .iter()
        .map(|(name, _)| *name)
        .collect::<Vec<_>>()
        .join(";");

    let canonical_request = [
        request.method,
        request.path,
        "",
        &canonical_headers,
        &signed_headers,
        &hex::encode(Sha256::digest(request.body)),
    ]
    .join("\n");

    let scope = format!("{}/{}/{}/aws4_request", date_stamp, REGION, SERVICE);
    let string_to_sign = [
        ALGORITHM,
        &amz_date,
        &scope,
        &hex::encode(Sha256::digest(canonical_request.as_bytes())),
    ]
    .join("\n");

    let signing_key = [date_stamp.as_str(), REGION, SERVICE, "aws4_request"]
        .iter()
        .fold(
            format!("AWS4{}", credentials.secret_key).into_bytes(),
            |key, part| hmac_sha256(&key, part.as_bytes()),
        );
    let signature = hex::encode(hmac_sha256(&signing_key, string_to_sign.as_bytes()));

    SignedHeaders {
        authorization: format!(
            "{} Credential={}/{}, SignedHeaders={}, Signature={}",
            ALGORITHM, credentials.access_key, scope, signed_headers, signature
        ),
        amz_date,
        security_token: credentials.session_token.clone(),
    }
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts keys of any length");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}
