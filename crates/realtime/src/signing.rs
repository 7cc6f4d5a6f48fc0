//! AWS Signature Version 4 for the realtime handshake.
//!
//! AppSync authenticates IAM subscription sockets through a `header` query
//! parameter: the base64 of a JSON object holding the headers of a signed
//! request against the GraphQL host. The signed request here is a bodiless
//! `GET` of the GraphQL path, and the accompanying `payload` parameter is
//! always the base64 of `{}`.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::credentials::Credentials;

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "AWS4-HMAC-SHA256";

/// Service name AppSync signs under.
pub const APPSYNC_SERVICE: &str = "appsync";

/// base64 of `{}`, the fixed `payload` query parameter.
pub const EMPTY_PAYLOAD: &str = "e30=";

/// What to sign.
pub struct SigningParams<'a> {
    pub host: &'a str,
    pub path: &'a str,
    pub region: &'a str,
    pub service: &'a str,
    pub credentials: &'a Credentials,
    pub time: DateTime<Utc>,
}

/// Headers produced by signing, in the shape AppSync expects inside the
/// `header` query parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignedHeaders {
    pub host: String,
    #[serde(rename = "x-amz-date")]
    pub amz_date: String,
    #[serde(rename = "x-amz-security-token", skip_serializing_if = "Option::is_none")]
    pub security_token: Option<String>,
    #[serde(rename = "Authorization")]
    pub authorization: String,
}

impl SignedHeaders {
    /// base64(JSON(headers)), ready for the `header` query parameter.
    pub fn to_query_value(&self) -> String {
        let json = serde_json::to_vec(self).expect("SignedHeaders is always serialisable");
        STANDARD.encode(json)
    }
}

/// Sign a bodiless `GET` request.
pub fn sign_get(params: &SigningParams<'_>) -> SignedHeaders {
    let amz_date = params.time.format("%Y%m%dT%H%M%SZ").to_string();
    let date_stamp = params.time.format("%Y%m%d").to_string();

    let mut canonical_headers = format!("host:{}\nx-amz-date:{}\n", params.host, amz_date);
    let mut signed_header_names = String::from("host;x-amz-date");
    if let Some(token) = &params.credentials.session_token {
        canonical_headers.push_str(&format!("x-amz-security-token:{token}\n"));
        signed_header_names.push_str(";x-amz-security-token");
    }

    let canonical_request = format!(
        "GET\n{}\n\n{}\n{}\n{}",
        params.path,
        canonical_headers,
        signed_header_names,
        sha256_hex(b""),
    );

    let scope = format!(
        "{date_stamp}/{}/{}/aws4_request",
        params.region, params.service
    );
    let string_to_sign = format!(
        "{ALGORITHM}\n{amz_date}\n{scope}\n{}",
        sha256_hex(canonical_request.as_bytes())
    );

    let key = signing_key(
        &params.credentials.secret_access_key,
        &date_stamp,
        params.region,
        params.service,
    );
    let signature = hex::encode(hmac_sha256(&key, string_to_sign.as_bytes()));

    SignedHeaders {
        host: params.host.to_string(),
        amz_date,
        security_token: params.credentials.session_token.clone(),
        authorization: format!(
            "{ALGORITHM} Credential={}/{scope}, SignedHeaders={signed_header_names}, Signature={signature}",
            params.credentials.access_key_id
        ),
    }
}

/// Derive the per-day, per-region, per-service signing key.
pub fn signing_key(secret: &str, date_stamp: &str, region: &str, service: &str) -> Vec<u8> {
    let k_date = hmac_sha256(format!("AWS4{secret}").as_bytes(), date_stamp.as_bytes());
    let k_region = hmac_sha256(&k_date, region.as_bytes());
    let k_service = hmac_sha256(&k_region, service.as_bytes());
    hmac_sha256(&k_service, b"aws4_request")
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts keys of any length");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}
