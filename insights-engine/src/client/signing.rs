//! AWS Signature Version 4 for JSON-protocol POST requests.

use chrono::{DateTime, Utc};
use insights_core::Credentials;
use ring::hmac;
use sha2::{Digest, Sha256};

const ALGORITHM: &str = "AWS4-HMAC-SHA256";
const SERVICE: &str = "logs";

/// The parts of an outgoing request that take part in the signature.
pub struct SigningRequest<'a> {
    pub host: &'a str,
    pub path: &'a str,
    pub content_type: &'a str,
    pub target: &'a str,
    pub payload: &'a [u8],
}

/// Headers to attach so the request authenticates as `credentials`.
pub fn sign(
    credentials: &Credentials,
    region: &str,
    request: &SigningRequest<'_>,
    at: DateTime<Utc>,
) -> Vec<(&'static str, String)> {
    let amz_date = at.format("%Y%m%dT%H%M%SZ").to_string();
    let date = at.format("%Y%m%d").to_string();
    let scope = format!("{}/{}/{}/aws4_request", date, region, SERVICE);

    let (canonical, signed_headers) =
        canonical_request(request, &amz_date, credentials.session_token.as_deref());
    let string_to_sign = format!(
        "{}\n{}\n{}\n{}",
        ALGORITHM,
        amz_date,
        scope,
        hex::encode(Sha256::digest(canonical.as_bytes()))
    );

    let key = signing_key(&credentials.secret_access_key, &date, region);
    let signature = hex::encode(hmac::sign(&key, string_to_sign.as_bytes()).as_ref());

    let mut headers = vec![
        ("x-amz-date", amz_date),
        (
            "authorization",
            format!(
                "{} Credential={}/{}, SignedHeaders={}, Signature={}",
                ALGORITHM, credentials.access_key_id, scope, signed_headers, signature
            ),
        ),
    ];
    if let Some(token) = &credentials.session_token {
        headers.push(("x-amz-security-token", token.clone()));
    }
    headers
}

/// Returns the canonical request and its signed-header list.
fn canonical_request(
    request: &SigningRequest<'_>,
    amz_date: &str,
    session_token: Option<&str>,
) -> (String, String) {
    let mut headers = vec![
        ("content-type", request.content_type),
        ("host", request.host),
        ("x-amz-date", amz_date),
        ("x-amz-target", request.target),
    ];
    if let Some(token) = session_token {
        headers.push(("x-amz-security-token", token));
    }
    headers.sort_by(|a, b| a.0.cmp(b.0));

    let canonical_headers: String = headers
        .iter()
        .map(|(name, value)| format!("{}:{}\n", name, value.trim()))
        .collect();
    let signed_headers = headers
        .iter()
        .map(|(name, _)| *name)
        .collect::<Vec<_>>()
        .join(";");
    let path = if request.path.is_empty() { "/" } else { request.path };

    let canonical = format!(
        "POST\n{}\n\n{}\n{}\n{}",
        path,
        canonical_headers,
        signed_headers,
        hex::encode(Sha256::digest(request.payload))
    );
    (canonical, signed_headers)
}

fn signing_key(secret: &str, date: &str, region: &str) -> hmac::Key {
    let derive = |key: &[u8], data: &str| {
        let key = hmac::Key::new(hmac::HMAC_SHA256, key);
        hmac::sign(&key, data.as_bytes()).as_ref().to_vec()
    };
    let k_date = derive(format!("AWS4{}", secret).as_bytes(), date);
    let k_region = derive(&k_date, region);
    let k_service = derive(&k_region, SERVICE);
    let k_signing = derive(&k_service, "aws4_request");
    hmac::Key::new(hmac::HMAC_SHA256, &k_signing)
}
