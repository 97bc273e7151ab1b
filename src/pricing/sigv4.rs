//! AWS Signature Version 4 signing for pricing API calls.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Credentials used to sign a request
#[derive(Debug, Clone)]
pub struct SigningCredentials<'a> {
    pub access_key_id: &'a str,
    pub secret_access_key: &'a str,
    pub session_token: Option<&'a str>,
}

/// Compute HMAC-SHA256.
fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    type HmacSha256 = Hmac<Sha256>;
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC key length");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

/// Hex-encode bytes.
fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// SHA-256 hash and hex-encode.
pub fn sha256_hex(data: &[u8]) -> String {
    use sha2::{Digest, Sha256};
    hex_encode(&Sha256::digest(data))
}

/// Host header value as the HTTP client will send it
fn host_header(url: &url::Url) -> String {
    let host = url.host_str().unwrap_or("");
    match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    }
}

/// Sign an HTTP request with AWS SigV4 at the current time.
///
/// Returns the headers to add to the request.
pub fn sign(
    method: &str,
    url: &url::Url,
    extra_headers: &[(&str, &str)],
    body: &[u8],
    credentials: &SigningCredentials<'_>,
    region: &str,
    service: &str,
) -> Vec<(String, String)> {
    sign_at(Utc::now(), method, url, extra_headers, body, credentials, region, service)
}

#[allow(clippy::too_many_arguments)]
pub(crate) fn sign_at(
    now: DateTime<Utc>,
    method: &str,
    url: &url::Url,
    extra_headers: &[(&str, &str)],
    body: &[u8],
    credentials: &SigningCredentials<'_>,
    region: &str,
    service: &str,
) -> Vec<(String, String)> {
    let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
    let date_stamp = now.format("%Y%m%d").to_string();
    let payload_hash = sha256_hex(body);

    // Canonical headers, sorted by lowercase name
    let mut headers_map: BTreeMap<String, String> = BTreeMap::new();
    headers_map.insert("host".to_string(), host_header(url));
    headers_map.insert("x-amz-date".to_string(), amz_date.clone());
    headers_map.insert("x-amz-content-sha256".to_string(), payload_hash.clone());
    if let Some(token) = credentials.session_token {
        headers_map.insert("x-amz-security-token".to_string(), token.to_string());
    }
    for (k, v) in extra_headers {
        headers_map.insert(k.to_ascii_lowercase(), v.to_string());
    }

    let canonical_headers: String = headers_map
        .iter()
        .map(|(k, v)| format!("{}:{}\n", k, v.trim()))
        .collect();
    let signed_headers = headers_map
        .keys()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(";");

    let canonical_uri = if url.path().is_empty() { "/" } else { url.path() };
    let canonical_querystring = url.query().unwrap_or("");

    let canonical_request = format!(
        "{}\n{}\n{}\n{}\n{}\n{}",
        method, canonical_uri, canonical_querystring,
        canonical_headers, signed_headers, payload_hash
    );

    let algorithm = "AWS4-HMAC-SHA256";
    let credential_scope = format!("{}/{}/{}/aws4_request", date_stamp, region, service);
    let string_to_sign = format!(
        "{}\n{}\n{}\n{}",
        algorithm, amz_date, credential_scope,
        sha256_hex(canonical_request.as_bytes())
    );

    let k_date = hmac_sha256(
        format!("AWS4{}", credentials.secret_access_key).as_bytes(),
        date_stamp.as_bytes(),
    );
    let k_region = hmac_sha256(&k_date, region.as_bytes());
    let k_service = hmac_sha256(&k_region, service.as_bytes());
    let k_signing = hmac_sha256(&k_service, b"aws4_request");

    let signature = hex_encode(&hmac_sha256(&k_signing, string_to_sign.as_bytes()));

    let authorization = format!(
        "{} Credential={}/{}, SignedHeaders={}, Signature={}",
        algorithm, credentials.access_key_id, credential_scope, signed_headers, signature
    );

    let mut result = vec![
        ("Authorization".to_string(), authorization),
        ("x-amz-date".to_string(), amz_date),
        ("x-amz-content-sha256".to_string(), payload_hash),
    ];
    if let Some(token) = credentials.session_token {
        result.push(("x-amz-security-token".to_string(), token.to_string()));
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn credentials() -> SigningCredentials<'static> {
        SigningCredentials {
            access_key_id: "AKIDEXAMPLE",
            secret_access_key: "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY",
            session_token: None,
        }
    }

    fn header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
        headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_sha256_of_empty_payload() {
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_authorization_scope_and_signed_headers() {
        let now = Utc.with_ymd_and_hms(2015, 8, 30, 12, 36, 0).unwrap();
        let url = url::Url::parse("https://api.pricing.us-east-1.amazonaws.com/").unwrap();

        let headers = sign_at(
            now,
            "POST",
            &url,
            &[("Content-Type", "application/x-amz-json-1.1")],
            b"{}",
            &credentials(),
            "us-east-1",
            "pricing",
        );

        let auth = header(&headers, "authorization").unwrap();
        assert!(auth.starts_with(
            "AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/20150830/us-east-1/pricing/aws4_request, "
        ));
        assert!(auth.contains(
            "SignedHeaders=content-type;host;x-amz-content-sha256;x-amz-date, "
        ));
        let signature = auth.rsplit("Signature=").next().unwrap();
        assert_eq!(signature.len(), 64);
        assert_eq!(header(&headers, "x-amz-date"), Some("20150830T123600Z"));
    }

    #[test]
    fn test_signature_is_deterministic_and_body_sensitive() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let url = url::Url::parse("https://api.pricing.us-east-1.amazonaws.com/").unwrap();
        let creds = credentials();

        let a = sign_at(now, "POST", &url, &[], b"{\"a\":1}", &creds, "us-east-1", "pricing");
        let b = sign_at(now, "POST", &url, &[], b"{\"a\":1}", &creds, "us-east-1", "pricing");
        let c = sign_at(now, "POST", &url, &[], b"{\"a\":2}", &creds, "us-east-1", "pricing");

        assert_eq!(header(&a, "authorization"), header(&b, "authorization"));
        assert_ne!(header(&a, "authorization"), header(&c, "authorization"));
    }

    #[test]
    fn test_session_token_is_signed_and_returned() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let url = url::Url::parse("http://127.0.0.1:8123/").unwrap();
        let creds = SigningCredentials {
            session_token: Some("token-123"),
            ..credentials()
        };

        let headers = sign_at(now, "POST", &url, &[], b"", &creds, "us-east-1", "pricing");
        assert_eq!(header(&headers, "x-amz-security-token"), Some("token-123"));
        assert!(header(&headers, "authorization")
            .unwrap()
            .contains("x-amz-security-token"));
    }

    #[test]
    fn test_host_header_keeps_explicit_port() {
        let url = url::Url::parse("http://127.0.0.1:8123/").unwrap();
        assert_eq!(host_header(&url), "127.0.0.1:8123");

        let url = url::Url::parse("https://api.pricing.us-east-1.amazonaws.com/").unwrap();
        assert_eq!(host_header(&url), "api.pricing.us-east-1.amazonaws.com");
    }
}
