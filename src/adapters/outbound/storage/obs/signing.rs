//! AWS Signature V4 request signing, accepted by OBS's S3-compatible API.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use http::Method;
use reqwest::Url;
use sha2::{Digest, Sha256};

const ALGORITHM: &str = "AWS4-HMAC-SHA256";
const SERVICE: &str = "s3";
const SIGNED_HEADERS: &str = "host;x-amz-content-sha256;x-amz-date";

/// Payload hash for requests whose body is not hashed
pub const UNSIGNED_PAYLOAD: &str = "UNSIGNED-PAYLOAD";

/// Hex SHA-256 of a request body
pub fn payload_hash(body: &[u8]) -> String {
    hex::encode(Sha256::digest(body))
}

/// Headers to attach to a signed request
#[derive(Debug, Clone, PartialEq)]
pub struct SignedHeaders {
    pub authorization: String,
    pub amz_date: String,
    pub content_sha256: String,
}

/// Signs requests with a fixed access key pair and region
#[derive(Clone)]
pub struct RequestSigner {
    access_key: String,
    secret_key: String,
    region: String,
}

impl std::fmt::Debug for RequestSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestSigner")
            .field("access_key", &self.access_key)
            .field("region", &self.region)
            .finish_non_exhaustive()
    }
}

impl RequestSigner {
    pub fn new(access_key: &str, secret_key: &str, region: &str) -> Self {
        Self {
            access_key: access_key.to_string(),
            secret_key: secret_key.to_string(),
            region: region.to_string(),
        }
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    /// Sign `method url` carrying a body with hash `content_sha256`, as of `now`
    pub fn sign(
        &self,
        method: &Method,
        url: &Url,
        content_sha256: &str,
        now: DateTime<Utc>,
    ) -> SignedHeaders {
        let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
        let date = now.format("%Y%m%d").to_string();

        let canonical_request = format!(
            "{}\n{}\n{}\nhost:{}\nx-amz-content-sha256:{}\nx-amz-date:{}\n\n{}\n{}",
            method.as_str(),
            canonical_uri(url),
            canonical_query(url),
            host_header(url),
            content_sha256,
            amz_date,
            SIGNED_HEADERS,
            content_sha256,
        );

        let scope = format!("{}/{}/{}/aws4_request", date, self.region, SERVICE);
        let string_to_sign = format!(
            "{}\n{}\n{}\n{}",
            ALGORITHM,
            amz_date,
            scope,
            hex::encode(Sha256::digest(canonical_request.as_bytes()))
        );

        let signing_key = derive_signing_key(&self.secret_key, &date, &self.region);
        let signature = hex::encode(hmac_sha256(&signing_key, &string_to_sign));

        SignedHeaders {
            authorization: format!(
                "{} Credential={}/{}, SignedHeaders={}, Signature={}",
                ALGORITHM, self.access_key, scope, SIGNED_HEADERS, signature
            ),
            amz_date,
            content_sha256: content_sha256.to_string(),
        }
    }
}

/// Value of the Host header reqwest will send for `url`
pub fn host_header(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    }
}

fn canonical_uri(url: &Url) -> &str {
    // Path segments are already percent-encoded when the URL is built
    match url.path() {
        "" => "/",
        path => path,
    }
}

fn canonical_query(url: &Url) -> String {
    let mut pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            (
                urlencoding::encode(&k).into_owned(),
                urlencoding::encode(&v).into_owned(),
            )
        })
        .collect();
    pairs.sort();

    pairs
        .into_iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}

fn hmac_sha256(key: &[u8], data: &str) -> Vec<u8> {
    let mut mac =
        <Hmac<Sha256> as Mac>::new_from_slice(key).expect("HMAC accepts keys of any length");
    mac.update(data.as_bytes());
    mac.finalize().into_bytes().to_vec()
}

fn derive_signing_key(secret: &str, date: &str, region: &str) -> Vec<u8> {
    let k_date = hmac_sha256(format!("AWS4{}", secret).as_bytes(), date);
    let k_region = hmac_sha256(&k_date, region);
    let k_service = hmac_sha256(&k_region, SERVICE);
    hmac_sha256(&k_service, "aws4_request")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 17, 8, 30, 0).unwrap()
    }

    #[test]
    fn test_authorization_header_shape() {
        let signer = RequestSigner::new("accesskey", "secretkey", "ap-southeast-2");
        let url = Url::parse("https://obs.example.com/bucket/thanos/file1").unwrap();

        let headers = signer.sign(&Method::GET, &url, UNSIGNED_PAYLOAD, fixed_time());

        assert_eq!(headers.amz_date, "20240517T083000Z");
        assert_eq!(headers.content_sha256, UNSIGNED_PAYLOAD);
        assert!(headers.authorization.starts_with(
            "AWS4-HMAC-SHA256 Credential=accesskey/20240517/ap-southeast-2/s3/aws4_request, \
             SignedHeaders=host;x-amz-content-sha256;x-amz-date, Signature="
        ));
        let signature = headers.authorization.rsplit('=').next().unwrap();
        assert_eq!(signature.len(), 64);
        assert!(signature.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_signature_depends_on_request() {
        let signer = RequestSigner::new("accesskey", "secretkey", "us-east-1");
        let get = Url::parse("https://obs.example.com/bucket/a").unwrap();
        let other = Url::parse("https://obs.example.com/bucket/b").unwrap();

        let first = signer.sign(&Method::GET, &get, UNSIGNED_PAYLOAD, fixed_time());
        assert_eq!(first, signer.sign(&Method::GET, &get, UNSIGNED_PAYLOAD, fixed_time()));
        assert_ne!(first, signer.sign(&Method::DELETE, &get, UNSIGNED_PAYLOAD, fixed_time()));
        assert_ne!(first, signer.sign(&Method::GET, &other, UNSIGNED_PAYLOAD, fixed_time()));

        let body_hash = payload_hash(b"thanos");
        assert_eq!(body_hash.len(), 64);
        assert_ne!(
            first,
            signer.sign(&Method::PUT, &get, &body_hash, fixed_time())
        );

        let rotated = RequestSigner::new("accesskey", "othersecret", "us-east-1");
        assert_ne!(first, rotated.sign(&Method::GET, &get, UNSIGNED_PAYLOAD, fixed_time()));
    }

    #[test]
    fn test_canonical_query_is_sorted_and_encoded() {
        let url =
            Url::parse("http://localhost:9000/bucket?prefix=thanos%2F&delimiter=%2F&marker=a%20b")
                .unwrap();

        assert_eq!(
            canonical_query(&url),
            "delimiter=%2F&marker=a%20b&prefix=thanos%2F"
        );
        assert_eq!(host_header(&url), "localhost:9000");

        let default_port = Url::parse("https://obs.example.com/bucket").unwrap();
        assert_eq!(host_header(&default_port), "obs.example.com");
    }
}
