use async_trait::async_trait;
use bytes::Bytes;
use futures::TryStreamExt;
use http::Method;
use reqwest::{Client, RequestBuilder, Response, Url};
use std::io;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio_util::io::StreamReader;
use tracing::debug;

use super::api::{ListObjectsInput, ListObjectsOutput, ObsApi};
use super::signing::{payload_hash, RequestSigner, UNSIGNED_PAYLOAD};
use super::xml;
use crate::{
    adapters::outbound::storage::error::ObsError, config::ObsStorageConfig,
    ports::storage::ObjectReader,
};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// OBS client speaking the path-style REST API over HTTP(S)
#[derive(Clone, Debug)]
pub struct ObsHttpClient {
    http_client: Client,
    endpoint: Url,
    signer: RequestSigner,
}

impl ObsHttpClient {
    /// Create a client for the endpoint and credentials in `config`.
    ///
    /// The config is expected to be validated already.
    pub fn new(config: &ObsStorageConfig) -> Result<Self, ObsError> {
        let endpoint = parse_endpoint(&config.endpoint)?;

        let mut builder = Client::builder().connect_timeout(CONNECT_TIMEOUT);
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            http_client: builder.build()?,
            endpoint,
            signer: RequestSigner::new(&config.access_key, &config.secret_key, &config.region()),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn bucket_url(&self, bucket: &str) -> Result<Url, ObsError> {
        let url = format!(
            "{}/{}",
            self.endpoint.as_str().trim_end_matches('/'),
            urlencoding::encode(bucket)
        );
        Url::parse(&url).map_err(|e| ObsError::InvalidEndpoint(format!("{}: {}", url, e)))
    }

    fn object_url(&self, bucket: &str, key: &str) -> Result<Url, ObsError> {
        let mut url = self.bucket_url(bucket)?;
        // Keep '/' as a path separator, encode everything else per segment
        let encoded_key = key
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect::<Vec<_>>()
            .join("/");
        let path = format!("{}/{}", url.path(), encoded_key);
        url.set_path(&path);
        Ok(url)
    }

    /// Start a signed request
    fn request(&self, method: Method, url: Url, content_sha256: &str) -> RequestBuilder {
        let signed = self
            .signer
            .sign(&method, &url, content_sha256, chrono::Utc::now());

        self.http_client
            .request(method, url)
            .header("x-amz-date", signed.amz_date)
            .header("x-amz-content-sha256", signed.content_sha256)
            .header(http::header::AUTHORIZATION, signed.authorization)
    }

    /// Send the request and turn non-success statuses into service errors
    async fn execute(&self, request: RequestBuilder) -> Result<Response, ObsError> {
        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(xml::parse_error(status, &body));
        }

        Ok(response)
    }
}

#[async_trait]
impl ObsApi for ObsHttpClient {
    /// OBS needs a Content-Length on PUT, so the body is read up front
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        mut body: ObjectReader,
    ) -> Result<(), ObsError> {
        let mut data = Vec::new();
        body.read_to_end(&mut data).await?;
        let data = Bytes::from(data);

        let url = self.object_url(bucket, key)?;
        debug!(bucket, key, size = data.len(), "uploading object");

        let request = self
            .request(Method::PUT, url, &payload_hash(&data))
            .body(data);
        self.execute(request).await?;

        Ok(())
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<ObjectReader, ObsError> {
        let url = self.object_url(bucket, key)?;
        let response = self
            .execute(self.request(Method::GET, url, UNSIGNED_PAYLOAD))
            .await?;

        let stream = response
            .bytes_stream()
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e));

        Ok(Box::new(StreamReader::new(Box::pin(stream))))
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), ObsError> {
        let url = self.object_url(bucket, key)?;
        self.execute(self.request(Method::DELETE, url, UNSIGNED_PAYLOAD))
            .await?;

        Ok(())
    }

    async fn list_objects(&self, input: &ListObjectsInput) -> Result<ListObjectsOutput, ObsError> {
        let mut params = vec![("prefix", input.prefix.clone())];
        if !input.delimiter.is_empty() {
            params.push(("delimiter", input.delimiter.clone()));
        }
        if let Some(ref marker) = input.marker {
            params.push(("marker", marker.clone()));
        }
        if let Some(max_keys) = input.max_keys {
            params.push(("max-keys", max_keys.to_string()));
        }
        // Spaces must go out as %20, not the form encoding's '+'
        let query = params
            .iter()
            .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");

        let mut url = self.bucket_url(&input.bucket)?;
        url.set_query(Some(&query));

        let response = self
            .execute(self.request(Method::GET, url, UNSIGNED_PAYLOAD))
            .await?;
        let body = response.text().await?;

        xml::parse_list_objects(&body)
    }
}

/// Accept `host[:port]` as well as full URLs; bare hosts default to HTTPS
fn parse_endpoint(endpoint: &str) -> Result<Url, ObsError> {
    let endpoint = endpoint.trim();
    let with_scheme = if endpoint.contains("://") {
        endpoint.to_string()
    } else {
        format!("https://{}", endpoint)
    };

    let url = Url::parse(&with_scheme)
        .map_err(|e| ObsError::InvalidEndpoint(format!("{}: {}", endpoint, e)))?;

    match url.scheme() {
        "http" | "https" if url.host_str().is_some() => Ok(url),
        _ => Err(ObsError::InvalidEndpoint(endpoint.to_string())),
    }
}
