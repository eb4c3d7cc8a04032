use async_stream::try_stream;
use async_trait::async_trait;
use futures::{Stream, TryStreamExt};
use std::collections::HashSet;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::api::{ListObjectsInput, ObsApi};
use super::client::ObsHttpClient;
use crate::{
    adapters::outbound::storage::error::ObsError,
    config::ObsStorageConfig,
    domain::{
        errors::{StorageError, StorageResult, ValidationError},
        models::{ListingPage, ObjectListing},
        value_objects::ObjectKey,
    },
    ports::storage::{ObjectClient, ObjectReader},
};

/// Object client backed by a single OBS bucket
pub struct ObsStorage<C: ObsApi = ObsHttpClient> {
    client: Arc<C>,
    bucket: String,
}

impl<C: ObsApi> Clone for ObsStorage<C> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            bucket: self.bucket.clone(),
        }
    }
}

impl ObsStorage<ObsHttpClient> {
    /// Validate `config` and connect to its bucket
    pub fn new(config: &ObsStorageConfig) -> StorageResult<Self> {
        config.validate()?;

        let client = ObsHttpClient::new(config).map_err(|e| match e {
            ObsError::InvalidEndpoint(endpoint) => {
                StorageError::from(ValidationError::InvalidEndpoint(endpoint))
            }
            other => other.into_infrastructure_error("create OBS client"),
        })?;

        info!(
            endpoint = %client.endpoint(),
            bucket = %config.bucket,
            "created OBS client"
        );

        Ok(Self::with_client(Arc::new(client), config.bucket.clone()))
    }
}

impl<C: ObsApi> ObsStorage<C> {
    pub fn with_client(client: Arc<C>, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Stream the pages of a listing, following markers until the store
    /// reports the listing complete.
    ///
    /// A truncated page whose next marker is missing, empty, or one that was
    /// already requested ends the stream with
    /// [`StorageError::MalformedListing`].
    pub fn list_pages<'a>(
        &'a self,
        prefix: &'a str,
        delimiter: &'a str,
    ) -> impl Stream<Item = StorageResult<ListingPage>> + Send + 'a {
        self.page_stream(prefix, delimiter, None)
    }

    fn page_stream<'a>(
        &'a self,
        prefix: &'a str,
        delimiter: &'a str,
        cancel: Option<&'a CancellationToken>,
    ) -> impl Stream<Item = StorageResult<ListingPage>> + Send + 'a {
        try_stream! {
            let mut marker: Option<String> = None;
            let mut used_markers: HashSet<String> = HashSet::new();

            loop {
                if cancel.is_some_and(|c| c.is_cancelled()) {
                    Err::<(), _>(StorageError::Cancelled {
                        operation: "list objects".to_string(),
                    })?;
                }

                let input = ListObjectsInput::new(self.bucket.as_str(), prefix, delimiter)
                    .with_marker(marker.clone());

                let output = self
                    .client
                    .list_objects(&input)
                    .await
                    .map_err(|e| e.into_infrastructure_error("list objects"))?;

                let (page, truncated, next_marker) = output.into_page();
                debug!(
                    bucket = %self.bucket,
                    prefix,
                    marker = marker.as_deref().unwrap_or(""),
                    objects = page.objects.len(),
                    common_prefixes = page.common_prefixes.len(),
                    truncated,
                    "fetched listing page"
                );

                if !truncated {
                    yield page;
                    break;
                }

                let next = continuation_marker(&used_markers, next_marker)?;
                yield page;
                used_markers.insert(next.clone());
                marker = Some(next);
            }
        }
    }

    /// Like [`ObjectClient::list`], but gives up with
    /// [`StorageError::Cancelled`] once `cancel` fires
    pub async fn list_cancellable(
        &self,
        prefix: &str,
        delimiter: &str,
        cancel: &CancellationToken,
    ) -> StorageResult<ObjectListing> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(bucket = %self.bucket, prefix, "listing cancelled");
                Err(StorageError::Cancelled {
                    operation: "list objects".to_string(),
                })
            }
            result = self.collect_listing(prefix, delimiter, Some(cancel)) => result,
        }
    }

    async fn collect_listing(
        &self,
        prefix: &str,
        delimiter: &str,
        cancel: Option<&CancellationToken>,
    ) -> StorageResult<ObjectListing> {
        let pages = self.page_stream(prefix, delimiter, cancel);
        futures::pin_mut!(pages);

        let mut listing = ObjectListing::default();
        while let Some(page) = pages.try_next().await? {
            listing.push_page(page);
        }

        Ok(listing)
    }
}

/// Marker for the page after a truncated one
fn continuation_marker(used: &HashSet<String>, next: Option<String>) -> StorageResult<String> {
    let message = match next {
        Some(next) if !next.is_empty() && !used.contains(&next) => return Ok(next),
        Some(next) if !next.is_empty() => format!("next marker {:?} was already requested", next),
        _ => "truncated listing page carries no next marker".to_string(),
    };

    warn!(%message, "malformed listing page");
    Err(StorageError::MalformedListing { message })
}

#[async_trait]
impl<C: ObsApi> ObjectClient for ObsStorage<C> {
    async fn put_object(&self, key: &ObjectKey, object: ObjectReader) -> StorageResult<()> {
        debug!(bucket = %self.bucket, key = %key, "putting object");
        self.client
            .put_object(&self.bucket, key.as_str(), object)
            .await
            .map_err(|e| e.into_storage_error(key, "put object"))
    }

    async fn get_object(&self, key: &ObjectKey) -> StorageResult<ObjectReader> {
        debug!(bucket = %self.bucket, key = %key, "getting object");
        self.client
            .get_object(&self.bucket, key.as_str())
            .await
            .map_err(|e| e.into_storage_error(key, "get object"))
    }

    async fn delete_object(&self, key: &ObjectKey) -> StorageResult<()> {
        debug!(bucket = %self.bucket, key = %key, "deleting object");
        self.client
            .delete_object(&self.bucket, key.as_str())
            .await
            .map_err(|e| e.into_storage_error(key, "delete object"))
    }

    async fn list(&self, prefix: &str, delimiter: &str) -> StorageResult<ObjectListing> {
        self.collect_listing(prefix, delimiter, None).await
    }

    fn stop(&self) {
        info!(bucket = %self.bucket, "OBS client stopped");
    }
}
