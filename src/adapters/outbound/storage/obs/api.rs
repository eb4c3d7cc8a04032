use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{
    adapters::outbound::storage::error::ObsError,
    domain::models::{CommonPrefix, ListingPage, StorageObject},
    ports::storage::ObjectReader,
};

/// The OBS capability set the adapter is built on.
///
/// `ObsHttpClient` talks to a real endpoint; `InMemoryObsApi` keeps objects
/// in memory. Both report failures as `ObsError` so the adapter translates
/// them in a single place.
#[async_trait]
pub trait ObsApi: Send + Sync + 'static {
    /// Upload `body` as `bucket/key`
    async fn put_object(&self, bucket: &str, key: &str, body: ObjectReader)
        -> Result<(), ObsError>;

    /// Open a stream over `bucket/key`
    async fn get_object(&self, bucket: &str, key: &str) -> Result<ObjectReader, ObsError>;

    /// Delete `bucket/key`
    async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), ObsError>;

    /// Fetch a single listing page
    async fn list_objects(&self, input: &ListObjectsInput) -> Result<ListObjectsOutput, ObsError>;
}

/// Parameters of one listing request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListObjectsInput {
    pub bucket: String,
    pub prefix: String,
    pub delimiter: String,
    pub marker: Option<String>,
    pub max_keys: Option<u32>,
}

impl ListObjectsInput {
    pub fn new(bucket: impl Into<String>, prefix: impl Into<String>, delimiter: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            prefix: prefix.into(),
            delimiter: delimiter.into(),
            marker: None,
            max_keys: None,
        }
    }

    pub fn with_marker(mut self, marker: Option<String>) -> Self {
        self.marker = marker;
        self
    }

    pub fn with_max_keys(mut self, max_keys: u32) -> Self {
        self.max_keys = Some(max_keys);
        self
    }
}

/// One `ListBucketResult` page as reported by the store
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListObjectsOutput {
    pub name: String,
    pub prefix: String,
    pub is_truncated: bool,
    pub next_marker: Option<String>,
    pub contents: Vec<ObsContent>,
    pub common_prefixes: Vec<String>,
}

/// A `Contents` entry of a listing page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObsContent {
    pub key: String,
    pub size: u64,
    pub last_modified: Option<DateTime<Utc>>,
    pub etag: Option<String>,
}

impl From<ObsContent> for StorageObject {
    fn from(content: ObsContent) -> Self {
        StorageObject {
            key: content.key,
            size: content.size,
            last_modified: content.last_modified,
            etag: content.etag,
        }
    }
}

impl ListObjectsOutput {
    /// Split the page into the domain page and its continuation signal
    pub fn into_page(self) -> (ListingPage, bool, Option<String>) {
        let page = ListingPage {
            objects: self.contents.into_iter().map(StorageObject::from).collect(),
            common_prefixes: self
                .common_prefixes
                .into_iter()
                .map(CommonPrefix::from)
                .collect(),
        };
        (page, self.is_truncated, self.next_marker)
    }
}
