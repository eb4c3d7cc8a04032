use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use http::StatusCode;
use std::collections::{BTreeMap, HashMap};
use std::io::Cursor;
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tokio::sync::RwLock;

use super::error::ObsError;
use super::obs::api::{ListObjectsInput, ListObjectsOutput, ObsApi, ObsContent};
use crate::ports::storage::ObjectReader;

/// Page size OBS uses when `max-keys` is not given
pub const DEFAULT_PAGE_SIZE: u32 = 1000;

/// In-memory implementation of the OBS API for testing and development
///
/// Listing follows OBS semantics: keys are returned in lexicographic order,
/// keys containing the delimiter after the prefix are folded into common
/// prefixes, and pages are cut at `max-keys` entries with a `NextMarker`.
#[derive(Clone)]
pub struct InMemoryObsApi {
    buckets: Arc<RwLock<HashMap<String, BTreeMap<String, StoredObject>>>>,
    page_size: u32,
}

#[derive(Clone)]
struct StoredObject {
    data: Bytes,
    last_modified: DateTime<Utc>,
}

impl InMemoryObsApi {
    pub fn new() -> Self {
        Self {
            buckets: Arc::new(RwLock::new(HashMap::new())),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Cap every listing page at `page_size` entries
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    fn no_such_key(key: &str) -> ObsError {
        ObsError::Service {
            status: StatusCode::NOT_FOUND,
            code: "NoSuchKey".to_string(),
            message: format!("The specified key does not exist: {}", key),
            request_id: None,
        }
    }
}

impl Default for InMemoryObsApi {
    fn default() -> Self {
        Self::new()
    }
}

/// What a key contributes to a listing: itself or its common prefix
enum Entry<'a> {
    Object(&'a str, &'a StoredObject),
    Prefix(String),
}

impl Entry<'_> {
    fn name(&self) -> &str {
        match self {
            Entry::Object(key, _) => key,
            Entry::Prefix(prefix) => prefix,
        }
    }
}

fn classify<'a>(prefix: &str, delimiter: &str, key: &'a str, object: &'a StoredObject) -> Entry<'a> {
    if !delimiter.is_empty() {
        let rest = &key[prefix.len()..];
        if let Some(idx) = rest.find(delimiter) {
            return Entry::Prefix(key[..prefix.len() + idx + delimiter.len()].to_string());
        }
    }
    Entry::Object(key, object)
}

#[async_trait]
impl ObsApi for InMemoryObsApi {
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        mut body: ObjectReader,
    ) -> Result<(), ObsError> {
        let mut data = Vec::new();
        body.read_to_end(&mut data).await?;

        let mut buckets = self.buckets.write().await;
        buckets.entry(bucket.to_string()).or_default().insert(
            key.to_string(),
            StoredObject {
                data: Bytes::from(data),
                last_modified: Utc::now(),
            },
        );

        Ok(())
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<ObjectReader, ObsError> {
        let buckets = self.buckets.read().await;
        let object = buckets
            .get(bucket)
            .and_then(|objects| objects.get(key))
            .ok_or_else(|| Self::no_such_key(key))?;

        Ok(Box::new(Cursor::new(object.data.clone())))
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), ObsError> {
        let mut buckets = self.buckets.write().await;
        buckets
            .get_mut(bucket)
            .and_then(|objects| objects.remove(key))
            .map(|_| ())
            .ok_or_else(|| Self::no_such_key(key))
    }

    async fn list_objects(&self, input: &ListObjectsInput) -> Result<ListObjectsOutput, ObsError> {
        let max_keys = input.max_keys.unwrap_or(self.page_size).max(1) as usize;
        let marker = input.marker.as_deref().unwrap_or("");

        let buckets = self.buckets.read().await;
        let mut output = ListObjectsOutput {
            name: input.bucket.clone(),
            prefix: input.prefix.clone(),
            ..Default::default()
        };

        let Some(objects) = buckets.get(&input.bucket) else {
            return Ok(output);
        };

        let mut emitted = 0usize;
        let mut last_name: Option<String> = None;

        for (key, object) in objects.range(input.prefix.clone()..) {
            if !key.starts_with(&input.prefix) {
                break;
            }

            let entry = classify(&input.prefix, &input.delimiter, key, object);
            // Everything at or before the marker was served by an earlier page
            if entry.name() <= marker || last_name.as_deref() == Some(entry.name()) {
                continue;
            }

            if emitted == max_keys {
                output.is_truncated = true;
                output.next_marker = last_name;
                return Ok(output);
            }

            last_name = Some(entry.name().to_string());
            emitted += 1;
            match entry {
                Entry::Object(key, object) => output.contents.push(ObsContent {
                    key: key.to_string(),
                    size: object.data.len() as u64,
                    last_modified: Some(object.last_modified),
                    etag: None,
                }),
                Entry::Prefix(prefix) => output.common_prefixes.push(prefix),
            }
        }

        Ok(output)
    }
}
