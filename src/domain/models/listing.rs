use chrono::{DateTime, Utc};

/// An object entry reported by a delimiter-aware listing
#[derive(Debug, Clone, PartialEq)]
pub struct StorageObject {
    pub key: String,
    pub size: u64,
    pub last_modified: Option<DateTime<Utc>>,
    pub etag: Option<String>,
}

impl StorageObject {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            size: 0,
            last_modified: None,
            etag: None,
        }
    }
}

/// A virtual directory returned by a delimiter-aware listing
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CommonPrefix(String);

impl CommonPrefix {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self(prefix.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CommonPrefix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for CommonPrefix {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// One page of a listing, in the order the store returned it
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingPage {
    pub objects: Vec<StorageObject>,
    pub common_prefixes: Vec<CommonPrefix>,
}

/// The accumulation of every page of a listing
///
/// Entries are kept in page-arrival order, then within-page order. No
/// deduplication is performed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectListing {
    pub objects: Vec<StorageObject>,
    pub common_prefixes: Vec<CommonPrefix>,
}

impl ObjectListing {
    /// Append a page to the accumulation
    pub fn push_page(&mut self, page: ListingPage) {
        self.objects.extend(page.objects);
        self.common_prefixes.extend(page.common_prefixes);
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty() && self.common_prefixes.is_empty()
    }

    /// Keys of every listed object
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.objects.iter().map(|o| o.key.as_str())
    }

    pub fn into_parts(self) -> (Vec<StorageObject>, Vec<CommonPrefix>) {
        (self.objects, self.common_prefixes)
    }
}
