use crate::domain::{errors::StorageResult, models::ObjectListing, value_objects::ObjectKey};
use async_trait::async_trait;
use tokio::io::AsyncRead;

/// Object content handed across the storage boundary
pub type ObjectReader = Box<dyn AsyncRead + Send + Unpin>;

/// Port for object storage operations
/// This abstracts the actual storage backend (OBS, in-memory, etc.)
#[async_trait]
pub trait ObjectClient: Send + Sync + 'static {
    /// Store object data, creating or overwriting the object
    async fn put_object(&self, key: &ObjectKey, object: ObjectReader) -> StorageResult<()>;

    /// Open a stream over the object's content
    async fn get_object(&self, key: &ObjectKey) -> StorageResult<ObjectReader>;

    /// Delete the object; a missing object is reported as `ObjectNotFound`
    async fn delete_object(&self, key: &ObjectKey) -> StorageResult<()>;

    /// List objects and common prefixes under `prefix`, grouped by `delimiter`
    async fn list(&self, prefix: &str, delimiter: &str) -> StorageResult<ObjectListing>;

    /// Release any resources held by the client
    fn stop(&self) {}
}
