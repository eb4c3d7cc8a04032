use std::sync::Arc;

use crate::{
    adapters::outbound::storage::{InMemoryObsApi, ObsStorage},
    config::ObsStorageConfig,
    domain::errors::StorageError,
    ports::storage::ObjectClient,
};

/// Storage backend configuration
#[derive(Debug, Clone)]
pub enum StorageBackend {
    /// Objects live in process memory and vanish on exit
    InMemory { bucket: String },
    Obs(ObsStorageConfig),
}

impl Default for StorageBackend {
    fn default() -> Self {
        StorageBackend::InMemory {
            bucket: "local".to_string(),
        }
    }
}

/// Application builder for dependency injection
#[derive(Default)]
pub struct AppBuilder {
    storage_backend: StorageBackend,
    page_size: Option<u32>,
}

impl AppBuilder {
    /// Create a new application builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure storage backend
    pub fn with_storage_backend(mut self, backend: StorageBackend) -> Self {
        self.storage_backend = backend;
        self
    }

    /// Listing page size of the in-memory backend
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }

    /// Build the object client for the configured backend
    pub fn build(self) -> Result<Arc<dyn ObjectClient>, AppError> {
        match self.storage_backend {
            StorageBackend::InMemory { bucket } => {
                let mut api = InMemoryObsApi::new();
                if let Some(page_size) = self.page_size {
                    api = api.with_page_size(page_size);
                }
                Ok(Arc::new(ObsStorage::with_client(Arc::new(api), bucket)))
            }
            StorageBackend::Obs(config) => {
                let storage = ObsStorage::new(&config).map_err(|err| match err {
                    StorageError::Configuration(err) => AppError::Configuration {
                        message: err.to_string(),
                    },
                    other => AppError::StorageInit {
                        message: other.to_string(),
                    },
                })?;
                Ok(Arc::new(storage))
            }
        }
    }
}

/// Application-level errors
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Storage initialization error: {message}")]
    StorageInit { message: String },
}

/// Create an in-memory client for testing and development
pub fn create_in_memory_storage(bucket: impl Into<String>) -> Arc<dyn ObjectClient> {
    Arc::new(ObsStorage::with_client(
        Arc::new(InMemoryObsApi::new()),
        bucket,
    ))
}

/// Create an OBS-backed client
pub fn create_obs_storage(config: ObsStorageConfig) -> Result<Arc<dyn ObjectClient>, AppError> {
    AppBuilder::new()
        .with_storage_backend(StorageBackend::Obs(config))
        .build()
}

/// Create a client from environment variables.
///
/// `STORAGE_BACKEND=obs` reads the `OBS_*` variables; anything else gives an
/// in-memory client for `OBS_BUCKET` (or `local`).
pub fn create_storage_from_env() -> Result<Arc<dyn ObjectClient>, AppError> {
    let config = ObsStorageConfig::from_env();

    let backend = match std::env::var("STORAGE_BACKEND").as_deref() {
        Ok("obs") => StorageBackend::Obs(config),
        _ if !config.bucket.is_empty() => StorageBackend::InMemory {
            bucket: config.bucket,
        },
        _ => StorageBackend::default(),
    };

    AppBuilder::new().with_storage_backend(backend).build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::ObjectKey;
    use tokio::io::AsyncReadExt;

    #[tokio::test]
    async fn test_in_memory_round_trip() {
        let storage = create_in_memory_storage("thanos");
        let key = ObjectKey::new("thanos/file1".to_string()).unwrap();

        storage
            .put_object(&key, Box::new(std::io::Cursor::new(b"hello".to_vec())))
            .await
            .unwrap();

        let mut data = Vec::new();
        storage
            .get_object(&key)
            .await
            .unwrap()
            .read_to_end(&mut data)
            .await
            .unwrap();
        assert_eq!(data, b"hello");

        storage.delete_object(&key).await.unwrap();
        assert!(storage.delete_object(&key).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_builder_page_size_spreads_listing() {
        let storage = AppBuilder::new()
            .with_storage_backend(StorageBackend::InMemory {
                bucket: "thanos".to_string(),
            })
            .with_page_size(1)
            .build()
            .unwrap();

        for name in ["a/1", "a/2", "b/1", "c"] {
            let key = ObjectKey::new(name.to_string()).unwrap();
            storage
                .put_object(&key, Box::new(std::io::Cursor::new(Vec::new())))
                .await
                .unwrap();
        }

        let listing = storage.list("", "/").await.unwrap();
        assert_eq!(listing.keys().collect::<Vec<_>>(), vec!["c"]);
        let prefixes: Vec<_> = listing
            .common_prefixes
            .iter()
            .map(|p| p.as_str())
            .collect();
        assert_eq!(prefixes, vec!["a/", "b/"]);
    }

    #[test]
    fn test_obs_backend_requires_complete_config() {
        let result = create_obs_storage(ObsStorageConfig::new("obs.example.com", "", "", ""));

        match result {
            Err(AppError::Configuration { message }) => {
                assert!(message.contains("bucket"));
                assert!(message.contains("access_key"));
            }
            Err(other) => panic!("unexpected error {other}"),
            Ok(_) => panic!("incomplete config was accepted"),
        }
    }

    #[test]
    fn test_obs_backend_builds() {
        let config = ObsStorageConfig::new(
            "http://127.0.0.1:9000",
            "thanos-obs-test",
            "accesskey",
            "secretkey",
        );
        assert!(create_obs_storage(config).is_ok());
    }
}
