pub mod adapters;
pub mod app;
pub mod config;
pub mod domain;
pub mod ports;

// Re-export key types for convenience

// Domain types - listing models, value objects and errors
pub use domain::{
    CommonPrefix, DomainValidationError, ListingPage, ObjectKey, ObjectListing, StorageError,
    StorageObject, StorageResult,
};

// Port types - interfaces for external systems
pub use ports::{ObjectClient, ObjectReader};

// Configuration
pub use config::ObsStorageConfig;

// Application factory and configuration
pub use app::{
    AppBuilder, AppError, StorageBackend, create_in_memory_storage, create_obs_storage,
    create_storage_from_env,
};

// Adapter types - infrastructure implementations
pub use adapters::outbound::storage::{InMemoryObsApi, ObsApi, ObsError, ObsHttpClient, ObsStorage};

// Public facade for easy construction
pub mod prelude {
    pub use crate::{
        AppBuilder, ObjectClient, ObjectKey, ObjectListing, ObsStorage, ObsStorageConfig,
        StorageError, create_in_memory_storage, create_obs_storage,
    };
}
