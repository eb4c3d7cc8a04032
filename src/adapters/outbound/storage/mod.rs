// Infrastructure error types
pub mod error;

// Storage implementations
pub mod memory;
pub mod obs;

// Re-export key types
pub use error::ObsError;
pub use memory::InMemoryObsApi;
pub use obs::{ObsApi, ObsHttpClient, ObsStorage};
