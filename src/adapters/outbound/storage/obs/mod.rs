//! Huawei Cloud OBS adapter.
//!
//! [`ObsStorage`] implements the object client on top of an [`ObsApi`],
//! which is either the signed REST client [`ObsHttpClient`] or an in-memory
//! stand-in.

pub mod api;
pub mod client;
pub mod signing;
pub mod storage;
pub mod xml;

pub use api::{ListObjectsInput, ListObjectsOutput, ObsApi, ObsContent};
pub use client::ObsHttpClient;
pub use storage::ObsStorage;
