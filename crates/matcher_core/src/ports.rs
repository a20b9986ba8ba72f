//! crates/matcher_core/src/ports.rs
//!
//! Defines the service contracts (traits) the matching core depends on.
//! These traits keep the core independent of the concrete storage engine and
//! of the restaurant search API.

use async_trait::async_trait;
use crate::domain::{CandidateListing, Location};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Service unavailable: {0}")]
    Unavailable(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// A keyed store of opaque text blobs that survives process restarts.
///
/// Several independent contexts may share one store; writes are whole-value.
#[async_trait]
pub trait SnapshotStorage: Send + Sync {
    /// Returns the blob stored under `key`, or `None` if nothing was written yet.
    async fn read(&self, key: &str) -> PortResult<Option<String>>;

    /// Replaces the blob stored under `key`.
    async fn write(&self, key: &str, value: &str) -> PortResult<()>;
}

/// Supplies restaurant candidates around a location.
#[async_trait]
pub trait CandidateProvider: Send + Sync {
    /// Returns at most `limit` listings within `radius_m` meters of `location`.
    ///
    /// Upstream failures must be reported as `Err`, never as a partial list.
    async fn search(
        &self,
        location: Location,
        radius_m: f64,
        limit: usize,
    ) -> PortResult<Vec<CandidateListing>>;
}

//=========================================================================================
// In-Memory Storage
//=========================================================================================

/// A process-local `SnapshotStorage`. Clones share the same underlying map,
/// which lets two contexts stand in for two tabs over one store.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    blobs: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SnapshotStorage for MemoryStorage {
    async fn read(&self, key: &str) -> PortResult<Option<String>> {
        let blobs = self
            .blobs
            .lock()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(blobs.get(key).cloned())
    }

    async fn write(&self, key: &str, value: &str) -> PortResult<()> {
        let mut blobs = self
            .blobs
            .lock()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        blobs.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
