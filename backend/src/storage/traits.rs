//! # Storage Traits
//!
//! This module defines the storage abstraction that allows the on-device
//! and per-account remote backends to be used interchangeably in the
//! domain layer.

use anyhow::Result;
use async_trait::async_trait;
use shared::AppDocument;

/// Trait defining the interface for whole-document persistence
///
/// Exactly one implementation is active per session, chosen once at
/// activation time from the presence of an account identifier. The domain
/// layer never branches on the concrete backend after that point.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Load the full document, substituting an empty one where the backend
    /// has nothing stored yet
    async fn load(&self) -> Result<AppDocument>;

    /// Persist the full document. There are no partial or per-field writes;
    /// every save overwrites the previous state completely.
    async fn save(&self, document: &AppDocument) -> Result<()>;
}
