//! Account-scoped persistence: one JSON document per account behind a
//! transport trait.
//!
//! `RemoteStore` adapts a single account's document to the `DocumentStore`
//! interface and owns the failure policy: a failed load degrades to an
//! empty document (logged, never surfaced), while a failed save propagates
//! so the mutation gateway can roll back its optimistic publish.

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::{error, info};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::traits::DocumentStore;
use shared::AppDocument;

/// Transport for per-account documents. Implementations carry the actual
/// wire protocol; the core only needs fetch and full-document overwrite.
#[async_trait]
pub trait RemoteClient: Send + Sync {
    /// Fetch the account's document, `None` when it has never been written
    async fn fetch_document(&self, account_id: &str) -> Result<Option<AppDocument>>;

    /// Overwrite the account's document in full
    async fn store_document(&self, account_id: &str, document: &AppDocument) -> Result<()>;
}

/// `DocumentStore` over one account's remote document
pub struct RemoteStore {
    client: Arc<dyn RemoteClient>,
    account_id: String,
}

impl RemoteStore {
    pub fn new(client: Arc<dyn RemoteClient>, account_id: String) -> Self {
        Self { client, account_id }
    }

    pub fn account_id(&self) -> &str {
        &self.account_id
    }
}

#[async_trait]
impl DocumentStore for RemoteStore {
    async fn load(&self) -> Result<AppDocument> {
        match self.client.fetch_document(&self.account_id).await {
            Ok(Some(document)) => {
                info!(
                    "Loaded remote document for account {} at revision {}",
                    self.account_id, document.revision
                );
                Ok(document)
            }
            Ok(None) => {
                info!(
                    "No remote document for account {} yet, starting empty",
                    self.account_id
                );
                Ok(AppDocument::default())
            }
            Err(e) => {
                error!(
                    "Failed to load remote document for account {}: {:#}",
                    self.account_id, e
                );
                Ok(AppDocument::default())
            }
        }
    }

    async fn save(&self, document: &AppDocument) -> Result<()> {
        self.client
            .store_document(&self.account_id, document)
            .await
            .with_context(|| format!("Failed to save document for account {}", self.account_id))
    }
}

/// File-backed transport keeping one `<account>.json` per account under a
/// sync root, written atomically
#[derive(Clone)]
pub struct FileRemoteClient {
    base_directory: PathBuf,
}

impl FileRemoteClient {
    pub fn new<P: AsRef<Path>>(base_directory: P) -> Result<Self> {
        let base_path = base_directory.as_ref().to_path_buf();
        if !base_path.exists() {
            fs::create_dir_all(&base_path).with_context(|| {
                format!("Failed to create sync directory {}", base_path.display())
            })?;
        }
        Ok(Self {
            base_directory: base_path,
        })
    }

    fn document_path(&self, account_id: &str) -> PathBuf {
        self.base_directory.join(format!("{}.json", account_id))
    }
}

#[async_trait]
impl RemoteClient for FileRemoteClient {
    async fn fetch_document(&self, account_id: &str) -> Result<Option<AppDocument>> {
        let path = self.document_path(account_id);
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let document = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(Some(document))
    }

    async fn store_document(&self, account_id: &str, document: &AppDocument) -> Result<()> {
        let path = self.document_path(account_id);
        let content = serde_json::to_string_pretty(document)
            .context("Failed to serialize account document")?;

        // Atomic write using temp file
        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, content)
            .with_context(|| format!("Failed to write {}", temp_path.display()))?;
        fs::rename(&temp_path, &path)
            .with_context(|| format!("Failed to replace {}", path.display()))?;

        Ok(())
    }
}
