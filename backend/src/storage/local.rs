//! On-device persistence: four named JSON slots under a base directory.
//!
//! Each collection lives in its own file so the shape on disk matches the
//! corresponding field of the remote document. Reads are forgiving: a slot
//! that was never written, or that holds unparseable data, yields an empty
//! collection. Write errors are environment faults and propagate.

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use super::traits::DocumentStore;
use shared::{AppDocument, Customer, Dog};

const CUSTOMERS_SLOT: &str = "customers.json";
const DOGS_SLOT: &str = "dogs.json";
const SCHEDULES_SLOT: &str = "schedules.json";
const ATTENDANCE_SLOT: &str = "attendance.json";

/// Device-scoped store holding the four collections as independent files
#[derive(Clone)]
pub struct LocalStore {
    base_directory: PathBuf,
}

impl LocalStore {
    /// Create a local store rooted at the given directory, creating it if
    /// it does not exist yet
    pub fn new<P: AsRef<Path>>(base_directory: P) -> Result<Self> {
        let base_path = base_directory.as_ref().to_path_buf();
        if !base_path.exists() {
            fs::create_dir_all(&base_path).with_context(|| {
                format!("Failed to create data directory {}", base_path.display())
            })?;
        }
        Ok(Self {
            base_directory: base_path,
        })
    }

    pub fn base_directory(&self) -> &Path {
        &self.base_directory
    }

    fn slot_path(&self, slot: &str) -> PathBuf {
        self.base_directory.join(slot)
    }

    fn read_slot<T: DeserializeOwned + Default>(&self, slot: &str) -> Result<T> {
        let path = self.slot_path(slot);
        if !path.exists() {
            debug!("Slot {} has never been written, using empty default", slot);
            return Ok(T::default());
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        match serde_json::from_str(&content) {
            Ok(value) => Ok(value),
            Err(e) => {
                warn!(
                    "Slot {} holds unparseable data ({}), using empty default",
                    slot, e
                );
                Ok(T::default())
            }
        }
    }

    fn write_slot<T: Serialize>(&self, slot: &str, value: &T) -> Result<()> {
        let path = self.slot_path(slot);
        let content = serde_json::to_string_pretty(value)
            .with_context(|| format!("Failed to serialize slot {}", slot))?;

        // Atomic write using temp file
        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, content)
            .with_context(|| format!("Failed to write {}", temp_path.display()))?;
        fs::rename(&temp_path, &path)
            .with_context(|| format!("Failed to replace {}", path.display()))?;

        Ok(())
    }

    /// Read all four slots as one snapshot
    pub fn load_document(&self) -> Result<AppDocument> {
        Ok(AppDocument {
            customers: self.read_slot(CUSTOMERS_SLOT)?,
            dogs: self.read_slot(DOGS_SLOT)?,
            schedules: self.read_slot(SCHEDULES_SLOT)?,
            attendance: self.read_slot(ATTENDANCE_SLOT)?,
            revision: 0,
        })
    }

    /// Write all four slots from the given document
    pub fn save_document(&self, document: &AppDocument) -> Result<()> {
        self.write_slot(CUSTOMERS_SLOT, &document.customers)?;
        self.write_slot(DOGS_SLOT, &document.dogs)?;
        self.write_slot(SCHEDULES_SLOT, &document.schedules)?;
        self.write_slot(ATTENDANCE_SLOT, &document.attendance)?;
        Ok(())
    }

    /// Whether this device holds any customers or dogs. Drives the one-time
    /// import offer when an account becomes active.
    pub fn has_registry_data(&self) -> Result<bool> {
        let customers: Vec<Customer> = self.read_slot(CUSTOMERS_SLOT)?;
        if !customers.is_empty() {
            return Ok(true);
        }
        let dogs: Vec<Dog> = self.read_slot(DOGS_SLOT)?;
        Ok(!dogs.is_empty())
    }
}

#[async_trait]
impl DocumentStore for LocalStore {
    async fn load(&self) -> Result<AppDocument> {
        self.load_document()
    }

    async fn save(&self, document: &AppDocument) -> Result<()> {
        self.save_document(document)
    }
}
