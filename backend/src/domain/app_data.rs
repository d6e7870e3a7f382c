//! The data synchronization core.
//!
//! `AppDataService` owns the four entity collections and the choice of
//! backend. Activation picks device-local or account-remote storage from
//! the presence of an account id, loads the initial document, and runs the
//! one-time lifecycle hooks (legacy owner migration, import availability).
//!
//! Every edit flows through one commit path: read the base document from
//! the in-memory snapshot, compute the next document, publish it to
//! observers before persistence starts, then persist the whole document.
//! A failed save restores the full pre-write document and reports the
//! error. Commits queue on a single-writer lock, so calls issued while a
//! save is in flight wait and then compose against the latest committed
//! value instead of a stale base.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use log::{debug, error, info, warn};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{watch, Mutex as AsyncMutex};

use super::{calendar, migration};
use crate::storage::{DocumentStore, LocalStore, RemoteClient, RemoteStore};
use shared::{AppDocument, AttendanceRecord, Customer, DayAttendance, Dog, WeekPlan};

/// Blob-upload collaborator: stores a dog photo somewhere and hands back a
/// reference URL. The core never touches the bytes beyond passing them on.
#[async_trait]
pub trait PhotoUploader: Send + Sync {
    async fn upload(&self, dog_id: &str, bytes: &[u8]) -> Result<String>;
}

/// Service holding the active backend, the snapshot cache, and the
/// mutation gateway
#[derive(Clone)]
pub struct AppDataService {
    store: Arc<dyn DocumentStore>,
    local: LocalStore,
    account_id: Option<String>,
    /// Last known-good document, the base value for every commit
    snapshot: Arc<Mutex<AppDocument>>,
    /// Observable copy of the snapshot for UI consumption
    visible: Arc<watch::Sender<AppDocument>>,
    /// Serializes commits; held across persistence
    write_queue: Arc<AsyncMutex<()>>,
    migration_ran: Arc<AtomicBool>,
    import_resolved: Arc<AtomicBool>,
}

impl AppDataService {
    /// Activate a session: choose the backend from the account id, load the
    /// initial document, and run the post-load lifecycle hooks. The local
    /// store is retained either way; it backs the session when no account
    /// is linked and feeds the one-time import when one is.
    pub async fn activate(
        local: LocalStore,
        remote: Arc<dyn RemoteClient>,
        account_id: Option<String>,
    ) -> Result<Self> {
        let store: Arc<dyn DocumentStore> = match &account_id {
            Some(id) => {
                info!("Activating account storage for {}", id);
                Arc::new(RemoteStore::new(remote, id.clone()))
            }
            None => {
                info!("No account linked, activating device-local storage");
                Arc::new(local.clone())
            }
        };

        let document = store.load().await?;
        let (visible, _) = watch::channel(document.clone());

        let service = Self {
            store,
            local,
            account_id,
            snapshot: Arc::new(Mutex::new(document)),
            visible: Arc::new(visible),
            write_queue: Arc::new(AsyncMutex::new(())),
            migration_ran: Arc::new(AtomicBool::new(false)),
            import_resolved: Arc::new(AtomicBool::new(false)),
        };

        // A failed migration save has already rolled back; the session
        // continues on the unmigrated document and the error stays in the
        // log, matching the load-failure policy.
        if let Err(e) = service.run_legacy_owner_migration().await {
            error!("Legacy owner migration failed: {:#}", e);
        }

        Ok(service)
    }

    pub fn account_id(&self) -> Option<&str> {
        self.account_id.as_deref()
    }

    /// Whether this session persists to the account document
    pub fn is_remote(&self) -> bool {
        self.account_id.is_some()
    }

    /// Synchronous read of the current document
    pub fn document(&self) -> AppDocument {
        self.snapshot.lock().unwrap().clone()
    }

    pub fn customers(&self) -> Vec<Customer> {
        self.snapshot.lock().unwrap().customers.clone()
    }

    pub fn dogs(&self) -> Vec<Dog> {
        self.snapshot.lock().unwrap().dogs.clone()
    }

    pub fn schedules(&self) -> BTreeMap<String, WeekPlan> {
        self.snapshot.lock().unwrap().schedules.clone()
    }

    pub fn attendance(&self) -> BTreeMap<String, DayAttendance> {
        self.snapshot.lock().unwrap().attendance.clone()
    }

    /// Subscribe to document changes. The receiver sees every optimistic
    /// publish, including the restore after a failed save.
    pub fn subscribe(&self) -> watch::Receiver<AppDocument> {
        self.visible.subscribe()
    }

    fn publish(&self, document: &AppDocument) {
        *self.snapshot.lock().unwrap() = document.clone();
        self.visible.send_replace(document.clone());
    }

    /// The single mutation path. See the module docs for the protocol.
    async fn commit<F>(&self, mutate: F) -> Result<()>
    where
        F: FnOnce(&mut AppDocument),
    {
        let writer = self.write_queue.clone().lock_owned().await;

        let previous = self.snapshot.lock().unwrap().clone();
        let mut next = previous.clone();
        mutate(&mut next);
        next.revision = previous.revision + 1;

        // Optimistic publish: observers see the change before the save starts
        self.publish(&next);

        // Persistence runs on its own task: a caller torn down mid-await
        // does not abort the save, and the commit or rollback still lands
        // in the snapshot.
        let service = self.clone();
        let persist = tokio::spawn(async move {
            let _writer = writer;
            if let Err(e) = service.store.save(&next).await {
                error!(
                    "Persisting revision {} failed, rolling back: {:#}",
                    next.revision, e
                );
                service.publish(&previous);
                return Err(e);
            }
            debug!("Committed document revision {}", next.revision);
            Ok(())
        });

        persist.await.context("Persistence task panicked")?
    }

    /// Replace the customer collection with `updater(current)`
    pub async fn update_customers<F>(&self, updater: F) -> Result<()>
    where
        F: FnOnce(Vec<Customer>) -> Vec<Customer>,
    {
        self.commit(|doc| {
            let current = std::mem::take(&mut doc.customers);
            doc.customers = updater(current);
        })
        .await
    }

    /// Replace the dog collection with `updater(current)`
    pub async fn update_dogs<F>(&self, updater: F) -> Result<()>
    where
        F: FnOnce(Vec<Dog>) -> Vec<Dog>,
    {
        self.commit(|doc| {
            let current = std::mem::take(&mut doc.dogs);
            doc.dogs = updater(current);
        })
        .await
    }

    /// Replace the schedules collection with `updater(current)`
    pub async fn update_schedules<F>(&self, updater: F) -> Result<()>
    where
        F: FnOnce(BTreeMap<String, WeekPlan>) -> BTreeMap<String, WeekPlan>,
    {
        self.commit(|doc| {
            let current = std::mem::take(&mut doc.schedules);
            doc.schedules = updater(current);
        })
        .await
    }

    /// Replace the attendance collection with `updater(current)`
    pub async fn update_attendance<F>(&self, updater: F) -> Result<()>
    where
        F: FnOnce(BTreeMap<String, DayAttendance>) -> BTreeMap<String, DayAttendance>,
    {
        self.commit(|doc| {
            let current = std::mem::take(&mut doc.attendance);
            doc.attendance = updater(current);
        })
        .await
    }

    pub async fn add_customer(&self, customer: Customer) -> Result<()> {
        info!("Adding customer {}", customer.id);
        self.update_customers(|mut customers| {
            customers.push(customer);
            customers
        })
        .await
    }

    pub async fn update_customer(&self, updated: Customer) -> Result<()> {
        info!("Updating customer {}", updated.id);
        self.update_customers(|customers| {
            customers
                .into_iter()
                .map(|existing| {
                    if existing.id == updated.id {
                        updated.clone()
                    } else {
                        existing
                    }
                })
                .collect()
        })
        .await
    }

    /// Remove a customer. Their dogs are not touched; callers that want a
    /// cascade must remove the dogs first.
    pub async fn remove_customer(&self, customer_id: &str) -> Result<()> {
        info!("Removing customer {}", customer_id);
        self.update_customers(|customers| {
            customers
                .into_iter()
                .filter(|c| c.id != customer_id)
                .collect()
        })
        .await
    }

    pub async fn add_dog(&self, dog: Dog) -> Result<()> {
        info!("Adding dog {}", dog.id);
        self.update_dogs(|mut dogs| {
            dogs.push(dog);
            dogs
        })
        .await
    }

    pub async fn update_dog(&self, updated: Dog) -> Result<()> {
        info!("Updating dog {}", updated.id);
        self.update_dogs(|dogs| {
            dogs.into_iter()
                .map(|existing| {
                    if existing.id == updated.id {
                        updated.clone()
                    } else {
                        existing
                    }
                })
                .collect()
        })
        .await
    }

    pub async fn remove_dog(&self, dog_id: &str) -> Result<()> {
        info!("Removing dog {}", dog_id);
        self.update_dogs(|dogs| dogs.into_iter().filter(|d| d.id != dog_id).collect())
            .await
    }

    /// Save a week's plan, dropping dogs with no scheduled days
    pub async fn save_week_schedule(&self, week_key: &str, plan: WeekPlan) -> Result<()> {
        let cleaned: WeekPlan = plan
            .into_iter()
            .filter(|(_, entry)| !entry.days.is_empty())
            .collect();
        info!(
            "Saving schedule for {} covering {} dogs",
            week_key,
            cleaned.len()
        );

        let key = week_key.to_string();
        self.update_schedules(|mut schedules| {
            schedules.insert(key, cleaned);
            schedules
        })
        .await
    }

    /// Copy one week's plan onto another week. Copying from a week with no
    /// stored plan is a no-op. The copy shares nothing with the source, so
    /// later edits to either week never show up in the other.
    pub async fn copy_week_schedule(&self, from_week: &str, to_week: &str) -> Result<()> {
        let source = self
            .snapshot
            .lock()
            .unwrap()
            .schedules
            .get(from_week)
            .cloned();
        let Some(plan) = source else {
            debug!("No schedule stored for {}, nothing to copy", from_week);
            return Ok(());
        };

        info!("Copying schedule {} -> {}", from_week, to_week);
        let key = to_week.to_string();
        self.update_schedules(|mut schedules| {
            schedules.insert(key, plan);
            schedules
        })
        .await
    }

    /// Check a dog in with the current clock time. Replaces any earlier
    /// record for that dog and day.
    pub async fn check_in(&self, date_key: &str, dog_id: &str) -> Result<()> {
        info!("Checking in dog {} on {}", dog_id, date_key);
        let record = AttendanceRecord {
            checked_in: true,
            check_in_time: calendar::clock_time(),
            checked_out: false,
            check_out_time: String::new(),
        };

        let date = date_key.to_string();
        let dog = dog_id.to_string();
        self.update_attendance(|mut attendance| {
            attendance.entry(date).or_default().insert(dog, record);
            attendance
        })
        .await
    }

    /// Drop the day's record for a dog, as if it never arrived
    pub async fn undo_check_in(&self, date_key: &str, dog_id: &str) -> Result<()> {
        info!("Undoing check-in for dog {} on {}", dog_id, date_key);
        self.update_attendance(|mut attendance| {
            if let Some(day) = attendance.get_mut(date_key) {
                day.remove(dog_id);
            }
            attendance
        })
        .await
    }

    /// Mark a checked-in dog as picked up. Rejects dogs without a check-in
    /// record for the day.
    pub async fn check_out(&self, date_key: &str, dog_id: &str) -> Result<()> {
        let known = self
            .snapshot
            .lock()
            .unwrap()
            .attendance
            .get(date_key)
            .is_some_and(|day| day.contains_key(dog_id));
        if !known {
            return Err(anyhow!(
                "Dog {} has no check-in recorded on {}",
                dog_id,
                date_key
            ));
        }

        info!("Checking out dog {} on {}", dog_id, date_key);
        let time = calendar::clock_time();
        self.update_attendance(|mut attendance| {
            if let Some(record) = attendance
                .get_mut(date_key)
                .and_then(|day| day.get_mut(dog_id))
            {
                record.checked_out = true;
                record.check_out_time = time;
            }
            attendance
        })
        .await
    }

    /// Clear a dog's check-out flag and time, keeping the check-in
    pub async fn undo_check_out(&self, date_key: &str, dog_id: &str) -> Result<()> {
        info!("Undoing check-out for dog {} on {}", dog_id, date_key);
        self.update_attendance(|mut attendance| {
            if let Some(record) = attendance
                .get_mut(date_key)
                .and_then(|day| day.get_mut(dog_id))
            {
                record.checked_out = false;
                record.check_out_time.clear();
            }
            attendance
        })
        .await
    }

    /// Upload a dog photo through the collaborator and store the returned
    /// URL on the matching dog. A failed upload is reported without any
    /// state change.
    pub async fn upload_dog_photo(
        &self,
        uploader: &dyn PhotoUploader,
        dog_id: &str,
        bytes: &[u8],
    ) -> Result<String> {
        let url = uploader
            .upload(dog_id, bytes)
            .await
            .with_context(|| format!("Photo upload for dog {} failed", dog_id))?;

        info!("Storing photo for dog {} at {}", dog_id, url);
        let stored = url.clone();
        self.update_dogs(|dogs| {
            dogs.into_iter()
                .map(|mut d| {
                    if d.id == dog_id {
                        d.photo_url = Some(stored.clone());
                    }
                    d
                })
                .collect()
        })
        .await?;

        Ok(url)
    }

    /// One-time lifecycle hook: rewrite dogs that still carry embedded
    /// owner fields. Customers and dogs land in a single commit so a crash
    /// can never persist one without the other. Gated by a session flag,
    /// not by data shape, so it runs at most once per session even when
    /// there is nothing to migrate.
    pub async fn run_legacy_owner_migration(&self) -> Result<()> {
        if self.migration_ran.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let (customers, dogs) = {
            let doc = self.snapshot.lock().unwrap();
            (doc.customers.clone(), doc.dogs.clone())
        };
        let Some(outcome) =
            migration::migrate_legacy_owners(&customers, &dogs, &Utc::now().to_rfc3339())
        else {
            debug!("No legacy owner fields found, nothing to migrate");
            return Ok(());
        };

        info!(
            "Migrating {} dogs with embedded owner fields",
            outcome.migrated
        );
        self.commit(move |doc| {
            doc.customers = outcome.customers;
            doc.dogs = outcome.dogs;
        })
        .await
    }

    /// Whether the one-time local import should be offered: account
    /// storage active, account registry still empty, device data present,
    /// and the offer not yet resolved this session
    pub fn import_available(&self) -> bool {
        if !self.is_remote() || self.import_resolved.load(Ordering::SeqCst) {
            return false;
        }
        if !self.snapshot.lock().unwrap().is_registry_empty() {
            return false;
        }
        match self.local.has_registry_data() {
            Ok(has_data) => has_data,
            Err(e) => {
                warn!("Could not inspect device data: {:#}", e);
                false
            }
        }
    }

    /// Record that the user declined the import; it is not offered again
    /// within this session
    pub fn decline_import(&self) {
        self.import_resolved.store(true, Ordering::SeqCst);
    }

    /// Copy the device's four collections into the account document as one
    /// write. Device data is left untouched whether or not this succeeds;
    /// a failed save rolls back the account document.
    pub async fn import_from_local(&self) -> Result<()> {
        if !self.is_remote() {
            return Err(anyhow!("Import requires an active account"));
        }

        let snapshot = self.local.load_document()?;
        info!(
            "Importing device data: {} customers, {} dogs",
            snapshot.customers.len(),
            snapshot.dogs.len()
        );

        self.commit(move |doc| {
            doc.customers = snapshot.customers;
            doc.dogs = snapshot.dogs;
            doc.schedules = snapshot.schedules;
            doc.attendance = snapshot.attendance;
        })
        .await?;

        self.import_resolved.store(true, Ordering::SeqCst);
        Ok(())
    }
}
