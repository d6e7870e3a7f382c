//! # Daycare Tracker Backend
//!
//! Contains all non-UI logic for the daycare tracker: a customer/dog
//! registry, weekly scheduling, daily check-in/out and income summaries,
//! built around a data synchronization core that decides at runtime
//! whether state lives on the device or in a per-account remote document.
//!
//! The backend is UI-agnostic: the UI reads snapshots from
//! [`AppDataService`], subscribes to its change feed, and calls its
//! mutation operations. Nothing here depends on a particular frontend.
//!
//! ## Architecture
//!
//! ```text
//! UI Layer (reads snapshots, calls mutations)
//!     ↓
//! Domain Layer (AppDataService, calendar, finance, migration)
//!     ↓
//! Storage Layer (DocumentStore: LocalStore | RemoteStore)
//! ```

pub mod domain;
pub mod storage;

pub use domain::{AppDataService, IncomeSummary, PhotoUploader};
pub use storage::{DocumentStore, FileRemoteClient, LocalStore, RemoteClient, RemoteStore};
