//! # Domain Module
//!
//! Contains all business logic for the daycare tracker.
//!
//! ## Module Organization
//!
//! - **app_data**: the data synchronization core — backend selection,
//!   snapshot cache, mutation gateway, legacy migration and the one-time
//!   local import
//! - **calendar**: week/date navigation built on the persisted key formats
//! - **finance**: expected/actual income derivation and the month CSV export
//! - **migration**: the pure legacy-owner transform applied by app_data
//!
//! ## Key Responsibilities
//!
//! - **Single mutation path**: every collection edit flows through the
//!   gateway's optimistic commit, never directly to storage
//! - **Backend independence**: services work identically over device-local
//!   and account-remote storage
//! - **Derived views**: income and export computations read a document
//!   snapshot and never mutate state

pub mod app_data;
pub mod calendar;
pub mod finance;
pub mod migration;

pub use app_data::{AppDataService, PhotoUploader};
pub use finance::{
    income_between, month_attendance_csv, month_income, week_income, IncomeSummary,
};
pub use migration::{migrate_legacy_owners, MigrationOutcome};
