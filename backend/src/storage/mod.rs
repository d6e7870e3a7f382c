//! # Storage Module
//!
//! Handles all data persistence for the daycare tracker.
//!
//! The whole application state is one document holding four collections
//! (customers, dogs, schedules, attendance). This module provides two
//! interchangeable homes for that document:
//!
//! - **Local**: device-scoped, four independent JSON slots on disk,
//!   effectively synchronous
//! - **Remote**: account-scoped, a single JSON document per account behind
//!   an asynchronous transport
//!
//! ## Design Principles
//!
//! - **One interface, two implementations**: the domain layer talks to
//!   `DocumentStore` only and never branches on the concrete backend
//! - **Full-document writes**: no partial or per-field updates; a save
//!   always overwrites the previous state completely
//! - **Forgiving reads**: missing data means an empty collection, and a
//!   remote load failure degrades to an empty document with a log entry
//! - **Strict writes**: a failed save propagates so the caller can roll
//!   back its optimistic state

pub mod local;
pub mod remote;
pub mod traits;

pub use local::LocalStore;
pub use remote::{FileRemoteClient, RemoteClient, RemoteStore};
pub use traits::DocumentStore;
