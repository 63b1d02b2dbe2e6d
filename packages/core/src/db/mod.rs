//! Backing Store Layer
//!
//! The tree is a projection of records that live elsewhere. This module defines
//! the seam to that persistence layer:
//!
//! - [`RecordStore`] - loads the few record attributes the tree needs and
//!   performs transactional deletes
//! - [`LockBackend`] / [`Transaction`] - pessimistic record locks and the
//!   transactions they guard
//! - [`InMemoryRecordStore`] - complete in-process implementation, shared
//!   between replicas in tests and demos
//!
//! # Architecture
//!
//! Domain CRUD (editing a Transcript, saving a Clip) is out of scope here. The
//! core only ever reads names, parents and sort orders, and deletes records on
//! behalf of [`crate::locks::RecordDeletion`].

mod error;
mod memory_store;
mod record_store;

pub use error::StoreError;
pub use memory_store::InMemoryRecordStore;
pub use record_store::{Dependents, LockBackend, RecordStore, Transaction};
