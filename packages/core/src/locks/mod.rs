//! Record Lock Manager
//!
//! Pessimistic, cascading locks on backing records, shared by every replica
//! through the backing store:
//!
//! - [`RecordLockManager`] - acquires a record together with its lockable
//!   dependent (a Clip's Transcript), dependent first
//! - [`LockGuard`] - releases whatever it still holds, exactly once
//! - [`EditSession`] - a lock plus the transaction it guards; the transaction
//!   is always finished before the locks are released
//! - [`RecordDeletion`] - the guarded delete of a record and its dependents
//!
//! Acquisition never waits. A record held by another replica fails immediately
//! with [`LockError::RecordLocked`] naming the holder.

mod deletion;
mod error;
mod manager;
mod session;

pub use deletion::{DeletePlan, PendingDelete, RecordDeletion};
pub use error::LockError;
pub use manager::{LockGuard, RecordLockManager};
pub use session::EditSession;
