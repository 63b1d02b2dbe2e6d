//! Structural Mutation API
//!
//! This module contains the replica-side business logic:
//!
//! - `TreeService` - owns one replica's tree and applies Add / Delete / Rename /
//!   Move / Reorder to it
//! - Request types (`AddRequest`, ...) and `StructuralChange`, the unit that is
//!   applied locally and replayed from peers' messages
//! - `TreeEvent` - change notifications for views
//!
//! Services coordinate between the pure tree building blocks in
//! [`crate::tree`] and the backing store in [`crate::db`].

pub mod changes;
pub mod error;
pub mod events;
pub mod tree_service;

pub use changes::{
    AddRequest, ChangeOutcome, DeleteRequest, MoveRequest, RenameRequest, ReorderRequest,
    StructuralChange,
};
pub use error::TreeError;
pub use events::TreeEvent;
pub use tree_service::{RefreshReport, TreeService};
