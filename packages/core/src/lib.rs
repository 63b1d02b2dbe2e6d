//! MediaTree Core
//!
//! The replicated, hierarchical view of a media-analysis project (Series,
//! Episodes, Transcripts, Collections, Clips, Snapshots, Keywords and Notes)
//! that several client processes keep consistent over a shared backing store.
//!
//! # Architecture
//!
//! - **Records stay elsewhere**: the tree only references backing records by
//!   `(type, id)` and loads names, parents and sort orders on demand
//! - **Ids inside, paths on the wire**: nodes are indexed by record id locally;
//!   peers address them by a path of display names under an untranslated
//!   branch marker
//! - **Replay, not state transfer**: every structural change is broadcast and
//!   re-executed by each replica through the same API
//! - **Pessimistic locks**: edits to one backing record are serialized across
//!   processes with fail-fast, cascading locks
//!
//! # Modules
//!
//! - [`models`] - node kinds, branches, record references, tree nodes and paths
//! - [`tree`] - arena, name normalization, Path Resolver and Placement Engine
//! - [`services`] - Structural Mutation API (`TreeService`) and its events
//! - [`sync`] - Change Propagation Protocol
//! - [`locks`] - Record Lock Manager
//! - [`db`] - backing-record collaborator traits and an in-memory store
//! - [`config`] - per-replica configuration
//! - [`logging`] - tracing subscriber setup

pub mod config;
pub mod db;
pub mod locks;
pub mod logging;
pub mod models;
pub mod services;
pub mod sync;
pub mod tree;

// Re-export commonly used types
pub use config::TreeSyncConfig;
pub use db::{InMemoryRecordStore, LockBackend, RecordStore, StoreError};
pub use locks::{DeletePlan, EditSession, LockError, RecordDeletion, RecordLockManager};
pub use logging::init_tracing;
pub use models::*;
pub use services::*;
pub use sync::{ApplyOutcome, ChangePropagator, InProcessHub, MessageEnvelope, ProtocolError};
pub use tree::MediaTree;
