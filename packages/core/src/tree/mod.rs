//! Replicated Tree
//!
//! Pure, UI-free building blocks of a replica's tree:
//!
//! - [`MediaTree`] - node arena with record and (lazy) name indexes
//! - [`normalize`] - case/diacritic-insensitive name matching
//! - [`transitions`] - per-branch type-transition table
//! - [`resolver`] - Path Resolver
//! - [`placement`] - Placement Engine
//!
//! Nothing in here performs I/O; the Structural Mutation API in
//! [`crate::services`] composes these with the backing store.

mod arena;
pub mod normalize;
pub mod placement;
pub mod resolver;
pub mod transitions;

pub use arena::MediaTree;
pub use normalize::{names_match, normalize_name};
pub use placement::{placement, Placement, PlacementOptions};
pub use resolver::{resolve, resolve_display, NotFound};
