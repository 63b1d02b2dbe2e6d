//! Change Propagation Protocol
//!
//! Keeps replicas that share a backing store but no memory in step by
//! broadcasting every structural change as a small text message:
//!
//! - [`message`] - wire codec for structural changes and the `MessageEnvelope`
//! - [`MessageTransport`] - the broadcast seam, with [`InProcessHub`] for
//!   replicas in one process
//! - [`ChangePropagator`] - applies local changes then broadcasts them, and
//!   replays peers' changes through the Structural Mutation API
//!
//! Ordering holds per sender only. Renames are last-writer-wins; duplicate
//! and late deletes are no-ops.

mod error;
pub mod message;
mod propagator;
mod transport;

pub use error::ProtocolError;
pub use message::{decode, encode, MessageEnvelope, Opcode};
pub use propagator::{ApplyOutcome, ChangePropagator};
pub use transport::{InProcessHub, MessageTransport};
