//! Lupine Batch
//!
//! This crate contains the serializable domain types for batch processing:
//! a [`BatchProcess`] bundles an opaque work graph with a list of [`Batch`]
//! override sets, and each [`BatchSession`] tracks one execution session
//! spawned from a process through its lifecycle states.
//!
//! These types are what the store persists and returns. The graph payload is
//! carried as raw JSON and never interpreted here — resolving and executing
//! it belongs to the engine.

mod batch;
mod process;
mod session;
mod value;

pub use batch::Batch;
pub use process::BatchProcess;
pub use session::{BatchSession, BatchSessionChanges, SessionState};
pub use value::{BatchValue, ImageRef};
