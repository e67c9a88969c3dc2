//! Exploration map: reconstructs the layout of a maze that is only ever seen one tile at a
//! time, persists it per player, and draws it as ASCII.
//!
//! The tracker never assumes a passage is two-way. A link is recorded only for the
//! direction actually walked, or inferred when a newly reached tile advertises a move
//! back into already-mapped territory.

pub mod errors;
pub mod render;
pub mod storage;
pub mod tracker;
pub mod types;

pub use errors::MapError;
pub use render::{legend, render_ascii, EMPTY_MAP, MAP_TOO_LARGE};
pub use storage::{MapStore, Snapshot, SnapshotCell};
pub use tracker::{MapSummary, MapTracker, MoveOutcome};
pub use types::*;
