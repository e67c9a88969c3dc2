//! # Mazemap - exploration tracker for partially observed mazes
//!
//! Mazemap keeps a map of a grid maze that a game server only ever reveals one tile at a
//! time. Each server reply says which directions are walkable from the current tile,
//! whether score can be collected or the maze exited there, and sometimes whether an
//! unexplored direction leads toward either. Mazemap folds those replies into a graph,
//! saves it per player, and draws it as ASCII.
//!
//! ## Features
//!
//! - **Incremental mapping**: tiles are created on first sight; links are recorded only in
//!   the direction actually walked, so one-way passages stay one-way.
//! - **Self-healing**: a move the cached map did not expect refreshes the current tile
//!   instead of inventing an edge.
//! - **Stateless invocations**: every operation reloads and resaves the snapshot, so
//!   separate short-lived processes can drive the same map.
//! - **ASCII rendering**: tiles, walked links and frontier hints on a compact canvas.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mazemap::map::{MapStore, MapTracker, MoveOption, Observation};
//!
//! fn main() -> anyhow::Result<()> {
//!     let mut tracker = MapTracker::new(MapStore::new("./data", "alice"));
//!
//!     tracker.enter(&Observation::new(false, false, vec![MoveOption::new("right")]));
//!     tracker.record_move(
//!         "r",
//!         &Observation::new(true, false, vec![MoveOption::new("left")]),
//!     )?;
//!
//!     print!("{}", tracker.render_ascii());
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`map`] - data model, tracker, snapshot store and renderer
//! - [`config`] - TOML configuration for the CLI
//! - [`validation`] - player-name checks and safe snapshot file names

pub mod config;
pub mod map;
pub mod validation;
