//! Snapshot persistence for the exploration map.
//!
//! Persistence: JSON at `<data_dir>/maps/<player>.json` using write-to-temp + rename.
//!
//! Map tracking is auxiliary to the maze session, so the public [`MapStore::load`] and
//! [`MapStore::save`] never fail: a missing, corrupt or empty snapshot loads as a fresh
//! state, and write failures are logged at `warn` and dropped. Callers that want the
//! underlying errors can use [`MapStore::try_load`] / [`MapStore::try_save`].
//!
//! No file locking is taken; two processes writing the same snapshot race and the later
//! save wins.

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use super::errors::MapError;
use super::types::{Cell, Coord, Direction, ExplorationState, Opportunity, MAX_MAP_SPAN};

/// On-disk shape of the whole exploration state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default)]
    pub position_x: i32,
    #[serde(default)]
    pub position_y: i32,
    #[serde(default)]
    pub cells: Vec<SnapshotCell>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotCell {
    pub x: i32,
    pub y: i32,
    #[serde(default)]
    pub is_start: bool,
    #[serde(default)]
    pub can_collect_score: bool,
    #[serde(default)]
    pub can_exit: bool,
    #[serde(default)]
    pub links: Vec<Direction>,
    #[serde(default)]
    pub possible_moves: Vec<Direction>,
    #[serde(default)]
    pub opportunities: BTreeMap<Direction, Opportunity>,
}

impl From<&ExplorationState> for Snapshot {
    fn from(state: &ExplorationState) -> Self {
        let cells = state
            .cells
            .iter()
            .map(|(at, cell)| SnapshotCell {
                x: at.x,
                y: at.y,
                is_start: cell.is_start,
                can_collect_score: cell.can_collect_score,
                can_exit: cell.can_exit,
                links: cell.confirmed_links.iter().copied().collect(),
                possible_moves: cell.possible_moves.iter().copied().collect(),
                opportunities: cell.opportunities.clone(),
            })
            .collect();
        Snapshot {
            position_x: state.position.x,
            position_y: state.position.y,
            cells,
        }
    }
}

impl Snapshot {
    /// Rebuild the in-memory state. Returns `None` for a degenerate snapshot: no cells, or
    /// tiles outside the drawable limits (see [`ExplorationState::is_drawable`]).
    pub fn into_state(self) -> Option<ExplorationState> {
        if self.cells.is_empty() {
            return None;
        }
        let mut state = ExplorationState {
            cells: BTreeMap::new(),
            position: Coord::new(self.position_x, self.position_y),
        };
        for c in self.cells {
            // Duplicate coordinates: last entry wins.
            state.cells.insert(
                Coord::new(c.x, c.y),
                Cell {
                    is_start: c.is_start,
                    can_collect_score: c.can_collect_score,
                    can_exit: c.can_exit,
                    confirmed_links: c.links.into_iter().collect(),
                    possible_moves: c.possible_moves.into_iter().collect(),
                    opportunities: c.opportunities,
                },
            );
        }
        if !state.cells.contains_key(&state.position) {
            warn!(
                "map snapshot position {} has no cell; inserting an empty one",
                state.position
            );
            let at = state.position;
            state.cell_mut(at);
        }
        if !state.is_drawable() {
            warn!(
                "map snapshot exceeds {} tiles or touches the coordinate limits; discarding",
                MAX_MAP_SPAN
            );
            return None;
        }
        Some(state)
    }
}

/// Per-player snapshot file.
#[derive(Debug, Clone)]
pub struct MapStore {
    path: PathBuf,
}

impl MapStore {
    /// Store for `player` under `data_dir`; the player name is percent-encoded into the file name.
    pub fn new(data_dir: impl AsRef<Path>, player: &str) -> Self {
        MapStore {
            path: snapshot_path(data_dir.as_ref(), player),
        }
    }

    /// Store backed by an explicit file path.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        MapStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the snapshot. `Ok(None)` when the file is absent or holds no cells.
    pub fn try_load(&self) -> Result<Option<ExplorationState>, MapError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(s) => s,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        // `null` and other non-object roots count as degenerate, not corrupt.
        let snapshot: Option<Snapshot> = serde_json::from_str(&raw)?;
        Ok(snapshot.and_then(Snapshot::into_state))
    }

    /// Best-effort load: any failure yields a fresh, empty state.
    pub fn load(&self) -> ExplorationState {
        match self.try_load() {
            Ok(Some(state)) => state,
            Ok(None) => {
                debug!("no map snapshot at {}; starting empty", self.path.display());
                ExplorationState::default()
            }
            Err(e) => {
                warn!(
                    "unreadable map snapshot at {} ({}); starting empty",
                    self.path.display(),
                    e
                );
                ExplorationState::default()
            }
        }
    }

    pub fn try_save(&self, state: &ExplorationState) -> Result<(), MapError> {
        let json = serde_json::to_string_pretty(&Snapshot::from(state))?;
        write_json_atomic(&self.path, &json)?;
        Ok(())
    }

    /// Best-effort save: failures are logged and otherwise ignored so they never abort
    /// the maze action that triggered them.
    pub fn save(&self, state: &ExplorationState) {
        if let Err(e) = self.try_save(state) {
            warn!(
                "failed to save map snapshot to {}: {}",
                self.path.display(),
                e
            );
        }
    }
}

fn snapshot_path(data_dir: &Path, player: &str) -> PathBuf {
    data_dir
        .join("maps")
        .join(format!("{}.json", crate::validation::safe_filename(player)))
}

fn write_json_atomic(path: &Path, content: &str) -> std::io::Result<()> {
    let dir = path.parent().unwrap_or(Path::new("."));
    std::fs::create_dir_all(dir)?;
    let base = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("map.json");
    let mut counter = 0u32;
    let tmp_path = loop {
        let cand = dir.join(format!(".{}.tmp-{}-{}", base, std::process::id(), counter));
        match OpenOptions::new().write(true).create_new(true).open(&cand) {
            Ok(mut tmp) => {
                tmp.write_all(content.as_bytes())?;
                let _ = tmp.sync_all();
                break cand;
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                counter = counter.saturating_add(1);
            }
            Err(e) => return Err(e),
        }
    };
    if let Err(e) = std::fs::rename(&tmp_path, path) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(e);
    }
    if let Ok(dirf) = File::open(dir) {
        let _ = dirf.sync_all();
    }
    Ok(())
}
