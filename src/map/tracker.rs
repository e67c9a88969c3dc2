//! Exploration tracker: folds enter/move observations into the persisted map.
//!
//! Every operation reloads the snapshot first and saves it last, so separate short-lived
//! processes driving the same player see each other's progress.

use log::{debug, info};
use std::collections::{BTreeMap, BTreeSet};

use super::errors::MapError;
use super::render;
use super::storage::MapStore;
use super::types::{Coord, Direction, ExplorationState, MoveOption, Observation, Opportunity};

/// Result of [`MapTracker::record_move`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The step was consistent with the cached map; the player is now at `to`.
    Moved { to: Coord },
    /// The direction was not advertised for the current tile, or stepping would leave the
    /// drawable limits; only the tile's metadata was refreshed.
    Refreshed { at: Coord },
}

/// One-line overview of what has been mapped so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MapSummary {
    pub cells: usize,
    pub position: Coord,
    pub collect_tiles: usize,
    pub exit_tiles: usize,
    /// Advertised but never walked (tile, direction) pairs.
    pub frontier: usize,
}

impl std::fmt::Display for MapSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Tiles {} @{} Collect {} Exit {} Frontier {}",
            self.cells, self.position, self.collect_tiles, self.exit_tiles, self.frontier
        )
    }
}

#[derive(Debug)]
pub struct MapTracker {
    store: MapStore,
    state: ExplorationState,
}

impl MapTracker {
    pub fn new(store: MapStore) -> Self {
        MapTracker {
            store,
            state: ExplorationState::default(),
        }
    }

    /// State as of the last operation (not reloaded).
    pub fn state(&self) -> &ExplorationState {
        &self.state
    }

    pub fn store(&self) -> &MapStore {
        &self.store
    }

    fn reload(&mut self) {
        self.state = self.store.load();
    }

    fn persist(&self) {
        self.store.save(&self.state);
    }

    /// Forget every tile and return to the origin.
    pub fn reset(&mut self) {
        self.state = ExplorationState::default();
        self.persist();
        debug!("map reset at {}", self.store.path().display());
    }

    /// Start a maze session. Existing progress is never overwritten; only an empty map
    /// gets its origin tile initialised from `obs`.
    pub fn enter(&mut self, obs: &Observation) {
        self.reload();
        if !self.state.is_empty() {
            info!(
                "map already has {} tiles; resuming at {}",
                self.state.cells.len(),
                self.state.position
            );
            self.persist();
            return;
        }

        let (possible, opportunities) = parse_options(&obs.moves);
        self.state.position = Coord::ORIGIN;
        let origin = self.state.cell_mut(Coord::ORIGIN);
        origin.is_start = true;
        origin.can_collect_score = obs.can_collect_score;
        origin.can_exit = obs.can_exit;
        origin.possible_moves = possible;
        origin.opportunities = opportunities;
        self.persist();
    }

    /// Record the outcome of a move request in direction `token`.
    ///
    /// `obs` describes the tile the server says the player is on after the request. An
    /// unparsable `token` fails without touching the saved map.
    pub fn record_move(&mut self, token: &str, obs: &Observation) -> Result<MoveOutcome, MapError> {
        let dir: Direction = token.parse()?;
        self.reload();

        let from = self.state.position;
        let (possible, opportunities) = parse_options(&obs.moves);
        // A step off the edge of the coordinate space or past the drawable span is
        // treated like an unexpected move.
        let target = from.step(dir).filter(|to| self.state.admits(*to));
        let from_cell = self.state.cell_mut(from);

        let to = match target {
            Some(to) if from_cell.possible_moves.contains(&dir) => to,
            _ => {
                info!(
                    "move {} not possible from {}; refreshing tile instead of moving",
                    dir, from
                );
                from_cell.possible_moves = possible;
                from_cell.opportunities = opportunities;
                from_cell.can_collect_score = obs.can_collect_score;
                from_cell.can_exit = obs.can_exit;
                self.persist();
                return Ok(MoveOutcome::Refreshed { at: from });
            }
        };

        from_cell.confirmed_links.insert(dir);

        // Links are inferred only toward tiles that are already mapped; new tiles stay frontier.
        let known: BTreeSet<Direction> = possible
            .iter()
            .copied()
            .filter(|d| to.step(*d).map_or(false, |n| self.state.cells.contains_key(&n)))
            .collect();

        let to_cell = self.state.cell_mut(to);
        to_cell.can_collect_score = obs.can_collect_score;
        to_cell.can_exit = obs.can_exit;
        // Hints from earlier visits survive unless the server re-annotates the direction,
        // stops offering it, or it now leads to a mapped tile.
        to_cell.opportunities.extend(opportunities);
        to_cell
            .opportunities
            .retain(|d, _| possible.contains(d) && !known.contains(d));
        to_cell.confirmed_links = known;
        to_cell.possible_moves = possible;

        self.state.position = to;
        debug!("moved {} from {} to {}", dir, from, to);
        self.persist();
        Ok(MoveOutcome::Moved { to })
    }

    /// Render the latest saved map.
    pub fn render_ascii(&mut self) -> String {
        self.reload();
        render::render_ascii(&self.state)
    }

    pub fn summary(&mut self) -> MapSummary {
        self.reload();
        let cells = &self.state.cells;
        MapSummary {
            cells: cells.len(),
            position: self.state.position,
            collect_tiles: cells.values().filter(|c| c.can_collect_score).count(),
            exit_tiles: cells.values().filter(|c| c.can_exit).count(),
            frontier: cells
                .values()
                .map(|c| c.possible_moves.difference(&c.confirmed_links).count())
                .sum(),
        }
    }
}

/// Split server move options into the possible-move set and opportunity map.
/// Tokens that do not parse are skipped.
fn parse_options(
    moves: &[MoveOption],
) -> (BTreeSet<Direction>, BTreeMap<Direction, Opportunity>) {
    let mut possible = BTreeSet::new();
    let mut opportunities = BTreeMap::new();
    for opt in moves {
        let Ok(dir) = opt.direction.parse::<Direction>() else {
            debug!("skipping unrecognised move option '{}'", opt.direction);
            continue;
        };
        possible.insert(dir);
        if let Some(opp) = opt.opportunity {
            opportunities.insert(dir, opp);
        }
    }
    (possible, opportunities)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::types::{Cell, MAX_MAP_SPAN};

    fn tracker() -> (tempfile::TempDir, MapTracker) {
        let td = tempfile::tempdir().unwrap();
        let store = MapStore::new(td.path(), "tester");
        (td, MapTracker::new(store))
    }

    fn set(dirs: &[Direction]) -> BTreeSet<Direction> {
        dirs.iter().copied().collect()
    }

    fn opts(tokens: &[&str]) -> Vec<MoveOption> {
        tokens.iter().map(|t| t.parse().unwrap()).collect()
    }

    #[test]
    fn enter_initialises_origin() {
        let (_td, mut t) = tracker();
        let mut moves = opts(&["up:c", "right"]);
        moves.push(MoveOption::new("sideways"));
        t.enter(&Observation::new(true, false, moves));

        let origin = t.state().cell(Coord::ORIGIN).unwrap();
        assert!(origin.is_start);
        assert!(origin.can_collect_score);
        assert!(!origin.can_exit);
        assert_eq!(
            origin.possible_moves,
            set(&[Direction::Up, Direction::Right])
        );
        assert_eq!(origin.opportunities.len(), 1);
        assert!(origin.opportunities[&Direction::Up].allows_collection);
        assert!(origin.confirmed_links.is_empty());
    }

    #[test]
    fn enter_keeps_existing_progress() {
        let (_td, mut t) = tracker();
        t.enter(&Observation::new(false, false, opts(&["r"])));
        t.record_move("r", &Observation::new(false, false, opts(&["l"])))
            .unwrap();
        let before = t.state().clone();

        t.enter(&Observation::new(true, true, vec![]));
        assert_eq!(t.state(), &before);
        assert_eq!(t.store().load(), before);
    }

    #[test]
    fn reset_is_idempotent() {
        let (_td, mut t) = tracker();
        t.enter(&Observation::default());
        t.reset();
        t.reset();
        assert!(t.state().is_empty());
        assert_eq!(t.state().position, Coord::ORIGIN);
        assert_eq!(t.render_ascii(), render::EMPTY_MAP);
    }

    #[test]
    fn invalid_token_does_not_touch_saved_map() {
        let (_td, mut t) = tracker();
        t.enter(&Observation::new(false, false, opts(&["u"])));
        let saved = t.store().load();
        let err = t
            .record_move("sideways", &Observation::new(true, true, vec![]))
            .unwrap_err();
        assert!(matches!(err, MapError::InvalidDirection(_)));
        assert_eq!(t.store().load(), saved);
    }

    #[test]
    fn valid_move_links_outward_only() {
        let (_td, mut t) = tracker();
        t.enter(&Observation::new(false, false, opts(&["u"])));
        let outcome = t
            .record_move("UP", &Observation::new(false, true, opts(&["d", "l:e"])))
            .unwrap();
        assert_eq!(outcome, MoveOutcome::Moved { to: Coord::new(0, 1) });

        let state = t.state();
        assert_eq!(state.position, Coord::new(0, 1));
        let origin = state.cell(Coord::ORIGIN).unwrap();
        assert!(origin.confirmed_links.contains(&Direction::Up));

        let top = state.cell(Coord::new(0, 1)).unwrap();
        assert!(top.can_exit);
        // Down leads back to a mapped tile so it is inferred; Left is still frontier.
        assert_eq!(top.confirmed_links, set(&[Direction::Down]));
        assert_eq!(
            top.possible_moves,
            set(&[Direction::Down, Direction::Left])
        );
        assert!(!top.opportunities.contains_key(&Direction::Down));
        assert!(top.opportunities[&Direction::Left].allows_exit);
    }

    #[test]
    fn one_way_step_does_not_add_back_link() {
        let (_td, mut t) = tracker();
        t.enter(&Observation::new(false, false, opts(&["r"])));
        // Server reports no way back from the new tile.
        t.record_move("r", &Observation::new(false, false, opts(&["r"])))
            .unwrap();
        let east = t.state().cell(Coord::new(1, 0)).unwrap();
        assert!(east.confirmed_links.is_empty());
        assert!(!east.possible_moves.contains(&Direction::Left));
    }

    #[test]
    fn unadvertised_move_refreshes_in_place() {
        let (_td, mut t) = tracker();
        t.enter(&Observation::new(false, false, opts(&["u"])));
        let moves = opts(&["l:ce"]);
        let outcome = t
            .record_move("d", &Observation::new(true, false, moves))
            .unwrap();
        assert_eq!(outcome, MoveOutcome::Refreshed { at: Coord::ORIGIN });

        let origin = t.state().cell(Coord::ORIGIN).unwrap();
        assert_eq!(t.state().position, Coord::ORIGIN);
        assert_eq!(origin.possible_moves, set(&[Direction::Left]));
        assert_eq!(origin.opportunities.len(), 1);
        assert!(origin.can_collect_score);
        assert!(origin.is_start);
        assert_eq!(t.state().cells.len(), 1);
    }

    #[test]
    fn move_before_enter_refreshes_origin() {
        let (_td, mut t) = tracker();
        let outcome = t
            .record_move("r", &Observation::new(false, false, opts(&["r"])))
            .unwrap();
        assert_eq!(outcome, MoveOutcome::Refreshed { at: Coord::ORIGIN });
        let origin: &Cell = t.state().cell(Coord::ORIGIN).unwrap();
        assert!(!origin.is_start);
        assert!(origin.possible_moves.contains(&Direction::Right));
    }

    #[test]
    fn revisit_keeps_earlier_hints() {
        let (_td, mut t) = tracker();
        t.enter(&Observation::new(false, false, opts(&["r"])));
        t.record_move("r", &Observation::new(false, false, opts(&["l", "u:c"])))
            .unwrap();
        t.record_move("l", &Observation::new(false, false, opts(&["r"])))
            .unwrap();
        // Back east with an unannotated Up: the earlier hint stays.
        t.record_move("r", &Observation::new(false, false, opts(&["l", "u"])))
            .unwrap();
        let east = t.state().cell(Coord::new(1, 0)).unwrap();
        assert!(east.opportunities[&Direction::Up].allows_collection);
        assert_eq!(t.render_ascii(), "  c\nS-@\n");

        // A fresh annotation replaces it; a direction no longer offered drops it.
        t.record_move("l", &Observation::new(false, false, opts(&["r"])))
            .unwrap();
        t.record_move("r", &Observation::new(false, false, opts(&["l", "u:e"])))
            .unwrap();
        let east = t.state().cell(Coord::new(1, 0)).unwrap();
        assert!(east.opportunities[&Direction::Up].allows_exit);
        assert!(!east.opportunities[&Direction::Up].allows_collection);
        t.record_move("l", &Observation::new(false, false, opts(&["r"])))
            .unwrap();
        t.record_move("r", &Observation::new(false, false, opts(&["l"])))
            .unwrap();
        assert!(t.state().cell(Coord::new(1, 0)).unwrap().opportunities.is_empty());
    }

    #[test]
    fn step_past_span_limit_refreshes() {
        let (_td, mut t) = tracker();
        let far = Coord::new(MAX_MAP_SPAN as i32 - 1, 0);
        let mut state = ExplorationState::default();
        state.cell_mut(Coord::ORIGIN).possible_moves = set(&[Direction::Left]);
        state.cell_mut(far);
        t.store().try_save(&state).unwrap();

        let outcome = t
            .record_move("l", &Observation::new(false, false, opts(&["r"])))
            .unwrap();
        assert_eq!(outcome, MoveOutcome::Refreshed { at: Coord::ORIGIN });
        assert_eq!(t.state().cells.len(), 2);
        assert!(t.state().cell(Coord::new(-1, 0)).is_none());
        // The stored map is still loadable and drawable.
        assert!(t.store().try_load().unwrap().is_some());
        assert!(t.render_ascii().contains('@'));
    }

    #[test]
    fn summary_counts_frontier_and_specials() {
        let (_td, mut t) = tracker();
        t.enter(&Observation::new(false, false, opts(&["r", "u"])));
        t.record_move("r", &Observation::new(true, false, opts(&["l", "r"])))
            .unwrap();
        let s = t.summary();
        assert_eq!(s.cells, 2);
        assert_eq!(s.position, Coord::new(1, 0));
        assert_eq!(s.collect_tiles, 1);
        assert_eq!(s.exit_tiles, 0);
        // Origin: Up unexplored. East: Right unexplored.
        assert_eq!(s.frontier, 2);
        assert_eq!(
            s.to_string(),
            "Tiles 2 @(1,0) Collect 1 Exit 0 Frontier 2"
        );
    }
}
