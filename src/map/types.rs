//! Core data model for the exploration map: coordinates, directions and the
//! per-tile knowledge we accumulate while walking a maze we cannot see.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use super::errors::MapError;

/// Integer position on the unbounded maze grid. `(0,0)` is the entry tile and Y grows upward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Coord {
    pub x: i32,
    pub y: i32,
}

impl Coord {
    pub const ORIGIN: Coord = Coord { x: 0, y: 0 };

    pub fn new(x: i32, y: i32) -> Self {
        Coord { x, y }
    }

    /// Neighbouring coordinate one step in `dir`, or `None` past the edge of `i32`.
    pub fn step(self, dir: Direction) -> Option<Coord> {
        let (dx, dy) = dir.delta();
        Some(Coord {
            x: self.x.checked_add(dx)?,
            y: self.y.checked_add(dy)?,
        })
    }
}

/// Largest width or height, in tiles, a map may span.
pub const MAX_MAP_SPAN: i64 = 4096;

/// Coordinates stay one step clear of the `i32` limits and their bounding box stays
/// within [`MAX_MAP_SPAN`] tiles on each axis.
fn within_limits(coords: impl IntoIterator<Item = Coord>) -> bool {
    let lo = i32::MIN as i64 + 1;
    let hi = i32::MAX as i64 - 1;
    let mut bounds: Option<(i64, i64, i64, i64)> = None;
    for at in coords {
        let (x, y) = (at.x as i64, at.y as i64);
        if x < lo || x > hi || y < lo || y > hi {
            return false;
        }
        bounds = Some(match bounds {
            None => (x, x, y, y),
            Some((min_x, max_x, min_y, max_y)) => {
                (min_x.min(x), max_x.max(x), min_y.min(y), max_y.max(y))
            }
        });
    }
    match bounds {
        None => true,
        Some((min_x, max_x, min_y, max_y)) => {
            max_x - min_x < MAX_MAP_SPAN && max_y - min_y < MAX_MAP_SPAN
        }
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.x, self.y)
    }
}

/// One of the four walkable directions. Persisted as a small integer code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Direction {
    Up,
    Right,
    Down,
    Left,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Right,
        Direction::Down,
        Direction::Left,
    ];

    /// Grid offset `(dx, dy)` for a single step.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, 1),
            Direction::Right => (1, 0),
            Direction::Down => (0, -1),
            Direction::Left => (-1, 0),
        }
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Right => Direction::Left,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
        }
    }

    pub fn is_vertical(self) -> bool {
        matches!(self, Direction::Up | Direction::Down)
    }

    pub fn code(self) -> u8 {
        match self {
            Direction::Up => 0,
            Direction::Right => 1,
            Direction::Down => 2,
            Direction::Left => 3,
        }
    }

    /// Accepted input tokens, matched case-insensitively after trimming.
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            Direction::Up => &["u", "up", "↑"],
            Direction::Right => &["r", "right", "→"],
            Direction::Down => &["d", "down", "↓"],
            Direction::Left => &["l", "left", "←"],
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Right => "right",
            Direction::Down => "down",
            Direction::Left => "left",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Direction {
    type Err = MapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim().to_lowercase();
        Direction::ALL
            .into_iter()
            .find(|d| d.aliases().contains(&token.as_str()))
            .ok_or_else(|| MapError::InvalidDirection(s.to_string()))
    }
}

impl From<Direction> for u8 {
    fn from(d: Direction) -> u8 {
        d.code()
    }
}

impl TryFrom<u8> for Direction {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Direction::Up),
            1 => Ok(Direction::Right),
            2 => Ok(Direction::Down),
            3 => Ok(Direction::Left),
            other => Err(format!("unknown direction code {}", other)),
        }
    }
}

/// What lies behind an edge we have not walked yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Opportunity {
    pub allows_collection: bool,
    pub allows_exit: bool,
}

/// Everything known about one maze tile.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Cell {
    /// True only for the tile the player occupied when entering the maze.
    pub is_start: bool,
    pub can_collect_score: bool,
    pub can_exit: bool,
    /// Directions actually walked out of this cell. Never mirrored onto the neighbour:
    /// passages may be one-way.
    pub confirmed_links: BTreeSet<Direction>,
    /// Directions the server last reported as walkable from here.
    pub possible_moves: BTreeSet<Direction>,
    pub opportunities: BTreeMap<Direction, Opportunity>,
}

/// The full map plus the player's position. This is the unit of persistence.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExplorationState {
    pub cells: BTreeMap<Coord, Cell>,
    pub position: Coord,
}

impl ExplorationState {
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cell(&self, at: Coord) -> Option<&Cell> {
        self.cells.get(&at)
    }

    /// Lazily create the cell at `at`.
    pub fn cell_mut(&mut self, at: Coord) -> &mut Cell {
        self.cells.entry(at).or_default()
    }

    pub fn current(&self) -> Option<&Cell> {
        self.cells.get(&self.position)
    }

    /// Whether every tile (and the position) fits the drawable limits.
    pub fn is_drawable(&self) -> bool {
        within_limits(self.cells.keys().copied().chain([self.position]))
    }

    /// Whether adding a tile at `at` keeps the map drawable.
    pub fn admits(&self, at: Coord) -> bool {
        within_limits(self.cells.keys().copied().chain([self.position, at]))
    }
}

/// One walkable direction as reported by the server, with optional lookahead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveOption {
    /// Raw direction token; parsed leniently (unknown tokens are skipped).
    pub direction: String,
    pub opportunity: Option<Opportunity>,
}

impl MoveOption {
    pub fn new(direction: impl Into<String>) -> Self {
        MoveOption {
            direction: direction.into(),
            opportunity: None,
        }
    }

    pub fn with_opportunity(mut self, allows_collection: bool, allows_exit: bool) -> Self {
        self.opportunity = Some(Opportunity {
            allows_collection,
            allows_exit,
        });
        self
    }
}

impl FromStr for MoveOption {
    type Err = MapError;

    /// Parse `<dir>[:flags]`, where flags may contain `c` (leads to collection)
    /// and `e` (leads to exit). `right:ce`, `u:`, `left`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (dir, flags) = match s.split_once(':') {
            Some((d, f)) => (d, Some(f.to_lowercase())),
            None => (s, None),
        };
        // Reject bad tokens here; the tracker itself is lenient.
        dir.parse::<Direction>()?;
        let mut opt = MoveOption::new(dir.trim());
        if let Some(flags) = flags {
            if let Some(bad) = flags.chars().find(|c| !matches!(c, 'c' | 'e')) {
                return Err(MapError::InvalidDirection(format!(
                    "{} (unknown flag '{}')",
                    s, bad
                )));
            }
            opt = opt.with_opportunity(flags.contains('c'), flags.contains('e'));
        }
        Ok(opt)
    }
}

/// Server response fields the tracker consumes on enter/move.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Observation {
    pub can_collect_score: bool,
    pub can_exit: bool,
    pub moves: Vec<MoveOption>,
}

impl Observation {
    pub fn new(can_collect_score: bool, can_exit: bool, moves: Vec<MoveOption>) -> Self {
        Observation {
            can_collect_score,
            can_exit,
            moves,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_aliases_case_insensitively() {
        for dir in Direction::ALL {
            for alias in dir.aliases() {
                assert_eq!(alias.parse::<Direction>().unwrap(), dir);
                assert_eq!(alias.to_uppercase().parse::<Direction>().unwrap(), dir);
            }
        }
        assert_eq!("  Left ".parse::<Direction>().unwrap(), Direction::Left);
    }

    #[test]
    fn rejects_unknown_tokens() {
        assert!(matches!(
            "north".parse::<Direction>(),
            Err(MapError::InvalidDirection(t)) if t == "north"
        ));
        assert!("".parse::<Direction>().is_err());
    }

    #[test]
    fn opposite_and_delta_cancel_out() {
        for dir in Direction::ALL {
            let there = Coord::ORIGIN.step(dir).unwrap();
            assert_ne!(there, Coord::ORIGIN);
            assert_eq!(there.step(dir.opposite()), Some(Coord::ORIGIN));
            assert_eq!(dir.opposite().opposite(), dir);
        }
        assert_eq!(Coord::ORIGIN.step(Direction::Up), Some(Coord::new(0, 1)));
        assert_eq!(Coord::ORIGIN.step(Direction::Left), Some(Coord::new(-1, 0)));
    }

    #[test]
    fn step_stops_at_integer_edge() {
        assert_eq!(Coord::new(i32::MAX, 0).step(Direction::Right), None);
        assert_eq!(Coord::new(0, i32::MIN).step(Direction::Down), None);
        assert_eq!(
            Coord::new(i32::MAX, 0).step(Direction::Left),
            Some(Coord::new(i32::MAX - 1, 0))
        );
    }

    #[test]
    fn drawable_limits() {
        let mut state = ExplorationState::default();
        state.cell_mut(Coord::ORIGIN);
        assert!(state.is_drawable());
        assert!(state.admits(Coord::new(MAX_MAP_SPAN as i32 - 1, 0)));
        assert!(!state.admits(Coord::new(MAX_MAP_SPAN as i32, 0)));
        assert!(!state.admits(Coord::new(0, -(MAX_MAP_SPAN as i32))));

        let mut edge = ExplorationState::default();
        edge.position = Coord::new(i32::MAX, 0);
        edge.cell_mut(Coord::new(i32::MAX, 0));
        assert!(!edge.is_drawable());
    }

    #[test]
    fn direction_codes_are_stable() {
        let codes: Vec<u8> = Direction::ALL.iter().map(|d| d.code()).collect();
        assert_eq!(codes, vec![0, 1, 2, 3]);
        assert_eq!(serde_json::to_string(&Direction::Down).unwrap(), "2");
        assert_eq!(
            serde_json::from_str::<Direction>("3").unwrap(),
            Direction::Left
        );
        assert!(serde_json::from_str::<Direction>("7").is_err());
    }

    #[test]
    fn move_option_flags() {
        let opt: MoveOption = "right:ce".parse().unwrap();
        assert_eq!(opt.direction, "right");
        assert_eq!(
            opt.opportunity,
            Some(Opportunity {
                allows_collection: true,
                allows_exit: true
            })
        );

        let bare: MoveOption = "u".parse().unwrap();
        assert_eq!(bare.opportunity, None);

        let empty_flags: MoveOption = "d:".parse().unwrap();
        assert_eq!(empty_flags.opportunity, Some(Opportunity::default()));

        assert!("x:c".parse::<MoveOption>().is_err());
        assert!("up:z".parse::<MoveOption>().is_err());
    }
}
