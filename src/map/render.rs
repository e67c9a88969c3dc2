//! ASCII projection of the exploration map.
//!
//! Odd rows/columns of the canvas hold tiles, even ones hold the connectors between them.
//! The maze's Y axis points up, so the top canvas row is the highest Y. The finished canvas
//! is cropped to its non-blank extent, so a lone tile renders as `"@\n"`.

use super::types::{Cell, Coord, Direction, ExplorationState, Opportunity};

/// Output for a map with no known tiles.
pub const EMPTY_MAP: &str = "(map is empty)\n";

/// Output for a map whose tiles fall outside the drawable limits.
pub const MAP_TOO_LARGE: &str = "(map too large to draw)\n";

/// Render `state` into a multi-line string, every row newline-terminated.
pub fn render_ascii(state: &ExplorationState) -> String {
    if !state.is_drawable() {
        return MAP_TOO_LARGE.to_string();
    }
    let Some(bounds) = Bounds::of(state) else {
        return EMPTY_MAP.to_string();
    };
    let mut canvas = Canvas::new(&bounds);

    for (&at, cell) in &state.cells {
        canvas.put_tile(at, tile_glyph(cell, at == state.position));
    }

    for (&at, cell) in &state.cells {
        for dir in Direction::ALL {
            let glyph = if cell.confirmed_links.contains(&dir) {
                if dir.is_vertical() {
                    '|'
                } else {
                    '-'
                }
            } else if cell.possible_moves.contains(&dir) {
                opportunity_glyph(cell.opportunities.get(&dir))
            } else {
                continue;
            };
            canvas.put_connector(at, dir, glyph);
        }
    }

    canvas.into_string()
}

/// Glyph legend for display alongside [`render_ascii`] output.
pub fn legend() -> &'static str {
    "@=You S=Start o=Visited\n\
     C=Collect E=Exit X=Both\n\
     -|=Walked ?=Unexplored\n\
     c/e/x=Unexplored, leads to C/E/X\n"
}

fn tile_glyph(cell: &Cell, current: bool) -> char {
    if current {
        return '@';
    }
    match (cell.can_collect_score, cell.can_exit) {
        (true, true) => 'X',
        (true, false) => 'C',
        (false, true) => 'E',
        (false, false) if cell.is_start => 'S',
        (false, false) => 'o',
    }
}

fn opportunity_glyph(opp: Option<&Opportunity>) -> char {
    match opp {
        Some(Opportunity {
            allows_collection: true,
            allows_exit: true,
        }) => 'x',
        Some(Opportunity {
            allows_collection: true,
            allows_exit: false,
        }) => 'c',
        Some(Opportunity {
            allows_collection: false,
            allows_exit: true,
        }) => 'e',
        _ => '?',
    }
}

/// Higher rank wins when two writes land on the same connector.
fn connector_rank(glyph: char) -> u8 {
    match glyph {
        '-' | '|' => 3,
        'x' | 'c' | 'e' => 2,
        '?' => 1,
        _ => 0,
    }
}

#[derive(Debug, Clone, Copy)]
struct Bounds {
    min_x: i32,
    max_x: i32,
    min_y: i32,
    max_y: i32,
}

impl Bounds {
    /// Bounding box of known tiles, grown by one wherever an edge tile can move further out.
    fn of(state: &ExplorationState) -> Option<Bounds> {
        let mut keys = state.cells.keys();
        let first = keys.next()?;
        let mut b = Bounds {
            min_x: first.x,
            max_x: first.x,
            min_y: first.y,
            max_y: first.y,
        };
        for at in keys {
            b.min_x = b.min_x.min(at.x);
            b.max_x = b.max_x.max(at.x);
            b.min_y = b.min_y.min(at.y);
            b.max_y = b.max_y.max(at.y);
        }

        let tight = b;
        for (at, cell) in &state.cells {
            let can = |dir: Direction| cell.possible_moves.contains(&dir);
            if at.x == tight.min_x && can(Direction::Left) {
                b.min_x = tight.min_x - 1;
            }
            if at.x == tight.max_x && can(Direction::Right) {
                b.max_x = tight.max_x + 1;
            }
            if at.y == tight.min_y && can(Direction::Down) {
                b.min_y = tight.min_y - 1;
            }
            if at.y == tight.max_y && can(Direction::Up) {
                b.max_y = tight.max_y + 1;
            }
        }
        Some(b)
    }

    fn width(&self) -> usize {
        (self.max_x - self.min_x + 1) as usize
    }

    fn height(&self) -> usize {
        (self.max_y - self.min_y + 1) as usize
    }
}

struct Canvas {
    bounds: Bounds,
    rows: Vec<Vec<char>>,
}

impl Canvas {
    fn new(bounds: &Bounds) -> Self {
        let cols = 2 * bounds.width() + 1;
        let rows = 2 * bounds.height() + 1;
        Canvas {
            bounds: *bounds,
            rows: vec![vec![' '; cols]; rows],
        }
    }

    /// Canvas (row, col) of a tile.
    fn origin_of(&self, at: Coord) -> (usize, usize) {
        let col = 2 * (at.x - self.bounds.min_x) + 1;
        let row = 2 * (self.bounds.max_y - at.y) + 1;
        (row as usize, col as usize)
    }

    fn put_tile(&mut self, at: Coord, glyph: char) {
        let (row, col) = self.origin_of(at);
        self.rows[row][col] = glyph;
    }

    fn put_connector(&mut self, at: Coord, dir: Direction, glyph: char) {
        let (row, col) = self.origin_of(at);
        let (dx, dy) = dir.delta();
        // Canvas rows grow downward.
        let row = row as i64 - dy as i64;
        let col = col as i64 + dx as i64;
        let Some(slot) = usize::try_from(row)
            .ok()
            .and_then(|r| self.rows.get_mut(r))
            .and_then(|line| usize::try_from(col).ok().and_then(|c| line.get_mut(c)))
        else {
            return;
        };
        if connector_rank(glyph) >= connector_rank(*slot) {
            *slot = glyph;
        }
    }

    fn into_string(self) -> String {
        let inked = |c: &char| *c != ' ';
        let used_rows: Vec<usize> = (0..self.rows.len())
            .filter(|&r| self.rows[r].iter().any(inked))
            .collect();
        let (Some(&top), Some(&bottom)) = (used_rows.first(), used_rows.last()) else {
            return EMPTY_MAP.to_string();
        };
        let left = self
            .rows
            .iter()
            .filter_map(|line| line.iter().position(inked))
            .min()
            .unwrap_or(0);
        let right = self
            .rows
            .iter()
            .filter_map(|line| line.iter().rposition(inked))
            .max()
            .unwrap_or(left);

        let mut out = String::with_capacity((bottom - top + 1) * (right - left + 2));
        for line in &self.rows[top..=bottom] {
            out.extend(&line[left..=right]);
            out.push('\n');
        }
        out
    }
}
