use std::hash::{Hash, Hasher};
use std::ops::Index;

use arrayvec::ArrayVec;
use thiserror::Error;

mod fmt;
mod parse;
pub mod solve;
pub mod stats;

pub use solve::{search, Outcome, Report, SearchConfig, Strategy};
pub use stats::SearchStats;

/// Fatal puzzle errors, raised while building a [`Game`] and never during search.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Empty grid")]
    EmptyGrid,
    #[error("Grid of {height}x{width} exceeds the supported size")]
    TooLarge { height: usize, width: usize },
    #[error("Invalid cell {ch:?} at row {row}, column {col}")]
    InvalidCell { ch: char, row: usize, col: usize },
    #[error("Missing player")]
    MissingPlayer,
    #[error("Multiple players, second one at row {row}, column {col}")]
    MultiplePlayers { row: usize, col: usize },
    #[error("Mismatch between number of stones ({stones}) and weights ({weights})")]
    StoneWeightMismatch { stones: usize, weights: usize },
    #[error("Mismatch between number of switches ({switches}) and stones ({stones})")]
    SwitchStoneMismatch { switches: usize, stones: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Error)]
pub enum GoError {
    #[error("Blocked by a wall or the grid edge")]
    Blocked,
    #[error("Stone cannot be pushed")]
    Unmovable,
    #[error("Expected action {expected:?}, got {actual:?}")]
    Mismatch { expected: char, actual: char },
}

/// A `(row, column)` cell coordinate. Ordering is row-major.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pos(pub u16, pub u16);

impl Pos {
    pub fn manhattan(self, other: Pos) -> u32 {
        self.0.abs_diff(other.0) as u32 + self.1.abs_diff(other.1) as u32
    }
}

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cell {
    #[default]
    Floor,
    Wall,
    Switch,
}

/// The static board. Never mutated once a [`Game`] is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    height: u16,
    width: u16,
    cells: Box<[Cell]>,
    switches: Box<[Pos]>,
}

impl Index<Pos> for Grid {
    type Output = Cell;
    fn index(&self, pos: Pos) -> &Self::Output {
        let idx = pos.0 as usize * self.width as usize + pos.1 as usize;
        &self.cells[idx]
    }
}

impl Grid {
    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn switches(&self) -> &[Pos] {
        &self.switches
    }

    pub fn is_in_bounds(&self, pos: Pos) -> bool {
        pos.0 < self.height && pos.1 < self.width
    }

    pub fn is_wall(&self, pos: Pos) -> bool {
        self.is_in_bounds(pos) && self[pos] == Cell::Wall
    }

    pub fn is_switch(&self, pos: Pos) -> bool {
        self.is_in_bounds(pos) && self[pos] == Cell::Switch
    }

    pub fn sibling_pos(&self, pos: Pos, dir: Direction) -> Option<Pos> {
        const DIRECTIONS: [(i16, i16); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];
        let x = pos.0.checked_add_signed(DIRECTIONS[dir as usize].0)?;
        let y = pos.1.checked_add_signed(DIRECTIONS[dir as usize].1)?;
        let pos = Pos(x, y);
        self.is_in_bounds(pos).then_some(pos)
    }

    /// A stone off the switches is stuck for good once it is boxed in
    /// vertically and horizontally. Cells past the edge count as walls.
    ///
    /// Only the static grid is consulted, so stones jammed against each other
    /// are not detected.
    pub fn is_deadlocked(&self, pos: Pos) -> bool {
        if self.is_switch(pos) {
            return false;
        }
        let blocked = |dir| self.sibling_pos(pos, dir).map_or(true, |p| self.is_wall(p));
        (blocked(Direction::Up) || blocked(Direction::Down))
            && (blocked(Direction::Left) || blocked(Direction::Right))
    }

    fn cells(&self) -> impl Iterator<Item = (Pos, Cell)> + '_ {
        let idx_iter = std::iter::successors(Some(Pos(0, 0)), |&Pos(x, y)| {
            Some(if y + 1 < self.width {
                Pos(x, y + 1)
            } else {
                Pos(x + 1, 0)
            })
        });
        idx_iter.zip(self.cells.iter().copied())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up = 0,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Expansion order. Changing it changes which of several equal paths the
    /// strategies report.
    pub const ALL: [Self; 4] = [Self::Up, Self::Down, Self::Left, Self::Right];

    pub fn reversed(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }
}

/// One step of a solution: a plain move, or a push of the adjacent stone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Action {
    pub dir: Direction,
    pub push: bool,
}

impl Action {
    pub fn symbol(self) -> char {
        let ch = match self.dir {
            Direction::Up => 'u',
            Direction::Down => 'd',
            Direction::Left => 'l',
            Direction::Right => 'r',
        };
        if self.push {
            ch.to_ascii_uppercase()
        } else {
            ch
        }
    }

    pub fn from_symbol(ch: char) -> Option<Self> {
        let dir = match ch.to_ascii_lowercase() {
            'u' => Direction::Up,
            'd' => Direction::Down,
            'l' => Direction::Left,
            'r' => Direction::Right,
            _ => return None,
        };
        Some(Self {
            dir,
            push: ch.is_ascii_uppercase(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stone {
    pub pos: Pos,
    pub weight: u32,
}

/// Player and stones. Stones are kept sorted by position, so comparing the
/// position sequences compares the position sets. Weights ride along with
/// their stone but take no part in equality or hashing.
#[derive(Debug, Clone)]
pub struct State {
    player: Pos,
    stones: Box<[Stone]>,
}

impl PartialEq for State {
    fn eq(&self, other: &Self) -> bool {
        self.player == other.player
            && self
                .stones
                .iter()
                .map(|s| s.pos)
                .eq(other.stones.iter().map(|s| s.pos))
    }
}
impl Eq for State {}

impl Hash for State {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.player.hash(state);
        for stone in self.stones.iter() {
            stone.pos.hash(state);
        }
    }
}

/// A state reachable in one step, with the cost of that step.
#[derive(Debug, Clone)]
pub struct Successor {
    pub state: State,
    pub action: Action,
    pub cost: u64,
}

impl State {
    pub fn player(&self) -> Pos {
        self.player
    }

    pub fn stones(&self) -> &[Stone] {
        &self.stones
    }

    fn stone_at(&self, pos: Pos) -> Option<usize> {
        self.stones.binary_search_by_key(&pos, |s| s.pos).ok()
    }

    pub fn is_solved(&self, grid: &Grid) -> bool {
        self.stones.iter().all(|s| grid.is_switch(s.pos))
    }

    pub fn has_deadlock(&self, grid: &Grid) -> bool {
        self.stones.iter().any(|s| grid.is_deadlocked(s.pos))
    }

    pub fn go(&self, grid: &Grid, dir: Direction) -> Result<Successor, GoError> {
        let target = grid
            .sibling_pos(self.player, dir)
            .filter(|&pos| !grid.is_wall(pos))
            .ok_or(GoError::Blocked)?;

        let Some(idx) = self.stone_at(target) else {
            return Ok(Successor {
                state: State {
                    player: target,
                    stones: self.stones.clone(),
                },
                action: Action { dir, push: false },
                cost: 1,
            });
        };

        let beyond = grid
            .sibling_pos(target, dir)
            .filter(|&pos| !grid.is_wall(pos) && self.stone_at(pos).is_none())
            .ok_or(GoError::Unmovable)?;

        let mut stones = self.stones.clone();
        stones[idx].pos = beyond;
        stones.sort_unstable_by_key(|s| s.pos);
        Ok(Successor {
            state: State {
                player: target,
                stones,
            },
            action: Action { dir, push: true },
            cost: 1 + self.stones[idx].weight as u64,
        })
    }

    /// Legal moves and pushes in [`Direction::ALL`] order.
    pub fn successors(&self, grid: &Grid) -> ArrayVec<Successor, 4> {
        Direction::ALL
            .into_iter()
            .filter_map(|dir| self.go(grid, dir).ok())
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct Game {
    pub grid: Grid,
    pub state: State,
}

impl Game {
    pub fn is_success(&self) -> bool {
        self.state.is_solved(&self.grid)
    }

    /// Applies `actions` in order, checking that each symbol's move/push kind
    /// matches what actually happens.
    pub fn replay(&mut self, actions: &[Action]) -> Result<(), GoError> {
        for &action in actions {
            let next = self.state.go(&self.grid, action.dir)?;
            if next.action != action {
                return Err(GoError::Mismatch {
                    expected: action.symbol(),
                    actual: next.action.symbol(),
                });
            }
            self.state = next.state;
        }
        Ok(())
    }
}
