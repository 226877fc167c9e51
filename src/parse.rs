use std::str::FromStr;

use anyhow::{ensure, Context, Result};

use crate::{Cell, ConfigError, Game, Grid, Pos, State, Stone};

impl Game {
    /// Builds a game from grid rows and the weights of the stones.
    ///
    /// `weights[i]` belongs to the i-th stone met in row-major order. Short
    /// rows are padded with floor up to the widest row.
    pub fn new<S: AsRef<str>>(rows: &[S], weights: &[u32]) -> Result<Self, ConfigError> {
        let height = rows.len();
        let width = rows
            .iter()
            .map(|row| row.as_ref().chars().count())
            .max()
            .unwrap_or(0);
        if height == 0 || width == 0 {
            return Err(ConfigError::EmptyGrid);
        }
        if height > u16::MAX as usize || width > u16::MAX as usize {
            return Err(ConfigError::TooLarge { height, width });
        }

        let mut cells = vec![Cell::Floor; height * width];
        let mut switches = Vec::new();
        let mut stones = Vec::new();
        let mut player = None;

        for (i, row) in rows.iter().enumerate() {
            for (j, ch) in row.as_ref().chars().enumerate() {
                let pos = Pos(i as _, j as _);
                let (cell, has_stone, has_player) = match ch {
                    ' ' => (Cell::Floor, false, false),
                    '#' => (Cell::Wall, false, false),
                    '.' => (Cell::Switch, false, false),
                    '$' => (Cell::Floor, true, false),
                    '*' => (Cell::Switch, true, false),
                    '@' => (Cell::Floor, false, true),
                    '+' => (Cell::Switch, false, true),
                    _ => return Err(ConfigError::InvalidCell { ch, row: i, col: j }),
                };
                cells[i * width + j] = cell;
                if cell == Cell::Switch {
                    switches.push(pos);
                }
                if has_stone {
                    stones.push(pos);
                }
                if has_player {
                    if player.is_some() {
                        return Err(ConfigError::MultiplePlayers { row: i, col: j });
                    }
                    player = Some(pos);
                }
            }
        }

        let player = player.ok_or(ConfigError::MissingPlayer)?;
        if stones.len() != weights.len() {
            return Err(ConfigError::StoneWeightMismatch {
                stones: stones.len(),
                weights: weights.len(),
            });
        }
        if switches.len() != stones.len() {
            return Err(ConfigError::SwitchStoneMismatch {
                switches: switches.len(),
                stones: stones.len(),
            });
        }

        // Row-major scan order is already position order.
        let stones = stones
            .into_iter()
            .zip(weights)
            .map(|(pos, &weight)| Stone { pos, weight })
            .collect();

        Ok(Game {
            grid: Grid {
                height: height as _,
                width: width as _,
                cells: cells.into(),
                switches: switches.into(),
            },
            state: State { player, stones },
        })
    }
}

/// A line of stone weights followed by the grid rows.
impl FromStr for Game {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut lines = s.lines().map(|line| line.trim_end());

        // The weight line may be blank for a puzzle without stones.
        let weights = lines
            .next()
            .context("Missing stone weights")?
            .split_whitespace()
            .enumerate()
            .map(|(i, w)| {
                w.parse::<u32>()
                    .with_context(|| format!("Invalid weight #{}: {w:?}", i + 1))
            })
            .collect::<Result<Vec<_>>>()?;

        let rows = lines.filter(|line| !line.is_empty()).collect::<Vec<_>>();
        ensure!(!rows.is_empty(), "Missing grid");

        Ok(Game::new(rows.as_slice(), &weights)?)
    }
}
