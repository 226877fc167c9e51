use std::fmt::{self, Display};

use crate::{Action, Cell, Game, Report, SearchStats, Strategy};

impl fmt::Display for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self.grid.width();
        for (pos, cell) in self.grid.cells() {
            let on_switch = cell == Cell::Switch;
            let ch = if pos == self.state.player {
                if on_switch {
                    '+'
                } else {
                    '@'
                }
            } else if self.state.stone_at(pos).is_some() {
                if on_switch {
                    '*'
                } else {
                    '$'
                }
            } else {
                cell.symbol()
            };
            ch.fmt(f)?;
            if pos.1 + 1 == width {
                "\n".fmt(f)?;
            }
        }
        Ok(())
    }
}

impl Cell {
    fn symbol(self) -> char {
        match self {
            Cell::Floor => ' ',
            Cell::Wall => '#',
            Cell::Switch => '.',
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.symbol().fmt(f)
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Bfs => "BFS".fmt(f),
            Strategy::Dfs => "DFS".fmt(f),
            Strategy::Ucs => "UCS".fmt(f),
            Strategy::AStar => "A*".fmt(f),
        }
    }
}

impl fmt::Display for SearchStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Steps: {}, Weight: {}, Nodes: {}, Time (ms): {:.2}, Memory (MB): {:.2}",
            self.steps,
            self.weight,
            self.nodes_generated,
            self.elapsed_millis(),
            self.memory_delta_mb,
        )
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.strategy)?;
        writeln!(f, "{}", self.stats)?;
        match &self.actions {
            Some(actions) => actions.iter().try_for_each(|action| action.fmt(f)),
            None => "No solution".fmt(f),
        }
    }
}
