use std::cmp::Reverse;
use std::collections::{BinaryHeap, VecDeque};
use std::str::FromStr;
use std::time::Duration;

use indexmap::map::MutableKeys;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::stats::Collector;
use crate::{Action, Game, Grid, SearchStats, State};

type IndexMap<K, V> = indexmap::IndexMap<K, V, fxhash::FxBuildHasher>;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    Bfs,
    Dfs,
    Ucs,
    AStar,
}

impl Strategy {
    pub const ALL: [Self; 4] = [Self::Bfs, Self::Dfs, Self::Ucs, Self::AStar];
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown strategy {0:?}, expecting one of bfs, dfs, ucs, astar")]
pub struct UnknownStrategy(String);

impl FromStr for Strategy {
    type Err = UnknownStrategy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "bfs" => Self::Bfs,
            "dfs" => Self::Dfs,
            "ucs" => Self::Ucs,
            "astar" | "a*" => Self::AStar,
            _ => return Err(UnknownStrategy(s.to_owned())),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchConfig {
    /// Wall-clock budget, polled once per frontier pop.
    pub timeout: Duration,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    Solved,
    /// The frontier ran dry.
    Exhausted,
    TimedOut,
}

#[derive(Debug, Clone)]
pub struct Report {
    pub strategy: Strategy,
    pub outcome: Outcome,
    /// `None` unless the outcome is [`Outcome::Solved`].
    pub actions: Option<Vec<Action>>,
    pub stats: SearchStats,
}

impl Report {
    pub fn path(&self) -> Option<String> {
        let actions = self.actions.as_ref()?;
        Some(actions.iter().map(|a| a.symbol()).collect())
    }
}

/// `heuristic(state) = Σ weight(s) × distance from s to its nearest switch`.
///
/// Switch assignment conflicts and blocking stones are ignored, so this may
/// overestimate and A* is then only best-first.
pub fn heuristic(grid: &Grid, state: &State) -> u64 {
    state
        .stones()
        .iter()
        .map(|stone| {
            let dist = grid
                .switches()
                .iter()
                .map(|&switch| stone.pos.manhattan(switch))
                .min()
                .unwrap_or(0);
            stone.weight as u64 * dist as u64
        })
        .sum()
}

/// Runs one search. `on_step` is called once per frontier pop.
pub fn search(
    game: &Game,
    strategy: Strategy,
    config: &SearchConfig,
    on_step: impl FnMut(),
) -> Report {
    match strategy {
        Strategy::Bfs => run(game, strategy, config, Fifo::default(), |_, _| 0, on_step),
        Strategy::Dfs => run(game, strategy, config, Lifo::default(), |_, _| 0, on_step),
        Strategy::Ucs => run(
            game,
            strategy,
            config,
            MinHeap::default(),
            |_, cost| cost,
            on_step,
        ),
        Strategy::AStar => run(
            game,
            strategy,
            config,
            MinHeap::default(),
            |state, cost| cost + heuristic(&game.grid, state),
            on_step,
        ),
    }
}

trait Frontier {
    /// Whether a state counts as visited when popped rather than when generated.
    const CLOSE_ON_POP: bool;

    fn insert(&mut self, node: usize, priority: u64);
    fn extract(&mut self) -> Option<usize>;
}

#[derive(Default)]
struct Fifo(VecDeque<usize>);

impl Frontier for Fifo {
    const CLOSE_ON_POP: bool = false;

    fn insert(&mut self, node: usize, _: u64) {
        self.0.push_back(node);
    }

    fn extract(&mut self) -> Option<usize> {
        self.0.pop_front()
    }
}

#[derive(Default)]
struct Lifo(Vec<usize>);

impl Frontier for Lifo {
    const CLOSE_ON_POP: bool = false;

    fn insert(&mut self, node: usize, _: u64) {
        self.0.push(node);
    }

    fn extract(&mut self) -> Option<usize> {
        self.0.pop()
    }
}

/// Lowest priority first, then earliest insertion.
#[derive(Default)]
struct MinHeap {
    heap: BinaryHeap<Reverse<(u64, u64, usize)>>,
    seq: u64,
}

impl Frontier for MinHeap {
    const CLOSE_ON_POP: bool = true;

    fn insert(&mut self, node: usize, priority: u64) {
        self.heap.push(Reverse((priority, self.seq, node)));
        self.seq += 1;
    }

    fn extract(&mut self) -> Option<usize> {
        self.heap.pop().map(|Reverse((_, _, node))| node)
    }
}

#[derive(Debug)]
struct Node {
    /// Parent index in the arena and the action leading here. `None` for the root.
    link: Option<(usize, Action)>,
    cost: u64,
    closed: bool,
}

fn run<F: Frontier>(
    game: &Game,
    strategy: Strategy,
    config: &SearchConfig,
    mut frontier: F,
    evaluate: impl Fn(&State, u64) -> u64,
    mut on_step: impl FnMut(),
) -> Report {
    let grid = &game.grid;
    let mut stats = Collector::start();
    debug!(%strategy, timeout = ?config.timeout, "search started");

    // Every state ever admitted, addressed by insertion index. Doubles as the
    // visited set.
    let mut arena = IndexMap::<State, Node>::default();
    let (root, _) = arena.insert_full(
        game.state.clone(),
        Node {
            link: None,
            cost: 0,
            closed: false,
        },
    );
    frontier.insert(root, evaluate(&game.state, 0));

    let goal = loop {
        #[cfg(feature = "coz")]
        coz::scope!("Expand");

        if stats.elapsed() >= config.timeout {
            break Err(Outcome::TimedOut);
        }
        let Some(cursor) = frontier.extract() else {
            break Err(Outcome::Exhausted);
        };

        if F::CLOSE_ON_POP {
            let node = &mut arena[cursor];
            // Already expanded through a cheaper entry.
            if node.closed {
                continue;
            }
            node.closed = true;
        }

        on_step();

        #[cfg(feature = "coz")]
        coz::progress!("Pop");

        let (state, node) = arena.get_index(cursor).expect("frontier holds arena indices");
        if state.is_solved(grid) {
            break Ok(cursor);
        }
        let base_cost = node.cost;

        for succ in state.successors(grid) {
            stats.record_generated();
            if succ.state.has_deadlock(grid) {
                continue;
            }

            let cost = base_cost + succ.cost;
            let link = Some((cursor, succ.action));
            let (child, priority) = match arena.get_full_mut2(&succ.state) {
                Some((child, key, node)) => {
                    // Closed states are never reopened. Open ones only take a
                    // strictly cheaper path, which matters to cost-ordered
                    // frontiers alone.
                    if !F::CLOSE_ON_POP || node.closed || node.cost <= cost {
                        continue;
                    }
                    // Equal keys may still carry the weights in another order.
                    *key = succ.state;
                    node.link = link;
                    node.cost = cost;
                    (child, evaluate(&*key, cost))
                }
                None => {
                    let priority = evaluate(&succ.state, cost);
                    let (child, _) = arena.insert_full(
                        succ.state,
                        Node {
                            link,
                            cost,
                            closed: false,
                        },
                    );
                    (child, priority)
                }
            };
            frontier.insert(child, priority);
        }
    };

    let (outcome, actions, weight) = match goal {
        Ok(goal) => {
            let mut actions = std::iter::successors(arena[goal].link, |&(parent, _)| {
                arena[parent].link
            })
            .map(|(_, action)| action)
            .collect::<Vec<_>>();
            actions.reverse();
            // Every step costs 1 plus the weight of the stone it pushes, if any.
            let weight = arena[goal].cost - actions.len() as u64;
            (Outcome::Solved, Some(actions), weight)
        }
        Err(outcome) => (outcome, None, 0),
    };

    let steps = actions.as_ref().map_or(0, Vec::len);
    let stats = stats.finish(steps, weight);
    match outcome {
        Outcome::TimedOut => warn!(
            %strategy,
            nodes = stats.nodes_generated,
            states = arena.len(),
            "search timed out after {:?}",
            stats.elapsed
        ),
        _ => info!(
            %strategy,
            ?outcome,
            steps,
            weight,
            nodes = stats.nodes_generated,
            states = arena.len(),
            elapsed_ms = stats.elapsed_millis(),
            "search finished"
        ),
    }

    Report {
        strategy,
        outcome,
        actions,
        stats,
    }
}
