use std::time::Duration;

use weighted_sokoban::solve::heuristic;
use weighted_sokoban::{
    search, Action, ConfigError, Direction, Game, GoError, Outcome, Pos, Report, SearchConfig,
    Strategy,
};

const OPEN_ROOM: &str = "\
1 9
########
#@     #
# $  $ #
#.    .#
########
";

fn load(s: &str) -> Game {
    s.parse().unwrap()
}

fn run(game: &Game, strategy: Strategy) -> Report {
    search(game, strategy, &SearchConfig::default(), || {})
}

fn total_cost(report: &Report) -> u64 {
    report.stats.steps as u64 + report.stats.weight
}

#[test]
fn config_errors() {
    let err = |rows: &[&str], weights: &[u32]| Game::new(rows, weights).unwrap_err();

    assert_eq!(err(&[], &[]), ConfigError::EmptyGrid);
    assert_eq!(err(&["#$.#"], &[1]), ConfigError::MissingPlayer);
    assert_eq!(
        err(&["@$.", "@  "], &[1]),
        ConfigError::MultiplePlayers { row: 1, col: 0 }
    );
    assert_eq!(
        err(&["@$$.."], &[1]),
        ConfigError::StoneWeightMismatch {
            stones: 2,
            weights: 1
        }
    );
    assert_eq!(
        err(&["@$..", "  +#"], &[1]),
        ConfigError::MultiplePlayers { row: 1, col: 2 }
    );
    assert_eq!(
        err(&["@$.."], &[1]),
        ConfigError::SwitchStoneMismatch {
            switches: 2,
            stones: 1
        }
    );
    assert_eq!(
        err(&["@$x"], &[1]),
        ConfigError::InvalidCell {
            ch: 'x',
            row: 0,
            col: 2
        }
    );
}

#[test]
fn parse_text() {
    let game = load("7 3\n#####\n#@$*\n# . #\n#####\n");
    assert_eq!(game.grid.height(), 4);
    // Short rows are padded to the widest one.
    assert_eq!(game.grid.width(), 5);
    assert!(!game.grid.is_wall(Pos(1, 4)));
    assert_eq!(game.grid.switches(), &[Pos(1, 3), Pos(2, 2)]);
    assert_eq!(game.state.player(), Pos(1, 1));

    let stones = game
        .state
        .stones()
        .iter()
        .map(|s| (s.pos, s.weight))
        .collect::<Vec<_>>();
    assert_eq!(stones, [(Pos(1, 2), 7), (Pos(1, 3), 3)]);

    assert!("x\n@$.".parse::<Game>().is_err());
    assert!("1\n".parse::<Game>().is_err());
}

#[test]
fn player_on_switch() {
    let game = load("1\n#####\n#+$ #\n#####");
    assert_eq!(game.state.player(), Pos(1, 1));
    assert_eq!(game.grid.switches(), &[Pos(1, 1)]);
    assert!(!game.is_success());
}

#[test]
fn move_then_opposite_move_returns() {
    let game = load(OPEN_ROOM);
    let grid = &game.grid;
    let mut checked = 0;
    let mut frontier = vec![game.state.clone()];
    // A few layers of reachable states.
    for _ in 0..3 {
        let mut next = Vec::new();
        for state in &frontier {
            for succ in state.successors(grid) {
                if !succ.action.push {
                    if let Ok(back) = succ.state.go(grid, succ.action.dir.reversed()) {
                        assert!(!back.action.push);
                        assert_eq!(back.state, *state);
                        checked += 1;
                    }
                }
                next.push(succ.state);
            }
        }
        frontier = next;
    }
    assert!(checked > 0);
}

#[test]
fn successors_follow_direction_order() {
    let game = load("2\n#####\n# . #\n# $ #\n# @ #\n#   #\n#####");
    let succs = game.state.successors(&game.grid);
    let symbols = succs.iter().map(|s| s.action.symbol()).collect::<String>();
    assert_eq!(symbols, "Udlr");
    // Pushing costs the stone's weight on top of the step.
    assert_eq!(succs[0].cost, 3);
    assert!(succs[1..].iter().all(|s| s.cost == 1));
}

#[test]
fn blocked_and_unmovable() {
    let game = load("1 1\n#####\n#@$$#\n#.. #\n#####");
    let grid = &game.grid;
    assert_eq!(
        game.state.go(grid, Direction::Up).unwrap_err(),
        GoError::Blocked
    );
    // Stone against stone.
    assert_eq!(
        game.state.go(grid, Direction::Right).unwrap_err(),
        GoError::Unmovable
    );

    let mut replayed = game.clone();
    let actions = [Action::from_symbol('r').unwrap()];
    assert_eq!(
        replayed.replay(&actions).unwrap_err(),
        GoError::Unmovable
    );
    let mut replayed = game.clone();
    let actions = [Action::from_symbol('D').unwrap()];
    assert_eq!(
        replayed.replay(&actions).unwrap_err(),
        GoError::Mismatch {
            expected: 'D',
            actual: 'd'
        }
    );
}

#[test]
fn corner_deadlock() {
    let game = load("1\n#####\n#$ .#\n#@  #\n#####");
    assert!(game.grid.is_deadlocked(Pos(1, 1)));
    assert!(game.grid.is_deadlocked(Pos(2, 3)));
    // Along a wall but not in a corner.
    assert!(!game.grid.is_deadlocked(Pos(1, 2)));
    // Corner switch.
    assert!(!game.grid.is_deadlocked(Pos(1, 3)));

    let game = game_with_switch_corner();
    assert!(!game.grid.is_deadlocked(Pos(1, 1)));
}

fn game_with_switch_corner() -> Game {
    load("1\n#####\n#* @#\n#####")
}

#[test]
fn equality_ignores_weights() {
    let rows = ["#####", "#@$.#", "#####"];
    let light = Game::new(&rows[..], &[1]).unwrap();
    let heavy = Game::new(&rows[..], &[9]).unwrap();
    assert_eq!(light.state, heavy.state);
}

#[test]
fn single_push() {
    let game = load("5\n@$.");
    for strategy in Strategy::ALL {
        let report = run(&game, strategy);
        assert_eq!(report.outcome, Outcome::Solved, "{strategy}");
        assert_eq!(report.path().as_deref(), Some("R"), "{strategy}");
        assert_eq!(report.stats.steps, 1);
        assert_eq!(report.stats.weight, 5);
        assert_eq!(report.stats.nodes_generated, 1);
    }
}

#[test]
fn already_solved() {
    let game = game_with_switch_corner();
    for strategy in Strategy::ALL {
        let report = run(&game, strategy);
        assert_eq!(report.outcome, Outcome::Solved);
        assert_eq!(report.path().as_deref(), Some(""));
        assert_eq!(report.stats.nodes_generated, 0);
    }
}

#[test]
fn walled_in_stone_has_no_solution() {
    let game = load("1\n#####\n#$ .#\n#@  #\n#####");
    for strategy in Strategy::ALL {
        let report = run(&game, strategy);
        assert_eq!(report.outcome, Outcome::Exhausted, "{strategy}");
        assert_eq!(report.actions, None);
        assert_eq!(report.path(), None);
        assert!(report.stats.nodes_generated > 0);
        assert_eq!(report.stats.steps, 0);
        assert_eq!(report.stats.weight, 0);
    }
}

#[test]
fn zero_budget_times_out() {
    let game = load(OPEN_ROOM);
    let config = SearchConfig {
        timeout: Duration::ZERO,
    };
    let mut steps = 0;
    let report = search(&game, Strategy::Bfs, &config, || steps += 1);
    assert_eq!(report.outcome, Outcome::TimedOut);
    assert_eq!(report.actions, None);
    assert_eq!(report.stats.steps, 0);
    assert_eq!(steps, 0);
}

#[test]
fn deterministic() {
    let game = load(OPEN_ROOM);
    for strategy in Strategy::ALL {
        let first = run(&game, strategy);
        let second = run(&game, strategy);
        assert_eq!(first.outcome, Outcome::Solved, "{strategy}");
        assert_eq!(first.path(), second.path(), "{strategy}");
        assert_eq!(
            first.stats.nodes_generated, second.stats.nodes_generated,
            "{strategy}"
        );
    }
}

#[test]
fn strategies_dominance() {
    let game = load(OPEN_ROOM);
    let reports = Strategy::ALL.map(|strategy| run(&game, strategy));
    let [bfs, dfs, ucs, astar] = &reports;

    for report in &reports {
        assert_eq!(report.outcome, Outcome::Solved, "{}", report.strategy);
        let mut replayed = game.clone();
        replayed.replay(report.actions.as_ref().unwrap()).unwrap();
        assert!(replayed.is_success(), "{}", report.strategy);
        // Every step costs 1 plus the pushed weight.
        assert_eq!(
            total_cost(report),
            report
                .actions
                .as_ref()
                .unwrap()
                .iter()
                .map(|a| if a.push { 0 } else { 1 })
                .sum::<u64>()
                + pushed_cost(&game, report),
            "{}",
            report.strategy
        );
    }

    for other in [dfs, ucs, astar] {
        assert!(bfs.stats.steps <= other.stats.steps, "{}", other.strategy);
    }
    for other in [bfs, dfs, astar] {
        assert!(total_cost(ucs) <= total_cost(other), "{}", other.strategy);
    }
}

/// Sum of `1 + weight` over the pushes of a solution, tracked by replaying it.
fn pushed_cost(game: &Game, report: &Report) -> u64 {
    let mut state = game.state.clone();
    let mut cost = 0;
    for action in report.actions.as_ref().unwrap() {
        let succ = state.go(&game.grid, action.dir).unwrap();
        if succ.action.push {
            cost += succ.cost;
        }
        state = succ.state;
    }
    cost
}

#[test]
fn heuristic_weights_distances() {
    let game = load("3 1\n#######\n#.$@$.#\n#######");
    assert_eq!(heuristic(&game.grid, &game.state), 4);

    let game = game_with_switch_corner();
    assert_eq!(heuristic(&game.grid, &game.state), 0);
}

#[test]
fn report_format() {
    let game = load("5\n@$.");
    let report = run(&game, Strategy::AStar);
    let text = report.to_string();
    let lines = text.lines().collect::<Vec<_>>();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "A*");
    assert!(lines[1].starts_with("Steps: 1, Weight: 5, Nodes: 1, Time (ms): "));
    assert!(lines[1].contains(", Memory (MB): "));
    assert_eq!(lines[2], "R");

    let game = load("1\n#####\n#$ .#\n#@  #\n#####");
    let report = run(&game, Strategy::Dfs);
    assert!(report.to_string().ends_with("\nNo solution"));
}

#[test]
fn strategy_names() {
    for strategy in Strategy::ALL {
        let name = strategy.to_string();
        assert_eq!(name.parse::<Strategy>().unwrap(), strategy);
    }
    assert_eq!("astar".parse::<Strategy>().unwrap(), Strategy::AStar);
    assert!("greedy".parse::<Strategy>().is_err());
}
