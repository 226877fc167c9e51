use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use rayon::prelude::*;
use tracing_subscriber::EnvFilter;
use weighted_sokoban::{search, Game, Outcome, Report, SearchConfig, Strategy};

/// Solves weighted Sokoban puzzles with BFS, DFS, UCS and A*.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Puzzle files: a line of stone weights followed by the grid.
    #[arg(required = true)]
    puzzles: Vec<PathBuf>,
    /// Strategy to run (bfs, dfs, ucs, astar). Repeatable, all by default.
    #[arg(short, long = "strategy")]
    strategies: Vec<Strategy>,
    /// Time budget of each search, in seconds.
    #[arg(short, long, default_value_t = 60)]
    timeout: u64,
    /// Directory to append the reports of each puzzle to.
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Number of searches running at once.
    #[arg(short, long, default_value_t = 1)]
    jobs: usize,
    /// Hide progress spinners.
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    rayon::ThreadPoolBuilder::new()
        .num_threads(cli.jobs)
        .build_global()
        .context("Failed to start the worker pool")?;

    let games = cli
        .puzzles
        .iter()
        .map(|path| load(path))
        .collect::<Result<Vec<_>>>()?;
    let strategies = if cli.strategies.is_empty() {
        Strategy::ALL.to_vec()
    } else {
        cli.strategies.clone()
    };
    let config = SearchConfig {
        timeout: Duration::from_secs(cli.timeout),
    };

    let progress = MultiProgress::with_draw_target(if cli.quiet {
        ProgressDrawTarget::hidden()
    } else {
        ProgressDrawTarget::stderr()
    });
    let spinner = ProgressStyle::with_template("{spinner} {msg} [{elapsed}] {pos} states")
        .context("Invalid progress template")?;

    // One unit per (puzzle, strategy) pair; nothing mutable is shared.
    let jobs = (0..games.len())
        .flat_map(|i| strategies.iter().map(move |&strategy| (i, strategy)))
        .map(|(i, strategy)| {
            let bar = progress.add(ProgressBar::new_spinner().with_style(spinner.clone()));
            bar.set_message(format!("{strategy} {}", cli.puzzles[i].display()));
            (i, strategy, bar)
        })
        .collect::<Vec<_>>();
    let reports = jobs
        .into_par_iter()
        .map(|(i, strategy, bar)| {
            let report = search(&games[i], strategy, &config, || bar.inc(1));
            bar.finish_and_clear();
            (i, report)
        })
        .collect::<Vec<_>>();

    for (i, report) in &reports {
        print_report(&cli.puzzles[*i], report);
    }

    if let Some(dir) = &cli.output {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
        for (i, report) in &reports {
            let path = dir.join(output_name(&cli.puzzles[*i]));
            let mut file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("Failed to open {}", path.display()))?;
            writeln!(file, "{report}")
                .with_context(|| format!("Failed to write {}", path.display()))?;
        }
    }

    Ok(())
}

fn load(path: &Path) -> Result<Game> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    data.parse::<Game>()
        .with_context(|| format!("Failed to parse {}", path.display()))
}

fn print_report(puzzle: &Path, report: &Report) {
    let status = match report.outcome {
        Outcome::Solved => style("solved").green(),
        Outcome::Exhausted => style("no solution").red(),
        Outcome::TimedOut => style("timed out").yellow(),
    };
    println!("{} {status}", style(puzzle.display()).bold());
    println!("{report}\n");
}

/// `input-3.txt` reports to `output-3.txt`, anything else to `<stem>-output.txt`.
fn output_name(puzzle: &Path) -> String {
    let stem = puzzle
        .file_stem()
        .map_or_else(|| "puzzle".into(), |stem| stem.to_string_lossy());
    match stem.strip_prefix("input") {
        Some(rest) => format!("output{rest}.txt"),
        None => format!("{stem}-output.txt"),
    }
}
