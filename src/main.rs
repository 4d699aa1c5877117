use clap::{Parser, Subcommand};
use crossterm::{
    cursor, queue,
    style::Print,
    terminal::{self, ClearType},
};
use log::error;
use rand::{rngs::StdRng, SeedableRng};
use std::io::{self, IsTerminal, Stderr, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use slider_pdb::{
    progress::ProgressSink, worker, Board, CancelToken, HeuristicKind, SolveStatus, Solver,
    SolverConfig,
};

#[derive(Parser)]
#[command(name = "slider-pdb", version, about = "Optimal 15-puzzle solver")]
struct Cli {
    /// TOML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory for cached pattern databases.
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,

    /// Keep pattern databases in memory only.
    #[arg(long, global = true)]
    no_cache: bool,

    /// Guide the search with Manhattan distance plus linear conflicts instead of pattern databases.
    #[arg(long, global = true)]
    manhattan: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Solve a board given as 16 numbers in row-major order, 0 for the blank.
    Solve { tiles: Vec<String> },
    /// Scramble the solved board with a random walk, then solve it.
    Scramble {
        #[arg(long, default_value_t = 60)]
        moves: usize,
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Load or build every pattern database.
    Build,
    /// Delete cached pattern databases.
    ClearCache,
    /// Speak the JSON-lines host protocol on stdin/stdout.
    Worker,
}

/// Rewrites a single status line on stderr.
struct StatusLine {
    err: Stderr,
    live: bool,
}

impl StatusLine {
    fn new() -> Self {
        let err = io::stderr();
        let live = err.is_terminal();
        Self { err, live }
    }

    fn finish(&mut self) {
        if self.live {
            let _ = queue!(
                self.err,
                cursor::MoveToColumn(0),
                terminal::Clear(ClearType::CurrentLine)
            );
            let _ = self.err.flush();
        }
    }
}

impl ProgressSink for StatusLine {
    fn emit(&mut self, text: &str) {
        if self.live {
            let _ = queue!(
                self.err,
                cursor::MoveToColumn(0),
                terminal::Clear(ClearType::CurrentLine),
                Print(text)
            );
            let _ = self.err.flush();
        } else {
            let _ = writeln!(self.err, "{text}");
        }
    }
}

fn load_config(cli: &Cli) -> slider_pdb::Result<SolverConfig> {
    let mut config = match &cli.config {
        Some(path) => SolverConfig::load(path)?,
        None => SolverConfig::default(),
    };
    if let Some(dir) = &cli.cache_dir {
        config.cache_dir = Some(dir.clone());
    }
    if cli.no_cache {
        config.persist = false;
    }
    if cli.manhattan {
        config.heuristic = HeuristicKind::Manhattan;
    }
    Ok(config)
}

fn solve_and_print(solver: &Solver, puzzle: &Board) -> ExitCode {
    let mut status = StatusLine::new();
    let report = solver.solve(puzzle.tiles(), &CancelToken::new(), &mut status);
    status.finish();

    match (report.status, report.moves) {
        (SolveStatus::Ok, Some(moves)) => {
            println!("Found optimal solution with: {} moves", moves.len());
            let mut board = puzzle.clone();
            for tile in moves {
                match board.slide_tile(tile) {
                    Ok(direction) => println!("{tile} {direction}\n{board}"),
                    Err(e) => {
                        error!("replaying solution failed: {e}");
                        return ExitCode::FAILURE;
                    }
                }
            }
            ExitCode::SUCCESS
        }
        (status, _) => {
            match report.error {
                Some(e) => eprintln!("{status}: {e}"),
                None => eprintln!("{status}"),
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> slider_pdb::Result<ExitCode> {
    let config = load_config(&cli)?;
    let solver = Solver::new(&config);

    let code = match cli.command {
        Command::Solve { tiles } => {
            let puzzle: Board = tiles.join(" ").parse()?;
            println!("Puzzle:\n{}", puzzle);
            solve_and_print(&solver, &puzzle)
        }
        Command::Scramble { moves, seed } => {
            let mut rng = match seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };
            let mut puzzle = Board::goal();
            println!("Initial Puzzle:\n{}", puzzle);
            puzzle.scramble(&mut rng, moves);
            println!("Shuffled Puzzle:\n{}", puzzle);
            solve_and_print(&solver, &puzzle)
        }
        Command::Build => {
            let mut status = StatusLine::new();
            let tables = solver.ensure_tables(&CancelToken::new(), &mut status);
            status.finish();
            for table in tables?.tables() {
                println!(
                    "{} {}: {} entries, max distance {}",
                    table.pattern().key(),
                    table.pattern(),
                    table.len(),
                    table.max_distance()
                );
            }
            ExitCode::SUCCESS
        }
        Command::ClearCache => {
            solver.clear_cache()?;
            if let Some(dir) = config.resolved_cache_dir().filter(|_| config.persist) {
                println!("Cleared {}", dir.display());
            }
            ExitCode::SUCCESS
        }
        Command::Worker => {
            worker::serve(Arc::new(solver), io::stdin().lock(), io::stdout())?;
            ExitCode::SUCCESS
        }
    };
    Ok(code)
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run(Cli::parse()) {
        Ok(code) => code,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
