//! Optimal 15-puzzle solving with additive pattern databases and IDA*.

pub mod cancel;
pub mod config;
pub mod error;
pub mod heuristic;
pub mod pattern;
pub mod pdb;
pub mod progress;
pub mod puzzle;
pub mod rank;
pub mod search;
pub mod solver;
pub mod store;
pub mod worker;

pub use cancel::CancelToken;
pub use config::SolverConfig;
pub use error::{Error, Result};
pub use heuristic::{Heuristic, HeuristicKind, ManhattanLinear, PatternTables};
pub use pattern::{Layout, Pattern, PatternSet};
pub use pdb::PatternDatabase;
pub use puzzle::{Board, Move};
pub use solver::{SolveReport, SolveStatus, Solver};
pub use store::{FileStore, MemoryStore, NullStore, PdbStore};
