use log::{debug, info, warn};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::cancel::{CancelToken, Checkpoint};
use crate::config::SolverConfig;
use crate::error::{Error, Result};
use crate::heuristic::{HeuristicKind, ManhattanLinear, PatternTables};
use crate::pattern::{Pattern, PatternSet};
use crate::pdb::PatternDatabase;
use crate::progress::{ProgressSink, Throttle, DEFAULT_INTERVAL};
use crate::puzzle::Board;
use crate::search::ida_star;
use crate::store::PdbStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SolveStatus {
    Ok,
    Fail,
    Cancelled,
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SolveStatus::Ok => "ok",
            SolveStatus::Fail => "fail",
            SolveStatus::Cancelled => "cancelled",
        };
        write!(f, "{}", s)
    }
}

/// Outcome of one solve request. `moves` is only present with `SolveStatus::Ok`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolveReport {
    pub status: SolveStatus,
    pub moves: Option<Vec<u8>>,
    pub error: Option<String>,
}

impl SolveReport {
    pub fn solved(moves: Vec<u8>) -> Self {
        Self {
            status: SolveStatus::Ok,
            moves: Some(moves),
            error: None,
        }
    }

    pub fn failed(error: Option<String>) -> Self {
        Self {
            status: SolveStatus::Fail,
            moves: None,
            error,
        }
    }

    pub fn cancelled() -> Self {
        Self {
            status: SolveStatus::Cancelled,
            moves: None,
            error: None,
        }
    }

    pub fn from_result(result: Result<Option<Vec<u8>>>) -> Self {
        match result {
            Ok(Some(moves)) => Self::solved(moves),
            Ok(None) => Self::failed(None),
            Err(Error::Cancelled) => Self::cancelled(),
            Err(e) => Self::failed(Some(e.to_string())),
        }
    }
}

/// Loads or builds the pattern tables once, then answers solve requests with them.
pub struct Solver {
    patterns: PatternSet,
    store: Arc<dyn PdbStore>,
    progress_interval: Duration,
    checkpoint_interval: u64,
    heuristic: HeuristicKind,
    tables: OnceCell<Arc<PatternTables>>,
}

impl Solver {
    pub fn new(config: &SolverConfig) -> Self {
        Self::with_store(PatternSet::layout(config.layout), config.open_store())
            .progress_interval(config.progress_interval())
            .checkpoint_interval(config.checkpoint_interval)
            .heuristic(config.heuristic)
    }

    pub fn with_store(patterns: PatternSet, store: Arc<dyn PdbStore>) -> Self {
        Self {
            patterns,
            store,
            progress_interval: DEFAULT_INTERVAL,
            checkpoint_interval: 4096,
            heuristic: HeuristicKind::default(),
            tables: OnceCell::new(),
        }
    }

    pub fn progress_interval(mut self, interval: Duration) -> Self {
        self.progress_interval = interval;
        self
    }

    pub fn checkpoint_interval(mut self, interval: u64) -> Self {
        self.checkpoint_interval = interval;
        self
    }

    pub fn heuristic(mut self, kind: HeuristicKind) -> Self {
        self.heuristic = kind;
        self
    }

    pub fn patterns(&self) -> &PatternSet {
        &self.patterns
    }

    /// Tables loaded so far, if a previous call completed them.
    pub fn tables(&self) -> Option<&Arc<PatternTables>> {
        self.tables.get()
    }

    pub fn ensure_tables(
        &self,
        cancel: &CancelToken,
        sink: &mut dyn ProgressSink,
    ) -> Result<Arc<PatternTables>> {
        let mut checkpoint = Checkpoint::new(cancel.clone(), self.checkpoint_interval);
        let mut progress = Throttle::new(sink, self.progress_interval);
        self.tables_with(&mut checkpoint, &mut progress)
    }

    fn tables_with(
        &self,
        checkpoint: &mut Checkpoint,
        progress: &mut Throttle<'_>,
    ) -> Result<Arc<PatternTables>> {
        let tables = self.tables.get_or_try_init(|| {
            let count = self.patterns.len();
            let mut tables = Vec::with_capacity(count);
            for (i, pattern) in self.patterns.patterns().iter().enumerate() {
                progress.update(|| format!("Loading/building PDB {}/{count}...", i + 1));
                tables.push(self.load_or_build(pattern, checkpoint, progress)?);
            }
            progress.force("All PDBs ready.");
            Ok::<_, Error>(Arc::new(PatternTables::new(tables)))
        })?;
        Ok(Arc::clone(tables))
    }

    fn load_or_build(
        &self,
        pattern: &Pattern,
        checkpoint: &mut Checkpoint,
        progress: &mut Throttle<'_>,
    ) -> Result<PatternDatabase> {
        let key = pattern.key();
        match self.store.get(&key) {
            Ok(Some(bytes)) => match PatternDatabase::from_bytes(pattern, &bytes) {
                Some(db) if db.unreached() == 0 => {
                    info!("loaded PDB {pattern} from store key {key}");
                    progress.update(|| format!("PDB {pattern}: loaded from cache."));
                    return Ok(db);
                }
                Some(_) => warn!("cached PDB {pattern} has holes; rebuilding"),
                None => warn!("cached PDB {pattern} has the wrong size; rebuilding"),
            },
            Ok(None) => debug!("no cached PDB under {key}"),
            Err(e) => warn!("reading cached PDB {key} failed: {e}; rebuilding"),
        }
        checkpoint.yield_now()?;

        progress.update(|| format!("PDB {pattern}: not cached, building..."));
        let db = PatternDatabase::build(pattern, checkpoint, progress)?;
        if let Err(e) = self.store.put(&key, &db.to_bytes()) {
            warn!("storing PDB {key} failed: {e}");
        }
        Ok(db)
    }

    /// Validates the board, makes sure the tables exist when they guide the search, and runs IDA*.
    pub fn try_solve(
        &self,
        tiles: &[u8],
        cancel: &CancelToken,
        sink: &mut dyn ProgressSink,
    ) -> Result<Option<Vec<u8>>> {
        let board = Board::from_tiles(tiles)?;
        if !board.is_solvable() {
            return Err(Error::Unsolvable);
        }

        let mut checkpoint = Checkpoint::new(cancel.clone(), self.checkpoint_interval);
        let mut progress = Throttle::new(sink, self.progress_interval);
        let moves = match self.heuristic {
            HeuristicKind::Pdb => {
                let tables = self.tables_with(&mut checkpoint, &mut progress)?;
                progress.update(|| "Starting IDA* (PDB)...".to_string());
                ida_star(&board, tables.as_ref(), &mut checkpoint, &mut progress)?
            }
            HeuristicKind::Manhattan => {
                progress
                    .update(|| "Starting IDA* (Manhattan + linear conflicts)...".to_string());
                ida_star(&board, &ManhattanLinear, &mut checkpoint, &mut progress)?
            }
        };
        if let Some(moves) = &moves {
            info!("solved {:?} in {} moves", board.tiles(), moves.len());
        }
        Ok(moves)
    }

    pub fn solve(
        &self,
        tiles: &[u8],
        cancel: &CancelToken,
        sink: &mut dyn ProgressSink,
    ) -> SolveReport {
        let report = SolveReport::from_result(self.try_solve(tiles, cancel, sink));
        if let Some(error) = &report.error {
            warn!("solve failed: {error}");
        }
        report
    }

    /// Removes persisted tables. Tables already in memory stay usable.
    pub fn clear_cache(&self) -> Result<()> {
        self.store.clear()?;
        info!("cleared persisted PDBs");
        Ok(())
    }
}
