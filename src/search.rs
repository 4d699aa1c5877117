//! Iterative-deepening A*.
//!
//! Each iteration is a depth-first search pruned at `g + h > bound`; the smallest
//! pruned `f` becomes the next bound. Children are tried in ascending heuristic
//! order and the move that would undo the previous one is skipped.

use log::{debug, trace};

use crate::cancel::Checkpoint;
use crate::error::Result;
use crate::heuristic::Heuristic;
use crate::progress::Throttle;
use crate::puzzle::{Board, NEIGHBORS};

const UNBOUNDED: u32 = u32::MAX;

enum Step {
    Found,
    Pruned(u32),
}

struct Dfs<'a, 'p, H: Heuristic + ?Sized> {
    heuristic: &'a H,
    checkpoint: &'a mut Checkpoint,
    progress: &'a mut Throttle<'p>,
    board: Board,
    path: Vec<u8>,
    bound: u32,
    nodes: u64,
}

impl<H: Heuristic + ?Sized> Dfs<'_, '_, H> {
    fn search(&mut self, g: u32, h: u32, prev_blank: Option<usize>) -> Result<Step> {
        let f = g + h;
        if f > self.bound {
            return Ok(Step::Pruned(f));
        }
        if self.board.is_solved() {
            return Ok(Step::Found);
        }

        self.nodes += 1;
        if self.checkpoint.tick()? {
            let (bound, nodes) = (self.bound, self.nodes);
            self.progress
                .update(|| format!("Searching... bound={bound} depth={g} nodes={nodes}"));
        }

        let blank = self.board.blank();
        let mut candidates = [(0u32, 0usize); 4];
        let mut count = 0;
        for &cell in NEIGHBORS.of(blank) {
            let cell = cell as usize;
            if Some(cell) == prev_blank {
                continue;
            }
            self.board.swap_blank(cell);
            candidates[count] = (self.heuristic.estimate(&self.board), cell);
            self.board.swap_blank(blank);
            count += 1;
        }
        let candidates = &mut candidates[..count];
        candidates.sort_by_key(|&(h, _)| h);

        let mut min_next = UNBOUNDED;
        for &(child_h, cell) in candidates.iter() {
            self.path.push(self.board.tile_at(cell));
            self.board.swap_blank(cell);

            match self.search(g + 1, child_h, Some(blank))? {
                Step::Found => return Ok(Step::Found),
                Step::Pruned(t) => min_next = min_next.min(t),
            }

            self.board.swap_blank(blank);
            self.path.pop();
        }
        Ok(Step::Pruned(min_next))
    }
}

/// Finds a shortest sequence of tiles to slide, or `None` if the bound can no longer grow.
///
/// The board must be solvable; otherwise this only returns through cancellation.
pub fn ida_star<H: Heuristic + ?Sized>(
    start: &Board,
    heuristic: &H,
    checkpoint: &mut Checkpoint,
    progress: &mut Throttle<'_>,
) -> Result<Option<Vec<u8>>> {
    if start.is_solved() {
        return Ok(Some(Vec::new()));
    }

    let start_h = heuristic.estimate(start);
    let mut bound = start_h;
    let mut total_nodes = 0u64;
    progress.update(|| format!("Starting IDA*, initial bound={bound}"));

    loop {
        checkpoint.yield_now()?;
        debug!("IDA* iteration with bound {bound}");
        progress.update(|| format!("IDA* iteration, bound={bound}"));

        let mut dfs = Dfs {
            heuristic,
            checkpoint: &mut *checkpoint,
            progress: &mut *progress,
            board: start.clone(),
            path: Vec::new(),
            bound,
            nodes: 0,
        };
        let step = dfs.search(0, start_h, None)?;
        total_nodes += dfs.nodes;
        trace!("bound {bound} expanded {} nodes", dfs.nodes);

        match step {
            Step::Found => {
                let path = dfs.path;
                debug!("solved in {} moves after {total_nodes} nodes", path.len());
                progress.force(&format!("Solution found, moves={}", path.len()));
                return Ok(Some(path));
            }
            Step::Pruned(UNBOUNDED) => return Ok(None),
            Step::Pruned(next) => bound = next,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::CancelToken;
    use crate::error::Error;
    use crate::heuristic::ManhattanLinear;
    use crate::progress::Silent;
    use crate::test_support::{boards_within, full_tables};
    use rand::{rngs::StdRng, SeedableRng};
    use std::cell::Cell;
    use std::time::Duration;

    fn solve_with<H: Heuristic + ?Sized>(board: &Board, heuristic: &H) -> Result<Option<Vec<u8>>> {
        let mut checkpoint = Checkpoint::new(CancelToken::new(), 4096);
        let mut sink = Silent;
        let mut progress = Throttle::new(&mut sink, Duration::from_millis(120));
        ida_star(board, heuristic, &mut checkpoint, &mut progress)
    }

    fn assert_solves(board: &Board, moves: &[u8]) {
        let mut replay = board.clone();
        replay.apply_tiles(moves).unwrap();
        assert!(replay.is_solved(), "{board:?} not solved by {moves:?}");
    }

    #[test]
    fn goal_needs_no_moves() {
        let moves = solve_with(&Board::goal(), full_tables()).unwrap().unwrap();
        assert!(moves.is_empty());
    }

    #[test]
    fn finds_shortest_solutions() {
        let tables = full_tables();
        let known = boards_within(12);
        let mut checked = 0;
        for (board, depth) in known.iter().filter(|(_, d)| *d >= 8).step_by(53) {
            let moves = solve_with(board, tables).unwrap().unwrap();
            assert_eq!(moves.len(), *depth as usize, "{board:?}");
            assert_solves(board, &moves);

            let fallback = solve_with(board, &ManhattanLinear).unwrap().unwrap();
            assert_eq!(fallback.len(), *depth as usize, "{board:?}");
            checked += 1;
        }
        assert!(checked > 50);
    }

    #[test]
    fn solves_deep_scrambles() {
        let tables = full_tables();
        let mut rng = StdRng::seed_from_u64(2024);
        for _ in 0..3 {
            let mut board = Board::goal();
            board.scramble(&mut rng, 40);
            let moves = solve_with(&board, tables).unwrap().unwrap();
            assert!(moves.len() <= 40);
            assert_eq!(moves.len() % 2, 0);
            assert_solves(&board, &moves);
        }
    }

    #[test]
    fn cancelled_search_reports_cancellation() {
        let mut board = Board::goal();
        board.scramble(&mut StdRng::seed_from_u64(9), 30);
        let token = CancelToken::new();
        token.cancel();
        let mut checkpoint = Checkpoint::new(token, 64);
        let mut sink = Silent;
        let mut progress = Throttle::new(&mut sink, Duration::ZERO);
        let result = ida_star(&board, &ManhattanLinear, &mut checkpoint, &mut progress);
        assert!(matches!(result, Err(Error::Cancelled)));
    }

    /// Trips the token once the search has made `after` estimates.
    struct CancelAfter {
        token: CancelToken,
        after: usize,
        calls: Cell<usize>,
    }

    impl Heuristic for CancelAfter {
        fn estimate(&self, board: &Board) -> u32 {
            let calls = self.calls.get() + 1;
            self.calls.set(calls);
            if calls == self.after {
                self.token.cancel();
            }
            ManhattanLinear.estimate(board)
        }
    }

    #[test]
    fn cancel_mid_iteration_unwinds_the_search() {
        let mut board = Board::goal();
        board.scramble(&mut StdRng::seed_from_u64(9), 60);
        let token = CancelToken::new();
        let heuristic = CancelAfter {
            token: token.clone(),
            after: 5000,
            calls: Cell::new(0),
        };
        let mut checkpoint = Checkpoint::new(token, 64);
        let mut sink = Silent;
        let mut progress = Throttle::new(&mut sink, Duration::ZERO);

        let result = ida_star(&board, &heuristic, &mut checkpoint, &mut progress);
        assert!(matches!(result, Err(Error::Cancelled)));
        // Each tick expands at most four children, so the flag is seen within one interval.
        let calls = heuristic.calls.get();
        assert!((5000..=5000 + 4 * 64).contains(&calls), "{calls} estimates");
        assert!(checkpoint.ticks() > 64, "cancelled inside the DFS");
    }
}
