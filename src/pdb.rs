//! Pattern databases built by 0-1 BFS over partial-permutation states.
//!
//! Moving a pattern tile costs 1 and moving any other tile costs 0, so each
//! table only charges for its own tiles and disjoint tables can be summed.

use log::{debug, info};
use std::collections::VecDeque;
use std::mem::size_of;

use crate::cancel::Checkpoint;
use crate::error::{Error, Result};
use crate::pattern::{PartialState, Pattern};
use crate::progress::Throttle;
use crate::puzzle::{Board, CELLS, NEIGHBORS};
use crate::rank::rank;

pub type Distance = u16;

pub const UNREACHED: Distance = Distance::MAX;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternDatabase {
    pattern: Pattern,
    distances: Vec<Distance>,
}

impl PatternDatabase {
    /// Runs the 0-1 BFS from the pattern's goal state until every rank has its distance.
    pub fn build(
        pattern: &Pattern,
        checkpoint: &mut Checkpoint,
        progress: &mut Throttle<'_>,
    ) -> Result<Self> {
        let m = pattern.state_len();
        let size = pattern.table_len();
        let mut distances = vec![UNREACHED; size];

        let goal = pattern.goal_state();
        distances[rank(&goal[..m])] = 0;

        let mut queue: VecDeque<PartialState> = VecDeque::new();
        queue.push_back(goal);

        // Slot of each cell in the current state, 0 when no pattern tile is there.
        let mut slot_of = [0u8; CELLS];
        let mut expanded: u64 = 0;

        while let Some(state) = queue.pop_front() {
            let current = distances[rank(&state[..m])];
            let blank = state[0] as usize;

            slot_of.fill(0);
            for (i, &cell) in state.iter().enumerate().take(m).skip(1) {
                slot_of[cell as usize] = i as u8;
            }

            for &next_blank in NEIGHBORS.of(blank) {
                let mut next = state;
                let slot = slot_of[next_blank as usize] as usize;
                let cost = if slot != 0 {
                    next.swap(0, slot);
                    1
                } else {
                    next[0] = next_blank;
                    0
                };

                let idx = rank(&next[..m]);
                let tentative = current + cost;
                if tentative < distances[idx] {
                    distances[idx] = tentative;
                    if cost == 0 {
                        queue.push_front(next);
                    } else {
                        queue.push_back(next);
                    }
                }
            }

            expanded += 1;
            if checkpoint.tick()? {
                progress.update(|| {
                    format!(
                        "PDB {pattern}: building... {expanded} states expanded, {} queued",
                        queue.len()
                    )
                });
            }
        }

        let unreached = distances.iter().filter(|&&d| d == UNREACHED).count();
        if unreached != 0 {
            return Err(Error::IncompleteTable {
                pattern: pattern.to_string(),
                unreached,
            });
        }

        info!("built PDB {pattern}: {size} entries from {expanded} expansions");
        progress.force(&format!("PDB {pattern}: done, {size} entries"));
        Ok(Self {
            pattern: pattern.clone(),
            distances,
        })
    }

    /// Restores a table from its stored bytes; `None` when the length does not fit the pattern.
    pub fn from_bytes(pattern: &Pattern, bytes: &[u8]) -> Option<Self> {
        let expected = pattern.table_len() * size_of::<Distance>();
        if bytes.len() != expected {
            debug!(
                "PDB {pattern}: stored blob has {} bytes, expected {expected}",
                bytes.len()
            );
            return None;
        }
        let distances = bytes
            .chunks_exact(size_of::<Distance>())
            .map(|c| Distance::from_le_bytes([c[0], c[1]]))
            .collect();
        Some(Self {
            pattern: pattern.clone(),
            distances,
        })
    }

    /// Little-endian entries in rank order.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.distances.iter().flat_map(|d| d.to_le_bytes()).collect()
    }

    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    pub fn len(&self) -> usize {
        self.distances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.distances.is_empty()
    }

    pub fn distance(&self, rank: usize) -> Distance {
        self.distances[rank]
    }

    pub fn max_distance(&self) -> Distance {
        self.distances
            .iter()
            .copied()
            .filter(|&d| d != UNREACHED)
            .max()
            .unwrap_or(0)
    }

    pub fn unreached(&self) -> usize {
        self.distances.iter().filter(|&&d| d == UNREACHED).count()
    }

    /// Distance for a full board, with `positions[v]` = cell of `v`.
    pub fn lookup_positions(&self, positions: &[u8; CELLS]) -> Distance {
        self.distances[self.pattern.rank_positions(positions)]
    }

    pub fn lookup(&self, board: &Board) -> Distance {
        self.lookup_positions(&board.positions())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::CancelToken;
    use crate::progress::Silent;
    use crate::puzzle::{Move, SIZE};
    use std::time::Duration;

    fn build(tiles: &[u8]) -> Result<PatternDatabase> {
        let pattern = Pattern::new(tiles.to_vec())?;
        let mut checkpoint = Checkpoint::new(CancelToken::new(), 1024);
        let mut sink = Silent;
        let mut progress = Throttle::new(&mut sink, Duration::ZERO);
        PatternDatabase::build(&pattern, &mut checkpoint, &mut progress)
    }

    fn manhattan(tile: u8, cell: usize) -> u16 {
        let goal = tile as usize - 1;
        ((goal / SIZE).abs_diff(cell / SIZE) + (goal % SIZE).abs_diff(cell % SIZE)) as u16
    }

    #[test]
    fn single_tile_table_is_complete() {
        let db = build(&[6]).unwrap();
        assert_eq!(db.len(), 240);
        assert_eq!(db.unreached(), 0);
        assert_eq!(db.lookup(&Board::goal()), 0);
        // A lone tile needs at least its Manhattan distance in moves.
        let mut state = [0u8; 2];
        for r in 0..db.len() {
            crate::rank::unrank(r, &mut state);
            assert!(db.distance(r) >= manhattan(6, state[1] as usize));
        }
    }

    #[test]
    fn small_pattern_counts_only_its_own_moves() {
        let db = build(&[1, 2]).unwrap();
        assert_eq!(db.unreached(), 0);

        let mut board = Board::goal();
        board.apply_move(Move::Down);
        board.apply_move(Move::Down);
        board.apply_move(Move::Right);
        assert_eq!(db.lookup(&board), 0, "tiles 1 and 2 never moved");

        // Blank walks to cell 1, pushing tiles 4, 3 and 2 along the way.
        let mut board = Board::goal();
        for m in [Move::Down, Move::Down, Move::Down, Move::Right, Move::Right] {
            assert!(board.apply_move(m));
        }
        assert_eq!(board.blank(), 1);
        assert_eq!(board.tile_at(2), 2);
        assert_eq!(db.lookup(&board), 1);
    }

    #[test]
    fn full_four_tile_table_is_complete_and_bounded() {
        let db = build(&[1, 2, 3, 4]).unwrap();
        assert_eq!(db.len(), 524_160);
        assert_eq!(db.unreached(), 0);
        assert!(db.max_distance() > 0);
        assert!(db.max_distance() <= 80);
    }

    #[test]
    fn cancelled_build_returns_no_table() {
        let pattern = Pattern::new(vec![1, 2, 3]).unwrap();
        let token = CancelToken::new();
        token.cancel();
        let mut checkpoint = Checkpoint::new(token, 16);
        let mut sink = Silent;
        let mut progress = Throttle::new(&mut sink, Duration::ZERO);
        let result = PatternDatabase::build(&pattern, &mut checkpoint, &mut progress);
        assert!(matches!(result, Err(Error::Cancelled)));
        assert!(checkpoint.ticks() <= 16);
    }

    #[test]
    fn bytes_round_trip_and_size_check() {
        let db = build(&[13, 14]).unwrap();
        let bytes = db.to_bytes();
        assert_eq!(bytes.len(), db.len() * 2);
        assert_eq!(PatternDatabase::from_bytes(db.pattern(), &bytes), Some(db.clone()));
        assert_eq!(PatternDatabase::from_bytes(db.pattern(), &bytes[1..]), None);
        let other = Pattern::new(vec![13, 14, 15]).unwrap();
        assert_eq!(PatternDatabase::from_bytes(&other, &bytes), None);
    }
}
