use serde::{Deserialize, Serialize};

use crate::pdb::{PatternDatabase, UNREACHED};
use crate::puzzle::{Board, CELLS, SIZE};

/// Lower bound on the number of moves left to reach the goal.
pub trait Heuristic {
    fn estimate(&self, board: &Board) -> u32;
}

/// Which estimate guides the search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HeuristicKind {
    /// Sum of the pattern databases.
    #[default]
    Pdb,
    /// Manhattan distance plus linear conflicts; needs no tables but searches far more nodes.
    Manhattan,
}

/// Loaded pattern databases, summed as an additive heuristic.
///
/// Immutable once constructed; shared read-only between solves.
#[derive(Debug, Default)]
pub struct PatternTables {
    tables: Vec<PatternDatabase>,
}

impl PatternTables {
    pub fn new(tables: Vec<PatternDatabase>) -> Self {
        Self { tables }
    }

    pub fn tables(&self) -> &[PatternDatabase] {
        &self.tables
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

impl Heuristic for PatternTables {
    fn estimate(&self, board: &Board) -> u32 {
        let positions = board.positions();
        self.tables
            .iter()
            .map(|table| {
                let d = table.lookup_positions(&positions);
                debug_assert_ne!(d, UNREACHED, "PDB {} has a hole", table.pattern());
                if d == UNREACHED {
                    0
                } else {
                    d as u32
                }
            })
            .sum()
    }
}

/// Manhattan distance plus linear conflicts.
///
/// Selected with [`HeuristicKind::Manhattan`]; also the reference estimate the
/// pattern tables are checked against.
#[derive(Debug, Clone, Copy, Default)]
pub struct ManhattanLinear;

impl ManhattanLinear {
    pub fn manhattan_distance(board: &Board) -> u32 {
        let mut distance = 0;
        for (cell, &value) in board.tiles().iter().enumerate() {
            if value != 0 {
                let target = value as usize - 1;
                distance += (cell / SIZE).abs_diff(target / SIZE);
                distance += (cell % SIZE).abs_diff(target % SIZE);
            }
        }
        distance as u32
    }

    /// Tiles in their goal row (or column) that must leave it so the rest are in
    /// order; each such tile costs two extra moves.
    pub fn linear_conflicts(board: &Board) -> u32 {
        let tiles = board.tiles();
        let mut conflicts = 0;
        for line in 0..SIZE {
            let mut row = Vec::with_capacity(SIZE);
            let mut col = Vec::with_capacity(SIZE);
            for k in 0..SIZE {
                let in_row = tiles[line * SIZE + k];
                if in_row != 0 && (in_row as usize - 1) / SIZE == line {
                    row.push(in_row);
                }
                let in_col = tiles[k * SIZE + line];
                if in_col != 0 && (in_col as usize - 1) % SIZE == line {
                    col.push(in_col);
                }
            }
            conflicts += row.len() - longest_increasing(&row);
            conflicts += col.len() - longest_increasing(&col);
        }
        conflicts as u32
    }
}

fn longest_increasing(values: &[u8]) -> usize {
    let mut best = [1usize; CELLS];
    let mut longest = 0;
    for i in 0..values.len() {
        for j in 0..i {
            if values[j] < values[i] {
                best[i] = best[i].max(best[j] + 1);
            }
        }
        longest = longest.max(best[i]);
    }
    longest
}

impl Heuristic for ManhattanLinear {
    fn estimate(&self, board: &Board) -> u32 {
        Self::manhattan_distance(board) + 2 * Self::linear_conflicts(board)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{boards_within, full_tables};
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn goal_estimates_zero() {
        assert_eq!(full_tables().estimate(&Board::goal()), 0);
        assert_eq!(ManhattanLinear.estimate(&Board::goal()), 0);
    }

    #[test]
    fn linear_conflicts_count_tiles_to_remove() {
        // Row 0 holds 4 1 2 3: only tile 4 has to step out of the row.
        let board: Board = "4 1 2 3 5 6 7 8 9 10 11 12 13 14 15 0".parse().unwrap();
        assert_eq!(ManhattanLinear::linear_conflicts(&board), 1);
        assert_eq!(ManhattanLinear::manhattan_distance(&board), 6);

        let reversed: Board = "3 2 1 4 5 6 7 8 9 10 11 12 13 14 15 0".parse().unwrap();
        assert_eq!(ManhattanLinear::linear_conflicts(&reversed), 2);
    }

    #[test]
    fn both_estimates_are_admissible_near_the_goal() {
        let tables = full_tables();
        for (board, depth) in boards_within(10) {
            let depth = depth as u32;
            assert!(tables.estimate(&board) <= depth, "{board:?} at depth {depth}");
            assert!(ManhattanLinear.estimate(&board) <= depth, "{board:?} at depth {depth}");
        }
    }

    #[test]
    fn tables_dominate_manhattan_distance() {
        let tables = full_tables();
        let mut rng = StdRng::seed_from_u64(0x15);
        for _ in 0..200 {
            let mut board = Board::goal();
            board.scramble(&mut rng, 60);
            assert!(tables.estimate(&board) >= ManhattanLinear::manhattan_distance(&board));
        }
    }

    #[test]
    fn empty_registry_estimates_zero() {
        assert_eq!(PatternTables::default().estimate(&Board::goal()), 0);
    }
}
