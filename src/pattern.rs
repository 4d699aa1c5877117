use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};
use crate::puzzle::{goal_position, Board, CELLS};
use crate::rank::{rank, rank_count};

pub const MAX_PATTERN_TILES: usize = 5;
/// Blank plus the largest pattern.
pub const MAX_STATE_LEN: usize = MAX_PATTERN_TILES + 1;

/// Cells of the blank followed by each pattern tile, in pattern order.
pub type PartialState = [u8; MAX_STATE_LEN];

/// A fixed group of non-blank tiles tracked by one database.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Pattern {
    tiles: Vec<u8>,
}

impl Pattern {
    pub fn new(tiles: impl Into<Vec<u8>>) -> Result<Self> {
        let tiles = tiles.into();
        if tiles.is_empty() || tiles.len() > MAX_PATTERN_TILES {
            return Err(Error::InvalidPattern(format!(
                "{tiles:?}: needs 1..={MAX_PATTERN_TILES} tiles"
            )));
        }
        let mut seen = 0u16;
        for &tile in &tiles {
            if tile == 0 || tile as usize >= CELLS {
                return Err(Error::InvalidPattern(format!("{tiles:?}: bad tile {tile}")));
            }
            if seen & (1 << tile) != 0 {
                return Err(Error::InvalidPattern(format!("{tiles:?}: tile {tile} repeated")));
            }
            seen |= 1 << tile;
        }
        Ok(Self { tiles })
    }

    pub fn tiles(&self) -> &[u8] {
        &self.tiles
    }

    /// Length of a partial state: blank plus tiles.
    pub fn state_len(&self) -> usize {
        self.tiles.len() + 1
    }

    pub fn table_len(&self) -> usize {
        rank_count(self.state_len())
    }

    /// Stable store key derived from the tile list.
    pub fn key(&self) -> String {
        let mut key = String::from("pdb");
        for tile in &self.tiles {
            key.push('_');
            key.push_str(&tile.to_string());
        }
        key
    }

    pub fn goal_state(&self) -> PartialState {
        let mut state = [0u8; MAX_STATE_LEN];
        state[0] = goal_position(0) as u8;
        for (i, &tile) in self.tiles.iter().enumerate() {
            state[i + 1] = goal_position(tile) as u8;
        }
        state
    }

    /// Rank of this pattern's partial state on a full board, given `positions[v]` = cell of `v`.
    pub fn rank_positions(&self, positions: &[u8; CELLS]) -> usize {
        let mut state = [0u8; MAX_STATE_LEN];
        state[0] = positions[0];
        for (i, &tile) in self.tiles.iter().enumerate() {
            state[i + 1] = positions[tile as usize];
        }
        rank(&state[..self.state_len()])
    }

    pub fn rank_board(&self, board: &Board) -> usize {
        self.rank_positions(&board.positions())
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tiles: Vec<String> = self.tiles.iter().map(|t| t.to_string()).collect();
        write!(f, "{{{}}}", tiles.join(","))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub enum Layout {
    #[default]
    #[serde(rename = "4-4-4-3")]
    FourFourFourThree,
    #[serde(rename = "5-5-5")]
    FiveFiveFive,
}

/// Pairwise-disjoint patterns whose databases add up to an admissible estimate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternSet {
    patterns: Vec<Pattern>,
}

impl PatternSet {
    pub fn new(patterns: Vec<Pattern>) -> Result<Self> {
        let mut covered = 0u16;
        for pattern in &patterns {
            for &tile in pattern.tiles() {
                if covered & (1 << tile) != 0 {
                    return Err(Error::InvalidPattern(format!(
                        "tile {tile} appears in more than one pattern"
                    )));
                }
                covered |= 1 << tile;
            }
        }
        Ok(Self { patterns })
    }

    pub fn from_tiles(groups: &[&[u8]]) -> Result<Self> {
        let patterns = groups
            .iter()
            .map(|g| Pattern::new(g.to_vec()))
            .collect::<Result<Vec<_>>>()?;
        Self::new(patterns)
    }

    pub fn layout(layout: Layout) -> Self {
        let groups: &[&[u8]] = match layout {
            Layout::FourFourFourThree => {
                &[&[1, 2, 3, 4], &[5, 6, 7, 8], &[9, 10, 11, 12], &[13, 14, 15]]
            }
            Layout::FiveFiveFive => &[&[1, 2, 3, 4, 5], &[6, 7, 8, 9, 10], &[11, 12, 13, 14, 15]],
        };
        let patterns = groups
            .iter()
            .map(|g| Pattern { tiles: g.to_vec() })
            .collect();
        Self { patterns }
    }

    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

impl Default for PatternSet {
    fn default() -> Self {
        Self::layout(Layout::default())
    }
}
