use rand::{seq::SliceRandom, Rng};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

pub const SIZE: usize = 4;
pub const CELLS: usize = SIZE * SIZE;

pub const GOAL: [u8; CELLS] = [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 0];

/// Cell of each value on the solved board; the blank sits in the last cell.
pub const fn goal_position(value: u8) -> usize {
    if value == 0 {
        CELLS - 1
    } else {
        value as usize - 1
    }
}

/// The direction a tile slides into the blank.
///
/// The blank travels the other way, so `Up` takes the tile below the blank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Move {
    Up,
    Down,
    Left,
    Right,
}

impl Move {
    pub const ALL: [Move; 4] = [Move::Up, Move::Down, Move::Left, Move::Right];

    /// Row and column step from the blank to the tile that slides.
    pub const fn tile_offset(self) -> (isize, isize) {
        match self {
            Move::Up => (1, 0),
            Move::Down => (-1, 0),
            Move::Left => (0, 1),
            Move::Right => (0, -1),
        }
    }

    /// The move that puts the tile back.
    pub const fn reverse(self) -> Self {
        match self {
            Move::Up => Move::Down,
            Move::Down => Move::Up,
            Move::Left => Move::Right,
            Move::Right => Move::Left,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Move::Up => "Up",
            Move::Down => "Down",
            Move::Left => "Left",
            Move::Right => "Right",
        }
    }

    /// The cell whose tile slides into `blank`, if it is on the board.
    pub fn source(self, blank: usize) -> Option<usize> {
        let (dr, dc) = self.tile_offset();
        let row = (blank / SIZE) as isize + dr;
        let col = (blank % SIZE) as isize + dc;
        if (0..SIZE as isize).contains(&row) && (0..SIZE as isize).contains(&col) {
            Some(row as usize * SIZE + col as usize)
        } else {
            None
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Grid neighbours of every cell, in `Move::ALL` order.
pub struct Neighbors {
    cells: [[u8; 4]; CELLS],
    len: [u8; CELLS],
}

impl Neighbors {
    const fn new() -> Self {
        let mut cells = [[0u8; 4]; CELLS];
        let mut len = [0u8; CELLS];
        let mut idx = 0;
        while idx < CELLS {
            let (r, c) = (idx / SIZE, idx % SIZE);
            let mut n = 0;
            if r < SIZE - 1 {
                cells[idx][n] = (idx + SIZE) as u8;
                n += 1;
            }
            if r > 0 {
                cells[idx][n] = (idx - SIZE) as u8;
                n += 1;
            }
            if c < SIZE - 1 {
                cells[idx][n] = (idx + 1) as u8;
                n += 1;
            }
            if c > 0 {
                cells[idx][n] = (idx - 1) as u8;
                n += 1;
            }
            len[idx] = n as u8;
            idx += 1;
        }
        Self { cells, len }
    }

    pub fn of(&self, cell: usize) -> &[u8] {
        &self.cells[cell][..self.len[cell] as usize]
    }
}

pub static NEIGHBORS: Neighbors = Neighbors::new();

#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Board {
    tiles: [u8; CELLS],
    blank: usize,
}

impl Board {
    pub fn goal() -> Self {
        Self {
            tiles: GOAL,
            blank: CELLS - 1,
        }
    }

    pub fn from_tiles(values: &[u8]) -> Result<Self> {
        if values.len() != CELLS {
            return Err(Error::InvalidBoard(format!(
                "expected {CELLS} values, got {}",
                values.len()
            )));
        }
        let mut seen = [false; CELLS];
        let mut tiles = [0u8; CELLS];
        let mut blank = 0;
        for (i, &value) in values.iter().enumerate() {
            let slot = seen.get_mut(value as usize).ok_or_else(|| {
                Error::InvalidBoard(format!("value {value} is outside 0..{CELLS}"))
            })?;
            if *slot {
                return Err(Error::InvalidBoard(format!("value {value} appears twice")));
            }
            *slot = true;
            tiles[i] = value;
            if value == 0 {
                blank = i;
            }
        }
        Ok(Self { tiles, blank })
    }

    pub fn tiles(&self) -> &[u8; CELLS] {
        &self.tiles
    }

    pub fn blank(&self) -> usize {
        self.blank
    }

    pub fn tile_at(&self, cell: usize) -> u8 {
        self.tiles[cell]
    }

    /// Cell of every value: `positions()[v]` is where `v` sits.
    pub fn positions(&self) -> [u8; CELLS] {
        let mut pos = [0u8; CELLS];
        for (cell, &value) in self.tiles.iter().enumerate() {
            pos[value as usize] = cell as u8;
        }
        pos
    }

    /// Moves the blank to `cell` by sliding that cell's tile. The caller guarantees adjacency.
    pub(crate) fn swap_blank(&mut self, cell: usize) {
        self.tiles.swap(self.blank, cell);
        self.blank = cell;
    }

    pub fn apply_move(&mut self, movement: Move) -> bool {
        match movement.source(self.blank) {
            Some(cell) => {
                self.swap_blank(cell);
                true
            }
            None => false,
        }
    }

    /// Slides `tile` into the blank; the tile must be adjacent to it.
    pub fn slide_tile(&mut self, tile: u8) -> Result<Move> {
        let movement = Move::ALL
            .into_iter()
            .find(|m| m.source(self.blank).is_some_and(|c| tile != 0 && self.tiles[c] == tile))
            .ok_or_else(|| Error::InvalidBoard(format!("tile {tile} is not next to the blank")))?;
        self.apply_move(movement);
        Ok(movement)
    }

    pub fn apply_tiles(&mut self, tiles: &[u8]) -> Result<()> {
        for &tile in tiles {
            self.slide_tile(tile)?;
        }
        Ok(())
    }

    /// Random walk of `moves` steps that never undoes the previous step.
    pub fn scramble<R: Rng + ?Sized>(&mut self, rng: &mut R, moves: usize) {
        let mut last: Option<Move> = None;
        for _ in 0..moves {
            let candidates: Vec<Move> = Move::ALL
                .into_iter()
                .filter(|m| Some(m.reverse()) != last && m.source(self.blank).is_some())
                .collect();
            if let Some(&m) = candidates.choose(rng) {
                self.apply_move(m);
                last = Some(m);
            }
        }
    }

    pub fn is_solvable(&self) -> bool {
        let inversions = Self::count_inversions(&self.tiles);
        let row_from_bottom = SIZE - self.blank / SIZE;
        if row_from_bottom % 2 == 1 {
            inversions % 2 == 0
        } else {
            inversions % 2 == 1
        }
    }

    fn count_inversions(flattened: &[u8]) -> usize {
        flattened
            .iter()
            .enumerate()
            .filter(|&(_, &val)| val != 0)
            .map(|(i, &val)| {
                flattened[i + 1..]
                    .iter()
                    .filter(|&&next| next != 0 && next < val)
                    .count()
            })
            .sum()
    }

    pub fn is_solved(&self) -> bool {
        self.tiles == GOAL
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::goal()
    }
}

impl FromStr for Board {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let values = s
            .split(|c: char| c == ',' || c == ';' || c.is_whitespace())
            .filter(|part| !part.is_empty())
            .map(|part| {
                part.parse::<u8>()
                    .map_err(|_| Error::InvalidBoard(format!("{part:?} is not a tile number")))
            })
            .collect::<Result<Vec<u8>>>()?;
        Self::from_tiles(&values)
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Board({:?})", self.tiles)
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.tiles.chunks(SIZE) {
            for &val in row {
                write!(f, "{:2} ", val)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
