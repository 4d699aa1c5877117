//! Dense ranking of partial permutations over the 16 cells.
//!
//! A tuple of `m` distinct cells maps to `[0, 16!/(16-m)!)`: the i-th cell contributes
//! the number of still-unused cells below it, weighted by the number of ways to
//! place the remaining `m-i-1` entries among the remaining `16-i-1` cells.

use crate::puzzle::CELLS;

/// `FALLING[n][k] = n * (n-1) * ... * (n-k+1)`, zero where `k > n`.
const FALLING: [[u64; CELLS + 1]; CELLS + 1] = falling_table();

const fn falling_table() -> [[u64; CELLS + 1]; CELLS + 1] {
    let mut table = [[0u64; CELLS + 1]; CELLS + 1];
    let mut n = 0;
    while n <= CELLS {
        let mut k = 0;
        let mut acc = 1u64;
        while k <= n {
            table[n][k] = acc;
            acc *= (n - k) as u64;
            k += 1;
        }
        n += 1;
    }
    table
}

pub fn falling_factorial(n: usize, k: usize) -> u64 {
    FALLING[n][k]
}

/// Number of distinct ranks for tuples of length `m`.
pub fn rank_count(m: usize) -> usize {
    FALLING[CELLS][m] as usize
}

pub fn rank(positions: &[u8]) -> usize {
    let m = positions.len();
    debug_assert!(m <= CELLS);
    let mut used: u16 = 0;
    let mut rank = 0u64;
    for (i, &p) in positions.iter().enumerate() {
        let below = (1u16 << p) - 1;
        let smaller_unused = (below & !used).count_ones() as u64;
        debug_assert!(used & (1 << p) == 0, "cell {p} repeated");
        used |= 1 << p;
        rank += smaller_unused * FALLING[CELLS - i - 1][m - i - 1];
    }
    rank as usize
}

/// Inverse of [`rank`] for tuples of length `out.len()`.
pub fn unrank(mut rank: usize, out: &mut [u8]) {
    let m = out.len();
    let mut used: u16 = 0;
    for i in 0..m {
        let weight = FALLING[CELLS - i - 1][m - i - 1] as usize;
        let mut skip = rank / weight;
        rank %= weight;
        let mut cell = 0u8;
        loop {
            if used & (1 << cell) == 0 {
                if skip == 0 {
                    break;
                }
                skip -= 1;
            }
            cell += 1;
        }
        used |= 1 << cell;
        out[i] = cell;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn for_each_tuple(m: usize, prefix: &mut Vec<u8>, used: u16, f: &mut impl FnMut(&[u8])) {
        if prefix.len() == m {
            f(prefix);
            return;
        }
        for cell in 0..CELLS as u8 {
            if used & (1 << cell) == 0 {
                prefix.push(cell);
                for_each_tuple(m, prefix, used | (1 << cell), f);
                prefix.pop();
            }
        }
    }

    fn assert_bijection(m: usize) {
        let count = rank_count(m);
        let mut seen = vec![false; count];
        let mut visited = 0usize;
        for_each_tuple(m, &mut Vec::new(), 0, &mut |tuple| {
            let r = rank(tuple);
            assert!(r < count, "rank {r} out of range for {tuple:?}");
            assert!(!seen[r], "collision at rank {r} for {tuple:?}");
            seen[r] = true;
            visited += 1;
        });
        assert_eq!(visited, count);
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn falling_factorials() {
        assert_eq!(falling_factorial(16, 0), 1);
        assert_eq!(falling_factorial(16, 2), 240);
        assert_eq!(falling_factorial(16, 4), 43_680);
        assert_eq!(falling_factorial(16, 5), 524_160);
        assert_eq!(falling_factorial(16, 6), 5_765_760);
        assert_eq!(falling_factorial(3, 3), 6);
    }

    #[test]
    fn pairs_are_a_bijection() {
        assert_bijection(2);
    }

    #[test]
    fn five_tuples_are_a_bijection() {
        assert_bijection(5);
    }

    #[test]
    fn extremes() {
        assert_eq!(rank(&[0, 1, 2, 3, 4]), 0);
        assert_eq!(rank(&[15, 14, 13, 12, 11]), rank_count(5) - 1);
    }

    #[test]
    fn unrank_inverts_rank() {
        let mut out = [0u8; 6];
        for r in (0..rank_count(6)).step_by(7919) {
            unrank(r, &mut out);
            assert_eq!(rank(&out), r);
        }
    }
}
