use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use crate::error::{Error, Result};

/// Caller-owned cancellation flag shared with an in-flight build or search.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Cooperative yield point for long loops.
///
/// Every `interval` ticks the thread yields and the token is checked, so a
/// cancellation is observed within a bounded number of operations.
#[derive(Debug)]
pub struct Checkpoint {
    token: CancelToken,
    interval: u64,
    ticks: u64,
}

impl Checkpoint {
    pub fn new(token: CancelToken, interval: u64) -> Self {
        Self {
            token,
            interval: interval.max(1),
            ticks: 0,
        }
    }

    /// Counts one operation; returns `Ok(true)` when this tick was a yield point.
    #[inline]
    pub fn tick(&mut self) -> Result<bool> {
        self.ticks += 1;
        if self.ticks % self.interval != 0 {
            return Ok(false);
        }
        thread::yield_now();
        self.token.check()?;
        Ok(true)
    }

    /// Unconditional yield point, used between coarse units of work.
    pub fn yield_now(&mut self) -> Result<()> {
        thread::yield_now();
        self.token.check()
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_flag() {
        let token = CancelToken::new();
        let other = token.clone();
        assert!(token.check().is_ok());
        other.cancel();
        assert!(token.is_cancelled());
        assert!(matches!(token.check(), Err(Error::Cancelled)));
    }

    #[test]
    fn checkpoint_observes_cancel_within_interval() {
        let token = CancelToken::new();
        let mut checkpoint = Checkpoint::new(token.clone(), 8);
        for _ in 0..7 {
            assert!(!checkpoint.tick().unwrap());
        }
        assert!(checkpoint.tick().unwrap());

        token.cancel();
        let mut observed_at = None;
        for i in 1..=8 {
            if checkpoint.tick().is_err() {
                observed_at = Some(i);
                break;
            }
        }
        assert_eq!(observed_at, Some(8));
        assert_eq!(checkpoint.ticks(), 16);
    }
}
