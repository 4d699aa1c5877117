use std::time::{Duration, Instant};

pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(120);

/// Receives human-readable status lines for the host.
pub trait ProgressSink {
    fn emit(&mut self, text: &str);
}

impl<F: FnMut(&str)> ProgressSink for F {
    fn emit(&mut self, text: &str) {
        self(text)
    }
}

/// Discards everything.
pub struct Silent;

impl ProgressSink for Silent {
    fn emit(&mut self, _text: &str) {}
}

/// Rate-limits a sink so status lines go out at most once per interval.
pub struct Throttle<'a> {
    sink: &'a mut dyn ProgressSink,
    interval: Duration,
    last: Option<Instant>,
}

impl<'a> Throttle<'a> {
    pub fn new(sink: &'a mut dyn ProgressSink, interval: Duration) -> Self {
        Self {
            sink,
            interval,
            last: None,
        }
    }

    /// Emits `text()` unless a line went out less than one interval ago.
    pub fn update(&mut self, text: impl FnOnce() -> String) {
        let now = Instant::now();
        if self.last.is_some_and(|last| now.duration_since(last) < self.interval) {
            return;
        }
        self.last = Some(now);
        self.sink.emit(&text());
    }

    /// Emits `text` regardless of the interval. Reserved for lines that end a
    /// phase, so the host always sees the final state.
    pub fn force(&mut self, text: &str) {
        self.last = Some(Instant::now());
        self.sink.emit(text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_is_rate_limited() {
        let mut lines = Vec::new();
        let mut sink = |text: &str| lines.push(text.to_string());
        let mut throttle = Throttle::new(&mut sink, Duration::from_secs(3600));
        throttle.update(|| "first".into());
        throttle.update(|| "second".into());
        throttle.force("forced");
        throttle.update(|| "third".into());
        drop(throttle);
        assert_eq!(lines, vec!["first", "forced"]);
    }

    #[test]
    fn zero_interval_passes_everything() {
        let mut count = 0;
        let mut sink = |_: &str| count += 1;
        let mut throttle = Throttle::new(&mut sink, Duration::ZERO);
        for _ in 0..5 {
            throttle.update(|| String::from("tick"));
        }
        drop(throttle);
        assert_eq!(count, 5);
    }
}
