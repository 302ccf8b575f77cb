//! Progress reporting decoupled from iteration

use std::sync::atomic::{AtomicU64, Ordering};

/// Observer for long-running phases.
///
/// `current` counts completed items out of `total`. Implementations must
/// tolerate calls from any thread; the engine itself carries no display
/// state.
pub trait Progress: Send + Sync {
    fn report(&self, current: u64, total: u64);
}

/// Discards all reports.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl Progress for NoProgress {
    fn report(&self, _current: u64, _total: u64) {}
}

/// Tracks the latest report through an atomic, usable as a shared
/// counter across worker threads.
#[derive(Debug, Default)]
pub struct CountingProgress {
    current: AtomicU64,
}

impl CountingProgress {
    pub fn current(&self) -> u64 {
        self.current.load(Ordering::Relaxed)
    }
}

impl Progress for CountingProgress {
    fn report(&self, current: u64, _total: u64) {
        self.current.store(current, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counting_progress_tracks_latest() {
        let progress = CountingProgress::default();
        progress.report(1, 10);
        progress.report(7, 10);
        assert_eq!(progress.current(), 7);
    }
}
