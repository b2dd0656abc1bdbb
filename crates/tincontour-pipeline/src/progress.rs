//! Progress reporting for the three long-running loops of a run.
//!
//! Purely observational: reports never influence results.

use std::fmt;

/// A long-running loop of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Slicing every triangle at every contour level it spans.
    Slicing,
    /// Walking open chains from their dangling ends.
    OpenChains,
    /// Walking the remaining closed loops.
    ClosedLoops,
}

impl Phase {
    /// All phases in execution order.
    pub const ALL: [Self; 3] = [Self::Slicing, Self::OpenChains, Self::ClosedLoops];

    /// Position of this phase, e.g. `"Loop 2 of 3"`.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Slicing => "Loop 1 of 3",
            Self::OpenChains => "Loop 2 of 3",
            Self::ClosedLoops => "Loop 3 of 3",
        }
    }

    /// Short machine-friendly name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Slicing => "slicing",
            Self::OpenChains => "open-chains",
            Self::ClosedLoops => "closed-loops",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.label(), self.name())
    }
}

/// Receives percentage-complete notifications.
///
/// Implemented for any `FnMut(Phase, u8)` closure, so callers can pass
/// `&mut |phase, pct| ...` directly.
pub trait Progress {
    /// Called when `phase` reaches a new whole percentage (0..=100).
    fn report(&mut self, phase: Phase, percent: u8);
}

/// A [`Progress`] that ignores every report.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl Progress for NoProgress {
    fn report(&mut self, _phase: Phase, _percent: u8) {}
}

impl<F: FnMut(Phase, u8)> Progress for F {
    fn report(&mut self, phase: Phase, percent: u8) {
        self(phase, percent);
    }
}

/// Converts loop positions into percentages and forwards only changes.
#[derive(Debug)]
pub(crate) struct ProgressTracker {
    phase: Phase,
    total: usize,
    last: Option<u8>,
}

impl ProgressTracker {
    pub(crate) const fn new(phase: Phase, total: usize) -> Self {
        Self {
            phase,
            total,
            last: None,
        }
    }

    /// Record that item `index` (zero-based) of `total` is done.
    pub(crate) fn update(&mut self, index: usize, sink: &mut dyn Progress) {
        let percent = if self.total <= 1 {
            100
        } else {
            let scaled = index.saturating_mul(100) / (self.total - 1);
            u8::try_from(scaled.min(100)).unwrap_or(100)
        };
        if self.last != Some(percent) {
            self.last = Some(percent);
            sink.report(self.phase, percent);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_and_names() {
        assert_eq!(Phase::Slicing.label(), "Loop 1 of 3");
        assert_eq!(Phase::ClosedLoops.name(), "closed-loops");
        assert_eq!(Phase::OpenChains.to_string(), "Loop 2 of 3 (open-chains)");
    }

    #[test]
    fn tracker_reports_each_percentage_once() {
        let mut seen = Vec::new();
        let mut sink = |phase: Phase, pct: u8| seen.push((phase, pct));
        let mut tracker = ProgressTracker::new(Phase::Slicing, 1000);
        for i in 0..1000 {
            tracker.update(i, &mut sink);
        }
        let percents: Vec<u8> = seen.iter().map(|&(_, p)| p).collect();
        assert_eq!(percents.first(), Some(&0));
        assert_eq!(percents.last(), Some(&100));
        assert_eq!(percents.len(), 101);
        assert!(percents.windows(2).all(|w| w[0] < w[1]));
        assert!(seen.iter().all(|&(phase, _)| phase == Phase::Slicing));
    }

    #[test]
    fn tracker_single_item_jumps_to_done() {
        let mut seen = Vec::new();
        let mut sink = |_: Phase, pct: u8| seen.push(pct);
        let mut tracker = ProgressTracker::new(Phase::ClosedLoops, 1);
        tracker.update(0, &mut sink);
        tracker.update(0, &mut sink);
        assert_eq!(seen, vec![100]);
    }

    #[test]
    fn no_progress_is_silent() {
        let mut tracker = ProgressTracker::new(Phase::OpenChains, 10);
        for i in 0..10 {
            tracker.update(i, &mut NoProgress);
        }
    }
}
