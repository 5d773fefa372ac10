// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Cooperative progress reporting and cancellation.
//!
//! Long-running passes poll a [`ProgressMonitor`] at checkpoints. The monitor
//! answers [`Progress::Stop`] to request cancellation; the pass then returns
//! [`Cancelled`] through its normal `Result` path, leaving all state touched
//! so far committed. There is no unwinding and no poisoning.

use std::fmt;

/// Answer from a monitor: keep going or stop at the next safe point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    Continue,
    Stop,
}

/// Receives fraction-complete reports in `[0.0, 1.0]`.
pub trait ProgressMonitor {
    fn report(&mut self, fraction: f64) -> Progress;
}

/// Monitor that ignores reports and never cancels.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentMonitor;

impl ProgressMonitor for SilentMonitor {
    fn report(&mut self, _fraction: f64) -> Progress {
        Progress::Continue
    }
}

/// A pass was stopped at a checkpoint. Work done before the checkpoint
/// stays applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cancelled;

impl fmt::Display for Cancelled {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("operation cancelled by progress monitor")
    }
}

impl std::error::Error for Cancelled {}

/// A sub-interval of the overall progress scale.
///
/// Composed passes give each phase a slice of their own range, so a nested
/// pass reporting `0.0..=1.0` locally maps onto the right portion of the
/// whole operation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressRange {
    start: f64,
    end: f64,
}

impl ProgressRange {
    pub fn new(start: f64, end: f64) -> Self {
        assert!(
            (0.0..=1.0).contains(&start) && (0.0..=1.0).contains(&end) && start <= end,
            "progress range must satisfy 0 <= start <= end <= 1"
        );
        Self { start, end }
    }

    /// The whole scale, `0.0..=1.0`.
    pub fn full() -> Self {
        Self { start: 0.0, end: 1.0 }
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn end(&self) -> f64 {
        self.end
    }

    /// Maps local completion `t` in `[0, 1]` into this range.
    pub fn at(&self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        self.start + (self.end - self.start) * t
    }

    /// The sub-range covering local `[a, b]` of this range.
    pub fn sub(&self, a: f64, b: f64) -> Self {
        Self::new(self.at(a), self.at(b))
    }

    /// Splits the range into `count` equal consecutive slices. A zero count
    /// yields no slices.
    pub fn slices(&self, count: usize) -> Vec<ProgressRange> {
        (0..count)
            .map(|i| {
                let step = 1.0 / count as f64;
                self.sub(i as f64 * step, (i + 1) as f64 * step)
            })
            .collect()
    }
}

/// Reports `fraction` and converts a stop answer into [`Cancelled`].
pub fn checkpoint(monitor: &mut dyn ProgressMonitor, fraction: f64) -> Result<(), Cancelled> {
    match monitor.report(fraction) {
        Progress::Continue => Ok(()),
        Progress::Stop => Err(Cancelled),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Allows `n` reports, then answers stop.
    pub(crate) struct StopAfter(pub usize);

    impl ProgressMonitor for StopAfter {
        fn report(&mut self, _fraction: f64) -> Progress {
            if self.0 == 0 {
                Progress::Stop
            } else {
                self.0 -= 1;
                Progress::Continue
            }
        }
    }

    #[test]
    fn range_maps_local_fractions() {
        let range = ProgressRange::new(0.2, 0.6);
        assert!((range.at(0.0) - 0.2).abs() < 1e-12);
        assert!((range.at(0.5) - 0.4).abs() < 1e-12);
        assert!((range.at(1.0) - 0.6).abs() < 1e-12);
    }

    #[test]
    fn sub_range_nests() {
        let outer = ProgressRange::new(0.0, 0.5);
        let inner = outer.sub(0.5, 1.0);
        assert!((inner.start() - 0.25).abs() < 1e-12);
        assert!((inner.end() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn slices_partition_the_range() {
        let slices = ProgressRange::full().slices(4);
        assert_eq!(slices.len(), 4);
        assert!((slices[0].start() - 0.0).abs() < 1e-12);
        assert!((slices[3].end() - 1.0).abs() < 1e-12);
        for pair in slices.windows(2) {
            assert!((pair[0].end() - pair[1].start()).abs() < 1e-12);
        }
    }

    #[test]
    #[should_panic(expected = "progress range")]
    fn inverted_range_panics() {
        let _ = ProgressRange::new(0.8, 0.2);
    }

    #[test]
    fn checkpoint_propagates_stop() {
        let mut monitor = StopAfter(1);
        assert!(checkpoint(&mut monitor, 0.1).is_ok());
        assert_eq!(checkpoint(&mut monitor, 0.2), Err(Cancelled));
    }
}
