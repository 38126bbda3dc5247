//! Per-frame animation progress.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

/// Snapshot of the render clock handed to every `animate` call.
///
/// `linear` runs 0..=1 across the turn; the other curves are derived from
/// it so that every watcher eases the same way.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    /// Render clock in milliseconds. Drives pressure decay.
    pub now: f64,
    pub linear: f64,
    /// Ease in and out.
    pub sinusoidal: f64,
    /// Out and back: 0 at both ends, 1 at the midpoint.
    pub bounce: f64,
}

impl Progress {
    /// Progress at clock `now` (ms), `linear` of the way through the turn.
    #[must_use]
    pub fn at(now: f64, linear: f64) -> Self {
        let linear = linear.clamp(0.0, 1.0);
        Self {
            now,
            linear,
            sinusoidal: (1.0 - (linear * PI).cos()) / 2.0,
            bounce: (linear * PI).sin(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_curves_at_endpoints() {
        let start = Progress::at(0.0, 0.0);
        assert!(start.sinusoidal.abs() < 1e-9);
        assert!(start.bounce.abs() < 1e-9);

        let end = Progress::at(0.0, 1.0);
        assert!((end.sinusoidal - 1.0).abs() < 1e-9);
        assert!(end.bounce.abs() < 1e-9);

        let mid = Progress::at(0.0, 0.5);
        assert!((mid.sinusoidal - 0.5).abs() < 1e-9);
        assert!((mid.bounce - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_linear_is_clamped() {
        assert_eq!(Progress::at(5.0, 1.5).linear, 1.0);
        assert_eq!(Progress::at(5.0, -0.2).linear, 0.0);
    }
}
