// Copyright © SixtyFPS GmbH <info@slint.dev>
// SPDX-License-Identifier: GPL-3.0-only OR LicenseRef-Slint-Royalty-free-2.0 OR LicenseRef-Slint-Software-3.0

//! Pointer velocity estimation for flings.

use crate::animations::Instant;
use crate::lengths::{ViewPoint, ViewVelocity};
use core::time::Duration;

const HISTORY_SIZE: usize = 20;
/// Samples older than this (relative to the newest one) are ignored.
const HORIZON: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy)]
struct Sample {
    position: ViewPoint,
    time: Instant,
}

/// Records the recent pointer positions of a touch stream.
#[derive(Debug, Default)]
pub struct VelocityTracker {
    samples: Vec<Sample>,
}

impl VelocityTracker {
    pub fn add_movement(&mut self, position: ViewPoint, time: Instant) {
        if self.samples.len() == HISTORY_SIZE {
            self.samples.remove(0);
        }
        self.samples.push(Sample { position, time });
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    /// Velocity of the pointer in view pixels per second, estimated over the last
    /// [`HORIZON`] worth of samples.
    pub fn velocity(&self) -> ViewVelocity {
        let Some(newest) = self.samples.last() else {
            return ViewVelocity::zero();
        };
        let oldest = self
            .samples
            .iter()
            .find(|s| newest.time.duration_since(s.time) <= HORIZON)
            .unwrap_or(newest);
        let elapsed = newest.time.duration_since(oldest.time).as_secs_f32();
        if elapsed <= 0. {
            return ViewVelocity::zero();
        }
        (newest.position - oldest.position) / elapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_motion() {
        let mut tracker = VelocityTracker::default();
        for i in 0..10 {
            tracker.add_movement(ViewPoint::new(0., i as f32 * 10.), Instant(i * 10));
        }
        // 10px every 10ms
        let v = tracker.velocity();
        assert!((v.y - 1000.).abs() < 0.5, "{v:?}");
        assert_eq!(v.x, 0.);
    }

    #[test]
    fn old_samples_are_ignored() {
        let mut tracker = VelocityTracker::default();
        tracker.add_movement(ViewPoint::new(0., 0.), Instant(0));
        tracker.add_movement(ViewPoint::new(500., 0.), Instant(10));
        tracker.add_movement(ViewPoint::new(500., 0.), Instant(400));
        tracker.add_movement(ViewPoint::new(510., 0.), Instant(450));
        let v = tracker.velocity();
        assert!((v.x - 200.).abs() < 0.5, "{v:?}");
    }

    #[test]
    fn single_sample_has_no_velocity() {
        let mut tracker = VelocityTracker::default();
        assert_eq!(tracker.velocity(), ViewVelocity::zero());
        tracker.add_movement(ViewPoint::new(3., 4.), Instant(5));
        assert_eq!(tracker.velocity(), ViewVelocity::zero());
    }
}
