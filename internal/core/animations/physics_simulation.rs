// Copyright © SixtyFPS GmbH <info@slint.dev>
// SPDX-License-Identifier: GPL-3.0-only OR LicenseRef-Slint-Royalty-free-2.0 OR LicenseRef-Slint-Software-3.0

//! Physical trajectories for scroll animations.

use crate::animations::Instant;
use crate::lengths::{Coord, ViewPoint, ViewVector, ViewVelocity};
use core::time::Duration;

/// A motion advanced in discrete steps.
pub trait Simulation {
    /// Advance to `now`, returning the new value and whether the simulation is over.
    fn step(&mut self, now: Instant) -> (ViewPoint, bool);
}

/// Parameters of a [`ConstantDeceleration`].
#[derive(Debug, Clone)]
pub struct ConstantDecelerationParameters {
    /// In pixels per second.
    pub initial_velocity: ViewVelocity,
    /// In pixels per second squared, always positive.
    pub deceleration: Coord,
}

impl ConstantDecelerationParameters {
    /// Build the simulation starting at `start_value`, never leaving the
    /// `min_value..=max_value` box.
    pub fn simulation(
        self,
        start_value: ViewPoint,
        min_value: ViewPoint,
        max_value: ViewPoint,
        now: Instant,
    ) -> ConstantDeceleration {
        ConstantDeceleration::new(start_value, min_value, max_value, self, now)
    }
}

/// A straight-line trajectory that slows down at a constant rate until it stops
/// or hits the limit box.
#[derive(Debug)]
pub struct ConstantDeceleration {
    start_value: ViewPoint,
    min_value: ViewPoint,
    max_value: ViewPoint,
    final_value: ViewPoint,
    curr_val: ViewPoint,
    /// Unit vector of the motion
    direction: ViewVector,
    initial_speed: Coord,
    data: ConstantDecelerationParameters,
    duration: Duration,
    start_time: Instant,
    finished: bool,
}

impl ConstantDeceleration {
    /// See [`ConstantDecelerationParameters::simulation`].
    pub fn new(
        start_value: ViewPoint,
        min_value: ViewPoint,
        max_value: ViewPoint,
        data: ConstantDecelerationParameters,
        now: Instant,
    ) -> Self {
        let initial_speed = data.initial_velocity.length();
        let deceleration = data.deceleration.max(Coord::EPSILON);
        let direction = if initial_speed > 0. {
            data.initial_velocity / initial_speed
        } else {
            ViewVector::zero()
        };
        let total_distance = initial_speed * initial_speed / (2. * deceleration);
        let duration = Duration::from_secs_f32(initial_speed / deceleration);
        let final_value =
            (start_value + direction * total_distance).round().clamp(min_value, max_value);
        Self {
            start_value,
            min_value,
            max_value,
            final_value,
            curr_val: start_value,
            direction,
            initial_speed,
            data,
            duration,
            start_time: now,
            finished: initial_speed <= 0.,
        }
    }

    /// Where the motion stops.
    pub fn final_value(&self) -> ViewPoint {
        self.final_value
    }

    /// Time until the motion stops if no limit is hit.
    pub fn duration(&self) -> Duration {
        self.duration
    }

    #[allow(missing_docs)]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// The speed along the trajectory at `now`, in pixels per second.
    pub fn current_speed(&self, now: Instant) -> Coord {
        if self.finished {
            return 0.;
        }
        let t = now.duration_since(self.start_time).as_secs_f32();
        (self.initial_speed - self.data.deceleration * t).max(0.)
    }

    /// The velocity vector at `now`.
    pub fn current_velocity(&self, now: Instant) -> ViewVelocity {
        self.direction * self.current_speed(now)
    }
}

impl Simulation for ConstantDeceleration {
    fn step(&mut self, now: Instant) -> (ViewPoint, bool) {
        if self.finished {
            return (self.curr_val, true);
        }
        let elapsed = now.duration_since(self.start_time);
        if elapsed >= self.duration {
            self.curr_val = self.final_value;
            self.finished = true;
            return (self.curr_val, true);
        }
        let t = elapsed.as_secs_f32();
        let distance = self.initial_speed * t - 0.5 * self.data.deceleration * t * t;
        self.curr_val = (self.start_value + self.direction * distance)
            .round()
            .clamp(self.min_value, self.max_value);
        if self.curr_val == self.final_value {
            self.finished = true;
        }
        (self.curr_val, self.finished)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(vx: f32, vy: f32) -> ConstantDecelerationParameters {
        ConstantDecelerationParameters {
            initial_velocity: ViewVelocity::new(vx, vy),
            deceleration: 1000.,
        }
    }

    #[test]
    fn decelerates_to_a_stop() {
        let mut sim = params(0., 1000.).simulation(
            ViewPoint::new(0., 0.),
            ViewPoint::new(0., 0.),
            ViewPoint::new(0., 10000.),
            Instant(0),
        );
        // v²/2a = 500
        assert_eq!(sim.final_value(), ViewPoint::new(0., 500.));
        assert_eq!(sim.duration(), Duration::from_secs(1));
        let (half, done) = sim.step(Instant(500));
        assert!(!done);
        assert_eq!(half, ViewPoint::new(0., 375.));
        assert!((sim.current_speed(Instant(500)) - 500.).abs() < 0.01);
        assert_eq!(sim.step(Instant(1000)), (ViewPoint::new(0., 500.), true));
        assert_eq!(sim.current_speed(Instant(1000)), 0.);
    }

    #[test]
    fn stops_at_the_limit() {
        let mut sim = params(-2000., 0.).simulation(
            ViewPoint::new(100., 0.),
            ViewPoint::new(0., 0.),
            ViewPoint::new(1000., 0.),
            Instant(0),
        );
        assert_eq!(sim.final_value(), ViewPoint::new(0., 0.));
        let (pos, done) = sim.step(Instant(200));
        assert_eq!(pos, ViewPoint::new(0., 0.));
        assert!(done);
    }

    #[test]
    fn zero_velocity_is_finished_immediately() {
        let sim = params(0., 0.).simulation(
            ViewPoint::new(5., 5.),
            ViewPoint::new(0., 0.),
            ViewPoint::new(10., 10.),
            Instant(0),
        );
        assert!(sim.is_finished());
        assert_eq!(sim.current_velocity(Instant(0)), ViewVelocity::zero());
    }
}
