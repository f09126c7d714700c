// Copyright © SixtyFPS GmbH <info@slint.dev>
// SPDX-License-Identifier: GPL-3.0-only OR LicenseRef-Slint-Royalty-free-2.0 OR LicenseRef-Slint-Software-3.0

#![warn(missing_docs)]
//! Time keeping and easing for scroll animations.
//!
//! The widget never reads the wall clock directly. All timestamps come from a [`Clock`],
//! which is the system clock in production and a mocked clock in tests, so that
//! animations and gesture timeouts can be stepped deterministically.

pub mod physics_simulation;

/// The representation of an easing curve, for scroll animations
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EasingCurve {
    /// The linear curve
    #[default]
    Linear,
    /// Fast start, then a long exponential tail, like a plate sliding through a viscous fluid.
    ViscousFluid,
}

/// Represent an instant, in milliseconds since the clock's origin
#[repr(transparent)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Ord, PartialOrd, Eq, Hash)]
pub struct Instant(pub u64);

impl core::ops::Sub<Instant> for Instant {
    type Output = core::time::Duration;
    fn sub(self, other: Self) -> core::time::Duration {
        core::time::Duration::from_millis(self.0.saturating_sub(other.0))
    }
}

impl core::ops::Sub<core::time::Duration> for Instant {
    type Output = Instant;
    fn sub(self, other: core::time::Duration) -> Instant {
        Self(self.0.saturating_sub(other.as_millis() as u64))
    }
}

impl core::ops::Add<core::time::Duration> for Instant {
    type Output = Instant;
    fn add(self, other: core::time::Duration) -> Instant {
        Self(self.0 + other.as_millis() as u64)
    }
}

impl core::ops::AddAssign<core::time::Duration> for Instant {
    fn add_assign(&mut self, other: core::time::Duration) {
        self.0 += other.as_millis() as u64;
    }
}

impl Instant {
    /// Returns the amount of time elapsed since an other instant.
    ///
    /// Equivalent to `self - earlier`, saturating at zero.
    pub fn duration_since(self, earlier: Instant) -> core::time::Duration {
        self - earlier
    }

    /// Return the number of milliseconds this `Instant` is after the clock origin
    pub fn as_millis(&self) -> u64 {
        self.0
    }
}

/// Source of monotonic time for the widget.
///
/// Implementations must never go backwards.
pub trait Clock {
    /// The current instant.
    fn now(&self) -> Instant;
}

/// The production clock, based on [`std::time::Instant`].
pub struct SystemClock {
    origin: std::time::Instant,
    slowdown: u64,
}

impl Default for SystemClock {
    fn default() -> Self {
        // Divides the perceived time, to watch animations in slow motion.
        let slowdown = std::env::var("WEBVIEW_SLOW_ANIMATIONS")
            .ok()
            .map(|val| val.parse().unwrap_or(2))
            .filter(|factor| *factor > 0)
            .unwrap_or(1);
        Self { origin: std::time::Instant::now(), slowdown }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant(self.origin.elapsed().as_millis() as u64 / self.slowdown)
    }
}

/// Sharpness of the [`EasingCurve::ViscousFluid`] curve.
const VISCOUS_FLUID_SCALE: f32 = 8.;

fn viscous_fluid(value: f32) -> f32 {
    let x = value * VISCOUS_FLUID_SCALE;
    if x < 1. {
        x - (1. - (-x).exp())
    } else {
        // Value of the first branch at x == 1.
        let start = (-1f32).exp();
        start + (1. - (1. - x).exp()) * (1. - start)
    }
}

/// map a value between 0 and 1 to another value between 0 and 1 according to the curve
pub fn easing_curve(curve: &EasingCurve, value: f32) -> f32 {
    match curve {
        EasingCurve::Linear => value,
        EasingCurve::ViscousFluid => {
            viscous_fluid(value.clamp(0., 1.)) / viscous_fluid(1.)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instant_arithmetic_saturates() {
        let a = Instant(100);
        let b = Instant(250);
        assert_eq!(b - a, core::time::Duration::from_millis(150));
        assert_eq!(a - b, core::time::Duration::ZERO);
        assert_eq!(a + core::time::Duration::from_millis(20), Instant(120));
    }

    #[test]
    fn viscous_fluid_is_monotonic_and_bounded() {
        let mut last = 0.;
        for i in 0..=40 {
            let v = easing_curve(&EasingCurve::ViscousFluid, i as f32 / 40.);
            assert!(v >= last, "{v} < {last}");
            assert!((0.0..=1.0001).contains(&v));
            last = v;
        }
        assert_eq!(easing_curve(&EasingCurve::ViscousFluid, 0.), 0.);
        assert!((easing_curve(&EasingCurve::ViscousFluid, 1.) - 1.).abs() < 1e-6);
        // Most of the distance is covered early.
        assert!(easing_curve(&EasingCurve::ViscousFluid, 0.5) > 0.9);
        assert_eq!(easing_curve(&EasingCurve::Linear, 0.25), 0.25);
    }
}
