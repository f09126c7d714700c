// Copyright © SixtyFPS GmbH <info@slint.dev>
// SPDX-License-Identifier: GPL-3.0-only OR LicenseRef-Slint-Royalty-free-2.0 OR LicenseRef-Slint-Software-3.0

//! The authoritative scroll offset of the page, and its animations.

use crate::animations::physics_simulation::{
    ConstantDeceleration, ConstantDecelerationParameters, Simulation,
};
use crate::animations::{easing_curve, EasingCurve, Instant};
use crate::config::GestureConfig;
use crate::lengths::{round_to_pixels, Coord, ViewPoint, ViewSize, ViewVector, ViewVelocity};
use core::time::Duration;

#[derive(Debug)]
enum ScrollAnimation {
    /// An eased animation towards a pinned target.
    Pinned { from: ViewPoint, to: ViewPoint, start_time: Instant, duration: Duration },
    Fling(ConstantDeceleration),
}

/// What happened during a [`Scroller::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollTick {
    /// No animation is running.
    Idle,
    /// The offset moved and the animation continues.
    Animating,
    /// The animation reached its end.
    Finished,
    /// The animation was aborted short of its end: a fling stopped moving, or the limits
    /// moved a scroll target out of reach.
    Stalled,
}

/// Scroll offset in view pixels, always on the pixel grid and within `[0, max_scroll]`.
#[derive(Debug)]
pub struct Scroller {
    offset: ViewPoint,
    max_scroll: ViewPoint,
    view_size: ViewSize,
    animation: Option<ScrollAnimation>,
    /// A fling stopped by [`Scroller::abort`] keeps reporting the velocity it would have.
    interrupted_fling: Option<ConstantDeceleration>,
    last_tick: Option<Instant>,
    standard_scroll_speed: Coord,
    max_scroll_duration: Duration,
    deceleration: Coord,
}

impl Scroller {
    pub fn new(config: &GestureConfig) -> Self {
        Self {
            offset: ViewPoint::zero(),
            max_scroll: ViewPoint::zero(),
            view_size: ViewSize::zero(),
            animation: None,
            interrupted_fling: None,
            last_tick: None,
            standard_scroll_speed: config.standard_scroll_speed,
            max_scroll_duration: config.max_scroll_duration,
            deceleration: config.fling_deceleration(),
        }
    }

    pub fn offset(&self) -> ViewPoint {
        self.offset
    }

    pub fn max_scroll(&self) -> ViewPoint {
        self.max_scroll
    }

    pub fn view_size(&self) -> ViewSize {
        self.view_size
    }

    pub fn can_scroll(&self) -> bool {
        self.max_scroll.x > 0. || self.max_scroll.y > 0.
    }

    /// Update the scrollable range from the document extent (in view pixels, zoom applied)
    /// and the size of the view. Returns true if the offset had to be moved back in range.
    pub fn set_limits(&mut self, content_extent: ViewSize, view_size: ViewSize) -> bool {
        self.view_size = view_size;
        self.max_scroll = ViewPoint::new(
            (content_extent.width - view_size.width).max(0.).round(),
            (content_extent.height - view_size.height).max(0.).round(),
        );
        let pinned = self.pin(self.offset);
        if pinned != self.offset {
            self.offset = pinned;
            return true;
        }
        false
    }

    /// Clamp a view point to the scrollable range.
    pub fn pin(&self, p: ViewPoint) -> ViewPoint {
        round_to_pixels(p).clamp(ViewPoint::zero(), self.max_scroll)
    }

    pub fn is_animating(&self) -> bool {
        self.animation.is_some()
    }

    /// Scroll to `target`, pinned to the scrollable range.
    ///
    /// Without `animate` the offset jumps and any running animation is aborted.
    /// Otherwise an eased animation of `duration_hint` starts, or of a duration derived
    /// from the distance when the hint is zero. Returns whether anything moved.
    pub fn pin_and_scroll_to(
        &mut self,
        target: ViewPoint,
        animate: bool,
        duration_hint: Duration,
        now: Instant,
    ) -> bool {
        let target = self.pin(target);
        let delta = target - self.offset;
        if delta == ViewVector::zero() {
            return false;
        }
        if !animate {
            self.abort();
            self.offset = target;
            return true;
        }
        let duration = if duration_hint.is_zero() {
            let distance = delta.x.abs().max(delta.y.abs());
            self.duration_for(distance)
        } else {
            duration_hint
        };
        self.stop();
        self.animation = Some(ScrollAnimation::Pinned {
            from: self.offset,
            to: target,
            start_time: now,
            duration,
        });
        self.last_tick = Some(now);
        true
    }

    /// Move the offset by `delta`, pinned. Any animation keeps running.
    pub fn scroll_by(&mut self, delta: ViewVector) -> bool {
        let target = self.pin(self.offset + delta);
        if target == self.offset {
            return false;
        }
        self.offset = target;
        true
    }

    /// Extend the running pinned animation by `dy` instead of restarting it.
    /// Returns false if there is no such animation.
    pub fn extend_scroll(&mut self, dy: Coord) -> bool {
        let extra = self.duration_for(dy.abs());
        let max_y = self.max_scroll.y;
        match &mut self.animation {
            Some(ScrollAnimation::Pinned { to, duration, .. }) => {
                to.y = (to.y + dy).round().clamp(0., max_y);
                *duration += extra;
                true
            }
            _ => false,
        }
    }

    /// Start a fling with `velocity` in view pixels per second (scroll direction).
    /// Returns false if the trajectory does not move the offset.
    pub fn fling(&mut self, velocity: ViewVelocity, now: Instant) -> bool {
        let simulation = ConstantDecelerationParameters {
            initial_velocity: velocity,
            deceleration: self.deceleration,
        }
        .simulation(self.offset, ViewPoint::zero(), self.max_scroll, now);
        if simulation.is_finished() || simulation.final_value() == self.offset {
            return false;
        }
        self.stop();
        self.animation = Some(ScrollAnimation::Fling(simulation));
        self.last_tick = Some(now);
        true
    }

    fn duration_for(&self, distance: Coord) -> Duration {
        let millis = (distance * 1000. / self.standard_scroll_speed).round() as u64;
        Duration::from_millis(millis).min(self.max_scroll_duration)
    }

    /// Velocity of the running fling, or of the fling interrupted by the last
    /// [`Self::abort`]. Zero when idle or running a pinned scroll.
    pub fn current_velocity(&self, now: Instant) -> ViewVelocity {
        match (&self.animation, &self.interrupted_fling) {
            (Some(ScrollAnimation::Fling(simulation)), _) => simulation.current_velocity(now),
            (None, Some(simulation)) => simulation.current_velocity(now),
            _ => ViewVelocity::zero(),
        }
    }

    /// Final offset of the running animation, or the current offset.
    pub fn final_offset(&self) -> ViewPoint {
        match &self.animation {
            Some(ScrollAnimation::Pinned { to, .. }) => *to,
            Some(ScrollAnimation::Fling(simulation)) => simulation.final_value(),
            None => self.offset,
        }
    }

    /// Stops the animation where it is. Calling it while idle does nothing.
    pub fn abort(&mut self) {
        if let Some(ScrollAnimation::Fling(simulation)) = self.animation.take() {
            self.interrupted_fling = Some(simulation);
        }
        self.last_tick = None;
    }

    fn stop(&mut self) {
        self.animation = None;
        self.interrupted_fling = None;
        self.last_tick = None;
    }

    pub fn tick(&mut self, now: Instant) -> ScrollTick {
        let Some(animation) = &mut self.animation else {
            return ScrollTick::Idle;
        };
        let (value, finished, target) = match animation {
            ScrollAnimation::Pinned { from, to, start_time, duration } => {
                let elapsed = now.duration_since(*start_time);
                if elapsed >= *duration || duration.is_zero() {
                    (*to, true, Some(*to))
                } else {
                    let progress = easing_curve(
                        &EasingCurve::ViscousFluid,
                        elapsed.as_secs_f32() / duration.as_secs_f32(),
                    );
                    (from.lerp(*to, progress), false, Some(*to))
                }
            }
            ScrollAnimation::Fling(simulation) => {
                let (value, finished) = simulation.step(now);
                (value, finished, None)
            }
        };
        let value = self.pin(value);
        let moved = value != self.offset;
        self.offset = value;
        if finished {
            self.stop();
            return ScrollTick::Finished;
        }
        // A pinned scroll ends on its target, or stalls once the limits keep it short of it.
        // Frames where the eased value rounds onto the same pixel are not a stall.
        if let Some(to) = target {
            let reachable = self.pin(to);
            if value == reachable {
                self.stop();
                return if reachable == to { ScrollTick::Finished } else { ScrollTick::Stalled };
            }
            self.last_tick = Some(now);
            return ScrollTick::Animating;
        }
        let time_passed = self.last_tick.is_none_or(|last| now > last);
        self.last_tick = Some(now);
        if !moved && time_passed {
            self.stop();
            return ScrollTick::Stalled;
        }
        ScrollTick::Animating
    }
}
