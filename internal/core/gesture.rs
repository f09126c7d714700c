// Copyright © SixtyFPS GmbH <info@slint.dev>
// SPDX-License-Identifier: GPL-3.0-only OR LicenseRef-Slint-Royalty-free-2.0 OR LicenseRef-Slint-Software-3.0

/*!
State of the touch gesture currently being interpreted.

The transitions live in [`crate::webview`]; this module holds the data they act on
and the pieces of the decision logic that do not need the rest of the widget.
*/

use crate::animations::Instant;
use crate::config::GestureConfig;
use crate::lengths::{ContentPoint, ContentVector, Coord, ViewPoint, ViewVector, ViewVelocity};
use crate::timers::TimerId;

/// How the current touch stream is being interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum TouchMode {
    /// Down, no movement beyond the slop yet.
    Init,
    /// Down while a scroll animation was running: the next movement drags without slop.
    DragStart,
    /// Panning the page.
    Drag,
    /// Held past the short press timeout; the tap highlight is shown.
    ShortPressStart,
    /// Held past the short press timeout, without highlight.
    ShortPress,
    /// Second down of a double tap.
    DoubleTap,
    /// Nothing more to do for this stream.
    Done,
    /// A second pointer went down; the scale gesture detector is in charge.
    PinchDrag,
    /// Panning a scrollable layer of the page.
    DragLayer,
}

/// Whether the render core claimed the touch stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum PreventDefault {
    NotForwarded,
    /// An answer is pending; dragging and flinging wait for it.
    MaybeYes,
    /// Claimed. No local effect may be applied.
    Yes,
    /// Declined, or not answered in time.
    No,
}

/// The forwarded event a pending decision is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
pub enum DecisionKind {
    Down,
    Move,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingDecision {
    pub sequence: u64,
    pub timer: TimerId,
}

/// At most one outstanding decision per kind.
#[derive(Debug, Clone, Default)]
pub struct PendingDecisions {
    down: Option<PendingDecision>,
    moved: Option<PendingDecision>,
}

impl PendingDecisions {
    pub fn get(&self, kind: DecisionKind) -> Option<PendingDecision> {
        match kind {
            DecisionKind::Down => self.down,
            DecisionKind::Move => self.moved,
        }
    }

    /// Store `decision`, returning the one it replaces.
    pub fn insert(&mut self, kind: DecisionKind, decision: PendingDecision) -> Option<PendingDecision> {
        self.slot(kind).replace(decision)
    }

    pub fn take(&mut self, kind: DecisionKind) -> Option<PendingDecision> {
        self.slot(kind).take()
    }

    /// The kind of the decision waiting for `sequence`.
    pub fn find(&self, sequence: u64) -> Option<DecisionKind> {
        [DecisionKind::Down, DecisionKind::Move]
            .into_iter()
            .find(|kind| self.get(*kind).is_some_and(|d| d.sequence == sequence))
    }

    pub fn is_empty(&self) -> bool {
        self.down.is_none() && self.moved.is_none()
    }

    /// Remove everything, returning the timers that guarded the decisions.
    pub fn clear(&mut self) -> impl Iterator<Item = TimerId> + use<> {
        [self.down.take(), self.moved.take()].into_iter().flatten().map(|d| d.timer)
    }

    fn slot(&mut self, kind: DecisionKind) -> &mut Option<PendingDecision> {
        match kind {
            DecisionKind::Down => &mut self.down,
            DecisionKind::Move => &mut self.moved,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapAxis {
    X,
    Y,
}

/// Restriction of a drag to one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SnapScroll {
    #[default]
    None,
    Snapped {
        axis: SnapAxis,
        /// Direction of the scroll delta when the snap was decided.
        positive: bool,
        /// Reversing direction locks the snap: it can no longer break.
        locked: bool,
    },
}

impl SnapScroll {
    /// Snap for a drag starting with `delta`, in scroll direction.
    pub fn classify(delta: ViewVector, config: &GestureConfig) -> Self {
        let (ax, ay) = (delta.x.abs(), delta.y.abs());
        if ax > config.max_slope_for_diagonal * ay {
            Self::Snapped { axis: SnapAxis::X, positive: delta.x > 0., locked: false }
        } else if ay > config.max_slope_for_diagonal * ax {
            Self::Snapped { axis: SnapAxis::Y, positive: delta.y > 0., locked: false }
        } else {
            Self::None
        }
    }

    /// Apply the hysteresis for the next drag `delta`. A large perpendicular excursion
    /// breaks an unlocked snap; travel back along the axis locks it.
    pub fn update(&mut self, delta: ViewVector, config: &GestureConfig) {
        let Self::Snapped { axis, positive, locked } = self else { return };
        if *locked {
            return;
        }
        let (along, across) = match axis {
            SnapAxis::X => (delta.x, delta.y),
            SnapAxis::Y => (delta.y, delta.x),
        };
        let slope = config.max_slope_for_diagonal;
        if across.abs() > slope * along.abs() && across.abs() > config.min_break_snap_cross_distance
        {
            *self = Self::None;
            return;
        }
        let reverse = config.min_lock_snap_reverse_distance;
        if along.abs() > slope * across.abs()
            && ((*positive && along < -reverse) || (!*positive && along > reverse))
        {
            *locked = true;
        }
    }

    pub fn axis(&self) -> Option<SnapAxis> {
        match self {
            Self::None => None,
            Self::Snapped { axis, .. } => Some(*axis),
        }
    }

    /// Zero the component of `v` perpendicular to the snap axis.
    pub fn restrict(&self, mut v: ViewVector) -> ViewVector {
        match self.axis() {
            Some(SnapAxis::X) => v.y = 0.,
            Some(SnapAxis::Y) => v.x = 0.,
            None => {}
        }
        v
    }
}

/// A scrollable layer being dragged.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerDrag {
    pub id: u64,
    pub scroll: ContentPoint,
    pub max_scroll: ContentPoint,
}

impl LayerDrag {
    /// Scroll the layer by `delta` content pixels, returning the part it could not absorb.
    pub fn scroll_by(&mut self, delta: ContentVector) -> ContentVector {
        let target = self.scroll + delta;
        let pinned = target.clamp(ContentPoint::zero(), self.max_scroll);
        let remainder = target - pinned;
        self.scroll = pinned;
        remainder
    }
}

/// One pointer-down to up or cancel sequence.
#[derive(Debug, Clone)]
pub struct TouchSession {
    pub mode: TouchMode,
    /// View position of the down.
    pub anchor: ViewPoint,
    /// Position the next drag delta is measured from.
    pub last_position: ViewPoint,
    /// Time of the last event of the stream.
    pub last_time: Instant,
    /// Sub-pixel part of the drag not applied yet.
    pub remainder: ViewVector,
    pub prevent_default: PreventDefault,
    /// The pointer travelled beyond the touch slop.
    pub confirmed: bool,
    pub snap: SnapScroll,
    pub layer: Option<LayerDrag>,
    /// The render core gets the raw stream and returns what it does not consume.
    pub deferred: bool,
    /// A down or move was sent to the render core.
    pub forwarded: bool,
    pub moves_forwarded: u32,
    pub last_forwarded_move: Option<Instant>,
    pub pending: PendingDecisions,
    /// This stream moves an end point of the selection.
    pub selecting: bool,
    /// A tap of this stream dismisses the selection.
    pub dismisses_selection: bool,
    /// The tap highlight is on screen.
    pub highlighted: bool,
}

impl TouchSession {
    pub fn new(mode: TouchMode, position: ViewPoint, time: Instant) -> Self {
        Self {
            mode,
            anchor: position,
            last_position: position,
            last_time: time,
            remainder: ViewVector::zero(),
            prevent_default: PreventDefault::NotForwarded,
            confirmed: false,
            snap: SnapScroll::None,
            layer: None,
            deferred: false,
            forwarded: false,
            moves_forwarded: 0,
            last_forwarded_move: None,
            pending: PendingDecisions::default(),
            selecting: false,
            dismisses_selection: false,
            highlighted: false,
        }
    }

    pub fn is_claimed(&self) -> bool {
        self.prevent_default == PreventDefault::Yes
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.mode, TouchMode::Drag | TouchMode::DragLayer)
    }

    /// Still in one of the modes from which a tap can be committed.
    pub fn is_press(&self) -> bool {
        matches!(self.mode, TouchMode::Init | TouchMode::ShortPressStart | TouchMode::ShortPress)
    }

    /// Take the whole-pixel part of `delta` plus the pending remainder, keeping the rest.
    pub fn take_whole_pixels(&mut self, delta: ViewVector) -> ViewVector {
        let total = delta + self.remainder;
        let whole = ViewVector::new(total.x.trunc(), total.y.trunc());
        self.remainder = total - whole;
        whole
    }
}

/// Velocity of the last fling, for the acceleration of a fling launched while the
/// previous one is still running.
#[derive(Debug, Clone, Default)]
pub struct FlingHistory {
    last_velocity: ViewVelocity,
}

impl FlingHistory {
    /// The velocity to launch for a new fling of `velocity` while the running fling
    /// moves at `current_speed`. Records the result as the new last velocity.
    pub fn carry_over(
        &mut self,
        mut velocity: ViewVelocity,
        current_speed: Coord,
        config: &GestureConfig,
    ) -> ViewVelocity {
        let last_speed = self.last_velocity.length();
        let speed = velocity.length();
        if last_speed > 0.
            && current_speed > 0.
            && speed > last_speed * config.min_velocity_ratio_for_acceleration
        {
            let last_angle = self.last_velocity.y.atan2(self.last_velocity.x);
            let angle = velocity.y.atan2(velocity.x);
            let delta = (last_angle - angle).abs();
            let circle = core::f32::consts::TAU;
            if delta > circle * 0.9 || delta < circle * 0.1 {
                velocity += self.last_velocity * (current_speed / last_speed);
            }
        }
        self.last_velocity = velocity;
        velocity
    }

    pub fn reset(&mut self) {
        self.last_velocity = ViewVelocity::zero();
    }
}
