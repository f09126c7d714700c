// Copyright © SixtyFPS GmbH <info@slint.dev>
// SPDX-License-Identifier: GPL-3.0-only OR LicenseRef-Slint-Royalty-free-2.0 OR LicenseRef-Slint-Software-3.0

//! Touch gesture disambiguation.
//!
//! Every pointer stream goes through the modes of [`TouchMode`]. When the page has
//! touch handlers, the events are also forwarded to the render core, and dragging
//! waits until the page declined them (or did not answer in time).

use super::{GestureTimer, PendingTap, WebView};
use crate::animations::Instant;
use crate::gesture::{
    DecisionKind, LayerDrag, PendingDecision, PreventDefault, SnapAxis, SnapScroll, TouchMode,
    TouchSession,
};
use crate::input::{PointerEvent, PointerEventKind, ScaleGestureEvent, ScaleGesturePhase};
use crate::lengths::{distance_squared, ViewPoint, ViewVector};
use crate::render_core::{CoreMessage, CoreMessageKind, TouchAction};
use crate::velocity::VelocityTracker;

impl WebView {
    /// Handle a pointer event from the platform.
    pub fn process_pointer_event(&mut self, event: PointerEvent) {
        self.meta_state = event.modifiers.meta_state();
        match event.kind {
            PointerEventKind::Down => self.touch_down(event.position, event.time),
            PointerEventKind::Move => self.with_session(|this, session| {
                this.touch_move(session, event.position, event.time)
            }),
            PointerEventKind::Up => self.touch_up(event.position, event.time),
            PointerEventKind::Cancel => self.touch_cancel(),
            PointerEventKind::PointerDown => self.start_pinch(),
            PointerEventKind::PointerUp => self.with_session(|this, session| {
                this.pointer_up(session, event.position, event.time)
            }),
        }
    }

    /// Handle an event of the platform's scale gesture detector.
    pub fn process_scale_gesture(&mut self, event: ScaleGestureEvent) {
        match event.phase {
            ScaleGesturePhase::Begin => {
                self.start_pinch();
                if self.touch_mode() == Some(TouchMode::PinchDrag) {
                    self.pinch_focus = Some(event.focus);
                }
            }
            ScaleGesturePhase::Update => {
                let Some(last_focus) = self.pinch_focus else { return };
                let anchor = self.view_to_content(last_focus);
                if self.zoom.apply_scale_factor(event.scale_factor) {
                    self.update_scroll_limits();
                }
                let target = self.zoom.to_view(anchor) - event.focus.to_vector();
                self.jump_to(target, false);
                self.pinch_focus = Some(event.focus);
                self.host.request_redraw();
            }
            ScaleGesturePhase::End => {
                if self.pinch_focus.take().is_some() {
                    self.report_scroll_offset();
                }
            }
        }
    }

    /// Run `f` on the active session, if any.
    fn with_session(&mut self, f: impl FnOnce(&mut Self, &mut TouchSession)) {
        if let Some(mut session) = self.touch.take() {
            f(self, &mut session);
            self.touch = Some(session);
        }
    }

    fn touch_down(&mut self, position: ViewPoint, time: Instant) {
        let now = self.clock.now();
        if let Some(mut stale) = self.touch.take() {
            log::debug!("Touch down while a stream in {} was still active", stale.mode);
            self.end_session(&mut stale);
        }

        // A touch catching a running animation is never the second tap of a double tap.
        let catching = self.scroller.is_animating();
        let mut double_tap = false;
        if let Some(tap) = self.pending_tap.take() {
            self.timers.stop_where(|timer| *timer == GestureTimer::ReleaseSingleTap);
            if !catching
                && !tap.claimed
                && distance_squared(tap.position, position) < self.config.double_tap_slop_squared()
            {
                double_tap = true;
            } else {
                self.commit_tap(tap.position, tap.claimed);
            }
        }

        let content = self.view_to_content(position);
        let mut session = if catching {
            // Catching a running animation: the next movement drags right away.
            self.scroller.abort();
            let mut session = TouchSession::new(TouchMode::DragStart, position, time);
            session.confirmed = true;
            session
        } else if double_tap {
            TouchSession::new(TouchMode::DoubleTap, position, time)
        } else {
            TouchSession::new(TouchMode::Init, position, time)
        };
        let deferred = self.full_screen
            || self.frames.hit_nav_node(content, self.config.nav_slop).is_some_and(|node| node.is_plugin);
        // Nothing reaches the page while selecting, so nothing waits for its answer.
        let selecting = self.selection.is_active();
        session.deferred = deferred && !selecting;
        session.prevent_default = if selecting {
            PreventDefault::NotForwarded
        } else if session.deferred {
            PreventDefault::Yes
        } else if self.touch_handlers {
            PreventDefault::MaybeYes
        } else {
            PreventDefault::No
        };

        if selecting {
            if self.selection.is_extending()
                && !self.selection.contains(content, self.config.nav_slop)
            {
                session.dismisses_selection = true;
            } else if let Some(message) = self.selection.start_at(content) {
                self.channel.send(message);
                session.selecting = true;
            }
        }

        let mut tracker = VelocityTracker::default();
        tracker.add_movement(position, time);
        self.velocity = Some(tracker);

        if self.should_forward(&session) {
            if session.deferred {
                self.reprocess_positions.clear();
            }
            let sequence =
                self.forward_touch(&mut session, TouchAction::Down, position);
            if session.prevent_default == PreventDefault::MaybeYes {
                self.open_decision(&mut session, DecisionKind::Down, sequence, now);
            }
        }

        if !session.selecting && matches!(session.mode, TouchMode::Init | TouchMode::DoubleTap) {
            self.timers.start(GestureTimer::ShortPress, self.config.short_press_timeout, now);
            self.timers.start(GestureTimer::LongPress, self.config.long_press_timeout, now);
            if !session.deferred {
                self.highlight = None;
                self.channel.send_delayed(
                    CoreMessage::RequestTouchHighlight { position: content, slop: self.config.nav_slop },
                    self.config.short_press_timeout,
                    now,
                );
            }
        }

        self.last_touch = Some((position, time));
        self.touch = Some(session);
    }

    fn touch_move(&mut self, session: &mut TouchSession, position: ViewPoint, time: Instant) {
        if let Some(tracker) = &mut self.velocity {
            tracker.add_movement(position, time);
        }
        self.last_touch = Some((position, time));

        if session.selecting {
            let content = self.view_to_content(position);
            if self.selection.is_started() {
                if let Some(message) = self.selection.extend_to(content) {
                    self.channel.send(message);
                    self.host.request_redraw();
                }
            }
            return;
        }

        if !session.confirmed {
            if distance_squared(session.anchor, position) < self.config.touch_slop_squared() {
                return;
            }
            self.confirm_move(session);
        }

        if self.should_forward(session) {
            self.forward_move(session, position, time);
        }

        if matches!(session.mode, TouchMode::Done | TouchMode::PinchDrag) || session.is_claimed() {
            return;
        }
        if session.prevent_default == PreventDefault::MaybeYes {
            session.last_time = time;
            return;
        }

        if session.is_dragging() {
            self.drag(session, position, time);
        } else {
            self.start_drag(session, position, time);
        }
    }

    /// The pointer left the touch slop: it is no longer a tap or a press.
    fn confirm_move(&mut self, session: &mut TouchSession) {
        session.confirmed = true;
        self.stop_press_timers();
        self.hide_highlight(session);
        if session.mode == TouchMode::DoubleTap {
            session.mode = TouchMode::Init;
        }
    }

    /// Forward a move, at most one per touch interval. The first one asks for a decision.
    fn forward_move(&mut self, session: &mut TouchSession, position: ViewPoint, time: Instant) {
        let first = session.moves_forwarded == 0;
        if !first
            && session
                .last_forwarded_move
                .is_some_and(|last| time.duration_since(last) < self.config.touch_interval)
        {
            return;
        }
        if first && session.prevent_default == PreventDefault::No {
            // The page may still claim the stream from its move handler.
            session.prevent_default = PreventDefault::MaybeYes;
        }
        let sequence = self.forward_touch(session, TouchAction::Move, position);
        session.moves_forwarded += 1;
        session.last_forwarded_move = Some(time);
        if first && session.prevent_default == PreventDefault::MaybeYes {
            let now = self.clock.now();
            self.open_decision(session, DecisionKind::Move, sequence, now);
        }
    }

    fn start_drag(&mut self, session: &mut TouchSession, position: ViewPoint, time: Instant) {
        session.snap = SnapScroll::classify(session.anchor - position, &self.config);
        session.layer = self.frames.hit_layer(self.view_to_content(session.anchor)).map(|layer| {
            LayerDrag { id: layer.id, scroll: layer.scroll, max_scroll: layer.max_scroll }
        });
        session.mode =
            if session.layer.is_some() { TouchMode::DragLayer } else { TouchMode::Drag };
        log::debug!("Drag started in {} mode, snap {:?}", session.mode, session.snap.axis());
        session.last_position = position;
        session.remainder = ViewVector::zero();
        session.last_time = time;
        self.reduce_priority();
    }

    fn drag(&mut self, session: &mut TouchSession, position: ViewPoint, time: Instant) {
        let delta = session.last_position - position;
        session.snap.update(delta, &self.config);
        let delta = session.snap.restrict(delta);
        // The axis a snap ignores keeps measuring from where the snap started.
        match session.snap.axis() {
            Some(SnapAxis::X) => session.last_position.x = position.x,
            Some(SnapAxis::Y) => session.last_position.y = position.y,
            None => session.last_position = position,
        }
        session.last_time = time;
        let delta = session.take_whole_pixels(delta);
        if delta != ViewVector::zero() {
            self.apply_drag(session, delta);
        }
    }

    fn apply_drag(&mut self, session: &mut TouchSession, mut delta: ViewVector) {
        if let Some(layer) = &mut session.layer {
            let scale = self.zoom.scale();
            let content_delta = scale.inverse().transform_vector(delta);
            let remainder = layer.scroll_by(content_delta);
            if remainder != content_delta {
                self.channel.send(CoreMessage::ScrollLayer { layer: layer.id, scroll: layer.scroll });
            }
            delta = scale.transform_vector(remainder);
        }
        if self.scroller.scroll_by(delta) {
            self.scroll_changed();
        }
    }

    fn touch_up(&mut self, position: ViewPoint, time: Instant) {
        let Some(mut session) = self.touch.take() else { return };
        let now = self.clock.now();
        if let Some(tracker) = &mut self.velocity {
            tracker.add_movement(position, time);
        }
        if self.should_forward(&session) {
            self.forward_touch(&mut session, TouchAction::Up, position);
        }
        self.stop_press_timers();

        match session.mode {
            TouchMode::DoubleTap => {
                if session.deferred {
                    self.forward_touch(&mut session, TouchAction::DoubleTap, position);
                } else if !session.is_claimed() {
                    self.double_tap_zoom(session.anchor);
                }
            }
            TouchMode::Init | TouchMode::ShortPressStart | TouchMode::ShortPress => {
                self.release_press(&mut session, time, now)
            }
            TouchMode::Drag => self.end_drag(&session, time, now),
            TouchMode::DragLayer | TouchMode::DragStart | TouchMode::PinchDrag => {
                self.settle_scroll()
            }
            TouchMode::Done => {}
        }

        self.end_session(&mut session);
    }

    fn release_press(&mut self, session: &mut TouchSession, time: Instant, now: Instant) {
        if session.confirmed {
            // Moved while the page was deciding: scroll now that the stream is ours.
            if !session.is_claimed() && self.scroller.can_scroll() {
                self.reduce_priority();
                self.end_drag(session, time, now);
            }
        } else if session.dismisses_selection {
            self.dismiss_selection();
        } else if session.selecting {
            // The stream moved a selection handle.
        } else if session.is_claimed() {
            log::debug!("Tap at {:?} consumed by the page", session.anchor);
        } else if session.mode == TouchMode::Init
            && (self.zoom.can_zoom_in()
                || self.zoom.can_zoom_out()
                || session.prevent_default == PreventDefault::MaybeYes)
        {
            // Wait for a second tap, or for the page's answer to the down.
            self.pending_tap = Some(PendingTap {
                position: session.anchor,
                down_sequence: session.pending.get(DecisionKind::Down).map(|d| d.sequence),
                claimed: false,
            });
            self.timers.start(GestureTimer::ReleaseSingleTap, self.config.double_tap_timeout, now);
        } else {
            self.commit_tap(session.anchor, false);
        }
    }

    /// Fling if the pointer was still moving when it went up, otherwise settle.
    fn end_drag(&mut self, session: &TouchSession, time: Instant, now: Instant) {
        if time.duration_since(session.last_time) <= self.config.fling_window {
            self.fling_from_touch(session, now);
        } else {
            self.fling_history.reset();
            self.settle_scroll();
        }
    }

    fn fling_from_touch(&mut self, session: &TouchSession, now: Instant) {
        let Some(tracker) = self.velocity.take() else {
            log::warn!("Drag ended without velocity samples");
            self.settle_scroll();
            return;
        };
        let velocity =
            session.snap.restrict(tracker.velocity() * self.config.fling_velocity_scale);
        let max = self.scroller.max_scroll();
        if (max.x == 0. && velocity.y == 0.) || (max.y == 0. && velocity.x == 0.) {
            self.settle_scroll();
            return;
        }
        let current_speed = self.scroller.current_velocity(now).length();
        // The finger moves the opposite way of the scroll offset.
        let velocity = self.fling_history.carry_over(-velocity, current_speed, &self.config);
        if self.scroller.fling(velocity, now) {
            log::debug!("Fling at {velocity:?} px/s");
            self.host.request_redraw();
        } else {
            self.settle_scroll();
        }
    }

    fn touch_cancel(&mut self) {
        let Some(mut session) = self.touch.take() else { return };
        if session.forwarded {
            let position = session.last_position;
            self.forward_touch(&mut session, TouchAction::Cancel, position);
        }
        self.stop_press_timers();
        if session.is_dragging()
            || matches!(session.mode, TouchMode::DragStart | TouchMode::PinchDrag)
        {
            self.settle_scroll();
        }
        self.end_session(&mut session);
    }

    /// A second pointer went down: hand over to the scale gesture.
    fn start_pinch(&mut self) {
        let Some(mut session) = self.touch.take() else { return };
        if session.is_claimed() || session.mode == TouchMode::PinchDrag {
            self.touch = Some(session);
            return;
        }
        if session.forwarded {
            let position = session.last_position;
            self.forward_touch(&mut session, TouchAction::Cancel, position);
        }
        self.stop_press_timers();
        self.clear_decisions(&mut session);
        self.hide_highlight(&mut session);
        if session.selecting {
            self.selection.finish_touch();
            session.selecting = false;
        }
        session.prevent_default = PreventDefault::NotForwarded;
        self.reduce_priority();
        self.scroller.abort();
        session.mode = TouchMode::PinchDrag;
        session.confirmed = true;
        self.touch = Some(session);
    }

    /// One of two pointers went up: keep panning with the other one.
    fn pointer_up(&mut self, session: &mut TouchSession, position: ViewPoint, time: Instant) {
        if session.mode != TouchMode::PinchDrag {
            return;
        }
        self.pinch_focus = None;
        session.mode = TouchMode::Drag;
        session.snap = SnapScroll::None;
        session.last_position = position;
        session.last_time = time;
        session.remainder = ViewVector::zero();
        let mut tracker = VelocityTracker::default();
        tracker.add_movement(position, time);
        self.velocity = Some(tracker);
    }

    /// Tear down what a finished stream left behind.
    fn end_session(&mut self, session: &mut TouchSession) {
        self.stop_press_timers();
        self.clear_decisions(session);
        self.hide_highlight(session);
        if session.selecting {
            self.selection.finish_touch();
        }
        self.velocity = None;
    }

    pub(super) fn long_press(&mut self, session: &mut TouchSession) {
        if session.deferred {
            let anchor = session.anchor;
            self.forward_touch(session, TouchAction::LongPress, anchor);
            return;
        }
        if session.is_claimed() || !(session.is_press() || session.mode == TouchMode::DoubleTap) {
            return;
        }
        session.mode = TouchMode::Done;
        self.hide_highlight(session);
        let content = self.view_to_content(session.anchor);
        if !self.host.long_press(content) && self.begin_selection_at(content, true) {
            session.selecting = true;
        }
    }

    /// Send the tap at `position` to the page, unless the page claimed it.
    pub(super) fn commit_tap(&mut self, position: ViewPoint, claimed: bool) {
        if claimed {
            log::debug!("Tap at {position:?} consumed by the page");
            return;
        }
        let content = self.view_to_content(position);
        let (frame, node) = self
            .frames
            .hit_nav_node(content, self.config.nav_slop)
            .map_or((0, 0), |node| (node.frame, node.node));
        self.tap_generation += 1;
        self.channel.send(CoreMessage::TouchUp {
            generation: self.tap_generation,
            frame,
            node,
            x: content.x,
            y: content.y,
        });
        self.host.click(content);
    }

    fn should_forward(&self, session: &TouchSession) -> bool {
        (self.touch_handlers || self.full_screen || session.deferred)
            && !self.selection.is_active()
            && session.prevent_default != PreventDefault::NotForwarded
    }

    /// Send a touch event of the stream to the render core. Returns its sequence number.
    ///
    /// Events of deferred streams are sent back by the core if the page does not use them.
    fn forward_touch(
        &mut self,
        session: &mut TouchSession,
        action: TouchAction,
        position: ViewPoint,
    ) -> u64 {
        let reprocess = session.deferred;
        self.sequence += 1;
        if reprocess {
            self.reprocess_positions.push_back((self.sequence, position));
        }
        self.channel.send(CoreMessage::TouchEvent {
            sequence: self.sequence,
            action,
            points: vec![self.view_to_content(position)],
            meta_state: self.meta_state,
            reprocess,
        });
        if matches!(action, TouchAction::Down | TouchAction::Move) {
            session.forwarded = true;
        }
        self.sequence
    }

    fn open_decision(
        &mut self,
        session: &mut TouchSession,
        kind: DecisionKind,
        sequence: u64,
        now: Instant,
    ) {
        let timer = self.timers.start(
            GestureTimer::PreventDefaultTimeout(kind),
            self.config.prevent_default_timeout,
            now,
        );
        if let Some(previous) = session.pending.insert(kind, PendingDecision { sequence, timer }) {
            self.timers.stop(previous.timer);
        }
    }

    /// The page answered the `kind` event (or did not in time, with `claimed` false).
    /// A claim sticks for the rest of the stream.
    pub(super) fn apply_decision(
        &mut self,
        session: &mut TouchSession,
        kind: DecisionKind,
        claimed: bool,
    ) {
        session.prevent_default = if claimed || session.is_claimed() {
            PreventDefault::Yes
        } else if !session.pending.is_empty() {
            PreventDefault::MaybeYes
        } else {
            PreventDefault::No
        };
        log::debug!("Decision for the {kind} event: {}", session.prevent_default);
        if session.is_claimed() {
            self.hide_highlight(session);
        }
    }

    fn clear_decisions(&mut self, session: &mut TouchSession) {
        for timer in session.pending.clear() {
            self.timers.stop(timer);
        }
    }

    fn stop_press_timers(&mut self) {
        self.timers.stop_where(|timer| {
            matches!(timer, GestureTimer::ShortPress | GestureTimer::LongPress)
        });
        self.channel.cancel_pending(CoreMessageKind::RequestTouchHighlight);
    }
}
