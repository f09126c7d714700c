// Copyright © SixtyFPS GmbH <info@slint.dev>
// SPDX-License-Identifier: GPL-3.0-only OR LicenseRef-Slint-Royalty-free-2.0 OR LicenseRef-Slint-Software-3.0

//! Handling of the render core's replies on the UI thread.

use super::{DeferredMode, DeferredTouch, WebView};
use crate::frame::{ContentFrame, FrameUpdate};
use crate::gesture::TouchMode;
use crate::lengths::{distance_squared, ContentPoint, ViewPoint};
use crate::render_core::{CoreReply, TouchAction};
use core::time::Duration;

impl WebView {
    /// Handle every reply the render core posted since the last call.
    pub fn dispatch_render_core_replies(&mut self) {
        while let Some(reply) = self.channel.try_recv() {
            self.handle_reply(reply);
        }
    }

    /// Block for at most `timeout` until the render core replies, then handle that reply
    /// and every other one already posted. Returns false if nothing arrived in time.
    pub fn wait_for_render_core(&mut self, timeout: Duration) -> bool {
        let Some(reply) = self.channel.recv_timeout(timeout) else { return false };
        self.handle_reply(reply);
        self.dispatch_render_core_replies();
        true
    }

    fn handle_reply(&mut self, reply: CoreReply) {
        match reply {
            CoreReply::PreventTouch { sequence, action, claimed } => {
                self.prevent_touch(sequence, action, claimed)
            }
            CoreReply::NewFrame(frame) => self.new_frame(frame),
            CoreReply::SelectionRange { generation, start, end, text } => {
                if self.selection.apply_range(generation, start, end, text) {
                    self.host.request_redraw();
                } else {
                    log::debug!("Dropping stale selection range {generation}");
                }
            }
            CoreReply::ScrollTo { position } => {
                let target = self.zoom.to_view(position);
                self.jump_to(target, true);
            }
            CoreReply::ScrollBy { delta, animate } => {
                let target = self.scroller.offset() + self.zoom.scale().transform_vector(delta);
                if animate {
                    self.animate_scroll_to(target);
                } else {
                    self.jump_to(target, true);
                }
            }
            CoreReply::ReprocessTouch { sequence, action, position } => {
                self.reprocess_touch(sequence, action, position)
            }
            CoreReply::CursorBounds(bounds) => self.cursor_bounds = bounds,
            CoreReply::TouchHighlight(rect) => {
                self.highlight = rect;
                let Some(mut session) = self.touch.take() else { return };
                if session.mode == TouchMode::ShortPressStart && !session.is_claimed() {
                    if rect.is_some() {
                        self.show_highlight(&mut session);
                    } else {
                        self.hide_highlight(&mut session);
                    }
                }
                self.touch = Some(session);
            }
            CoreReply::SetTouchHandlers(enabled) => self.touch_handlers = enabled,
        }
    }

    /// The page answered whether it consumed the touch event with `sequence`.
    fn prevent_touch(&mut self, sequence: u64, action: TouchAction, claimed: bool) {
        if let Some(mut session) = self.touch.take() {
            let kind = session.pending.find(sequence);
            if let Some(kind) = kind {
                if let Some(decision) = session.pending.take(kind) {
                    self.timers.stop(decision.timer);
                }
                self.apply_decision(&mut session, kind, claimed);
            }
            self.touch = Some(session);
            if kind.is_some() {
                return;
            }
        }
        if let Some(tap) = &mut self.pending_tap {
            if tap.down_sequence == Some(sequence) {
                tap.down_sequence = None;
                tap.claimed = claimed;
                return;
            }
        }
        log::debug!("Dropping stale answer for the {action} event {sequence}");
    }

    fn new_frame(&mut self, frame: ContentFrame) {
        let scroll_hint = frame.scroll_hint;
        match self.frames.replace(frame) {
            FrameUpdate::Held => log::trace!("Holding a new frame while updates are paused"),
            FrameUpdate::Applied => {
                self.update_scroll_limits();
                if let Some(hint) = scroll_hint {
                    let target = self.zoom.to_view(hint);
                    self.jump_to(target, true);
                }
                self.host.request_redraw();
            }
        }
    }

    /// View position of the reprocessed event `sequence` when it was sent.
    fn reprocessed_position(&mut self, sequence: u64, position: ContentPoint) -> ViewPoint {
        while let Some(&(sent, view)) = self.reprocess_positions.front() {
            if sent > sequence {
                break;
            }
            self.reprocess_positions.pop_front();
            if sent == sequence {
                return view;
            }
        }
        self.content_to_view(position)
    }

    /// A touch event of a deferred stream that the page did not consume: interpret it
    /// as panning, double tap or long press.
    fn reprocess_touch(&mut self, sequence: u64, action: TouchAction, position: ContentPoint) {
        let view = self.reprocessed_position(sequence, position);
        match action {
            TouchAction::Down => {
                self.deferred =
                    DeferredTouch { mode: DeferredMode::Init, anchor: view, last_position: view };
            }
            TouchAction::Move => match self.deferred.mode {
                DeferredMode::Init => {
                    if distance_squared(self.deferred.anchor, view)
                        >= self.config.touch_slop_squared()
                    {
                        self.deferred.mode = DeferredMode::Drag;
                        self.deferred.last_position = view;
                        self.reduce_priority();
                    }
                }
                DeferredMode::Drag => {
                    let delta = self.deferred.last_position - view;
                    self.deferred.last_position = view;
                    if self.scroller.scroll_by(delta) {
                        self.scroll_changed();
                    }
                }
                DeferredMode::Done => {}
            },
            TouchAction::Up | TouchAction::Cancel => {
                if self.deferred.mode == DeferredMode::Drag {
                    self.settle_scroll();
                }
                self.deferred.mode = DeferredMode::Done;
            }
            TouchAction::DoubleTap => {
                self.deferred.mode = DeferredMode::Done;
                self.double_tap_zoom(view);
            }
            TouchAction::LongPress => {
                self.deferred.mode = DeferredMode::Done;
                self.host.long_press(position);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::Fixture;
    use crate::frame::NavNode;
    use crate::gesture::PreventDefault;
    use crate::lengths::ContentRect;
    use crate::render_core::{CoreMessage, CoreReply, TouchAction};
    use crate::tests::{HostEvent, blank_frame};
    use euclid::{point2, rect};

    #[test]
    fn stale_answers_are_ignored() {
        let (fixture, mut web_view) = Fixture::new();
        fixture.reply(&mut web_view, CoreReply::SetTouchHandlers(true));
        fixture.press(&mut web_view, point2(100., 100.));
        let first = fixture.last_touch_sequence(TouchAction::Down);
        fixture.release(&mut web_view, point2(100., 100.));
        fixture.advance(&mut web_view, 400);
        assert_eq!(fixture.host.clicks(), 1);

        fixture.press(&mut web_view, point2(100., 100.));
        // An answer for the previous stream does not decide this one.
        fixture.reply(&mut web_view, CoreReply::PreventTouch {
            sequence: first,
            action: TouchAction::Down,
            claimed: true,
        });
        assert_eq!(web_view.prevent_default_state(), Some(PreventDefault::MaybeYes));
        fixture.reply(&mut web_view, CoreReply::PreventTouch {
            sequence: 999,
            action: TouchAction::Down,
            claimed: true,
        });
        assert_eq!(web_view.prevent_default_state(), Some(PreventDefault::MaybeYes));
    }

    #[test]
    fn answer_after_release_claims_the_tap() {
        let (fixture, mut web_view) = Fixture::new();
        fixture.reply(&mut web_view, CoreReply::SetTouchHandlers(true));
        fixture.press(&mut web_view, point2(100., 100.));
        let down = fixture.last_touch_sequence(TouchAction::Down);
        fixture.advance(&mut web_view, 50);
        fixture.release(&mut web_view, point2(100., 100.));
        fixture.reply(&mut web_view, CoreReply::PreventTouch {
            sequence: down,
            action: TouchAction::Down,
            claimed: true,
        });
        fixture.advance(&mut web_view, 400);
        assert_eq!(fixture.host.clicks(), 0);
        assert!(!fixture.take_sent().iter().any(|m| matches!(m, CoreMessage::TouchUp { .. })));
    }

    #[test]
    fn stale_selection_ranges_are_dropped() {
        let (fixture, mut web_view) = Fixture::new();
        assert!(web_view.begin_selection());
        fixture.press(&mut web_view, point2(10., 10.));
        fixture.move_to(&mut web_view, point2(60., 10.));
        fixture.move_to(&mut web_view, point2(90., 10.));
        let generations: Vec<_> = fixture
            .take_sent()
            .into_iter()
            .filter_map(|m| match m {
                CoreMessage::ExtendSelection { generation, .. } => Some(generation),
                _ => None,
            })
            .collect();
        assert_eq!(generations.len(), 3);
        let latest = generations[2];

        fixture.reply(&mut web_view, CoreReply::SelectionRange {
            generation: latest,
            start: point2(10., 0.),
            end: point2(90., 20.),
            text: "latest".into(),
        });
        fixture.reply(&mut web_view, CoreReply::SelectionRange {
            generation: generations[1],
            start: point2(10., 0.),
            end: point2(60., 20.),
            text: "stale".into(),
        });
        assert_eq!(web_view.selection_text(), Some("latest"));
    }

    #[test]
    fn frames_are_held_during_selection() {
        let (fixture, mut web_view) = Fixture::new();
        web_view.begin_selection();
        fixture.reply(&mut web_view, CoreReply::NewFrame(blank_frame(800., 8000.)));
        assert_eq!(web_view.draw().content_size.height, 4000.);
        assert!(web_view.dismiss_selection());
        assert_eq!(web_view.draw().content_size.height, 8000.);
        assert_eq!(web_view.max_scroll().y, 7200.);
    }

    #[test]
    fn highlight_follows_the_short_press() {
        let (fixture, mut web_view) = Fixture::new();
        fixture.press(&mut web_view, point2(20., 30.));
        fixture.advance(&mut web_view, 210);
        assert!(fixture.take_sent().iter().any(|m| matches!(
            m,
            CoreMessage::RequestTouchHighlight { position, .. } if *position == point2(20., 30.)
        )));
        let bounds: ContentRect = rect(0., 0., 100., 50.);
        fixture.reply(&mut web_view, CoreReply::TouchHighlight(Some(bounds)));
        assert_eq!(web_view.draw().highlight, Some(rect(0., 0., 100., 50.)));
        fixture.release(&mut web_view, point2(20., 30.));
        assert_eq!(web_view.draw().highlight, None);
        assert_eq!(fixture.host.clicks(), 1);
        assert!(fixture.host.events().contains(&HostEvent::TapHighlight(None)));
    }

    #[test]
    fn deferred_stream_pans_when_not_consumed() {
        let (fixture, mut web_view) = Fixture::new();
        let mut frame = blank_frame(800., 4000.);
        frame.nav_nodes.push(NavNode {
            frame: 1,
            node: 7,
            bounds: rect(0., 0., 400., 400.),
            is_plugin: true,
        });
        fixture.reply(&mut web_view, CoreReply::NewFrame(frame));

        fixture.press(&mut web_view, point2(200., 300.));
        assert_eq!(web_view.prevent_default_state(), Some(PreventDefault::Yes));
        for y in [280., 260., 240.] {
            fixture.advance(&mut web_view, 20);
            fixture.move_to(&mut web_view, point2(200., y));
        }
        fixture.release(&mut web_view, point2(200., 240.));
        // Nothing happens locally until the page hands the events back.
        assert_eq!(web_view.scroll_offset(), point2(0., 0.));

        let events: Vec<_> = fixture
            .take_sent()
            .into_iter()
            .filter_map(|m| match m {
                CoreMessage::TouchEvent { sequence, action, points, reprocess: true, .. } => {
                    Some((sequence, action, points[0]))
                }
                _ => None,
            })
            .collect();
        assert_eq!(events.len(), 5);
        for (sequence, action, position) in events {
            fixture.reply(&mut web_view, CoreReply::ReprocessTouch { sequence, action, position });
        }
        assert_eq!(web_view.scroll_offset(), point2(0., 40.));
        assert!(fixture.take_sent().contains(&CoreMessage::SetScrollOffset {
            position: point2(0., 40.)
        }));
        assert_eq!(fixture.host.clicks(), 0);
    }
}
