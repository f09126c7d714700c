// Copyright © SixtyFPS GmbH <info@slint.dev>
// SPDX-License-Identifier: GPL-3.0-only OR LicenseRef-Slint-Royalty-free-2.0 OR LicenseRef-Slint-Software-3.0

use super::WebView;
use crate::lengths::{ContentPoint, ViewPoint, ViewVector, ViewVelocity};
use crate::render_core::CoreMessage;
use core::time::Duration;

impl WebView {
    /// Scroll so that the document point `position` is at the top left of the view.
    pub fn scroll_to(&mut self, position: ContentPoint, animate: bool) -> bool {
        let target = self.zoom.to_view(position);
        if animate { self.animate_scroll_to(target) } else { self.jump_to(target, true) }
    }

    /// Start a fling with `velocity` in view pixels per second, in scroll direction.
    pub fn fling_scroll(&mut self, velocity: ViewVelocity) -> bool {
        let now = self.clock.now();
        if !self.scroller.fling(velocity, now) {
            return false;
        }
        self.reduce_priority();
        self.host.request_redraw();
        true
    }

    /// Scroll up by a page, or to the top.
    pub fn page_up(&mut self, to_top: bool) -> bool {
        self.page_scroll(false, to_top)
    }

    /// Scroll down by a page, or to the bottom.
    pub fn page_down(&mut self, to_bottom: bool) -> bool {
        self.page_scroll(true, to_bottom)
    }

    fn page_scroll(&mut self, down: bool, to_edge: bool) -> bool {
        let offset = self.scroller.offset();
        if to_edge {
            let y = if down { self.scroller.max_scroll().y } else { 0. };
            return self.animate_scroll_to(ViewPoint::new(offset.x, y));
        }
        let height = self.scroller.view_size().height;
        let overlap = self.config.page_scroll_overlap;
        let page = if height > 2. * overlap { height - overlap } else { height / 2. };
        let dy = if down { page } else { -page };
        // Pressing repeatedly extends the running animation.
        if self.scroller.extend_scroll(dy) {
            return true;
        }
        self.animate_scroll_to(offset + ViewVector::new(0., dy))
    }

    pub(super) fn animate_scroll_to(&mut self, target: ViewPoint) -> bool {
        let now = self.clock.now();
        if !self.scroller.pin_and_scroll_to(target, true, Duration::ZERO, now) {
            return false;
        }
        self.reduce_priority();
        self.host.request_redraw();
        true
    }

    /// Move the offset to `target` at once. Returns whether it moved.
    pub(super) fn jump_to(&mut self, target: ViewPoint, report: bool) -> bool {
        let now = self.clock.now();
        let was_animating = self.scroller.is_animating();
        if !self.scroller.pin_and_scroll_to(target, false, Duration::ZERO, now) {
            return false;
        }
        if was_animating {
            self.resume_priority();
        }
        self.scroll_changed();
        if report {
            self.report_scroll_offset();
        }
        true
    }

    pub(super) fn double_tap_zoom(&mut self, position: ViewPoint) {
        self.host.double_tapped(position);
        let anchor = self.view_to_content(position);
        if !self.zoom.handle_double_tap() {
            return;
        }
        self.update_scroll_limits();
        // Keep the tapped point under the finger.
        let target = self.zoom.to_view(anchor) - position.to_vector();
        if !self.jump_to(target, true) {
            self.report_scroll_offset();
        }
        self.host.request_redraw();
    }

    pub(super) fn update_scroll_limits(&mut self) {
        let extent = self.zoom.content_extent(self.frames.content_size());
        if self.scroller.set_limits(extent, self.view_size) {
            self.scroll_changed();
        }
    }

    pub(super) fn scroll_changed(&self) {
        self.host.scroll_changed(self.scroller.offset());
        self.host.request_redraw();
    }

    /// The scroll offset came to rest: give the render core its priority back and tell
    /// it where the view ended up.
    pub(super) fn settle_scroll(&mut self) {
        self.resume_priority();
        self.report_scroll_offset();
    }

    pub(super) fn report_scroll_offset(&self) {
        let position = self.zoom.to_content(self.scroller.offset()).max(ContentPoint::zero());
        self.channel.send(CoreMessage::SetScrollOffset { position });
    }
}
