// Copyright © SixtyFPS GmbH <info@slint.dev>
// SPDX-License-Identifier: GPL-3.0-only OR LicenseRef-Slint-Royalty-free-2.0 OR LicenseRef-Slint-Software-3.0

//! Functions useful for testing
#![warn(missing_docs)]

use crate::animations::{Clock, Instant};
use crate::frame::{ContentFrame, Picture};
use crate::lengths::{ContentPoint, ContentSize, ViewPoint, ViewRect};
use crate::webview::WebViewHost;
use core::cell::{Cell, RefCell};

/// The widget does not read the real time in tests, but a mocked time
/// that only moves when the test advances it.
#[derive(Debug, Default)]
pub struct MockClock {
    now: Cell<u64>,
}

impl MockClock {
    /// Add `time_in_ms` milliseconds to the mocked time.
    pub fn advance(&self, time_in_ms: u64) {
        self.now.set(self.now.get() + time_in_ms);
    }

    /// Jump to `instant`. Time never goes backwards.
    pub fn set(&self, instant: Instant) {
        self.now.set(self.now.get().max(instant.0));
    }
}

impl Clock for MockClock {
    fn now(&self) -> Instant {
        Instant(self.now.get())
    }
}

/// A host callback, as recorded by [`RecordingHost`].
#[derive(Debug, Clone, PartialEq)]
#[allow(missing_docs)]
pub enum HostEvent {
    Click(ContentPoint),
    LongPress(ContentPoint),
    SelectionModeStarted,
    SelectionModeFinished,
    Clipboard(String),
    TapHighlight(Option<ViewRect>),
    DoubleTapped(ViewPoint),
    ScrollChanged(ViewPoint),
}

/// A [`WebViewHost`] that records every callback.
#[derive(Debug, Default)]
pub struct RecordingHost {
    events: RefCell<Vec<HostEvent>>,
    redraws: Cell<usize>,
    /// What the long press handler returns.
    pub consume_long_press: Cell<bool>,
}

impl RecordingHost {
    /// Return and forget the events recorded so far.
    pub fn take_events(&self) -> Vec<HostEvent> {
        core::mem::take(&mut *self.events.borrow_mut())
    }

    /// The events recorded so far.
    pub fn events(&self) -> Vec<HostEvent> {
        self.events.borrow().clone()
    }

    /// Number of recorded clicks.
    pub fn clicks(&self) -> usize {
        self.events.borrow().iter().filter(|e| matches!(e, HostEvent::Click(_))).count()
    }

    /// Number of redraw requests.
    pub fn redraw_count(&self) -> usize {
        self.redraws.get()
    }

    fn push(&self, event: HostEvent) {
        self.events.borrow_mut().push(event);
    }
}

impl WebViewHost for RecordingHost {
    fn request_redraw(&self) {
        self.redraws.set(self.redraws.get() + 1);
    }

    fn click(&self, position: ContentPoint) {
        self.push(HostEvent::Click(position));
    }

    fn long_press(&self, position: ContentPoint) -> bool {
        self.push(HostEvent::LongPress(position));
        self.consume_long_press.get()
    }

    fn selection_mode_started(&self) {
        self.push(HostEvent::SelectionModeStarted);
    }

    fn selection_mode_finished(&self) {
        self.push(HostEvent::SelectionModeFinished);
    }

    fn set_clipboard_text(&self, text: &str) {
        self.push(HostEvent::Clipboard(text.into()));
    }

    fn tap_highlight(&self, rect: Option<ViewRect>) {
        self.push(HostEvent::TapHighlight(rect));
    }

    fn double_tapped(&self, position: ViewPoint) {
        self.push(HostEvent::DoubleTapped(position));
    }

    fn scroll_changed(&self, offset: ViewPoint) {
        self.push(HostEvent::ScrollChanged(offset));
    }
}

/// A frame of `width`x`height` content pixels with an empty picture and no hit-test data.
pub fn blank_frame(width: f32, height: f32) -> ContentFrame {
    ContentFrame::new(ContentSize::new(width, height), Picture::new(()))
}
