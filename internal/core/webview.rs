// Copyright © SixtyFPS GmbH <info@slint.dev>
// SPDX-License-Identifier: GPL-3.0-only OR LicenseRef-Slint-Royalty-free-2.0 OR LicenseRef-Slint-Software-3.0

/*!
The widget.

A [`WebView`] owns every piece of UI-thread state: the touch session, the scroll
offset, the selection and the displayed frame. The platform feeds it input events
and calls [`WebView::tick`] from its event loop; the widget talks to the render core
only through its [`RenderCoreChannel`] and to the platform through a [`WebViewHost`].
*/

mod replies;
mod scroll;
mod touch;

use crate::animations::{Clock, Instant, SystemClock};
use crate::config::GestureConfig;
use crate::frame::{FrameCache, Picture};
use crate::gesture::{DecisionKind, FlingHistory, PreventDefault, TouchMode, TouchSession};
use crate::input::{Key, KeyEvent, KeyEventType, StandardShortcut};
use crate::lengths::{ContentPoint, ContentRect, ContentSize, ViewPoint, ViewRect, ViewSize, ZoomScale};
use crate::render_core::{CoreMessage, CoreMessageKind, RenderCoreChannel};
use crate::scroller::{ScrollTick, Scroller};
use crate::selection::SelectionController;
use crate::services::{Registration, ServiceError, Services};
use crate::timers::TimerList;
use crate::velocity::VelocityTracker;
use crate::zoom::{ZoomManager, ZoomMapper};
use alloc::boxed::Box;
use alloc::collections::VecDeque;
use alloc::rc::Rc;
use alloc::sync::Arc;

/// Callbacks from the widget to the platform view.
///
/// All of them are called on the UI thread, from within the widget's entry points.
pub trait WebViewHost {
    /// The widget needs to be drawn again.
    fn request_redraw(&self) {}

    /// A tap was committed at `position`.
    fn click(&self, _position: ContentPoint) {}

    /// A touch was held at `position`. Return true to consume it; otherwise a text
    /// selection starts there.
    fn long_press(&self, _position: ContentPoint) -> bool {
        false
    }

    fn selection_mode_started(&self) {}

    fn selection_mode_finished(&self) {}

    fn set_clipboard_text(&self, _text: &str) {}

    /// Show, or hide with `None`, the highlight of the element under the finger.
    fn tap_highlight(&self, _rect: Option<ViewRect>) {}

    fn double_tapped(&self, _position: ViewPoint) {}

    fn scroll_changed(&self, _offset: ViewPoint) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GestureTimer {
    ShortPress,
    LongPress,
    /// Commits a released tap unless a second tap makes it a double tap first.
    ReleaseSingleTap,
    PreventDefaultTimeout(DecisionKind),
}

/// A released tap waiting for a possible second tap.
#[derive(Debug, Clone, Copy)]
struct PendingTap {
    position: ViewPoint,
    /// Sequence of the down event if the render core has not answered it yet.
    down_sequence: Option<u64>,
    claimed: bool,
}

/// Interpretation of the touch events the render core hands back unconsumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DeferredMode {
    Init,
    Drag,
    Done,
}

#[derive(Debug, Clone, Copy)]
struct DeferredTouch {
    mode: DeferredMode,
    anchor: ViewPoint,
    last_position: ViewPoint,
}

/// What to draw, as returned by [`WebView::draw`].
#[derive(Debug, Clone)]
pub struct DrawSnapshot {
    pub picture: Option<Picture>,
    pub content_size: ContentSize,
    pub scroll: ViewPoint,
    pub scale: ZoomScale,
    pub highlight: Option<ViewRect>,
    pub selection: Option<ViewRect>,
}

pub struct WebView {
    config: GestureConfig,
    clock: Rc<dyn Clock>,
    host: Rc<dyn WebViewHost>,
    channel: RenderCoreChannel,
    zoom: Box<dyn ZoomMapper>,
    scroller: Scroller,
    frames: FrameCache,
    selection: SelectionController,
    timers: TimerList<GestureTimer>,
    touch: Option<TouchSession>,
    last_touch: Option<(ViewPoint, Instant)>,
    pending_tap: Option<PendingTap>,
    deferred: DeferredTouch,
    /// View positions of the events sent with `reprocess`, by sequence number.
    reprocess_positions: VecDeque<(u64, ViewPoint)>,
    pinch_focus: Option<ViewPoint>,
    velocity: Option<VelocityTracker>,
    fling_history: FlingHistory,
    meta_state: u32,
    /// Sequence number of the last forwarded touch event.
    sequence: u64,
    tap_generation: u64,
    touch_handlers: bool,
    full_screen: bool,
    priority_reduced: bool,
    cursor_bounds: Option<ContentRect>,
    highlight: Option<ContentRect>,
    view_size: ViewSize,
    registration: Option<Registration>,
}

impl WebView {
    /// A widget with the default configuration (environment overrides applied) and the system clock.
    pub fn new(host: Rc<dyn WebViewHost>, channel: RenderCoreChannel) -> Self {
        Self::with_config(host, channel, GestureConfig::from_env(), Rc::new(SystemClock::default()))
    }

    pub fn with_config(
        host: Rc<dyn WebViewHost>,
        channel: RenderCoreChannel,
        config: GestureConfig,
        clock: Rc<dyn Clock>,
    ) -> Self {
        Self {
            scroller: Scroller::new(&config),
            config,
            clock,
            host,
            channel,
            zoom: Box::new(ZoomManager::default()),
            frames: FrameCache::default(),
            selection: SelectionController::default(),
            timers: TimerList::default(),
            touch: None,
            last_touch: None,
            pending_tap: None,
            deferred: DeferredTouch {
                mode: DeferredMode::Done,
                anchor: ViewPoint::zero(),
                last_position: ViewPoint::zero(),
            },
            reprocess_positions: VecDeque::new(),
            pinch_focus: None,
            velocity: None,
            fling_history: FlingHistory::default(),
            meta_state: 0,
            sequence: 0,
            tap_generation: 0,
            touch_handlers: false,
            full_screen: false,
            priority_reduced: false,
            cursor_bounds: None,
            highlight: None,
            view_size: ViewSize::zero(),
            registration: None,
        }
    }

    /// Replace the zoom policy.
    pub fn set_zoom_mapper(&mut self, zoom: Box<dyn ZoomMapper>) {
        self.zoom = zoom;
        self.update_scroll_limits();
    }

    /// Register with the process-wide services so that broadcasts reach this widget's
    /// render core. The registration ends when the widget is dropped or closed.
    pub fn register_with(&mut self, services: &Arc<Services>) -> Result<(), ServiceError> {
        let Some(sender) = self.channel.broadcast_sender() else {
            log::debug!("Not registering a closed web view");
            return Ok(());
        };
        self.registration = Some(services.register(sender)?);
        Ok(())
    }

    /// Tear down the link to the render core. Everything sent afterwards is dropped.
    pub fn close(&mut self) {
        self.channel.close();
        self.registration = None;
        self.timers.clear();
        self.touch = None;
        self.pending_tap = None;
        self.reprocess_positions.clear();
        self.velocity = None;
        self.scroller.abort();
    }

    pub fn config(&self) -> &GestureConfig {
        &self.config
    }

    pub fn zoom(&self) -> &dyn ZoomMapper {
        &*self.zoom
    }

    pub fn scroll_offset(&self) -> ViewPoint {
        self.scroller.offset()
    }

    pub fn max_scroll(&self) -> ViewPoint {
        self.scroller.max_scroll()
    }

    pub fn is_scroll_animating(&self) -> bool {
        self.scroller.is_animating()
    }

    /// Mode of the active touch session.
    pub fn touch_mode(&self) -> Option<TouchMode> {
        self.touch.as_ref().map(|s| s.mode)
    }

    pub fn prevent_default_state(&self) -> Option<PreventDefault> {
        self.touch.as_ref().map(|s| s.prevent_default)
    }

    pub fn is_selecting(&self) -> bool {
        self.selection.is_active()
    }

    pub fn selection_text(&self) -> Option<&str> {
        self.selection.text()
    }

    pub fn set_view_size(&mut self, size: ViewSize) {
        self.view_size = size;
        self.update_scroll_limits();
    }

    /// In full screen mode the render core gets every touch stream first.
    pub fn set_full_screen(&mut self, full_screen: bool) {
        self.full_screen = full_screen;
    }

    pub fn is_full_screen(&self) -> bool {
        self.full_screen
    }

    /// Advance the widget to the current time: dequeue render-core replies, fire due
    /// timers, post due delayed messages and step the scroll animation.
    ///
    /// Returns when the widget wants to be ticked again, if at all.
    pub fn tick(&mut self) -> Option<Instant> {
        self.dispatch_render_core_replies();
        let now = self.clock.now();
        for timer in self.timers.take_expired(now) {
            self.fire_timer(timer, now);
        }
        self.channel.flush_delayed(now);
        match self.scroller.tick(now) {
            ScrollTick::Idle => {}
            ScrollTick::Animating => self.scroll_changed(),
            ScrollTick::Finished | ScrollTick::Stalled => {
                self.scroll_changed();
                self.resume_priority();
                self.report_scroll_offset();
            }
        }
        self.next_deadline(now)
    }

    fn next_deadline(&self, now: Instant) -> Option<Instant> {
        if self.scroller.is_animating() {
            return Some(now);
        }
        match (self.timers.next_timeout(), self.channel.next_timeout()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    fn fire_timer(&mut self, timer: GestureTimer, now: Instant) {
        if timer == GestureTimer::ReleaseSingleTap {
            if let Some(tap) = self.pending_tap.take() {
                self.commit_tap(tap.position, tap.claimed);
            }
            return;
        }
        let Some(mut session) = self.touch.take() else {
            log::debug!("{timer:?} fired without a touch session");
            return;
        };
        match timer {
            GestureTimer::PreventDefaultTimeout(kind) => {
                if session.pending.take(kind).is_some() {
                    log::debug!("No answer for the {kind} event in time, handling it locally");
                    self.apply_decision(&mut session, kind, false);
                }
            }
            GestureTimer::ShortPress => match session.mode {
                TouchMode::Init if session.is_claimed() => session.mode = TouchMode::ShortPress,
                TouchMode::Init => {
                    session.mode = TouchMode::ShortPressStart;
                    self.show_highlight(&mut session);
                }
                TouchMode::DoubleTap => session.mode = TouchMode::Done,
                _ => {}
            },
            GestureTimer::LongPress => self.long_press(&mut session),
            GestureTimer::ReleaseSingleTap => {}
        }
        self.touch = Some(session);
    }

    /// Returns what needs to be drawn.
    pub fn draw(&self) -> DrawSnapshot {
        let highlight = self
            .touch
            .as_ref()
            .filter(|s| s.highlighted)
            .and(self.highlight)
            .map(|rect| self.content_rect_to_view(rect));
        DrawSnapshot {
            picture: self.frames.current().map(|frame| frame.picture.clone()),
            content_size: self.frames.content_size(),
            scroll: self.scroller.offset(),
            scale: self.zoom.scale(),
            highlight,
            selection: self.selection.bounds().map(|rect| self.content_rect_to_view(rect)),
        }
    }

    /// Handle a key event. Returns true if the event was used.
    pub fn process_key_event(&mut self, event: &KeyEvent) -> bool {
        if event.event_type == KeyEventType::KeyPressed {
            if self.selection.is_active() {
                if event.key == Key::Escape {
                    return self.dismiss_selection();
                }
                if event.shortcut() == Some(StandardShortcut::Copy) {
                    return self.copy_selection();
                }
            }
            let handled = match event.key {
                Key::PageUp => self.page_up(false),
                Key::PageDown => self.page_down(false),
                Key::Home => self.page_up(true),
                Key::End => self.page_down(true),
                _ => false,
            };
            if handled {
                return true;
            }
        }
        if !self.channel.is_connected() {
            return false;
        }
        self.channel.send(CoreMessage::KeyEvent {
            key: event.key.clone(),
            event_type: event.event_type,
            meta_state: event.modifiers.meta_state(),
        });
        true
    }

    /// Enter text selection mode. The anchor is the cursor if there is one, else the last
    /// touch point, else the center of the view. Returns false if already selecting.
    pub fn begin_selection(&mut self) -> bool {
        let seed = self.selection_seed();
        self.begin_selection_at(seed, false)
    }

    fn selection_seed(&self) -> ContentPoint {
        if let Some(cursor) = self.cursor_bounds {
            return cursor.origin;
        }
        if let Some((position, _)) = self.last_touch {
            let content = self.view_to_content(position);
            // Touches on the title bar map above the document.
            if content.y >= 0. {
                return content;
            }
        }
        let center = ViewPoint::new(self.view_size.width / 2., self.view_size.height / 2.);
        self.view_to_content(center)
    }

    fn begin_selection_at(&mut self, seed: ContentPoint, started: bool) -> bool {
        if !self.selection.begin(seed, started) {
            return false;
        }
        self.frames.pause();
        self.reduce_priority();
        if started {
            if let Some(message) = self.selection.extend_to(seed) {
                self.channel.send(message);
            }
        }
        self.host.selection_mode_started();
        self.host.request_redraw();
        true
    }

    /// Copy the selected text to the clipboard and leave selection mode.
    pub fn copy_selection(&mut self) -> bool {
        let Some(text) = self.selection.commit() else { return false };
        if !text.is_empty() {
            self.host.set_clipboard_text(&text);
        }
        self.end_selection();
        true
    }

    /// Leave selection mode without copying.
    pub fn dismiss_selection(&mut self) -> bool {
        if !self.selection.dismiss() {
            return false;
        }
        self.end_selection();
        true
    }

    fn end_selection(&mut self) {
        if self.frames.resume() {
            self.update_scroll_limits();
        }
        self.resume_priority();
        self.host.selection_mode_finished();
        self.host.request_redraw();
    }

    fn reduce_priority(&mut self) {
        if !self.priority_reduced {
            self.priority_reduced = true;
            self.channel.send(CoreMessage::ReducePriority);
            self.channel.send(CoreMessage::PauseUpdatePicture);
        }
    }

    fn resume_priority(&mut self) {
        if self.priority_reduced {
            self.priority_reduced = false;
            self.channel.send(CoreMessage::ResumePriority);
            self.channel.send(CoreMessage::ResumeUpdatePicture);
        }
    }

    fn show_highlight(&mut self, session: &mut TouchSession) {
        if let Some(rect) = self.highlight {
            session.highlighted = true;
            self.host.tap_highlight(Some(self.content_rect_to_view(rect)));
        }
    }

    fn hide_highlight(&mut self, session: &mut TouchSession) {
        self.channel.cancel_pending(CoreMessageKind::RequestTouchHighlight);
        if session.highlighted {
            session.highlighted = false;
            self.host.tap_highlight(None);
        }
    }

    /// Map a point of the view to the document.
    pub fn view_to_content(&self, position: ViewPoint) -> ContentPoint {
        self.zoom.to_content(position + self.scroller.offset().to_vector())
    }

    /// Map a document point to the view.
    pub fn content_to_view(&self, position: ContentPoint) -> ViewPoint {
        self.zoom.to_view(position) - self.scroller.offset().to_vector()
    }

    fn content_rect_to_view(&self, rect: ContentRect) -> ViewRect {
        let origin = self.content_to_view(rect.origin);
        ViewRect::new(origin, self.zoom.scale().transform_size(rect.size))
    }
}
