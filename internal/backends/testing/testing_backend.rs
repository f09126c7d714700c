// Copyright © SixtyFPS GmbH <info@slint.dev>
// SPDX-License-Identifier: GPL-3.0-only OR LicenseRef-Slint-Royalty-free-2.0 OR LicenseRef-Slint-Software-3.0

use crate::scripted_core::{CorePolicy, ScriptedRenderCore};
use i_webview_core::animations::Clock;
use i_webview_core::config::GestureConfig;
use i_webview_core::input::{PointerEvent, PointerEventKind};
use i_webview_core::lengths::{ContentSize, ViewPoint, ViewSize};
use i_webview_core::render_core::{
    self, ChannelError, CoreMessage, CoreReply, RenderCoreChannel, RenderCoreEndpoint, TouchAction,
};
use i_webview_core::tests::{blank_frame, MockClock, RecordingHost};
use i_webview_core::webview::WebView;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

/// How long [`TestWebView::wait_for_core`] waits for a reply.
const CORE_TIMEOUT: Duration = Duration::from_secs(5);

enum CoreEnd {
    /// Replies are posted by the test itself.
    Manual { endpoint: RenderCoreEndpoint, sent: RefCell<Vec<CoreMessage>> },
    Threaded(ScriptedRenderCore),
}

/// A web view driven by a mocked clock, with a recording host.
pub struct TestWebView {
    web_view: WebView,
    clock: Rc<MockClock>,
    host: Rc<RecordingHost>,
    core: CoreEnd,
}

impl TestWebView {
    /// A widget showing a blank document of `document` size in a view of `view` size.
    /// The test plays the render core.
    pub fn new(view: ViewSize, document: ContentSize) -> Self {
        Self::with_config(view, document, GestureConfig::default())
    }

    pub fn with_config(view: ViewSize, document: ContentSize, config: GestureConfig) -> Self {
        let (channel, endpoint) = render_core::channel();
        let frame = blank_frame(document.width, document.height);
        if endpoint.reply(CoreReply::NewFrame(frame)).is_err() {
            unreachable!("both ends of the channel are alive");
        }
        let core = CoreEnd::Manual { endpoint, sent: RefCell::default() };
        let mut this = Self::create(channel, config, core);
        this.web_view.set_view_size(view);
        this.web_view.tick();
        this.host.take_events();
        this
    }

    /// A widget whose render core answers on its own thread according to `policy`.
    /// Returns once the core's first frame, if any, is shown.
    pub fn with_render_core(view: ViewSize, policy: CorePolicy) -> std::io::Result<Self> {
        let (channel, endpoint) = render_core::channel();
        let expect_frame = policy.first_frame.is_some();
        let core = CoreEnd::Threaded(ScriptedRenderCore::spawn(endpoint, policy)?);
        let mut this = Self::create(channel, GestureConfig::default(), core);
        this.web_view.set_view_size(view);
        while expect_frame && this.web_view.draw().picture.is_none() {
            if !this.web_view.wait_for_render_core(CORE_TIMEOUT) {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::TimedOut,
                    "the render core did not post its first frame",
                ));
            }
        }
        this.host.take_events();
        Ok(this)
    }

    fn create(channel: RenderCoreChannel, config: GestureConfig, core: CoreEnd) -> Self {
        let clock = Rc::new(MockClock::default());
        let host = Rc::new(RecordingHost::default());
        let web_view = WebView::with_config(host.clone(), channel, config, clock.clone());
        Self { web_view, clock, host, core }
    }

    pub fn web_view(&mut self) -> &mut WebView {
        &mut self.web_view
    }

    pub fn host(&self) -> &RecordingHost {
        &self.host
    }

    pub fn clock(&self) -> &MockClock {
        &self.clock
    }

    fn pointer(&mut self, kind: PointerEventKind, position: ViewPoint) {
        let event = PointerEvent::new(kind, position, self.clock.now());
        self.web_view.process_pointer_event(event);
    }

    pub fn press(&mut self, position: ViewPoint) {
        self.pointer(PointerEventKind::Down, position);
    }

    pub fn move_to(&mut self, position: ViewPoint) {
        self.pointer(PointerEventKind::Move, position);
    }

    pub fn release(&mut self, position: ViewPoint) {
        self.pointer(PointerEventKind::Up, position);
    }

    /// Press and release at `position`, 50ms apart.
    pub fn tap(&mut self, position: ViewPoint) {
        self.press(position);
        self.advance(50);
        self.release(position);
    }

    /// Drag from `from` to `to` in `steps` moves spread over `duration_ms`. Without
    /// `fling` the pointer rests before going up.
    pub fn drag(&mut self, from: ViewPoint, to: ViewPoint, duration_ms: u64, steps: u32, fling: bool) {
        self.press(from);
        let steps = steps.max(1);
        for step in 1..=steps {
            self.advance(duration_ms / u64::from(steps));
            self.move_to(from.lerp(to, step as f32 / steps as f32));
        }
        if !fling {
            self.advance(200);
        }
        self.release(to);
    }

    /// Let `ms` milliseconds pass, ticking the widget once per 16ms frame.
    pub fn advance(&mut self, ms: u64) {
        let mut remaining = ms;
        while remaining > 0 {
            let step = remaining.min(16);
            self.clock.advance(step);
            remaining -= step;
            self.web_view.tick();
        }
    }

    /// Post `reply` as the render core and let the widget handle it.
    ///
    /// Panics if a [`ScriptedRenderCore`] plays the render core.
    pub fn reply(&mut self, reply: CoreReply) -> Result<(), ChannelError> {
        let CoreEnd::Manual { endpoint, .. } = &self.core else {
            panic!("the scripted render core is answering");
        };
        endpoint.reply(reply)?;
        self.web_view.tick();
        Ok(())
    }

    /// Wait for the threaded render core to answer, and handle its replies.
    pub fn wait_for_core(&mut self) -> bool {
        self.web_view.wait_for_render_core(CORE_TIMEOUT)
    }

    /// Handle replies until the threaded render core stays quiet for `idle_ms`.
    pub fn wait_for_core_idle(&mut self, idle_ms: u64) {
        while self.web_view.wait_for_render_core(Duration::from_millis(idle_ms)) {}
    }

    /// Messages sent to the render core since the last call.
    ///
    /// Panics if a [`ScriptedRenderCore`] plays the render core.
    pub fn take_sent(&self) -> Vec<CoreMessage> {
        let CoreEnd::Manual { endpoint, sent } = &self.core else {
            panic!("the scripted render core receives the messages");
        };
        sent.borrow_mut().extend(endpoint.drain());
        std::mem::take(&mut *sent.borrow_mut())
    }

    /// Sequence number of the last touch event with `action` sent to the render core.
    pub fn last_touch_sequence(&self, action: TouchAction) -> Option<u64> {
        let CoreEnd::Manual { endpoint, sent } = &self.core else {
            panic!("the scripted render core receives the messages");
        };
        let mut sent = sent.borrow_mut();
        sent.extend(endpoint.drain());
        sent.iter().rev().find_map(|message| match message {
            CoreMessage::TouchEvent { sequence, action: a, .. } if *a == action => Some(*sequence),
            _ => None,
        })
    }

    /// Close the widget and return every message the render core received that was not
    /// taken yet. Fails if the scripted render core panicked.
    pub fn finish(mut self) -> std::thread::Result<Vec<CoreMessage>> {
        self.web_view.close();
        match self.core {
            CoreEnd::Manual { endpoint, sent } => {
                let mut sent = sent.into_inner();
                sent.extend(endpoint.drain());
                Ok(sent)
            }
            CoreEnd::Threaded(core) => core.join(),
        }
    }
}
