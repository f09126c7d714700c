// Copyright © SixtyFPS GmbH <info@slint.dev>
// SPDX-License-Identifier: GPL-3.0-only OR LicenseRef-Slint-Royalty-free-2.0 OR LicenseRef-Slint-Software-3.0

use i_webview_core::frame::ContentFrame;
use i_webview_core::lengths::ContentRect;
use i_webview_core::render_core::{CoreMessage, CoreReply, RenderCoreEndpoint, TouchAction};
use std::thread::JoinHandle;

/// How a [`ScriptedRenderCore`] answers.
#[derive(Debug, Clone, Default)]
pub struct CorePolicy {
    /// The page has touch handlers.
    pub touch_handlers: bool,
    /// The page consumes every touch stream it sees.
    pub claim_touches: bool,
    /// Posted before anything else.
    pub first_frame: Option<ContentFrame>,
    /// Answer to highlight requests.
    pub highlight: Option<ContentRect>,
    /// Text reported for every selection range.
    pub selection_text: String,
}

impl CorePolicy {
    fn answer(&self, message: &CoreMessage) -> Option<CoreReply> {
        match message {
            CoreMessage::TouchEvent { sequence, action, points, reprocess, .. } => {
                let position = *points.first()?;
                if *reprocess {
                    // Consumed events are not sent back.
                    (!self.claim_touches).then_some(CoreReply::ReprocessTouch {
                        sequence: *sequence,
                        action: *action,
                        position,
                    })
                } else if matches!(action, TouchAction::Down | TouchAction::Move) {
                    Some(CoreReply::PreventTouch {
                        sequence: *sequence,
                        action: *action,
                        claimed: self.claim_touches,
                    })
                } else {
                    None
                }
            }
            CoreMessage::RequestTouchHighlight { .. } => Some(CoreReply::TouchHighlight(self.highlight)),
            CoreMessage::ExtendSelection { generation, anchor, extent, .. } => {
                Some(CoreReply::SelectionRange {
                    generation: *generation,
                    start: *anchor,
                    end: *extent,
                    text: self.selection_text.clone(),
                })
            }
            _ => None,
        }
    }
}

/// A stand-in for the render core, answering on its own thread until the widget closes
/// its end of the channel.
pub struct ScriptedRenderCore {
    thread: JoinHandle<Vec<CoreMessage>>,
}

impl ScriptedRenderCore {
    pub fn spawn(endpoint: RenderCoreEndpoint, policy: CorePolicy) -> std::io::Result<Self> {
        let thread = std::thread::Builder::new()
            .name("scripted render core".into())
            .spawn(move || run(endpoint, policy))?;
        Ok(Self { thread })
    }

    /// Wait until the widget closed the channel. Returns every message received.
    pub fn join(self) -> std::thread::Result<Vec<CoreMessage>> {
        self.thread.join()
    }
}

fn run(endpoint: RenderCoreEndpoint, policy: CorePolicy) -> Vec<CoreMessage> {
    let mut received = Vec::new();
    let post = |reply| endpoint.reply(reply).is_ok();
    if policy.touch_handlers && !post(CoreReply::SetTouchHandlers(true)) {
        return received;
    }
    if let Some(frame) = policy.first_frame.clone() {
        if !post(CoreReply::NewFrame(frame)) {
            return received;
        }
    }
    while let Ok(message) = endpoint.recv() {
        log::trace!("render core received {message:?}");
        if let Some(reply) = policy.answer(&message) {
            if endpoint.reply(reply).is_err() {
                break;
            }
        }
        received.push(message);
    }
    received
}
