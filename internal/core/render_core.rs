// Copyright © SixtyFPS GmbH <info@slint.dev>
// SPDX-License-Identifier: GPL-3.0-only OR LicenseRef-Slint-Royalty-free-2.0 OR LicenseRef-Slint-Software-3.0

/*!
The message channel between the widget and the render core.

The render core runs on its own thread. The widget never calls into it: it posts
[`CoreMessage`]s, and the core posts [`CoreReply`]s back. Replies are only looked at
when the widget dequeues them on the UI thread, and every reply that answers an
earlier message carries the sequence or generation number of that message so that
answers to superseded requests can be recognized and dropped.
*/

use crate::animations::Instant;
use crate::frame::ContentFrame;
use crate::input::{Key, KeyEventType};
use crate::lengths::{ContentPoint, ContentRect, ContentVector, Coord};
use crate::timers::TimerList;
use core::time::Duration;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError};

/// Touch actions as seen by the render core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
pub enum TouchAction {
    Down,
    Move,
    Up,
    Cancel,
    /// Synthesized by the widget when a deferred touch stream was held long enough.
    LongPress,
    /// Synthesized by the widget when a deferred touch stream was a double tap.
    DoubleTap,
}

/// Messages posted to the render core.
#[derive(Debug, Clone, PartialEq, strum::EnumDiscriminants)]
#[strum_discriminants(name(CoreMessageKind), derive(Hash, strum::Display))]
#[non_exhaustive]
pub enum CoreMessage {
    /// A touch event forwarded to the page. `reprocess` asks the core to send the event
    /// back with [`CoreReply::ReprocessTouch`] if the page does not consume it.
    TouchEvent {
        sequence: u64,
        action: TouchAction,
        points: Vec<ContentPoint>,
        meta_state: u32,
        reprocess: bool,
    },
    /// A committed tap.
    TouchUp { generation: u64, frame: u64, node: u64, x: Coord, y: Coord },
    KeyEvent { key: Key, event_type: KeyEventType, meta_state: u32 },
    /// Layout and painting should yield to scrolling.
    ReducePriority,
    ResumePriority,
    /// Stop producing new pictures until resumed.
    PauseUpdatePicture,
    ResumeUpdatePicture,
    /// The visible scroll position settled at `position`.
    SetScrollOffset { position: ContentPoint },
    ScrollLayer { layer: u64, scroll: ContentPoint },
    ExtendSelection { generation: u64, anchor: ContentPoint, extent: ContentPoint, extend: bool },
    /// Compute the highlight rectangle of the clickable element under `position`.
    RequestTouchHighlight { position: ContentPoint, slop: Coord },
    PluginsChanged,
}

/// Messages posted by the render core.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum CoreReply {
    /// Whether the page consumed (`claimed`) the touch event with `sequence`.
    PreventTouch { sequence: u64, action: TouchAction, claimed: bool },
    NewFrame(ContentFrame),
    SelectionRange { generation: u64, start: ContentPoint, end: ContentPoint, text: String },
    ScrollTo { position: ContentPoint },
    ScrollBy { delta: ContentVector, animate: bool },
    /// The touch event with `sequence`, sent with `reprocess`, that the page did not consume.
    ReprocessTouch { sequence: u64, action: TouchAction, position: ContentPoint },
    CursorBounds(Option<ContentRect>),
    TouchHighlight(Option<ContentRect>),
    /// Whether the page has touch event handlers.
    SetTouchHandlers(bool),
}

/// Error returned by the render-core end of the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Error, derive_more::Display)]
#[non_exhaustive]
pub enum ChannelError {
    /// The other end of the channel was dropped or closed.
    #[display("The channel to the widget is disconnected")]
    Disconnected,
}

/// Create a connected pair of channel ends.
pub fn channel() -> (RenderCoreChannel, RenderCoreEndpoint) {
    let (message_sender, message_receiver) = crossbeam_channel::unbounded();
    let (reply_sender, reply_receiver) = crossbeam_channel::unbounded();
    (
        RenderCoreChannel {
            sender: Some(message_sender),
            replies: reply_receiver,
            delayed: TimerList::default(),
        },
        RenderCoreEndpoint { messages: message_receiver, replies: reply_sender },
    )
}

/// The widget's end of the channel. Lives on the UI thread.
pub struct RenderCoreChannel {
    sender: Option<Sender<CoreMessage>>,
    replies: Receiver<CoreReply>,
    delayed: TimerList<CoreMessage>,
}

impl RenderCoreChannel {
    /// Post `message`. Messages arrive in the order they were sent. Does nothing once
    /// the channel is closed or the render core is gone.
    pub fn send(&self, message: CoreMessage) {
        let Some(sender) = &self.sender else {
            log::debug!("Render core channel closed, dropping {}", CoreMessageKind::from(&message));
            return;
        };
        if let Err(err) = sender.send(message) {
            log::debug!("Render core is gone, dropping {}", CoreMessageKind::from(&err.0));
        }
    }

    /// Post `message` once `delay` has elapsed after `now`, unless cancelled first with
    /// [`Self::cancel_pending`]. Delayed messages are released by [`Self::flush_delayed`].
    pub fn send_delayed(&mut self, message: CoreMessage, delay: Duration, now: Instant) {
        if self.sender.is_none() {
            return;
        }
        self.delayed.start(message, delay, now);
    }

    /// Drop every delayed message of `kind` not yet posted. Returns how many were dropped.
    pub fn cancel_pending(&mut self, kind: CoreMessageKind) -> usize {
        self.delayed.stop_where(|message| CoreMessageKind::from(message) == kind)
    }

    pub fn has_pending(&self, kind: CoreMessageKind) -> bool {
        self.delayed.any_pending(|message| CoreMessageKind::from(message) == kind)
    }

    /// Post every delayed message that is due at `now`.
    pub fn flush_delayed(&mut self, now: Instant) {
        for message in self.delayed.take_expired(now) {
            self.send(message);
        }
    }

    /// When the next delayed message is due.
    pub fn next_timeout(&self) -> Option<Instant> {
        self.delayed.next_timeout()
    }

    /// The next reply of the render core, if any arrived.
    pub fn try_recv(&self) -> Option<CoreReply> {
        self.replies.try_recv().ok()
    }

    /// Block for at most `timeout` until the render core posts a reply.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<CoreReply> {
        self.replies.recv_timeout(timeout).ok()
    }

    /// A sender for messages that do not originate from this widget, such as broadcasts.
    pub fn broadcast_sender(&self) -> Option<Sender<CoreMessage>> {
        self.sender.clone()
    }

    /// Tear down the sending side. Every later send is a no-op.
    pub fn close(&mut self) {
        self.sender = None;
        self.delayed.clear();
    }

    pub fn is_connected(&self) -> bool {
        self.sender.is_some()
    }
}

/// The render core's end of the channel. Can be moved to another thread.
pub struct RenderCoreEndpoint {
    messages: Receiver<CoreMessage>,
    replies: Sender<CoreReply>,
}

impl RenderCoreEndpoint {
    /// Block until the widget posts a message.
    pub fn recv(&self) -> Result<CoreMessage, ChannelError> {
        self.messages.recv().map_err(|_| ChannelError::Disconnected)
    }

    /// Like [`Self::recv`], but gives up after `timeout` and returns `Ok(None)`.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Option<CoreMessage>, ChannelError> {
        match self.messages.recv_timeout(timeout) {
            Ok(message) => Ok(Some(message)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(ChannelError::Disconnected),
        }
    }

    pub fn try_recv(&self) -> Result<Option<CoreMessage>, ChannelError> {
        match self.messages.try_recv() {
            Ok(message) => Ok(Some(message)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(ChannelError::Disconnected),
        }
    }

    /// Every message posted so far, without blocking.
    pub fn drain(&self) -> Vec<CoreMessage> {
        self.messages.try_iter().collect()
    }

    pub fn reply(&self, reply: CoreReply) -> Result<(), ChannelError> {
        self.replies.send(reply).map_err(|_| ChannelError::Disconnected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_ordered() {
        let (channel, endpoint) = channel();
        channel.send(CoreMessage::ReducePriority);
        channel.send(CoreMessage::PauseUpdatePicture);
        assert_eq!(
            endpoint.drain(),
            vec![CoreMessage::ReducePriority, CoreMessage::PauseUpdatePicture]
        );
        endpoint.reply(CoreReply::SetTouchHandlers(true)).unwrap();
        assert!(matches!(channel.try_recv(), Some(CoreReply::SetTouchHandlers(true))));
        assert!(channel.try_recv().is_none());
    }

    #[test]
    fn delayed_messages_can_be_cancelled() {
        let (mut channel, endpoint) = channel();
        let highlight =
            CoreMessage::RequestTouchHighlight { position: ContentPoint::new(1., 2.), slop: 12. };
        channel.send_delayed(highlight.clone(), Duration::from_millis(100), Instant(0));
        channel.send_delayed(CoreMessage::ResumePriority, Duration::from_millis(50), Instant(0));
        assert!(channel.has_pending(CoreMessageKind::RequestTouchHighlight));
        assert_eq!(channel.next_timeout(), Some(Instant(50)));

        channel.flush_delayed(Instant(60));
        assert_eq!(endpoint.drain(), vec![CoreMessage::ResumePriority]);

        assert_eq!(channel.cancel_pending(CoreMessageKind::RequestTouchHighlight), 1);
        channel.flush_delayed(Instant(1000));
        assert!(endpoint.drain().is_empty());

        channel.send_delayed(highlight.clone(), Duration::from_millis(100), Instant(1000));
        channel.flush_delayed(Instant(1100));
        assert_eq!(endpoint.drain(), vec![highlight]);
    }

    #[test]
    fn closed_channel_drops_messages() {
        let (mut channel, endpoint) = channel();
        channel.close();
        assert!(!channel.is_connected());
        channel.send(CoreMessage::ReducePriority);
        channel.send_delayed(CoreMessage::ResumePriority, Duration::ZERO, Instant(0));
        channel.flush_delayed(Instant(0));
        assert_eq!(endpoint.recv(), Err(ChannelError::Disconnected));
    }

    #[test]
    fn dropped_endpoint_is_not_an_error() {
        let (channel, endpoint) = channel();
        drop(endpoint);
        channel.send(CoreMessage::ReducePriority);
        assert!(channel.try_recv().is_none());
    }
}
