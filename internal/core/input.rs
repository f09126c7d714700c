// Copyright © SixtyFPS GmbH <info@slint.dev>
// SPDX-License-Identifier: GPL-3.0-only OR LicenseRef-Slint-Royalty-free-2.0 OR LicenseRef-Slint-Software-3.0

/*! Input events delivered by the platform view system
*/
#![warn(missing_docs)]

use crate::animations::Instant;
use crate::lengths::ViewPoint;

/// What happened to the pointer(s).
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum PointerEventKind {
    /// The first pointer touched the view
    Down,
    /// One or more pointers moved
    Move,
    /// The last pointer left the view
    Up,
    /// The platform aborted the touch stream
    Cancel,
    /// An additional pointer went down while another one is already down
    PointerDown,
    /// One of several pointers went up; at least one remains down
    PointerUp,
}

/// A touch or mouse event in view coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    /// The kind of event
    pub kind: PointerEventKind,
    /// Position of the primary pointer, or the remaining pointer after a [`PointerEventKind::PointerUp`]
    pub position: ViewPoint,
    /// Number of pointers down after this event
    pub pointer_count: usize,
    /// When the event happened
    pub time: Instant,
    /// The keyboard modifiers at the time of the event
    pub modifiers: KeyboardModifiers,
}

impl PointerEvent {
    /// Convenience constructor for single-pointer events
    pub fn new(kind: PointerEventKind, position: ViewPoint, time: Instant) -> Self {
        let pointer_count = match kind {
            PointerEventKind::Up | PointerEventKind::Cancel => 0,
            PointerEventKind::PointerDown => 2,
            _ => 1,
        };
        Self { kind, position, pointer_count, time, modifiers: KeyboardModifiers::default() }
    }
}

/// KeyboardModifier provides booleans to indicate possible modifier keys
/// on a keyboard, such as Shift, Control, etc.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct KeyboardModifiers {
    /// Indicates the alt key on a keyboard.
    pub alt: bool,
    /// Indicates the control key on a keyboard.
    pub control: bool,
    /// Indicates the logo key on macOS and the windows key on Windows.
    pub meta: bool,
    /// Indicates the shift key on a keyboard.
    pub shift: bool,
}

impl KeyboardModifiers {
    /// Bit mask sent to the render core along with touch and key events.
    pub fn meta_state(&self) -> u32 {
        (self.shift as u32) | (self.alt as u32) << 1 | (self.control as u32) << 2 | (self.meta as u32) << 3
    }
}

/// Keys the widget distinguishes. Everything else travels as text.
#[derive(Debug, Clone, PartialEq, Eq, strum::Display)]
#[non_exhaustive]
pub enum Key {
    /// A key producing text
    Character(char),
    #[allow(missing_docs)]
    PageUp,
    #[allow(missing_docs)]
    PageDown,
    #[allow(missing_docs)]
    Home,
    #[allow(missing_docs)]
    End,
    #[allow(missing_docs)]
    Escape,
    #[allow(missing_docs)]
    Space,
    #[allow(missing_docs)]
    Other(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, strum::EnumString, strum::Display)]
/// This enum defines the different kinds of key events that can happen.
pub enum KeyEventType {
    /// A key on a keyboard was pressed.
    #[default]
    KeyPressed,
    /// A key on a keyboard was released.
    KeyReleased,
}

/// Represents a key event sent by the windowing system.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyEvent {
    /// The key
    pub key: Key,
    /// The keyboard modifiers active at the time of the key press event.
    pub modifiers: KeyboardModifiers,
    /// Indicates whether the key was pressed or released
    pub event_type: KeyEventType,
}

impl KeyEvent {
    /// A key press without modifiers
    pub fn pressed(key: Key) -> Self {
        Self { key, modifiers: KeyboardModifiers::default(), event_type: KeyEventType::KeyPressed }
    }

    /// If a shortcut was pressed, this function returns `Some(StandardShortcut)`.
    /// Otherwise it returns None.
    pub fn shortcut(&self) -> Option<StandardShortcut> {
        if self.modifiers.control && !self.modifiers.shift {
            match self.key {
                Key::Character('c') => Some(StandardShortcut::Copy),
                Key::Character('a') => Some(StandardShortcut::SelectAll),
                _ => None,
            }
        } else {
            None
        }
    }
}

/// Represents a non context specific shortcut.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StandardShortcut {
    /// Copy Something
    Copy,
    /// Select All
    SelectAll,
}

/// Phase of a platform scale gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum ScaleGesturePhase {
    #[allow(missing_docs)]
    Begin,
    #[allow(missing_docs)]
    Update,
    #[allow(missing_docs)]
    End,
}

/// An event from the platform's scale-gesture detector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleGestureEvent {
    /// Phase of the gesture
    pub phase: ScaleGesturePhase,
    /// Focus point between the fingers
    pub focus: ViewPoint,
    /// Scale change since the previous event of this gesture
    pub scale_factor: f32,
    /// When the event happened
    pub time: Instant,
}
