// Copyright © SixtyFPS GmbH <info@slint.dev>
// SPDX-License-Identifier: GPL-3.0-only OR LicenseRef-Slint-Royalty-free-2.0 OR LicenseRef-Slint-Software-3.0

#![doc = include_str!("README.md")]
#![deny(unsafe_code)]
extern crate alloc;

pub mod animations;
pub mod config;
pub mod frame;
pub mod gesture;
pub mod input;
pub mod lengths;
pub mod render_core;
pub mod scroller;
pub mod selection;
pub mod services;
#[doc(hidden)]
pub mod tests;
pub mod timers;
pub mod velocity;
pub mod webview;
pub mod zoom;

#[doc(inline)]
pub use config::{ConfigError, GestureConfig};

#[doc(inline)]
pub use render_core::{channel, CoreMessage, CoreReply, RenderCoreChannel, RenderCoreEndpoint};

#[doc(inline)]
pub use services::{ServiceError, Services};

#[doc(inline)]
pub use webview::{DrawSnapshot, WebView, WebViewHost};

pub use lengths::Coord;
