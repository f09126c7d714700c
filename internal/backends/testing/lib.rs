// Copyright © SixtyFPS GmbH <info@slint.dev>
// SPDX-License-Identifier: GPL-3.0-only OR LicenseRef-Slint-Royalty-free-2.0 OR LicenseRef-Slint-Software-3.0

#![doc = include_str!("README.md")]

mod scripted_core;
mod testing_backend;

pub use scripted_core::{CorePolicy, ScriptedRenderCore};
pub use testing_backend::TestWebView;

/// Route the `log` output of the widget to the test output.
///
/// Set `RUST_LOG=debug` to see the gesture decisions.
pub fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
