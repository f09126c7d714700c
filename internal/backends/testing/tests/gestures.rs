// Copyright © SixtyFPS GmbH <info@slint.dev>
// SPDX-License-Identifier: GPL-3.0-only OR LicenseRef-Slint-Royalty-free-2.0 OR LicenseRef-Slint-Software-3.0

use euclid::{point2, size2};
use i_webview_backend_testing::{TestWebView, init_test_logging};
use i_webview_core::gesture::TouchMode;
use i_webview_core::input::{Key, KeyEvent, KeyEventType, KeyboardModifiers};
use i_webview_core::render_core::{CoreMessage, CoreReply};
use i_webview_core::tests::HostEvent;

fn phone() -> TestWebView {
    init_test_logging();
    TestWebView::new(size2(400., 800.), size2(800., 4000.))
}

fn selection_generations(messages: &[CoreMessage]) -> Vec<u64> {
    messages
        .iter()
        .filter_map(|message| match message {
            CoreMessage::ExtendSelection { generation, .. } => Some(*generation),
            _ => None,
        })
        .collect()
}

#[test]
fn double_tap_toggles_the_zoom() {
    let mut test = phone();
    test.tap(point2(200., 300.));
    test.advance(100);
    test.tap(point2(205., 305.));
    test.advance(500);
    assert_eq!(test.web_view().zoom().scale().get(), 1.5);

    test.advance(1000);
    test.tap(point2(200., 300.));
    test.advance(100);
    test.tap(point2(200., 300.));
    test.advance(500);
    assert_eq!(test.web_view().zoom().scale().get(), 1.);
    assert_eq!(test.host().clicks(), 0);
    let double_taps = test
        .host()
        .events()
        .into_iter()
        .filter(|event| matches!(event, HostEvent::DoubleTapped(_)))
        .count();
    assert_eq!(double_taps, 2);
}

#[test]
fn taps_far_apart_are_two_clicks() {
    let mut test = phone();
    test.tap(point2(50., 50.));
    test.advance(100);
    test.tap(point2(350., 700.));
    test.advance(500);
    assert_eq!(
        test.host().events(),
        vec![HostEvent::Click(point2(50., 50.)), HostEvent::Click(point2(350., 700.))]
    );
}

#[test]
fn scrolling_stays_within_the_document() {
    let mut test = phone();
    // Dragging down at the top of the page does not scroll.
    test.drag(point2(200., 100.), point2(200., 600.), 100, 10, false);
    assert_eq!(test.web_view().scroll_offset(), point2(0., 0.));

    assert!(test.web_view().scroll_to(point2(0., 100_000.), true));
    test.advance(2000);
    assert_eq!(test.web_view().scroll_offset(), point2(0., 3200.));
    assert!(
        test.take_sent()
            .contains(&CoreMessage::SetScrollOffset { position: point2(0., 3200.) })
    );
    test.drag(point2(200., 600.), point2(200., 100.), 100, 10, true);
    test.advance(3000);
    assert_eq!(test.web_view().scroll_offset(), point2(0., 3200.));
    assert!(!test.web_view().is_scroll_animating());
}

#[test]
fn fling_is_caught_by_the_next_touch() {
    let mut test = phone();
    test.drag(point2(200., 700.), point2(200., 400.), 100, 10, true);
    assert!(test.web_view().is_scroll_animating());
    test.advance(100);
    test.press(point2(200., 400.));
    let caught = test.web_view().scroll_offset();
    assert_eq!(test.web_view().touch_mode(), Some(TouchMode::DragStart));
    test.advance(300);
    test.release(point2(200., 400.));
    test.advance(1000);
    assert_eq!(test.web_view().scroll_offset(), caught);
    assert_eq!(test.host().clicks(), 0);
}

#[test]
fn long_press_selects_and_copies() {
    let mut test = phone();
    test.press(point2(40., 80.));
    test.advance(1000);
    assert!(test.web_view().is_selecting());
    test.move_to(point2(120., 80.));
    test.move_to(point2(240., 100.));
    test.release(point2(240., 100.));

    let generations = selection_generations(&test.take_sent());
    let Some(&latest) = generations.last() else { panic!("no selection was requested") };
    test.reply(CoreReply::SelectionRange {
        generation: latest,
        start: point2(40., 72.),
        end: point2(240., 108.),
        text: "selected words".into(),
    })
    .unwrap();
    assert_eq!(test.web_view().selection_text(), Some("selected words"));
    assert!(test.web_view().draw().selection.is_some());

    let copy = KeyEvent {
        key: Key::Character('c'),
        modifiers: KeyboardModifiers { control: true, ..Default::default() },
        event_type: KeyEventType::KeyPressed,
    };
    assert!(test.web_view().process_key_event(&copy));
    assert!(!test.web_view().is_selecting());
    let events = test.host().take_events();
    assert!(events.contains(&HostEvent::Clipboard("selected words".into())));
    assert_eq!(events.last(), Some(&HostEvent::SelectionModeFinished));
    test.advance(500);
    assert_eq!(test.host().clicks(), 0);
}

#[test]
fn escape_dismisses_the_selection() {
    let mut test = phone();
    assert!(test.web_view().begin_selection());
    test.take_sent();
    assert!(test.web_view().process_key_event(&KeyEvent::pressed(Key::Escape)));
    assert!(!test.web_view().is_selecting());
    let sent = test.take_sent();
    assert!(sent.contains(&CoreMessage::ResumePriority));
    assert!(sent.contains(&CoreMessage::ResumeUpdatePicture));
    assert!(!sent.iter().any(|message| matches!(message, CoreMessage::KeyEvent { .. })));
    assert!(test.finish().unwrap().is_empty());
}
