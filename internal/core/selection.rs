// Copyright © SixtyFPS GmbH <info@slint.dev>
// SPDX-License-Identifier: GPL-3.0-only OR LicenseRef-Slint-Royalty-free-2.0 OR LicenseRef-Slint-Software-3.0

//! Spatial text selection.
//!
//! The widget only tracks the two end points. The render core works out which text
//! lies between them and answers with a [`CoreReply::SelectionRange`](crate::render_core::CoreReply::SelectionRange).

use crate::lengths::{ContentPoint, ContentRect, Coord};
use crate::render_core::CoreMessage;

#[derive(Debug, Clone)]
struct SelectionSession {
    anchor: ContentPoint,
    extent: ContentPoint,
    /// False while the first touch is still placing the start handle, true once
    /// touches drag an end point.
    extend: bool,
    /// A touch is currently moving one of the end points.
    started: bool,
    /// Last range reported by the render core.
    range: Option<(ContentPoint, ContentPoint)>,
    text: String,
}

#[derive(Debug, Default)]
pub struct SelectionController {
    session: Option<SelectionSession>,
    generation: u64,
}

impl SelectionController {
    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    /// A touch is moving one of the end points.
    pub fn is_started(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.started)
    }

    /// The touches of the session have placed the start handle already.
    pub fn is_extending(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.extend)
    }

    /// Generation of the last request; replies with another generation are stale.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn anchor(&self) -> Option<ContentPoint> {
        self.session.as_ref().map(|s| s.anchor)
    }

    pub fn extent(&self) -> Option<ContentPoint> {
        self.session.as_ref().map(|s| s.extent)
    }

    pub fn text(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.text.as_str())
    }

    /// Open a session with both end points at `seed`. Returns false if one is already open.
    ///
    /// `started` is set when a touch is still down at `seed` and will drag the extent.
    pub fn begin(&mut self, seed: ContentPoint, started: bool) -> bool {
        if self.session.is_some() {
            return false;
        }
        self.session = Some(SelectionSession {
            anchor: seed,
            extent: seed,
            extend: started,
            started,
            range: None,
            text: String::new(),
        });
        true
    }

    /// A touch went down at `point`: it places the start handle, or drags the extent if
    /// the start handle is placed already.
    pub fn start_at(&mut self, point: ContentPoint) -> Option<CoreMessage> {
        let session = self.session.as_mut()?;
        if !session.extend {
            session.anchor = point;
        }
        session.extent = point;
        session.started = true;
        Some(self.request())
    }

    /// Move the end point being dragged to `point`.
    pub fn extend_to(&mut self, point: ContentPoint) -> Option<CoreMessage> {
        let session = self.session.as_mut()?;
        if !session.started {
            return None;
        }
        session.extent = point;
        Some(self.request())
    }

    /// The touch that moved an end point went up.
    pub fn finish_touch(&mut self) {
        if let Some(session) = &mut self.session {
            session.started = false;
            session.extend = true;
        }
    }

    fn request(&mut self) -> CoreMessage {
        self.generation += 1;
        let (anchor, extent, extend) =
            self.session.as_ref().map_or((ContentPoint::zero(), ContentPoint::zero(), false), |s| {
                (s.anchor, s.extent, s.extend)
            });
        CoreMessage::ExtendSelection { generation: self.generation, anchor, extent, extend }
    }

    /// Apply a range computed by the render core. Returns false for stale answers.
    pub fn apply_range(
        &mut self,
        generation: u64,
        start: ContentPoint,
        end: ContentPoint,
        text: String,
    ) -> bool {
        let Some(session) = &mut self.session else { return false };
        if generation != self.generation {
            return false;
        }
        session.range = Some((start, end));
        session.text = text;
        true
    }

    /// The area covered by the selection, for hit testing and drawing.
    pub fn bounds(&self) -> Option<ContentRect> {
        let session = self.session.as_ref()?;
        let (a, b) = session.range.unwrap_or((session.anchor, session.extent));
        Some(ContentRect::from_points([a, b]))
    }

    pub fn contains(&self, point: ContentPoint, slop: Coord) -> bool {
        self.bounds().is_some_and(|r| r.inflate(slop, slop).contains(point))
    }

    /// End the session, returning the selected text.
    pub fn commit(&mut self) -> Option<String> {
        self.session.take().map(|s| s.text)
    }

    /// End the session without copying. Returns false if none was open.
    pub fn dismiss(&mut self) -> bool {
        self.session.take().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use euclid::point2;

    #[test]
    fn first_touch_places_the_anchor() {
        let mut selection = SelectionController::default();
        assert!(selection.start_at(point2(1., 1.)).is_none());
        assert!(selection.begin(point2(50., 50.), false));
        assert!(!selection.begin(point2(0., 0.), false));
        assert!(!selection.is_started());

        let message = selection.start_at(point2(10., 20.));
        assert_eq!(
            message,
            Some(CoreMessage::ExtendSelection {
                generation: 1,
                anchor: point2(10., 20.),
                extent: point2(10., 20.),
                extend: false,
            })
        );
        selection.extend_to(point2(80., 40.));
        selection.finish_touch();
        assert_eq!(selection.anchor(), Some(point2(10., 20.)));

        // The next touch drags the extent.
        selection.start_at(point2(90., 60.));
        assert_eq!(selection.anchor(), Some(point2(10., 20.)));
        assert_eq!(selection.extent(), Some(point2(90., 60.)));
    }

    #[test]
    fn stale_ranges_are_dropped() {
        let mut selection = SelectionController::default();
        selection.begin(point2(0., 0.), true);
        selection.extend_to(point2(10., 0.));
        selection.extend_to(point2(20., 0.));
        assert_eq!(selection.generation(), 2);
        assert!(!selection.apply_range(1, point2(0., 0.), point2(10., 0.), "Hello".into()));
        assert!(selection.apply_range(2, point2(0., 0.), point2(20., 10.), "Hello w".into()));
        assert!(selection.contains(point2(15., 5.), 0.));
        assert!(!selection.contains(point2(15., 50.), 12.));
        assert_eq!(selection.commit().as_deref(), Some("Hello w"));
        assert!(!selection.is_active());
        assert!(!selection.dismiss());
    }
}
