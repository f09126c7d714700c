// Copyright © SixtyFPS GmbH <info@slint.dev>
// SPDX-License-Identifier: GPL-3.0-only OR LicenseRef-Slint-Royalty-free-2.0 OR LicenseRef-Slint-Software-3.0

//! Mapping between content and view coordinates.
//!
//! View points handed to a [`ZoomMapper`] are document view points: the on-screen
//! position plus the current scroll offset.

use crate::lengths::{ContentPoint, ContentSize, Coord, ViewPoint, ViewSize, ZoomScale};

pub trait ZoomMapper {
    fn scale(&self) -> ZoomScale;

    fn to_content(&self, point: ViewPoint) -> ContentPoint;

    fn to_view(&self, point: ContentPoint) -> ViewPoint;

    /// Size of the whole document in view pixels.
    fn content_extent(&self, size: ContentSize) -> ViewSize {
        let bottom_right = self.to_view(ContentPoint::new(size.width, size.height));
        ViewSize::new(bottom_right.x, bottom_right.y)
    }

    fn can_zoom_in(&self) -> bool;

    fn can_zoom_out(&self) -> bool;

    /// Zoom in or out in response to a double tap. Returns true if the scale changed.
    fn handle_double_tap(&mut self) -> bool;

    /// Multiply the scale by `factor`, within limits. Returns true if the scale changed.
    fn apply_scale_factor(&mut self, factor: Coord) -> bool;
}

/// The default zoom policy: a scale clamped between a minimum and a maximum, toggled
/// between the default and a reading scale on double tap.
#[derive(Debug, Clone)]
pub struct ZoomManager {
    scale: Coord,
    pub default_scale: Coord,
    pub double_tap_scale: Coord,
    pub min_scale: Coord,
    pub max_scale: Coord,
    /// Height of the title bar drawn above the content, in view pixels.
    pub title_bar_height: Coord,
}

impl Default for ZoomManager {
    fn default() -> Self {
        Self {
            scale: 1.,
            default_scale: 1.,
            double_tap_scale: 1.5,
            min_scale: 0.25,
            max_scale: 4.,
            title_bar_height: 0.,
        }
    }
}

const MINIMUM_SCALE_INCREMENT: Coord = 0.01;

impl ZoomManager {
    pub fn set_scale(&mut self, scale: Coord) -> bool {
        let scale = scale.clamp(self.min_scale, self.max_scale);
        if (scale - self.scale).abs() < Coord::EPSILON {
            return false;
        }
        self.scale = scale;
        true
    }
}

impl ZoomMapper for ZoomManager {
    fn scale(&self) -> ZoomScale {
        ZoomScale::new(self.scale)
    }

    fn to_content(&self, point: ViewPoint) -> ContentPoint {
        ContentPoint::new(point.x / self.scale, (point.y - self.title_bar_height) / self.scale)
    }

    fn to_view(&self, point: ContentPoint) -> ViewPoint {
        ViewPoint::new(point.x * self.scale, point.y * self.scale + self.title_bar_height)
    }

    fn can_zoom_in(&self) -> bool {
        self.max_scale - self.scale > MINIMUM_SCALE_INCREMENT
    }

    fn can_zoom_out(&self) -> bool {
        self.scale - self.min_scale > MINIMUM_SCALE_INCREMENT
    }

    fn handle_double_tap(&mut self) -> bool {
        if self.scale < self.double_tap_scale - MINIMUM_SCALE_INCREMENT {
            self.set_scale(self.double_tap_scale)
        } else {
            self.set_scale(self.default_scale)
        }
    }

    fn apply_scale_factor(&mut self, factor: Coord) -> bool {
        if !(factor.is_finite() && factor > 0.) {
            return false;
        }
        self.set_scale(self.scale * factor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_with_title_bar() {
        let zoom = ZoomManager { scale: 2., title_bar_height: 40., ..Default::default() };
        let content = ContentPoint::new(10., 20.);
        let view = zoom.to_view(content);
        assert_eq!(view, ViewPoint::new(20., 80.));
        assert_eq!(zoom.to_content(view), content);
        assert_eq!(
            zoom.content_extent(ContentSize::new(100., 50.)),
            ViewSize::new(200., 140.)
        );
    }

    #[test]
    fn double_tap_toggles() {
        let mut zoom = ZoomManager::default();
        assert!(zoom.handle_double_tap());
        assert_eq!(zoom.scale().get(), 1.5);
        assert!(zoom.handle_double_tap());
        assert_eq!(zoom.scale().get(), 1.);
    }

    #[test]
    fn scale_is_clamped() {
        let mut zoom = ZoomManager::default();
        assert!(zoom.apply_scale_factor(100.));
        assert_eq!(zoom.scale().get(), 4.);
        assert!(!zoom.can_zoom_in());
        assert!(zoom.can_zoom_out());
        assert!(!zoom.apply_scale_factor(2.));
        assert!(!zoom.apply_scale_factor(f32::NAN));
    }
}
