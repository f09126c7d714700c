// Copyright © SixtyFPS GmbH <info@slint.dev>
// SPDX-License-Identifier: GPL-3.0-only OR LicenseRef-Slint-Royalty-free-2.0 OR LicenseRef-Slint-Software-3.0

/// This type is used as a tagging type for use with [`euclid::Scale`] to convert
/// between document (content) coordinates and on-screen pixels.
pub struct ContentPx;

/// This type is used as a tagging type for on-screen pixels, after the zoom scale
/// and the title bar offset were applied.
pub struct ViewPx;

pub type Coord = f32;

pub type ContentPoint = euclid::Point2D<Coord, ContentPx>;
pub type ContentVector = euclid::Vector2D<Coord, ContentPx>;
pub type ContentSize = euclid::Size2D<Coord, ContentPx>;
pub type ContentRect = euclid::Rect<Coord, ContentPx>;

pub type ViewPoint = euclid::Point2D<Coord, ViewPx>;
pub type ViewVector = euclid::Vector2D<Coord, ViewPx>;
pub type ViewSize = euclid::Size2D<Coord, ViewPx>;
pub type ViewRect = euclid::Rect<Coord, ViewPx>;

/// Zoom factor: how many view pixels one content pixel covers.
pub type ZoomScale = euclid::Scale<Coord, ContentPx, ViewPx>;

/// A velocity in view pixels per second.
pub type ViewVelocity = euclid::Vector2D<Coord, ViewPx>;

/// Squared distance between two points, used for slop comparisons so that no
/// square root is needed.
pub fn distance_squared<U>(a: euclid::Point2D<Coord, U>, b: euclid::Point2D<Coord, U>) -> Coord {
    (a - b).square_length()
}

/// Round a view point to whole pixels. Scroll offsets always live on the pixel grid.
pub fn round_to_pixels(p: ViewPoint) -> ViewPoint {
    p.round()
}
