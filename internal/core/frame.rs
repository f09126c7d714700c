// Copyright © SixtyFPS GmbH <info@slint.dev>
// SPDX-License-Identifier: GPL-3.0-only OR LicenseRef-Slint-Royalty-free-2.0 OR LicenseRef-Slint-Software-3.0

/*!
Snapshots of the rendered page.

The render core paints the page into a [`Picture`] and ships it together with the
hit-test data it computed for that paint. A [`ContentFrame`] is never mutated once
received: the [`FrameCache`] swaps whole frames.
*/

use crate::lengths::{ContentPoint, ContentRect, ContentSize, Coord};
use alloc::sync::Arc;
use core::any::Any;

/// Opaque drawable produced by the render core. Cheap to clone.
#[derive(Clone)]
pub struct Picture(Arc<dyn Any + Send + Sync>);

impl Picture {
    pub fn new<T: Any + Send + Sync>(payload: T) -> Self {
        Self(Arc::new(payload))
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref()
    }

    /// Returns true if both pictures share the same payload.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl core::fmt::Debug for Picture {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("Picture(..)")
    }
}

/// A clickable element of the page.
#[derive(Debug, Clone, PartialEq)]
pub struct NavNode {
    pub frame: u64,
    pub node: u64,
    pub bounds: ContentRect,
    /// Plugins get the raw touch stream, so a touch starting on one is deferred to the render core.
    pub is_plugin: bool,
}

/// A sub-layer of the page with its own scroll position.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrollableLayer {
    pub id: u64,
    pub bounds: ContentRect,
    pub scroll: ContentPoint,
    pub max_scroll: ContentPoint,
}

#[derive(Debug, Clone)]
pub struct ContentFrame {
    /// Size of the whole document.
    pub size: ContentSize,
    pub picture: Picture,
    pub nav_nodes: Vec<NavNode>,
    pub layers: Vec<ScrollableLayer>,
    /// Scroll position the page asks for when this frame is the first of a document.
    pub scroll_hint: Option<ContentPoint>,
}

impl ContentFrame {
    pub fn new(size: ContentSize, picture: Picture) -> Self {
        Self { size, picture, nav_nodes: Vec::new(), layers: Vec::new(), scroll_hint: None }
    }

    /// The nav node under `point`. Nodes are grown by `slop` on each side; a node
    /// containing the point itself wins over one only reached through the slop,
    /// then the closest center wins.
    pub fn hit_nav_node(&self, point: ContentPoint, slop: Coord) -> Option<&NavNode> {
        let distance = |node: &NavNode| (node.bounds.center() - point).square_length();
        self.nav_nodes
            .iter()
            .filter(|node| node.bounds.inflate(slop, slop).contains(point))
            .min_by(|a, b| {
                b.bounds
                    .contains(point)
                    .cmp(&a.bounds.contains(point))
                    .then_with(|| distance(a).total_cmp(&distance(b)))
            })
    }

    /// The topmost scrollable layer under `point` that can actually scroll.
    pub fn hit_layer(&self, point: ContentPoint) -> Option<&ScrollableLayer> {
        self.layers.iter().rev().find(|layer| {
            layer.bounds.contains(point) && (layer.max_scroll.x > 0. || layer.max_scroll.y > 0.)
        })
    }
}

/// Outcome of [`FrameCache::replace`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameUpdate {
    Applied,
    /// Updates are paused: the frame is kept aside until [`FrameCache::resume`].
    Held,
}

/// The frame being displayed, plus the newest one received while updates are paused.
#[derive(Debug, Default)]
pub struct FrameCache {
    current: Option<ContentFrame>,
    held: Option<ContentFrame>,
    paused: bool,
}

impl FrameCache {
    pub fn current(&self) -> Option<&ContentFrame> {
        self.current.as_ref()
    }

    pub fn content_size(&self) -> ContentSize {
        self.current.as_ref().map_or(ContentSize::zero(), |frame| frame.size)
    }

    pub fn replace(&mut self, frame: ContentFrame) -> FrameUpdate {
        if self.paused {
            // Only the newest one matters.
            self.held = Some(frame);
            FrameUpdate::Held
        } else {
            self.current = Some(frame);
            FrameUpdate::Applied
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Resume updates. Returns true if a held frame was swapped in.
    pub fn resume(&mut self) -> bool {
        self.paused = false;
        match self.held.take() {
            Some(frame) => {
                self.current = Some(frame);
                true
            }
            None => false,
        }
    }

    pub fn hit_nav_node(&self, point: ContentPoint, slop: Coord) -> Option<&NavNode> {
        self.current.as_ref()?.hit_nav_node(point, slop)
    }

    pub fn hit_layer(&self, point: ContentPoint) -> Option<&ScrollableLayer> {
        self.current.as_ref()?.hit_layer(point)
    }
}
