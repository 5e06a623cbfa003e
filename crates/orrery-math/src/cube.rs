//! Axis-aligned bounding boxes.
//!
//! A [`Cube`] is a position plus a size. The constructor normalizes negative
//! sizes by shifting the position, so `size` is always componentwise
//! non-negative. Overlap tests are inclusive: boxes touching at a face (or
//! zero-size boxes meeting at a point) count as overlapping, with a
//! zero-size intersection.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::Vec3;

/// An axis-aligned box, used by blocks to report their outline and by the
/// collision-overlap queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Cube {
    /// Minimum corner.
    pub pos: Vec3,
    /// Extent along each axis; always non-negative after construction.
    pub size: Vec3,
}

impl Cube {
    /// Construct from a corner and a size. Negative size components are
    /// normalized by shifting `pos` so the stored size is non-negative.
    pub fn new(mut pos: Vec3, mut size: Vec3) -> Self {
        if size.x < 0.0 {
            pos.x += size.x;
            size.x = -size.x;
        }
        if size.y < 0.0 {
            pos.y += size.y;
            size.y = -size.y;
        }
        if size.z < 0.0 {
            pos.z += size.z;
            size.z = -size.z;
        }
        Self { pos, size }
    }

    /// A box of the given size centered on the origin.
    pub fn from_center(size: Vec3) -> Self {
        Self::new(size * -0.5, size)
    }

    /// The maximum corner, `pos + size`.
    #[inline]
    pub fn end_pos(&self) -> Vec3 {
        self.pos + self.size
    }

    /// The center point.
    #[inline]
    pub fn center(&self) -> Vec3 {
        self.pos + self.size * 0.5
    }

    /// Whether the two boxes intersect. Inclusive on every axis.
    pub fn overlap(&self, x: &Cube) -> bool {
        let (p1, p2) = (self.pos, self.end_pos());
        let (q1, q2) = (x.pos, x.end_pos());
        let (a1, a2) = (q1 - p1, p2 - q1);
        let (b1, b2) = (q2 - p1, p2 - q2);
        (a1.x >= 0.0 && a2.x >= 0.0 || b1.x >= 0.0 && b2.x >= 0.0)
            && (a1.y >= 0.0 && a2.y >= 0.0 || b1.y >= 0.0 && b2.y >= 0.0)
            && (a1.z >= 0.0 && a2.z >= 0.0 || b1.z >= 0.0 && b2.z >= 0.0)
    }

    /// Compute the intersection region, expressed relative to `self`.
    ///
    /// On overlap, writes the region into `area` and returns `true`. The
    /// contents of `area` may be partially written even when the boxes do
    /// not overlap.
    pub fn overlap_box(&self, x: &Cube, area: &mut Cube) -> bool {
        let (p1, p2) = (self.pos, self.end_pos());
        let (q1, q2) = (x.pos, x.end_pos());
        let (a1, a2) = (q1 - p1, p2 - q1);
        let (b1, b2) = (q2 - p1, p2 - q2);

        // Per axis: either x's min corner sits inside self, or x straddles
        // self's min corner from below.
        if a1.x >= 0.0 && a2.x >= 0.0 {
            area.pos.x = a1.x;
            area.size.x = if b2.x >= 0.0 { x.size.x } else { a2.x };
        } else if b1.x >= 0.0 && b2.x >= 0.0 {
            area.pos.x = 0.0;
            area.size.x = b1.x;
        } else {
            return false;
        }
        if a1.y >= 0.0 && a2.y >= 0.0 {
            area.pos.y = a1.y;
            area.size.y = if b2.y >= 0.0 { x.size.y } else { a2.y };
        } else if b1.y >= 0.0 && b2.y >= 0.0 {
            area.pos.y = 0.0;
            area.size.y = b1.y;
        } else {
            return false;
        }
        if a1.z >= 0.0 && a2.z >= 0.0 {
            area.pos.z = a1.z;
            area.size.z = if b2.z >= 0.0 { x.size.z } else { a2.z };
        } else if b1.z >= 0.0 && b2.z >= 0.0 {
            area.pos.z = 0.0;
            area.size.z = b1.z;
        } else {
            return false;
        }
        true
    }
}

impl fmt::Display for Cube {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Cube(pos={}, size={})", self.pos, self.size)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
