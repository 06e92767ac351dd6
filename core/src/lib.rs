#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Umbra engine.
//!
//! This crate defines the geometric vocabulary that connects the scene loader,
//! the authoritative map, and the pure systems. The map is assembled from a
//! [`scene::SceneDescription`], answers region queries expressed as
//! [`BoundingBox`] values, and hands static [`Segment`] colliders to the
//! collision system. Agent tuning lives in [`config`].

pub mod config;
pub mod scene;

use std::f32::consts::PI;

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle expressed in world units.
///
/// The edges follow the scene convention: `left <= right` along the x axis and
/// `bottom <= top` along the y axis.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    left: f32,
    right: f32,
    bottom: f32,
    top: f32,
}

impl BoundingBox {
    /// Creates a bounding box from its four edges.
    #[must_use]
    pub const fn new(left: f32, right: f32, bottom: f32, top: f32) -> Self {
        Self {
            left,
            right,
            bottom,
            top,
        }
    }

    /// Creates a square box centered at `point` reaching `distance` along each axis.
    ///
    /// A zero distance yields a degenerate box that behaves as a point query.
    #[must_use]
    pub fn from_point_and_distance(point: Vec2, distance: f32) -> Self {
        Self {
            left: point.x - distance,
            right: point.x + distance,
            bottom: point.y - distance,
            top: point.y + distance,
        }
    }

    /// Smallest box enclosing both corner points.
    #[must_use]
    pub fn from_corners(a: Vec2, b: Vec2) -> Self {
        Self {
            left: a.x.min(b.x),
            right: a.x.max(b.x),
            bottom: a.y.min(b.y),
            top: a.y.max(b.y),
        }
    }

    /// Left edge.
    #[must_use]
    pub const fn left(&self) -> f32 {
        self.left
    }

    /// Right edge.
    #[must_use]
    pub const fn right(&self) -> f32 {
        self.right
    }

    /// Bottom edge.
    #[must_use]
    pub const fn bottom(&self) -> f32 {
        self.bottom
    }

    /// Top edge.
    #[must_use]
    pub const fn top(&self) -> f32 {
        self.top
    }

    /// Extent along the x axis.
    #[must_use]
    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    /// Extent along the y axis.
    #[must_use]
    pub fn height(&self) -> f32 {
        self.top - self.bottom
    }

    /// Midpoint of the box.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        Vec2::new(
            (self.left + self.right) / 2.0,
            (self.bottom + self.top) / 2.0,
        )
    }

    /// Reports whether the edges are ordered (`left <= right`, `bottom <= top`).
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        self.left <= self.right && self.bottom <= self.top
    }

    /// Separating-axis overlap test.
    ///
    /// Boxes that merely share an edge do not intersect.
    #[must_use]
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        !(self.right <= other.left
            || self.left >= other.right
            || self.top <= other.bottom
            || self.bottom >= other.top)
    }

    /// Reports whether every point of `self` lies within `other`.
    #[must_use]
    pub fn is_contained_in(&self, other: &BoundingBox) -> bool {
        self.left >= other.left
            && self.right <= other.right
            && self.bottom >= other.bottom
            && self.top <= other.top
    }

    /// Reports whether `self` lies within the interior of `other`, clear of its edges.
    ///
    /// Every box inside the interior of a query box, degenerate or not,
    /// intersects it.
    #[must_use]
    pub fn is_strictly_inside(&self, other: &BoundingBox) -> bool {
        self.left > other.left
            && self.right < other.right
            && self.bottom > other.bottom
            && self.top < other.top
    }

    /// Overlapping region of two boxes, or `None` when they do not intersect.
    #[must_use]
    pub fn intersection(&self, other: &BoundingBox) -> Option<BoundingBox> {
        if !self.intersects(other) {
            return None;
        }

        Some(BoundingBox {
            left: self.left.max(other.left),
            right: self.right.min(other.right),
            bottom: self.bottom.max(other.bottom),
            top: self.top.min(other.top),
        })
    }

    /// Smallest box enclosing both boxes.
    #[must_use]
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            left: self.left.min(other.left),
            right: self.right.max(other.right),
            bottom: self.bottom.min(other.bottom),
            top: self.top.max(other.top),
        }
    }
}

/// Static line segment used for collision and shadow casting.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// First endpoint.
    pub pt1: Vec2,
    /// Second endpoint.
    pub pt2: Vec2,
}

impl Segment {
    /// Creates a segment from two endpoints.
    #[must_use]
    pub const fn new(pt1: Vec2, pt2: Vec2) -> Self {
        Self { pt1, pt2 }
    }

    /// Length of the segment.
    #[must_use]
    pub fn length(&self) -> f32 {
        self.pt1.distance(self.pt2)
    }

    /// Reports whether both endpoints coincide.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.pt1 == self.pt2
    }

    /// Unit vector pointing from `pt2` toward `pt1`, or `None` for degenerate segments.
    #[must_use]
    pub fn direction(&self) -> Option<Vec2> {
        (self.pt1 - self.pt2).try_normalize()
    }

    /// Bounding box of the segment.
    #[must_use]
    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_corners(self.pt1, self.pt2)
    }

    /// Point of the infinite line through the segment nearest to `point`.
    ///
    /// Degenerate segments have no line; the shared endpoint is returned.
    #[must_use]
    pub fn nearest_point_on_line(&self, point: Vec2) -> Vec2 {
        let Some(direction) = self.direction() else {
            return self.pt1;
        };
        self.pt2 + direction * (point - self.pt2).dot(direction)
    }

    /// Point of the segment nearest to `point`.
    ///
    /// The line projection is clamped to the segment's bounding box on each
    /// axis, which keeps it on the segment for any orientation.
    #[must_use]
    pub fn nearest_point(&self, point: Vec2) -> Vec2 {
        let projected = self.nearest_point_on_line(point);
        let bbox = self.bounding_box();
        Vec2::new(
            projected.x.clamp(bbox.left(), bbox.right()),
            projected.y.clamp(bbox.bottom(), bbox.top()),
        )
    }

    /// Reports whether the segment touches the interior of the circle.
    #[must_use]
    pub fn collides_with_circle(&self, center: Vec2, radius: f32) -> bool {
        let radius_squared = radius * radius;
        if self.pt1.distance_squared(center) < radius_squared
            || self.pt2.distance_squared(center) < radius_squared
        {
            return true;
        }

        self.nearest_point(center).distance_squared(center) < radius_squared
    }
}

/// Heading of a vector in radians, in the range `(-PI, PI]`.
///
/// Zero points along +x and `PI / 2` along +y, matching `atan2(y, x)`.
#[must_use]
pub fn angle_from_vector(vector: Vec2) -> f32 {
    vector.y.atan2(vector.x)
}

/// Wraps an angle into `(-PI, PI]`.
#[must_use]
pub fn normalize_angle(angle: f32) -> f32 {
    let mut wrapped = angle % (2.0 * PI);
    if wrapped <= -PI {
        wrapped += 2.0 * PI;
    } else if wrapped > PI {
        wrapped -= 2.0 * PI;
    }
    wrapped
}

/// Signed shortest rotation that turns `from` onto `to`, in `(-PI, PI]`.
#[must_use]
pub fn angle_difference(from: f32, to: f32) -> f32 {
    normalize_angle(to - from)
}
