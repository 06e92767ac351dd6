#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for Umbra adapters.
//!
//! Backends draw what a [`Camera`] sees. This crate decides *what* that is:
//! the camera's rotated view rectangle is reduced to an axis-aligned box, and
//! [`FrameGeometry`] culls the map's polygon and edge hierarchies against it.

use glam::Vec2;
use umbra_core::{config::CameraProperties, normalize_angle, BoundingBox, Segment};
use umbra_world::{query, Map};

/// Rotating view onto the map.
///
/// At angle zero the screen's up direction is +y in the world. Positive angles
/// turn the view counter-clockwise.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    position: Vec2,
    angle: f32,
    view_width: f32,
    view_height: f32,
}

impl Camera {
    /// Creates a camera at the origin showing `view_width` by `view_height` world units.
    #[must_use]
    pub const fn new(view_width: f32, view_height: f32) -> Self {
        Self {
            position: Vec2::ZERO,
            angle: 0.0,
            view_width,
            view_height,
        }
    }

    /// Creates a camera with the configured view extents.
    #[must_use]
    pub const fn from_properties(properties: &CameraProperties) -> Self {
        Self::new(properties.view_width, properties.view_height)
    }

    /// Sizes the view for a screen of the given pixel size.
    ///
    /// The shorter screen axis shows `min_display_size` world units and the
    /// longer one grows with the aspect ratio.
    #[must_use]
    pub fn fit_screen(min_display_size: f32, screen_width: f32, screen_height: f32) -> Self {
        if screen_width <= 0.0 || screen_height <= 0.0 {
            return Self::new(min_display_size, min_display_size);
        }

        if screen_width >= screen_height {
            Self::new(
                min_display_size * screen_width / screen_height,
                min_display_size,
            )
        } else {
            Self::new(
                min_display_size,
                min_display_size * screen_height / screen_width,
            )
        }
    }

    /// Center of the view.
    #[must_use]
    pub const fn position(&self) -> Vec2 {
        self.position
    }

    /// Rotation of the view, in `(-PI, PI]`.
    #[must_use]
    pub const fn angle(&self) -> f32 {
        self.angle
    }

    /// Visible extent across the screen.
    #[must_use]
    pub const fn view_width(&self) -> f32 {
        self.view_width
    }

    /// Visible extent up the screen.
    #[must_use]
    pub const fn view_height(&self) -> f32 {
        self.view_height
    }

    /// Moves the view center.
    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    /// Sets the view rotation, wrapping it into `(-PI, PI]`.
    pub fn set_angle(&mut self, angle: f32) {
        self.angle = normalize_angle(angle);
    }

    /// World direction pointing up the screen.
    #[must_use]
    pub fn up(&self) -> Vec2 {
        Vec2::from_angle(self.angle).rotate(Vec2::Y)
    }

    /// Turns the view from a horizontal pointer offset in `[-1, 1]`.
    ///
    /// The response is quadratic, so the view turns fastest with the pointer
    /// at the screen edge, reaching `angular_speed`.
    pub fn turn_by_pointer(&mut self, pointer_x: f32, angular_speed: f32, dt: f32) {
        let pointer_x = pointer_x.clamp(-1.0, 1.0);
        self.set_angle(self.angle - pointer_x * pointer_x.abs() * angular_speed * dt);
    }

    /// Centers the view ahead of `target` so it sits one unit above the bottom edge.
    pub fn follow(&mut self, target: Vec2) {
        self.position = target + self.up() * (self.view_height / 2.0 - 1.0);
    }

    /// Axis-aligned box enclosing the rotated view rectangle.
    #[must_use]
    pub fn bounding_box(&self) -> BoundingBox {
        let (sin, cos) = self.angle.sin_cos();
        let (sin, cos) = (sin.abs(), cos.abs());
        let half_width = self.view_width / 2.0;
        let half_height = self.view_height / 2.0;
        let extent = Vec2::new(
            cos * half_width + sin * half_height,
            sin * half_width + cos * half_height,
        );
        BoundingBox::from_corners(self.position - extent, self.position + extent)
    }

    /// Maps a screen-space point in `[-1, 1]` on both axes to world coordinates.
    #[must_use]
    pub fn screen_to_world(&self, screen: Vec2) -> Vec2 {
        let local = screen * Vec2::new(self.view_width / 2.0, self.view_height / 2.0);
        self.position + Vec2::from_angle(self.angle).rotate(local)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::from_properties(&CameraProperties::default())
    }
}

/// Reusable draw lists for a single frame.
#[derive(Clone, Debug, Default)]
pub struct FrameGeometry {
    view: Option<BoundingBox>,
    indices: Vec<u16>,
    shadow_casters: Vec<Segment>,
}

impl FrameGeometry {
    /// Creates empty draw lists.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Refills the draw lists with the geometry visible through `camera`.
    pub fn collect(&mut self, map: &Map, camera: &Camera) {
        let view = camera.bounding_box();
        query::visible_polygons(map, view, &mut self.indices);
        query::shadow_casters(map, view, &mut self.shadow_casters);
        self.view = Some(view);
    }

    /// Box the lists were culled against, absent before the first collection.
    #[must_use]
    pub const fn view(&self) -> Option<BoundingBox> {
        self.view
    }

    /// Concatenated triangle lists of every visible polygon.
    #[must_use]
    pub fn indices(&self) -> &[u16] {
        &self.indices
    }

    /// Number of triangles in [`FrameGeometry::indices`].
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Walls that cast shadows within the view.
    #[must_use]
    pub fn shadow_casters(&self) -> &[Segment] {
        &self.shadow_casters
    }
}
