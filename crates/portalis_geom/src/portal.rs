use glam::{Mat4, Vec2, Vec3};

use crate::frame::portal_frame;
use crate::geometry::{
    border_vertices, quad_corners, quad_vertices, BORDER_VERTEX_COUNT, DEFAULT_BORDER_WIDTH,
    QUAD_VERTEX_COUNT,
};
use crate::intersect::segment_intersects_triangle;

/// A rectangular window in world space.
///
/// The transform and both vertex caches are computed once at construction; center, normal and
/// size have no setters, so the caches never go stale. Pairing is held by
/// [`PortalRegistry`](crate::registry::PortalRegistry), not by the portal itself.
#[derive(Debug, Clone)]
pub struct Portal {
    center: Vec3,
    normal: Vec3,
    size: Vec2,
    border_width: f32,
    model: Mat4,
    color: Vec3,
    quad_vertices: [Vec3; QUAD_VERTEX_COUNT],
    border_vertices: [Vec3; BORDER_VERTEX_COUNT],
}

impl Portal {
    /// `size` must be positive and `normal` non-zero; neither is checked here.
    pub fn new(center: Vec3, normal: Vec3, size: Vec2) -> Self {
        Self::with_border_width(center, normal, size, DEFAULT_BORDER_WIDTH)
    }

    pub fn with_border_width(center: Vec3, normal: Vec3, size: Vec2, border_width: f32) -> Self {
        let model = portal_frame(center, normal);
        Self {
            center,
            normal: normal.normalize(),
            size,
            border_width,
            model,
            color: Vec3::ONE,
            quad_vertices: quad_vertices(&model, size),
            border_vertices: border_vertices(&model, size, border_width),
        }
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }

    pub fn normal(&self) -> Vec3 {
        self.normal
    }

    pub fn size(&self) -> Vec2 {
        self.size
    }

    pub fn border_width(&self) -> f32 {
        self.border_width
    }

    /// Local -> world transform.
    pub fn model(&self) -> Mat4 {
        self.model
    }

    pub fn color(&self) -> Vec3 {
        self.color
    }

    pub fn set_color(&mut self, color: Vec3) {
        self.color = color;
    }

    pub fn quad_vertices(&self) -> &[Vec3; QUAD_VERTEX_COUNT] {
        &self.quad_vertices
    }

    pub fn border_vertices(&self) -> &[Vec3; BORDER_VERTEX_COUNT] {
        &self.border_vertices
    }

    /// Positive in front of the portal, negative behind, ~0 on the plane.
    pub fn signed_distance_to_plane(&self, point: Vec3) -> f32 {
        self.normal.dot(point - self.center)
    }

    /// Whether the segment crosses the portal's rectangle (not just its infinite plane).
    pub fn intersects_line(&self, start: Vec3, end: Vec3) -> bool {
        let [p0, p1, p2, p3] = quad_corners(&self.model, self.size);
        segment_intersects_triangle(start, end, p0, p1, p2)
            || segment_intersects_triangle(start, end, p0, p2, p3)
    }
}
