use glam::{Mat4, Vec2, Vec3};

pub const QUAD_VERTEX_COUNT: usize = 6;
pub const BORDER_VERTEX_COUNT: usize = 24;
pub const DEFAULT_BORDER_WIDTH: f32 = 0.5;

fn local_rect(half: Vec2) -> [Vec3; 4] {
    [
        Vec3::new(-half.x, -half.y, 0.0), // bottom left
        Vec3::new(half.x, -half.y, 0.0),  // bottom right
        Vec3::new(half.x, half.y, 0.0),   // top right
        Vec3::new(-half.x, half.y, 0.0),  // top left
    ]
}

/// World-space corners of the portal quad: bottom left, bottom right, top right, top left.
pub fn quad_corners(model: &Mat4, size: Vec2) -> [Vec3; 4] {
    local_rect(size * 0.5).map(|corner| model.transform_point3(corner))
}

/// Two triangles covering the portal window, counter-clockwise seen from the front.
pub fn quad_vertices(model: &Mat4, size: Vec2) -> [Vec3; QUAD_VERTEX_COUNT] {
    let [bl, br, tr, tl] = quad_corners(model, size);
    [bl, br, tr, bl, tr, tl]
}

/// Ring of 4 quads (bottom, right, top, left) between the window and a rectangle
/// inflated by `border_width`.
pub fn border_vertices(model: &Mat4, size: Vec2, border_width: f32) -> [Vec3; BORDER_VERTEX_COUNT] {
    let half = size * 0.5;
    let inner = local_rect(half).map(|corner| model.transform_point3(corner));
    let outer =
        local_rect(half + Vec2::splat(border_width)).map(|corner| model.transform_point3(corner));

    [
        // bottom
        outer[0], outer[1], inner[0],
        inner[0], outer[1], inner[1],
        // right
        inner[1], outer[1], outer[2],
        inner[1], outer[2], inner[2],
        // top
        inner[2], outer[2], outer[3],
        inner[2], outer[3], inner[3],
        // left
        inner[3], outer[3], outer[0],
        inner[3], outer[0], inner[0],
    ]
}
