use glam::{Mat4, Vec3};

/// Above this |dot(normal, Y)| the portal counts as horizontal and X is used as the reference up.
const NEAR_VERTICAL_DOT: f32 = 0.95;

/// Orthonormal axes of a portal's local frame, expressed in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PortalBasis {
    pub right: Vec3,
    pub up: Vec3,
    pub normal: Vec3,
}

impl PortalBasis {
    pub fn from_normal(normal: Vec3) -> Self {
        let normal = normal.normalize();

        let mut world_up = Vec3::Y;
        if normal.dot(world_up).abs() > NEAR_VERTICAL_DOT {
            world_up = Vec3::X;
        }

        let right = world_up.cross(normal).normalize();
        let up = normal.cross(right).normalize();

        Self { right, up, normal }
    }

    /// Reads the basis back out of a model matrix built by [`portal_frame`].
    pub fn from_model(model: &Mat4) -> Self {
        Self {
            right: model.x_axis.truncate(),
            up: model.y_axis.truncate(),
            normal: model.z_axis.truncate(),
        }
    }
}

/// Builds the local -> world transform of a portal. Local +Z is the facing normal.
///
/// `normal` does not need to be normalized, but must not be zero.
pub fn portal_frame(center: Vec3, normal: Vec3) -> Mat4 {
    let basis = PortalBasis::from_normal(normal);
    Mat4::from_cols(
        basis.right.extend(0.0),
        basis.up.extend(0.0),
        basis.normal.extend(0.0),
        center.extend(1.0),
    )
}
