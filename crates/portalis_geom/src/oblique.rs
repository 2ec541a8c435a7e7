//! Oblique near-plane clipping.
//!
//! Math from Eric Lengyel, "Oblique View Frustum Depth Projection and Clipping":
//! <https://www.terathon.com/lengyel/Lengyel-Oblique.pdf>. Only the projection's third row is
//! replaced, so the far plane and the x/y behaviour of the frustum are left untouched.

use glam::{Mat3, Mat4, Vec4};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::portal::Portal;

const DEGENERATE_DENOM: f32 = 1e-6;

/// Clip-space depth convention of the base projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClipDepth {
    /// OpenGL style, near plane at -1 (`Mat4::perspective_rh_gl`).
    #[default]
    NegativeOneToOne,
    /// wgpu/Vulkan/D3D style, near plane at 0 (`Mat4::perspective_rh`).
    ZeroToOne,
}

/// The exit portal's plane in the camera space of `view`, oriented so the camera (the origin)
/// lies on its negative side.
pub fn camera_space_plane(exit: &Portal, view: Mat4) -> Vec4 {
    let normal = (Mat3::from_mat4(view) * exit.normal()).normalize();
    let point = view.transform_point3(exit.center());
    let plane = normal.extend(-normal.dot(point));

    if plane.w > 0.0 {
        -plane
    } else {
        plane
    }
}

/// `base_proj` with its near plane moved onto the exit portal's plane (OpenGL depth range).
pub fn oblique_projection(exit: &Portal, view: Mat4, base_proj: Mat4) -> Mat4 {
    oblique_projection_with_depth(exit, view, base_proj, ClipDepth::NegativeOneToOne)
}

pub fn oblique_projection_with_depth(
    exit: &Portal,
    view: Mat4,
    base_proj: Mat4,
    depth: ClipDepth,
) -> Mat4 {
    let clip_plane = camera_space_plane(exit, view);
    apply_oblique_clip(base_proj, clip_plane, depth)
}

/// Replaces the third row of `proj` so the near plane becomes `clip_plane` (camera space).
///
/// Falls back to `proj` when the camera is nearly coplanar with the clip plane.
pub fn apply_oblique_clip(proj: Mat4, clip_plane: Vec4, depth: ClipDepth) -> Mat4 {
    // Clip-space corner opposite the plane. For symmetric perspective projections the x/y signs
    // match between camera and clip space, so the plane is never taken into clip space.
    let q = proj.inverse() * Vec4::new(clip_plane.x.signum(), clip_plane.y.signum(), 1.0, 1.0);

    let denom = clip_plane.dot(q);
    if denom.abs() < DEGENERATE_DENOM {
        debug!("Oblique clip plane is degenerate (denominator {denom}), keeping base projection");
        return proj;
    }

    let m4 = proj.row(3);
    let new_row = match depth {
        ClipDepth::NegativeOneToOne => clip_plane * (2.0 / denom) - m4,
        ClipDepth::ZeroToOne => clip_plane * (m4.dot(q) / denom),
    };

    let mut m = proj.to_cols_array_2d();
    m[0][2] = new_row.x;
    m[1][2] = new_row.y;
    m[2][2] = new_row.z;
    m[3][2] = new_row.w;
    Mat4::from_cols_array_2d(&m)
}

#[cfg(test)]
mod tests {
    use glam::{Mat4, Vec2, Vec3, Vec4};

    use super::{camera_space_plane, oblique_projection, oblique_projection_with_depth, ClipDepth};
    use crate::portal::Portal;

    fn gl_projection() -> Mat4 {
        Mat4::perspective_rh_gl(90.0_f32.to_radians(), 1.0, 0.1, 100.0)
    }

    fn exit_ahead() -> Portal {
        Portal::new(Vec3::new(0.0, 0.0, -5.0), Vec3::Z, Vec2::new(4.0, 4.0))
    }

    fn ndc_depth(proj: Mat4, point: Vec3) -> f32 {
        let clip = proj * point.extend(1.0);
        clip.z / clip.w
    }

    #[test]
    fn camera_space_plane_faces_away_from_camera() {
        let plane = camera_space_plane(&exit_ahead(), Mat4::IDENTITY);
        assert!((plane - Vec4::new(0.0, 0.0, -1.0, -5.0)).length() < 1e-5, "got {plane}");

        let flipped = Portal::new(Vec3::new(0.0, 0.0, -5.0), Vec3::NEG_Z, Vec2::new(4.0, 4.0));
        let plane = camera_space_plane(&flipped, Mat4::IDENTITY);
        assert!((plane - Vec4::new(0.0, 0.0, -1.0, -5.0)).length() < 1e-5, "got {plane}");
    }

    #[test]
    fn only_the_third_row_changes() {
        let base = gl_projection();
        let oblique = oblique_projection(&exit_ahead(), Mat4::IDENTITY, base);

        for row in [0, 1, 3] {
            assert_eq!(oblique.row(row), base.row(row), "row {row} changed");
        }
        assert!((oblique.row(2) - base.row(2)).length() > 1e-3);
    }

    #[test]
    fn exit_plane_becomes_the_near_plane() {
        let oblique = oblique_projection(&exit_ahead(), Mat4::IDENTITY, gl_projection());

        let on_plane = ndc_depth(oblique, Vec3::new(0.5, -0.5, -5.0));
        assert!((on_plane + 1.0).abs() < 1e-4, "on-plane depth {on_plane}");

        let between = ndc_depth(oblique, Vec3::new(0.0, 0.0, -4.0));
        assert!(between < -1.0, "point in front of the exit should be clipped, got {between}");

        let beyond = ndc_depth(oblique, Vec3::new(0.0, 0.0, -50.0));
        assert!(beyond > -1.0 && beyond <= 1.0, "point behind the exit should survive, got {beyond}");
    }

    #[test]
    fn zero_to_one_depth_puts_exit_plane_at_zero() {
        let base = Mat4::perspective_rh(90.0_f32.to_radians(), 1.0, 0.1, 100.0);
        let oblique =
            oblique_projection_with_depth(&exit_ahead(), Mat4::IDENTITY, base, ClipDepth::ZeroToOne);

        let on_plane = ndc_depth(oblique, Vec3::new(-1.0, 1.0, -5.0));
        assert!(on_plane.abs() < 1e-4, "on-plane depth {on_plane}");
        assert!(ndc_depth(oblique, Vec3::new(0.0, 0.0, -3.0)) < 0.0);
        for row in [0, 1, 3] {
            assert_eq!(oblique.row(row), base.row(row));
        }
    }

    #[test]
    fn oblique_plane_follows_a_moved_camera() {
        let view = Mat4::look_at_rh(Vec3::new(2.0, 1.0, 10.0), Vec3::new(0.0, 0.0, -5.0), Vec3::Y);
        let oblique = oblique_projection(&exit_ahead(), view, gl_projection());

        let world_on_plane = Vec3::new(0.3, 0.2, -5.0);
        let depth = ndc_depth(oblique, view.transform_point3(world_on_plane));
        assert!((depth + 1.0).abs() < 1e-3, "on-plane depth {depth}");
    }

    #[test]
    fn degenerate_denominator_keeps_base_projection() {
        // With an identity projection the far corner is (+-1, +-1, 1, 1); a plane z = 1 through it
        // makes dot(plane, q) exactly zero.
        let exit = Portal::new(Vec3::new(0.0, 0.0, 1.0), Vec3::Z, Vec2::ONE);
        let oblique = oblique_projection(&exit, Mat4::IDENTITY, Mat4::IDENTITY);
        assert_eq!(oblique, Mat4::IDENTITY);
    }
}
