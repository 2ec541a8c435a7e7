use std::f32::consts::PI;

use glam::{Mat4, Vec3};

use crate::portal::Portal;

/// View matrix for rendering the scene behind `exit` as seen through `entry`.
///
/// Exit-local space is flipped 180 degrees about its up axis, because stepping into the front of
/// `entry` leaves through the front of `exit`, then carried through entry-local space into the
/// viewer's camera space.
pub fn portal_view_matrix(entry: &Portal, exit: &Portal, cam_view: Mat4) -> Mat4 {
    let entry_to_camera = cam_view * entry.model();
    entry_to_camera * Mat4::from_rotation_y(PI) * exit.model().inverse()
}

/// World-space position of the camera described by `view`.
pub fn virtual_camera_position(view: &Mat4) -> Vec3 {
    view.inverse().transform_point3(Vec3::ZERO)
}

/// World-space forward (-Z in camera space) of the camera described by `view`.
pub fn virtual_camera_forward(view: &Mat4) -> Vec3 {
    view.inverse().transform_vector3(Vec3::NEG_Z).normalize_or_zero()
}
