use glam::{Mat3, Vec3};

const EPSILON: f32 = 1e-6;

/// Parameters of a segment/triangle hit: `t` along the segment (0 = start, 1 = end) and the
/// barycentric `u`, `v` of the hit point relative to the triangle's second and third vertices.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentHit {
    pub t: f32,
    pub u: f32,
    pub v: f32,
}

impl SegmentHit {
    pub fn point(&self, start: Vec3, end: Vec3) -> Vec3 {
        start.lerp(end, self.t)
    }
}

/// Solves `[la - lb, p1 - p0, p2 - p0] * (t, u, v) = la - p0`.
///
/// Returns `None` for zero-length segments, segments parallel to the triangle plane, and hits
/// outside the segment or the triangle.
pub fn segment_triangle_hit(la: Vec3, lb: Vec3, p0: Vec3, p1: Vec3, p2: Vec3) -> Option<SegmentHit> {
    if (lb - la).length() < EPSILON {
        return None;
    }

    let m = Mat3::from_cols(la - lb, p1 - p0, p2 - p0);
    if m.determinant().abs() < EPSILON {
        return None;
    }

    let tuv = m.inverse() * (la - p0);
    let (t, u, v) = (tuv.x, tuv.y, tuv.z);

    if t < -EPSILON || t > 1.0 + EPSILON {
        return None;
    }
    if u < -EPSILON || v < -EPSILON || u + v > 1.0 + EPSILON {
        return None;
    }

    Some(SegmentHit { t, u, v })
}

pub fn segment_intersects_triangle(la: Vec3, lb: Vec3, p0: Vec3, p1: Vec3, p2: Vec3) -> bool {
    segment_triangle_hit(la, lb, p0, p1, p2).is_some()
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::{segment_intersects_triangle, segment_triangle_hit};

    const P0: Vec3 = Vec3::new(0.0, 0.0, 0.0);
    const P1: Vec3 = Vec3::new(1.0, 0.0, 0.0);
    const P2: Vec3 = Vec3::new(0.0, 1.0, 0.0);

    #[test]
    fn hit_reports_segment_parameter_and_barycentrics() {
        let hit = segment_triangle_hit(
            Vec3::new(0.25, 0.25, 1.0),
            Vec3::new(0.25, 0.25, -3.0),
            P0,
            P1,
            P2,
        )
        .expect("segment crosses the triangle");

        assert!((hit.t - 0.25).abs() < 1e-6);
        assert!((hit.u - 0.25).abs() < 1e-6);
        assert!((hit.v - 0.25).abs() < 1e-6);
        let point = hit.point(Vec3::new(0.25, 0.25, 1.0), Vec3::new(0.25, 0.25, -3.0));
        assert!((point - Vec3::new(0.25, 0.25, 0.0)).length() < 1e-6);
    }

    #[test]
    fn segment_ending_exactly_on_triangle_counts() {
        assert!(segment_intersects_triangle(
            Vec3::new(0.2, 0.2, 1.0),
            Vec3::new(0.2, 0.2, 0.0),
            P0,
            P1,
            P2
        ));
    }

    #[test]
    fn hit_past_hypotenuse_misses() {
        assert!(!segment_intersects_triangle(
            Vec3::new(0.8, 0.8, 1.0),
            Vec3::new(0.8, 0.8, -1.0),
            P0,
            P1,
            P2
        ));
    }

    #[test]
    fn parallel_segment_misses() {
        assert!(!segment_intersects_triangle(
            Vec3::new(0.1, 0.1, 0.5),
            Vec3::new(0.4, 0.1, 0.5),
            P0,
            P1,
            P2
        ));
    }

    #[test]
    fn degenerate_segment_misses() {
        let p = Vec3::new(0.1, 0.1, 0.0);
        assert!(segment_triangle_hit(p, p, P0, P1, P2).is_none());
    }
}
