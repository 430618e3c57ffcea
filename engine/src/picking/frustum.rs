//! View Frustum
//!
//! Six clip planes extracted from a view-projection matrix (Gribb/Hartmann),
//! used to skip blocks the camera cannot see before any ray test.
//! Assumes glam's 0..1 clip-space depth range.

use glam::{Mat4, Vec3, Vec4};

use super::aabb::Aabb;

/// Six inward-facing planes: `n·p + d >= 0` means inside.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frustum {
    planes: [Vec4; 6],
}

impl Frustum {
    /// Extract the planes of `view_proj` (projection * view).
    pub fn from_view_projection(view_proj: Mat4) -> Self {
        let r0 = view_proj.row(0);
        let r1 = view_proj.row(1);
        let r2 = view_proj.row(2);
        let r3 = view_proj.row(3);
        let planes = [
            r3 + r0, // left
            r3 - r0, // right
            r3 + r1, // bottom
            r3 - r1, // top
            r2,      // near (depth 0..1)
            r3 - r2, // far
        ];
        Self {
            planes: planes.map(normalize_plane),
        }
    }

    /// A frustum that accepts everything.
    pub fn unbounded() -> Self {
        Self {
            planes: [Vec4::new(0.0, 0.0, 0.0, 1.0); 6],
        }
    }

    /// False only when the box lies completely outside one plane.
    pub fn intersects_aabb(&self, aabb: &Aabb) -> bool {
        if aabb.is_empty() {
            return false;
        }
        self.planes.iter().all(|plane| {
            // Box corner farthest along the plane normal
            let positive = Vec3::new(
                if plane.x >= 0.0 { aabb.max.x } else { aabb.min.x },
                if plane.y >= 0.0 { aabb.max.y } else { aabb.min.y },
                if plane.z >= 0.0 { aabb.max.z } else { aabb.min.z },
            );
            plane.truncate().dot(positive) + plane.w >= 0.0
        })
    }
}

fn normalize_plane(plane: Vec4) -> Vec4 {
    let len = plane.truncate().length();
    if len > f32::EPSILON { plane / len } else { plane }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn looking_down_frustum() -> Frustum {
        let view = Mat4::look_at_rh(Vec3::new(0.0, 0.0, 50.0), Vec3::ZERO, Vec3::Y);
        let proj = Mat4::perspective_rh(1.0, 1.0, 0.1, 500.0);
        Frustum::from_view_projection(proj * view)
    }

    #[test]
    fn test_box_in_view() {
        let frustum = looking_down_frustum();
        let aabb = Aabb::new(Vec3::new(-5.0, -5.0, 0.0), Vec3::new(5.0, 5.0, 1.0));
        assert!(frustum.intersects_aabb(&aabb));
    }

    #[test]
    fn test_box_outside_view() {
        let frustum = looking_down_frustum();
        let aabb = Aabb::new(Vec3::new(500.0, 500.0, 0.0), Vec3::new(510.0, 510.0, 1.0));
        assert!(!frustum.intersects_aabb(&aabb));
    }

    #[test]
    fn test_box_behind_camera() {
        let frustum = looking_down_frustum();
        let aabb = Aabb::new(Vec3::new(-1.0, -1.0, 60.0), Vec3::new(1.0, 1.0, 70.0));
        assert!(!frustum.intersects_aabb(&aabb));
    }

    #[test]
    fn test_unbounded_accepts_everything() {
        let aabb = Aabb::new(Vec3::splat(1e6), Vec3::splat(1e6 + 1.0));
        assert!(Frustum::unbounded().intersects_aabb(&aabb));
    }
}
