//! Ray Intersection Routines
//!
//! Pure functions for terrain picking: ray vs. box (slab method), segment vs.
//! triangle (plane side test + edge test), and the plan-view tie-break used
//! to choose between candidate hits.
//!
//! # Example
//!
//! ```ignore
//! use tile_terrain_engine::picking::{Aabb, PickRay, ray_triangle_intersect};
//! use glam::Vec3;
//!
//! let ray = PickRay::from_segment(Vec3::new(0.5, 0.5, 10.0), Vec3::new(0.5, 0.5, -10.0)).unwrap();
//! let tile = Aabb::new(Vec3::ZERO, Vec3::new(1.0, 1.0, 0.0));
//! if ray.hits_aabb(&tile).is_some() {
//!     let tri = [Vec3::ZERO, Vec3::X, Vec3::new(1.0, 1.0, 0.0)];
//!     let hit = ray_triangle_intersect(ray.near, ray.far, tri);
//! }
//! ```

use glam::Vec3;

use super::aabb::Aabb;

/// A picking ray built from the near/far unprojection of the cursor.
///
/// Box tests use `origin`/`direction`; triangle tests use the `near`/`far`
/// sample points directly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickRay {
    /// Ray start (equal to `near`)
    pub origin: Vec3,
    /// Normalized direction from `near` to `far`
    pub direction: Vec3,
    /// Cursor unprojected onto the near plane
    pub near: Vec3,
    /// Cursor unprojected onto the far plane
    pub far: Vec3,
}

impl PickRay {
    /// Build a ray from two sample points. Returns `None` when they coincide.
    pub fn from_segment(near: Vec3, far: Vec3) -> Option<Self> {
        let delta = far - near;
        if delta.length_squared() <= f32::EPSILON {
            return None;
        }
        Some(Self {
            origin: near,
            direction: delta.normalize(),
            near,
            far,
        })
    }

    /// Distance along the ray to the first intersection with `aabb`.
    pub fn hits_aabb(&self, aabb: &Aabb) -> Option<f32> {
        ray_aabb_intersect(self.origin, self.direction, aabb)
    }

    pub fn point_at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// Ray-AABB intersection test using the slab method.
///
/// # Returns
///
/// * `Some(t)` - Distance along the ray to the intersection point (t >= 0)
/// * `None` - No intersection, empty box, or box entirely behind the origin
pub fn ray_aabb_intersect(ray_origin: Vec3, ray_dir: Vec3, aabb: &Aabb) -> Option<f32> {
    if aabb.is_empty() {
        return None;
    }

    let mut t_min = f32::NEG_INFINITY;
    let mut t_max = f32::INFINITY;
    for axis in 0..3 {
        let origin = ray_origin[axis];
        let dir = ray_dir[axis];
        let (lo, hi) = (aabb.min[axis], aabb.max[axis]);

        // Parallel to this slab: inside it or never
        if dir.abs() <= 1e-10 {
            if origin < lo || origin > hi {
                return None;
            }
            continue;
        }

        let inv_dir = 1.0 / dir;
        let t1 = (lo - origin) * inv_dir;
        let t2 = (hi - origin) * inv_dir;
        t_min = t_min.max(t1.min(t2));
        t_max = t_max.min(t1.max(t2));
    }

    if t_max >= t_min && t_max >= 0.0 {
        if t_min >= 0.0 {
            Some(t_min)
        } else {
            // Ray starts inside the box
            Some(t_max)
        }
    } else {
        None
    }
}

/// Segment-triangle intersection.
///
/// The segment `near..far` must cross the triangle's plane (the signed plane
/// distances of its end points differ in sign), and the crossing point must
/// lie on the same side of all three edges.
pub fn ray_triangle_intersect(near: Vec3, far: Vec3, triangle: [Vec3; 3]) -> Option<Vec3> {
    let [a, b, c] = triangle;
    let normal = (b - a).cross(c - a);
    if normal.length_squared() <= f32::EPSILON * f32::EPSILON {
        return None;
    }

    let d_near = normal.dot(near - a);
    let d_far = normal.dot(far - a);
    if d_near * d_far > 0.0 {
        return None;
    }
    let denom = d_near - d_far;
    if denom == 0.0 {
        // Segment lies in the plane
        return None;
    }

    let t = d_near / denom;
    let hit = near + (far - near) * t;

    let e0 = (b - a).cross(hit - a).dot(normal);
    let e1 = (c - b).cross(hit - b).dot(normal);
    let e2 = (a - c).cross(hit - c).dot(normal);
    let inside = (e0 >= 0.0 && e1 >= 0.0 && e2 >= 0.0) || (e0 <= 0.0 && e1 <= 0.0 && e2 <= 0.0);
    inside.then_some(hit)
}

/// Squared distance between two points ignoring the vertical (z) axis.
pub fn plan_distance_squared(a: Vec3, b: Vec3) -> f32 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    dx * dx + dy * dy
}

/// The candidate closest to `camera` in plan view (x, y only).
///
/// This can pick a point that is farther in 3D when it is nearer in plan;
/// the first candidate wins ties.
pub fn closest_in_plan(candidates: impl IntoIterator<Item = Vec3>, camera: Vec3) -> Option<Vec3> {
    let mut best: Option<(Vec3, f32)> = None;
    for point in candidates {
        let dist = plan_distance_squared(point, camera);
        match best {
            Some((_, best_dist)) if dist >= best_dist => {}
            _ => best = Some((point, dist)),
        }
    }
    best.map(|(point, _)| point)
}
