//! Picking Module
//!
//! Stateless geometry used to find what lies under the cursor: bounding
//! boxes, the view frustum, and ray/box + ray/triangle intersection.
//! Shared by `HeightmapBlock` and `TerrainGrid`; no physics engine involved.

pub mod aabb;
pub mod frustum;
pub mod ray;

pub use aabb::Aabb;
pub use frustum::Frustum;
pub use ray::{
    PickRay, closest_in_plan, plan_distance_squared, ray_aabb_intersect, ray_triangle_intersect,
};
