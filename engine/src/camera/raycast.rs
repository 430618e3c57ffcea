//! Raycast Module
//!
//! Turns a cursor position into a picking ray by unprojecting it onto the
//! near and far clip planes of the current camera.

use glam::{Mat4, Vec2, Vec3, Vec4};

use crate::picking::{Frustum, PickRay};

/// Camera state consumed by picking.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    /// Eye position in world space
    pub position: Vec3,
    /// World → view transform
    pub view: Mat4,
    /// View → clip transform (glam convention, depth 0..1)
    pub projection: Mat4,
}

impl Camera {
    /// Right-handed perspective camera looking from `position` at `target`.
    ///
    /// The terrain is z-up, so `Vec3::Z` is the up vector unless the camera
    /// looks straight down, in which case world Y is used instead.
    pub fn look_at(position: Vec3, target: Vec3, fov_y: f32, aspect: f32, near: f32, far: f32) -> Self {
        let forward = (target - position).normalize_or_zero();
        let up = if forward.cross(Vec3::Z).length_squared() < 1e-6 {
            Vec3::Y
        } else {
            Vec3::Z
        };
        Self {
            position,
            view: Mat4::look_at_rh(position, target, up),
            projection: Mat4::perspective_rh(fov_y, aspect, near, far),
        }
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view
    }

    pub fn frustum(&self) -> Frustum {
        Frustum::from_view_projection(self.view_projection())
    }
}

/// Screen rectangle the terrain is drawn into, in pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// True when the cursor lies inside the viewport rectangle.
    pub fn contains(&self, cursor: Vec2) -> bool {
        cursor.x >= self.x
            && cursor.y >= self.y
            && cursor.x <= self.x + self.width
            && cursor.y <= self.y + self.height
    }

    /// Cursor pixel → normalized device coordinates (y up).
    pub fn to_ndc(&self, cursor: Vec2) -> Vec2 {
        Vec2::new(
            2.0 * (cursor.x - self.x) / self.width - 1.0,
            1.0 - 2.0 * (cursor.y - self.y) / self.height,
        )
    }
}

/// Unproject a point in NDC at the given clip depth back into world space.
pub fn unproject(inverse_view_proj: Mat4, ndc: Vec2, depth: f32) -> Option<Vec3> {
    let clip = inverse_view_proj * Vec4::new(ndc.x, ndc.y, depth, 1.0);
    if clip.w.abs() <= f32::EPSILON {
        return None;
    }
    Some(clip.truncate() / clip.w)
}

/// Build the picking ray under the cursor.
///
/// # Returns
/// * `Some(PickRay)` - Ray from the near-plane point to the far-plane point
/// * `None` - Cursor outside the viewport, empty viewport, or a degenerate camera
pub fn cursor_ray(camera: &Camera, viewport: &Viewport, cursor: Vec2) -> Option<PickRay> {
    if viewport.width <= 0.0 || viewport.height <= 0.0 || !viewport.contains(cursor) {
        return None;
    }
    let inverse = camera.view_projection().inverse();
    let ndc = viewport.to_ndc(cursor);
    let near = unproject(inverse, ndc, 0.0)?;
    let far = unproject(inverse, ndc, 1.0)?;
    PickRay::from_segment(near, far)
}
