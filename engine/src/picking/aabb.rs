//! Axis-Aligned Bounding Boxes
//!
//! Box type used for the block / tile / sub-quad picking hierarchy.

use glam::Vec3;

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Default for Aabb {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl Aabb {
    /// An inverted box that any `include` call replaces.
    pub const EMPTY: Self = Self {
        min: Vec3::splat(f32::MAX),
        max: Vec3::splat(f32::MIN),
    };

    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Smallest box containing every point; `EMPTY` for no points.
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Self {
        points.into_iter().fold(Self::EMPTY, |mut aabb, p| {
            aabb.include(p);
            aabb
        })
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Grow the box to contain `point`.
    pub fn include(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    /// Box containing both `self` and `other`.
    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb::new(self.min.min(other.min), self.max.max(other.max))
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Point containment with a tolerance on every face.
    pub fn contains(&self, point: Vec3, epsilon: f32) -> bool {
        point.cmpge(self.min - Vec3::splat(epsilon)).all()
            && point.cmple(self.max + Vec3::splat(epsilon)).all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_points() {
        let aabb = Aabb::from_points([
            Vec3::new(1.0, -2.0, 0.5),
            Vec3::new(-1.0, 4.0, 0.0),
            Vec3::new(0.0, 0.0, 3.0),
        ]);
        assert_eq!(aabb.min, Vec3::new(-1.0, -2.0, 0.0));
        assert_eq!(aabb.max, Vec3::new(1.0, 4.0, 3.0));
        assert!(!aabb.is_empty());
    }

    #[test]
    fn test_empty_box() {
        assert!(Aabb::from_points([]).is_empty());
        assert!(Aabb::default().is_empty());
    }

    #[test]
    fn test_union_and_contains() {
        let a = Aabb::new(Vec3::ZERO, Vec3::ONE);
        let b = Aabb::new(Vec3::splat(2.0), Vec3::splat(3.0));
        let u = a.union(&b);
        assert_eq!(u, Aabb::new(Vec3::ZERO, Vec3::splat(3.0)));
        assert!(u.contains(Vec3::splat(1.5), 0.0));
        assert!(!a.contains(Vec3::splat(1.5), 0.0));
        assert!(a.contains(Vec3::new(1.0005, 0.5, 0.5), 0.001));
    }
}
