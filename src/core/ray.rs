//! # Ray Module
//!
//! Half-lines used by the ray queries of chunks, sectors and the world.

use cgmath::{InnerSpace, Point3, Vector3};

/// A half-line starting at `origin` and extending along `direction`.
///
/// The direction is normalized on construction so that ray parameters are
/// world-space distances. All ray queries in the engine rely on that.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Ray {
    /// Starting point of the ray in world space
    pub origin: Point3<f32>,
    /// Unit-length direction of the ray
    pub direction: Vector3<f32>,
}

impl Ray {
    /// Creates a new ray, normalizing `direction`.
    ///
    /// # Arguments
    /// * `origin` - Starting point of the ray in world space
    /// * `direction` - Direction of the ray; must not be the zero vector
    pub fn new(origin: Point3<f32>, direction: Vector3<f32>) -> Self {
        Ray {
            origin,
            direction: direction.normalize(),
        }
    }

    /// Returns the point at `distance` along the ray.
    pub fn point_at(&self, distance: f32) -> Point3<f32> {
        self.origin + self.direction * distance
    }
}
