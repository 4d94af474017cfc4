//! # Bounds Module
//!
//! Axis-aligned bounding boxes for chunks, sectors and single voxels.

use cgmath::{Point3, Vector3};

use super::Ray;

/// Direction components smaller than this are treated as parallel to a slab.
const PARALLEL_EPSILON: f32 = 1e-8;

/// An axis-aligned bounding box described by its minimum and maximum corners.
///
/// # Examples
///
/// ```
/// use cgmath::Point3;
/// use voxel_terrain::core::Bounds;
///
/// let mut bounds = Bounds::new(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0));
/// bounds.encapsulate(&Bounds::new(Point3::new(1.0, 0.0, 0.0), Point3::new(2.0, 1.0, 1.0)));
/// assert!(bounds.contains(Point3::new(1.5, 0.5, 0.5)));
/// ```
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Bounds {
    /// Minimum corner
    pub min: Point3<f32>,
    /// Maximum corner
    pub max: Point3<f32>,
}

impl Bounds {
    /// Creates bounds from two corners.
    pub fn new(min: Point3<f32>, max: Point3<f32>) -> Self {
        Bounds { min, max }
    }

    /// Creates bounds from a minimum corner and an extent along each axis.
    pub fn from_min_size(min: Point3<f32>, size: Vector3<f32>) -> Self {
        Bounds {
            min,
            max: min + size,
        }
    }

    /// Extent of the bounds along each axis.
    pub fn size(&self) -> Vector3<f32> {
        self.max - self.min
    }

    /// Center point of the bounds.
    pub fn center(&self) -> Point3<f32> {
        self.min + self.size() * 0.5
    }

    /// Checks whether `point` lies inside the bounds, faces included.
    pub fn contains(&self, point: Point3<f32>) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
            && point.z >= self.min.z
            && point.z <= self.max.z
    }

    /// Checks whether `point` lies in the half-open x/z footprint `[min, max)`.
    ///
    /// Adjacent footprints never both contain the same point, so this picks a
    /// single owner for positions on a shared edge. The y axis is ignored.
    pub fn contains_xz(&self, point: Point3<f32>) -> bool {
        point.x >= self.min.x && point.x < self.max.x && point.z >= self.min.z && point.z < self.max.z
    }

    /// Grows the bounds so that they also enclose `other`.
    pub fn encapsulate(&mut self, other: &Bounds) {
        self.min = Point3::new(
            self.min.x.min(other.min.x),
            self.min.y.min(other.min.y),
            self.min.z.min(other.min.z),
        );
        self.max = Point3::new(
            self.max.x.max(other.max.x),
            self.max.y.max(other.max.y),
            self.max.z.max(other.max.z),
        );
    }

    /// Intersects a ray with the bounds using the slab method.
    ///
    /// # Returns
    /// The distance along the ray to the entry point, `0.0` when the origin is
    /// already inside, or `None` if the ray misses the bounds.
    pub fn intersect_ray(&self, ray: &Ray) -> Option<f32> {
        self.ray_span(ray).map(|(entry, _)| entry)
    }

    /// Entry and exit distances of a ray through the bounds.
    ///
    /// # Returns
    /// `(entry, exit)` with `entry` clamped to `0.0`, or `None` if the ray
    /// misses the bounds.
    pub fn ray_span(&self, ray: &Ray) -> Option<(f32, f32)> {
        let mut t_min = 0.0f32;
        let mut t_max = f32::INFINITY;

        for axis in 0..3 {
            let origin = ray.origin[axis];
            let direction = ray.direction[axis];
            let (low, high) = (self.min[axis], self.max[axis]);

            if direction.abs() < PARALLEL_EPSILON {
                if origin < low || origin > high {
                    return None;
                }
                continue;
            }

            let inverse = 1.0 / direction;
            let mut t_near = (low - origin) * inverse;
            let mut t_far = (high - origin) * inverse;
            if t_near > t_far {
                std::mem::swap(&mut t_near, &mut t_far);
            }

            t_min = t_min.max(t_near);
            t_max = t_max.min(t_far);
            if t_min > t_max {
                return None;
            }
        }

        Some((t_min, t_max))
    }
}
