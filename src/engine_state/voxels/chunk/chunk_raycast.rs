//! # Chunk Raycast Module
//!
//! Ray queries against the voxels of a single chunk.
//!
//! The query marches the ray through the chunk in steps of one voxel, then
//! narrows the crossing down with a few halving steps between the last empty
//! probe and the first occupied one. The resolved voxel's cube is intersected
//! exactly to find the surface point and the struck face.

use cgmath::{Point3, Vector3};
use log::error;

use super::Chunk;
use crate::core::{Bounds, Ray};
use crate::engine_state::error::{VoxelError, VoxelResult};
use crate::engine_state::voxels::voxel::voxel_side::VoxelSide;
use crate::engine_state::voxels::voxel::VoxelInfo;

/// Relative push applied to the bounds entry distance so the first probe lands
/// inside the chunk.
const ENTRY_NUDGE: f32 = 1.001;

/// Tolerance when matching a hit point to a cube face.
const ON_FACE_EPSILON: f32 = 1e-4;

/// Result of a successful ray query.
#[derive(Clone, Debug, PartialEq)]
pub struct VoxelHit {
    /// The voxel that was struck
    pub voxel: VoxelInfo,
    /// The face of the voxel that was struck
    pub side: VoxelSide,
    /// Outward normal of the struck face
    pub normal: Vector3<f32>,
    /// World-space point on the struck face
    pub point: Point3<f32>,
    /// Distance from the ray origin to `point`
    pub distance: f32,
}

impl Chunk {
    /// Finds the first voxel of this chunk struck by `ray`.
    ///
    /// # Returns
    /// `Ok(None)` if the ray misses the chunk or passes through it without
    /// touching a voxel.
    ///
    /// # Errors
    /// [`VoxelError::FaceClassification`] if the hit point cannot be matched to
    /// a face of the resolved voxel.
    pub fn get_ray_hit_info(&self, ray: &Ray) -> VoxelResult<Option<VoxelHit>> {
        let Some(entry_distance) = self.bounds.intersect_ray(ray) else {
            return Ok(None);
        };
        let start_distance = entry_distance * ENTRY_NUDGE;
        let voxel_size = self.settings.voxel_size;

        // coarse march, one voxel per step
        let mut previous_probe = None;
        let mut first_hit = None;
        let mut step = 0usize;
        loop {
            let probe = ray.point_at(start_distance + step as f32 * voxel_size);
            if !self.bounds.contains(probe) {
                break;
            }
            if let Some(voxel) = self.voxel_at_world_pos(probe) {
                first_hit = Some(voxel);
                break;
            }
            previous_probe = Some(probe);
            step += 1;
        }

        let Some(first_hit) = first_hit else {
            return Ok(None);
        };

        let voxel = match previous_probe {
            Some(previous) => self.refine_hit(ray, previous).unwrap_or(first_hit),
            None => first_hit,
        };

        self.resolve_face(ray, voxel).map(Some)
    }

    /// Halves the step between the last empty probe and the first occupied
    /// one `raycast_precision_iterations` times.
    ///
    /// # Returns
    /// The voxel under the final probe, or `None` if it landed on empty space.
    fn refine_hit(&self, ray: &Ray, previous_probe: Point3<f32>) -> Option<&VoxelInfo> {
        let mut increment = self.settings.voxel_size * 0.5;
        let mut distance = increment;
        let mut voxel = None;

        for _ in 0..self.settings.raycast_precision_iterations {
            voxel = self.voxel_at_world_pos(previous_probe + ray.direction * distance);
            increment *= 0.5;
            if voxel.is_some() {
                distance -= increment;
            } else {
                distance += increment;
            }
        }

        voxel
    }

    /// Matches the ray to a face of `voxel`.
    ///
    /// A ray entering the voxel is matched at its entry point. A ray that
    /// starts inside the voxel is reported at its origin (distance 0) with the
    /// face it leaves through.
    fn resolve_face(&self, ray: &Ray, voxel: &VoxelInfo) -> VoxelResult<VoxelHit> {
        let voxel_size = self.settings.voxel_size;
        let cube = Bounds::from_min_size(
            voxel.world_position,
            Vector3::new(voxel_size, voxel_size, voxel_size),
        );
        let span = cube.ray_span(ray);

        let classification = span
            .and_then(|(entry, _)| self.face_at(ray, voxel, entry).map(|side| (side, entry)))
            .or_else(|| {
                span.filter(|_| cube.contains(ray.origin))
                    .and_then(|(_, exit)| self.face_at(ray, voxel, exit))
                    .map(|side| (side, 0.0))
            });

        match classification {
            Some((side, distance)) => Ok(VoxelHit {
                voxel: voxel.clone(),
                side,
                normal: side.normal(),
                point: ray.point_at(distance),
                distance,
            }),
            None => {
                let point = ray.point_at(span.map_or(0.0, |(entry, _)| entry));
                error!(
                    "Ray hit point {:?} lies on no face of voxel at {:?}",
                    point, voxel.world_position
                );
                Err(VoxelError::FaceClassification {
                    point,
                    voxel_position: voxel.world_position,
                })
            }
        }
    }

    fn face_at(&self, ray: &Ray, voxel: &VoxelInfo, distance: f32) -> Option<VoxelSide> {
        let local = ray.point_at(distance) - voxel.world_position;
        VoxelSide::classify_surface_point(local, self.settings.voxel_size, ON_FACE_EPSILON)
    }
}
