//! # Voxel Module
//!
//! This module provides the per-voxel data stored by chunks and the cube
//! geometry tables used to draw a voxel.

use cgmath::Point3;

use super::biome::BiomeId;

pub mod voxel_side;

/// Chunk-local voxel coordinate.
///
/// `x` and `z` lie in `0..chunk_size`, `y` lies in `0..world_height`.
pub type VoxelIndex = Point3<usize>;

/// Data for one occupied voxel.
///
/// An enclosed voxel has all six neighbours occupied, so it contributes no
/// visible faces and owns no mesh block.
#[derive(Clone, Debug, PartialEq)]
pub struct VoxelInfo {
    /// World-space position of the voxel's minimum corner
    pub world_position: Point3<f32>,
    /// Surface descriptor of this voxel
    pub biome: BiomeId,
    /// Whether every face of the voxel is covered by a neighbour
    pub is_enclosed: bool,
    /// Start of this voxel's mesh block in the chunk buffers, `None` when enclosed
    pub mesh_start: Option<usize>,
}
