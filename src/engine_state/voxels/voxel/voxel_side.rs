//! # Voxel Side Module
//!
//! This module defines the six faces of a voxel cube together with the corner
//! and uv tables used to triangulate them.

use cgmath::Vector3;

/// Corners of a unit cube, bottom quad first, both quads counter-clockwise.
pub const CUBE_CORNERS: [[f32; 3]; 8] = [
    [0.0, 0.0, 0.0],
    [1.0, 0.0, 0.0],
    [1.0, 0.0, 1.0],
    [0.0, 0.0, 1.0],
    [0.0, 1.0, 0.0],
    [1.0, 1.0, 0.0],
    [1.0, 1.0, 1.0],
    [0.0, 1.0, 1.0],
];

/// Texture coordinates of the six vertices of a face, in triangle order.
pub const FACE_UVS: [[f32; 2]; 6] = [
    [0.0, 0.0],
    [0.0, 1.0],
    [1.0, 0.0],
    [1.0, 0.0],
    [0.0, 1.0],
    [1.0, 1.0],
];

/// Represents the six possible faces of a voxel.
///
/// The discriminants give the order in which faces are written into a mesh
/// block: [FRONT, BACK, RIGHT, LEFT, BOTTOM, TOP]
#[derive(PartialEq, Eq, Hash, Copy, Clone, Debug)]
pub enum VoxelSide {
    /// The front face (facing negative Z)
    FRONT = 0,

    /// The back face (facing positive Z)
    BACK = 1,

    /// The right face (facing positive X)
    RIGHT = 2,

    /// The left face (facing negative X)
    LEFT = 3,

    /// The bottom face (facing negative Y)
    BOTTOM = 4,

    /// The top face (facing positive Y)
    TOP = 5,
}

impl VoxelSide {
    /// Returns all six faces in mesh-block order.
    pub fn all() -> [VoxelSide; 6] {
        [
            VoxelSide::FRONT,
            VoxelSide::BACK,
            VoxelSide::RIGHT,
            VoxelSide::LEFT,
            VoxelSide::BOTTOM,
            VoxelSide::TOP,
        ]
    }

    /// Indices into [`CUBE_CORNERS`] forming the two triangles of this face.
    pub fn triangle_corners(self) -> [usize; 6] {
        match self {
            VoxelSide::FRONT => [0, 4, 1, 1, 4, 5],
            VoxelSide::BACK => [2, 6, 3, 3, 6, 7],
            VoxelSide::RIGHT => [1, 5, 2, 2, 5, 6],
            VoxelSide::LEFT => [3, 7, 0, 0, 7, 4],
            VoxelSide::BOTTOM => [3, 0, 2, 2, 0, 1],
            VoxelSide::TOP => [4, 7, 5, 5, 7, 6],
        }
    }

    /// Outward unit normal of this face.
    pub fn normal(self) -> Vector3<f32> {
        match self {
            VoxelSide::FRONT => Vector3::new(0.0, 0.0, -1.0),
            VoxelSide::BACK => Vector3::new(0.0, 0.0, 1.0),
            VoxelSide::RIGHT => Vector3::new(1.0, 0.0, 0.0),
            VoxelSide::LEFT => Vector3::new(-1.0, 0.0, 0.0),
            VoxelSide::BOTTOM => Vector3::new(0.0, -1.0, 0.0),
            VoxelSide::TOP => Vector3::new(0.0, 1.0, 0.0),
        }
    }

    /// Determines which face a point on the surface of a voxel lies on.
    ///
    /// `local` is the point relative to the voxel's minimum corner. Faces are
    /// tested in the order -x, +x, -y, +y, -z, +z and the first face within
    /// `epsilon` wins.
    ///
    /// # Returns
    /// The matching face, or `None` if the point is on no face.
    pub fn classify_surface_point(local: Vector3<f32>, voxel_size: f32, epsilon: f32) -> Option<VoxelSide> {
        let candidates = [
            (local.x, 0.0, VoxelSide::LEFT),
            (local.x, voxel_size, VoxelSide::RIGHT),
            (local.y, 0.0, VoxelSide::BOTTOM),
            (local.y, voxel_size, VoxelSide::TOP),
            (local.z, 0.0, VoxelSide::FRONT),
            (local.z, voxel_size, VoxelSide::BACK),
        ];

        candidates
            .into_iter()
            .find(|(value, plane, _)| (value - plane).abs() < epsilon)
            .map(|(_, _, side)| side)
    }
}
