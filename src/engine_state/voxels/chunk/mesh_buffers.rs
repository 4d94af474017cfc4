//! # Mesh Buffers Module
//!
//! Parallel vertex, uv and index buffers of a chunk, managed as a sequence of
//! fixed-size mesh blocks.
//!
//! ## Block Layout
//!
//! Every drawn voxel owns exactly one block of [`VERTICES_PER_VOXEL`] entries
//! in each buffer: 6 faces × 2 triangles × 3 vertices, none of them shared.
//! The index buffer is therefore a 1:1 vertex reference list and the entry at
//! position `i` always equals `i`.
//!
//! Because blocks are constant-sized, freeing one is a single range removal
//! followed by shifting every later index down by one block. Callers that
//! remember block starts (the voxels of the chunk) must apply the same shift.

use cgmath::{Point3, Vector2};

use crate::engine_state::voxels::voxel::voxel_side::{VoxelSide, CUBE_CORNERS, FACE_UVS};

/// Number of buffer entries in one voxel's mesh block.
pub const VERTICES_PER_VOXEL: usize = 36;

/// Vertex positions and uvs of one voxel's mesh block.
pub struct VoxelBlock {
    /// Chunk-local vertex positions
    pub vertices: [[f32; 3]; VERTICES_PER_VOXEL],
    /// Atlas texture coordinates
    pub uvs: [[f32; 2]; VERTICES_PER_VOXEL],
}

impl VoxelBlock {
    /// Builds the 36 vertices of a cube.
    ///
    /// # Arguments
    /// * `local_origin` - Chunk-local position of the voxel's minimum corner
    /// * `voxel_size` - Edge length of the cube
    /// * `uv_origin` - Start of the biome tile in the texture atlas
    /// * `uv_scale` - Size of the biome tile in the texture atlas
    pub fn build(local_origin: Point3<f32>, voxel_size: f32, uv_origin: Vector2<f32>, uv_scale: f32) -> Self {
        let mut vertices = [[0.0; 3]; VERTICES_PER_VOXEL];
        let mut uvs = [[0.0; 2]; VERTICES_PER_VOXEL];

        for (face_index, side) in VoxelSide::all().into_iter().enumerate() {
            for (corner_index, corner) in side.triangle_corners().into_iter().enumerate() {
                let entry = face_index * 6 + corner_index;
                let offset = CUBE_CORNERS[corner];
                vertices[entry] = [
                    local_origin.x + offset[0] * voxel_size,
                    local_origin.y + offset[1] * voxel_size,
                    local_origin.z + offset[2] * voxel_size,
                ];
                let face_uv = FACE_UVS[corner_index];
                uvs[entry] = [
                    uv_origin.x + face_uv[0] * uv_scale,
                    uv_origin.y + face_uv[1] * uv_scale,
                ];
            }
        }

        VoxelBlock { vertices, uvs }
    }
}

/// Growable parallel mesh buffers of one chunk.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshBuffers {
    vertices: Vec<[f32; 3]>,
    uvs: Vec<[f32; 2]>,
    indices: Vec<u32>,
}

impl MeshBuffers {
    /// Creates empty buffers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a block at the end of the buffers.
    ///
    /// # Returns
    /// The start of the new block.
    pub fn reserve_block(&mut self, block: &VoxelBlock) -> usize {
        let start = self.vertices.len();
        self.vertices.extend_from_slice(&block.vertices);
        self.uvs.extend_from_slice(&block.uvs);
        self.indices
            .extend((start..start + VERTICES_PER_VOXEL).map(|index| index as u32));
        start
    }

    /// Removes the block starting at `start` and renumbers the indices that
    /// followed it.
    ///
    /// # Panics
    /// Panics if `start` does not begin a block inside the buffers.
    pub fn free_block(&mut self, start: usize) {
        let end = start + VERTICES_PER_VOXEL;
        self.vertices.drain(start..end);
        self.uvs.drain(start..end);
        self.indices.drain(start..end);
        self.renumber_after(start);
    }

    /// Shifts every index at or after `start` down by one block.
    fn renumber_after(&mut self, start: usize) {
        for index in &mut self.indices[start..] {
            *index -= VERTICES_PER_VOXEL as u32;
        }
    }

    /// Drops all blocks.
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.uvs.clear();
        self.indices.clear();
    }

    /// Number of entries in each buffer.
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// Whether the buffers hold no blocks.
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Number of mesh blocks in the buffers.
    pub fn block_count(&self) -> usize {
        self.vertices.len() / VERTICES_PER_VOXEL
    }

    /// Chunk-local vertex positions.
    pub fn vertices(&self) -> &[[f32; 3]] {
        &self.vertices
    }

    /// Texture coordinates, parallel to [`MeshBuffers::vertices`].
    pub fn uvs(&self) -> &[[f32; 2]] {
        &self.uvs
    }

    /// Triangle list indices into [`MeshBuffers::vertices`].
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Raw bytes of the vertex buffer, ready for upload.
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Raw bytes of the uv buffer, ready for upload.
    pub fn uv_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.uvs)
    }

    /// Raw bytes of the index buffer, ready for upload.
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }
}
