//! # Chunk Module
//!
//! This module provides the `Chunk` struct: a square column of voxels that owns
//! its column height map, its occupied voxels and the mesh buffers drawn for
//! them.
//!
//! ## Storage
//!
//! Chunks keep two views of their voxels:
//! - `solid_array`: A bit vector (1 bit per voxel slot) answering occupancy in O(1)
//! - `voxels`: A sparse map holding a [`VoxelInfo`] for every occupied slot
//!
//! Both are always updated together. Ray marching and neighbour checks only
//! touch the bit vector; the map is consulted when voxel data is needed.
//!
//! ## Mesh Maintenance
//!
//! Mesh buffers are built once by [`Chunk::generate`] and then edited in place
//! by the add/remove operations in `chunk_editing`. Every drawn voxel owns one
//! fixed-size block (see [`mesh_buffers`]).
//!
//! ## Neighbours
//!
//! A chunk does not own or reference its neighbours. It stores their indices
//! in the owning sector's chunk grid; the sector resolves them when a
//! generation or removal step needs to look across the chunk edge.

use std::collections::HashMap;
use std::rc::Rc;

use bitvec::prelude::BitVec;
use cgmath::{Point3, Vector2, Vector3};

use crate::core::Bounds;
use crate::engine_state::settings::TerrainSettings;

use super::biome::{BiomeId, BiomeTable};
use super::voxel::{VoxelIndex, VoxelInfo};
use mesh_buffers::{MeshBuffers, VoxelBlock};

mod chunk_editing;
mod chunk_raycast;
pub mod mesh_buffers;

pub use chunk_editing::{CrossChunkExposure, RemovedVoxel};
pub use chunk_raycast::VoxelHit;

/// Column height of a column with no voxels left in it.
pub const EMPTY_COLUMN: i32 = -1;

/// The four lateral edges of a chunk.
#[derive(PartialEq, Eq, Hash, Copy, Clone, Debug)]
pub enum ChunkSide {
    /// Towards negative X
    LEFT,
    /// Towards positive X
    RIGHT,
    /// Towards negative Z
    BACK,
    /// Towards positive Z
    FRONT,
}

impl ChunkSide {
    /// Returns all four sides.
    pub fn all() -> [ChunkSide; 4] {
        [ChunkSide::LEFT, ChunkSide::RIGHT, ChunkSide::BACK, ChunkSide::FRONT]
    }

    /// The side of the neighbouring chunk that touches this side.
    pub fn opposite(self) -> ChunkSide {
        match self {
            ChunkSide::LEFT => ChunkSide::RIGHT,
            ChunkSide::RIGHT => ChunkSide::LEFT,
            ChunkSide::BACK => ChunkSide::FRONT,
            ChunkSide::FRONT => ChunkSide::BACK,
        }
    }
}

/// Indices of the lateral neighbours of a chunk in its sector's chunk grid.
///
/// `None` means there is no neighbour on that side (sector edge).
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ChunkNeighbours {
    /// Neighbour towards negative X
    pub left: Option<usize>,
    /// Neighbour towards positive X
    pub right: Option<usize>,
    /// Neighbour towards negative Z
    pub back: Option<usize>,
    /// Neighbour towards positive Z
    pub front: Option<usize>,
}

impl ChunkNeighbours {
    /// Returns the neighbour on `side`.
    pub fn get(&self, side: ChunkSide) -> Option<usize> {
        match side {
            ChunkSide::LEFT => self.left,
            ChunkSide::RIGHT => self.right,
            ChunkSide::BACK => self.back,
            ChunkSide::FRONT => self.front,
        }
    }
}

/// Column heights along the touching edges of the neighbouring chunks.
///
/// Each present entry holds `chunk_size` heights ordered along the shared edge
/// (by z for left/right, by x for back/front). Missing neighbours count as
/// height 0 during generation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChunkEdgeHeights {
    /// Right edge of the left neighbour
    pub left: Option<Vec<i32>>,
    /// Left edge of the right neighbour
    pub right: Option<Vec<i32>>,
    /// Front edge of the back neighbour
    pub back: Option<Vec<i32>>,
    /// Back edge of the front neighbour
    pub front: Option<Vec<i32>>,
}

impl ChunkEdgeHeights {
    fn height(edge: &Option<Vec<i32>>, along: usize) -> i32 {
        edge.as_ref().map_or(0, |heights| heights[along])
    }
}

/// A square column of `chunk_size × world_height × chunk_size` voxel slots.
pub struct Chunk {
    /// World-space position of the chunk's minimum corner (y is always 0)
    pub position: Point3<f32>,

    /// Topmost occupied y per column, indexed by `x + chunk_size * z`
    column_heights: Vec<i32>,

    /// One bit per voxel slot, indexed by `x + chunk_size * (z + chunk_size * y)`
    solid_array: BitVec,

    /// Data of every occupied voxel slot
    voxels: HashMap<VoxelIndex, VoxelInfo>,

    mesh: MeshBuffers,
    bounds: Bounds,
    neighbours: ChunkNeighbours,

    /// Set whenever the mesh buffers change, cleared by the consumer
    dirty: bool,

    settings: Rc<TerrainSettings>,
    biomes: Rc<BiomeTable>,
}

impl Chunk {
    /// Creates a chunk from its column height map. No voxels exist until
    /// [`Chunk::generate`] runs.
    ///
    /// # Arguments
    /// * `column_heights` - `chunk_size²` heights indexed by `x + chunk_size * z`
    /// * `position` - World-space position of the chunk's minimum corner
    /// * `settings` - Shared terrain settings
    /// * `biomes` - Shared biome table
    pub fn new(
        column_heights: Vec<i32>,
        position: Point3<f32>,
        settings: Rc<TerrainSettings>,
        biomes: Rc<BiomeTable>,
    ) -> Self {
        let chunk_size = settings.chunk_size;
        debug_assert_eq!(column_heights.len(), chunk_size * chunk_size);

        let bounds = Bounds::from_min_size(
            position,
            Vector3::new(
                settings.chunk_size_ws(),
                settings.world_height_ws(),
                settings.chunk_size_ws(),
            ),
        );
        let solid_array = BitVec::repeat(false, chunk_size * chunk_size * settings.world_height);

        Chunk {
            position,
            column_heights,
            solid_array,
            voxels: HashMap::new(),
            mesh: MeshBuffers::new(),
            bounds,
            neighbours: ChunkNeighbours::default(),
            dirty: false,
            settings,
            biomes,
        }
    }

    /// Builds every voxel and the initial mesh from the column heights.
    ///
    /// Voxels below the top of a column are enclosed (no mesh block) unless a
    /// lateral neighbour column is lower than them. The topmost voxel of a
    /// column is always drawn.
    ///
    /// # Arguments
    /// * `edges` - Heights along the touching edges of the neighbouring chunks
    pub fn generate(&mut self, edges: &ChunkEdgeHeights) {
        self.voxels.clear();
        self.solid_array.fill(false);
        self.mesh.clear();

        let chunk_size = self.settings.chunk_size;
        let world_height = self.settings.world_height as f32;

        for x in 0..chunk_size {
            for z in 0..chunk_size {
                let height = self.column_height(x, z);
                if height == EMPTY_COLUMN {
                    continue;
                }

                let left = if x == 0 {
                    ChunkEdgeHeights::height(&edges.left, z)
                } else {
                    self.column_height(x - 1, z)
                };
                let right = if x == chunk_size - 1 {
                    ChunkEdgeHeights::height(&edges.right, z)
                } else {
                    self.column_height(x + 1, z)
                };
                let back = if z == 0 {
                    ChunkEdgeHeights::height(&edges.back, x)
                } else {
                    self.column_height(x, z - 1)
                };
                let front = if z == chunk_size - 1 {
                    ChunkEdgeHeights::height(&edges.front, x)
                } else {
                    self.column_height(x, z + 1)
                };

                for y in 0..height {
                    let neighbour_missing = left < y || right < y || back < y || front < y;
                    let biome = self.biomes.biome_by_norm_height(y as f32 / world_height);
                    let index = Point3::new(x, y as usize, z);

                    let mesh_start = if neighbour_missing {
                        Some(self.draw_voxel(index, biome))
                    } else {
                        None
                    };
                    self.insert_voxel(index, biome, !neighbour_missing, mesh_start);
                }

                // the surface is always drawn
                let index = Point3::new(x, height as usize, z);
                let biome = self.biomes.biome_by_norm_height(height as f32 / world_height);
                let mesh_start = self.draw_voxel(index, biome);
                self.insert_voxel(index, biome, false, Some(mesh_start));
            }
        }

        self.dirty = true;
    }

    /// Converts a voxel index to the world position of its minimum corner.
    ///
    /// Does not check that the index lies inside the chunk.
    pub fn voxel_index_to_world_pos(&self, index: VoxelIndex) -> Point3<f32> {
        let voxel_size = self.settings.voxel_size;
        Point3::new(
            self.position.x + index.x as f32 * voxel_size,
            index.y as f32 * voxel_size,
            self.position.z + index.z as f32 * voxel_size,
        )
    }

    /// Converts a world position to the index of the voxel slot containing it.
    ///
    /// # Returns
    /// `None` if the position falls outside this chunk.
    pub fn world_pos_to_voxel_index(&self, world_pos: Point3<f32>) -> Option<VoxelIndex> {
        let voxel_size = self.settings.voxel_size;
        let x = ((world_pos.x - self.position.x) / voxel_size).floor();
        let y = (world_pos.y / voxel_size).floor();
        let z = ((world_pos.z - self.position.z) / voxel_size).floor();

        let chunk_size = self.settings.chunk_size as f32;
        let world_height = self.settings.world_height as f32;
        if x < 0.0 || z < 0.0 || y < 0.0 || x >= chunk_size || z >= chunk_size || y >= world_height {
            return None;
        }

        Some(Point3::new(x as usize, y as usize, z as usize))
    }

    /// Returns the voxel at a chunk-local index, if that slot is occupied.
    pub fn voxel_at_index(&self, index: VoxelIndex) -> Option<&VoxelInfo> {
        self.voxels.get(&index)
    }

    /// Returns the voxel containing a world position, if that slot is occupied.
    pub fn voxel_at_world_pos(&self, world_pos: Point3<f32>) -> Option<&VoxelInfo> {
        let index = self.world_pos_to_voxel_index(world_pos)?;
        if !self.is_voxel_solid(index) {
            return None;
        }
        self.voxels.get(&index)
    }

    /// Checks whether the voxel slot at `index` is occupied.
    pub fn is_voxel_solid(&self, index: VoxelIndex) -> bool {
        self.solid_array[self.solid_offset(index)]
    }

    /// Topmost occupied y of the column at local `(x, z)`, or [`EMPTY_COLUMN`].
    pub fn column_height(&self, x: usize, z: usize) -> i32 {
        self.column_heights[x + self.settings.chunk_size * z]
    }

    /// Height of the column containing `world_pos`; the y coordinate is ignored.
    ///
    /// # Returns
    /// `None` if the position falls outside the chunk's x/z footprint.
    pub fn column_height_at_world_pos(&self, world_pos: Point3<f32>) -> Option<i32> {
        let voxel_size = self.settings.voxel_size;
        let x = ((world_pos.x - self.position.x) / voxel_size).floor();
        let z = ((world_pos.z - self.position.z) / voxel_size).floor();

        let chunk_size = self.settings.chunk_size as f32;
        if x < 0.0 || z < 0.0 || x >= chunk_size || z >= chunk_size {
            return None;
        }
        Some(self.column_height(x as usize, z as usize))
    }

    /// All column heights, indexed by `x + chunk_size * z`.
    pub fn column_heights(&self) -> &[i32] {
        &self.column_heights
    }

    /// Column heights along one edge of this chunk.
    ///
    /// Left/right edges are ordered by z, back/front edges by x.
    pub fn edge_heights(&self, side: ChunkSide) -> Vec<i32> {
        let last = self.settings.chunk_size - 1;
        (0..self.settings.chunk_size)
            .map(|along| match side {
                ChunkSide::LEFT => self.column_height(0, along),
                ChunkSide::RIGHT => self.column_height(last, along),
                ChunkSide::BACK => self.column_height(along, 0),
                ChunkSide::FRONT => self.column_height(along, last),
            })
            .collect()
    }

    /// Sets the neighbour links of this chunk.
    pub fn set_neighbours(&mut self, neighbours: ChunkNeighbours) {
        self.neighbours = neighbours;
    }

    /// The neighbour links of this chunk.
    pub fn neighbours(&self) -> ChunkNeighbours {
        self.neighbours
    }

    /// World-space bounds of the chunk's full voxel column.
    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    /// The chunk's mesh buffers.
    pub fn mesh(&self) -> &MeshBuffers {
        &self.mesh
    }

    /// Iterates over every occupied voxel.
    pub fn voxels(&self) -> impl Iterator<Item = (&VoxelIndex, &VoxelInfo)> {
        self.voxels.iter()
    }

    /// Number of occupied voxels.
    pub fn voxel_count(&self) -> usize {
        self.voxels.len()
    }

    /// Whether the mesh changed since [`Chunk::mark_clean`] was last called.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Marks the current mesh as consumed by the renderer.
    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    fn solid_offset(&self, index: VoxelIndex) -> usize {
        let chunk_size = self.settings.chunk_size;
        index.x + chunk_size * (index.z + chunk_size * index.y)
    }

    fn insert_voxel(&mut self, index: VoxelIndex, biome: BiomeId, is_enclosed: bool, mesh_start: Option<usize>) {
        let offset = self.solid_offset(index);
        self.solid_array.set(offset, true);
        self.voxels.insert(
            index,
            VoxelInfo {
                world_position: self.voxel_index_to_world_pos(index),
                biome,
                is_enclosed,
                mesh_start,
            },
        );
    }

    /// Appends a mesh block for the voxel at `index`.
    ///
    /// # Returns
    /// The start of the new block.
    fn draw_voxel(&mut self, index: VoxelIndex, biome: BiomeId) -> usize {
        let voxel_size = self.settings.voxel_size;
        let uv_origin = self
            .biomes
            .get(biome)
            .map_or(Vector2::new(0.0, 0.0), |descriptor| Vector2::from(descriptor.texture_uv));
        let local_origin = Point3::new(
            index.x as f32 * voxel_size,
            index.y as f32 * voxel_size,
            index.z as f32 * voxel_size,
        );

        let block = VoxelBlock::build(local_origin, voxel_size, uv_origin, self.settings.biome_uv_scale);
        self.dirty = true;
        self.mesh.reserve_block(&block)
    }
}
