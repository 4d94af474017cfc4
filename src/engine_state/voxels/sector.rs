//! # Sector Module
//!
//! A sector is a square grid of chunks and the unit of procedural generation
//! and streaming. It owns its chunks exclusively and resolves the neighbour
//! indices they store.
//!
//! ## Generation
//!
//! 1. Every column of the sector footprint is sampled from the [`HeightField`]
//! 2. Chunks are linked to their four lateral neighbours inside the sector
//! 3. Every chunk builds its voxels and mesh, looking across chunk edges
//!    through the neighbour heights
//!
//! Chunks on the sector edge have no neighbour on the outer side. Their outer
//! faces are built as if the terrain beyond had height 0.

use std::rc::Rc;

use cgmath::{Point3, Vector2, Vector3};
use noise::{NoiseFn, Perlin};

use crate::core::{Bounds, Ray};
use crate::engine_state::error::VoxelResult;
use crate::engine_state::settings::{GenerationMethod, TerrainSettings};

use super::biome::{BiomeId, BiomeTable};
use super::chunk::{Chunk, ChunkEdgeHeights, ChunkNeighbours, ChunkSide, VoxelHit};
use super::voxel::VoxelInfo;

/// Produces column heights for any world position.
///
/// The field is a pure function of the world position and the noise offset,
/// so a sector regenerated at the same origin is identical to the original.
pub struct HeightField {
    method: GenerationMethod,
    perlin: Perlin,
    noise_scale: Vector3<f32>,
    sector_size_ws: f32,
    world_height: usize,
}

impl HeightField {
    /// Creates the height field described by `settings`.
    pub fn new(settings: &TerrainSettings) -> Self {
        HeightField {
            method: settings.generation_method,
            perlin: Perlin::new(settings.noise_seed),
            noise_scale: settings.noise_scale(),
            sector_size_ws: settings.sector_size_ws(),
            world_height: settings.world_height,
        }
    }

    /// Topmost voxel index of the column at world `(x, z)`.
    ///
    /// # Arguments
    /// * `world_x`, `world_z` - World position of the column's minimum corner
    /// * `noise_offset` - Shifts the sampled noise region, decorrelating worlds
    ///
    /// # Returns
    /// A height in `0..world_height`.
    pub fn column_height(&self, world_x: f32, world_z: f32, noise_offset: Vector2<f32>) -> i32 {
        let max_height = self.world_height as i32 - 1;
        match self.method {
            GenerationMethod::Flat { height } => height.clamp(0, max_height),
            GenerationMethod::Perlin => {
                let sample_x = world_x / self.sector_size_ws * self.noise_scale.x + noise_offset.x;
                let sample_z = world_z / self.sector_size_ws * self.noise_scale.z + noise_offset.y;

                // Perlin output is roughly -1..1
                let sample = self.perlin.get([sample_x as f64, sample_z as f64]) as f32;
                let height_norm = ((sample + 1.0) * 0.5).clamp(0.0, 1.0);

                let height = (height_norm * self.noise_scale.y * self.world_height as f32).floor() as i32;
                height.clamp(0, max_height)
            }
        }
    }
}

/// A square grid of chunks.
pub struct Sector {
    origin: Point3<f32>,
    /// Chunks indexed by `chunk_x + chunks_per_side * chunk_z`
    chunks: Vec<Chunk>,
    chunks_per_side: usize,
    bounds: Bounds,
    settings: Rc<TerrainSettings>,
}

impl Sector {
    /// Generates a sector whose minimum corner is `origin`.
    ///
    /// # Arguments
    /// * `origin` - World position of the sector's minimum corner (y is 0)
    /// * `noise_offset` - Noise offset shared by every sector of a world
    /// * `height_field` - Source of column heights
    /// * `settings` - Shared terrain settings
    /// * `biomes` - Shared biome table
    pub fn generate(
        origin: Point3<f32>,
        noise_offset: Vector2<f32>,
        height_field: &HeightField,
        settings: Rc<TerrainSettings>,
        biomes: Rc<BiomeTable>,
    ) -> Self {
        let chunk_size = settings.chunk_size;
        let chunks_per_side = settings.chunks_per_sector();
        let voxel_size = settings.voxel_size;

        let mut chunks = Vec::with_capacity(chunks_per_side * chunks_per_side);
        for chunk_z in 0..chunks_per_side {
            for chunk_x in 0..chunks_per_side {
                let position = Point3::new(
                    origin.x + (chunk_x * chunk_size) as f32 * voxel_size,
                    0.0,
                    origin.z + (chunk_z * chunk_size) as f32 * voxel_size,
                );

                let mut column_heights = Vec::with_capacity(chunk_size * chunk_size);
                for z in 0..chunk_size {
                    for x in 0..chunk_size {
                        column_heights.push(height_field.column_height(
                            position.x + x as f32 * voxel_size,
                            position.z + z as f32 * voxel_size,
                            noise_offset,
                        ));
                    }
                }

                chunks.push(Chunk::new(column_heights, position, settings.clone(), biomes.clone()));
            }
        }

        let mut sector = Sector {
            origin,
            chunks,
            chunks_per_side,
            bounds: Bounds::new(origin, origin),
            settings,
        };
        sector.link_chunks();
        sector.generate_chunks();
        sector
    }

    fn link_chunks(&mut self) {
        let count = self.chunks_per_side;
        for chunk_z in 0..count {
            for chunk_x in 0..count {
                let index = chunk_x + count * chunk_z;
                let neighbours = ChunkNeighbours {
                    left: (chunk_x > 0).then(|| index - 1),
                    right: (chunk_x + 1 < count).then(|| index + 1),
                    back: (chunk_z > 0).then(|| index - count),
                    front: (chunk_z + 1 < count).then(|| index + count),
                };
                self.chunks[index].set_neighbours(neighbours);
            }
        }
    }

    fn generate_chunks(&mut self) {
        for index in 0..self.chunks.len() {
            let neighbours = self.chunks[index].neighbours();
            let edge = |side: ChunkSide| {
                neighbours
                    .get(side)
                    .map(|neighbour| self.chunks[neighbour].edge_heights(side.opposite()))
            };
            let edges = ChunkEdgeHeights {
                left: edge(ChunkSide::LEFT),
                right: edge(ChunkSide::RIGHT),
                back: edge(ChunkSide::BACK),
                front: edge(ChunkSide::FRONT),
            };

            self.chunks[index].generate(&edges);
        }

        let mut bounds = *self.chunks[0].bounds();
        for chunk in self.chunks.iter().skip(1) {
            bounds.encapsulate(chunk.bounds());
        }
        self.bounds = bounds;
    }

    /// World position of the sector's minimum corner.
    pub fn origin(&self) -> Point3<f32> {
        self.origin
    }

    /// Union of the bounds of every chunk.
    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    /// Chunks along one side of the sector.
    pub fn chunks_per_side(&self) -> usize {
        self.chunks_per_side
    }

    /// All chunks, indexed by `chunk_x + chunks_per_side * chunk_z`.
    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// Mutable access to the chunks, used by the renderer to clear dirty flags.
    pub fn chunks_mut(&mut self) -> &mut [Chunk] {
        &mut self.chunks
    }

    /// Index of the chunk whose footprint contains `world_pos`.
    pub fn chunk_index_at_world_pos(&self, world_pos: Point3<f32>) -> Option<usize> {
        let chunk_size_ws = self.settings.chunk_size_ws();
        let chunk_x = ((world_pos.x - self.origin.x) / chunk_size_ws).floor();
        let chunk_z = ((world_pos.z - self.origin.z) / chunk_size_ws).floor();

        let count = self.chunks_per_side as f32;
        if chunk_x < 0.0 || chunk_z < 0.0 || chunk_x >= count || chunk_z >= count {
            return None;
        }
        Some(chunk_x as usize + self.chunks_per_side * chunk_z as usize)
    }

    /// The chunk whose footprint contains `world_pos`.
    pub fn chunk_at_world_pos(&self, world_pos: Point3<f32>) -> Option<&Chunk> {
        self.chunk_index_at_world_pos(world_pos)
            .map(|index| &self.chunks[index])
    }

    /// The voxel containing `world_pos`, if that slot is occupied.
    pub fn voxel_at_world_pos(&self, world_pos: Point3<f32>) -> Option<&VoxelInfo> {
        self.chunk_at_world_pos(world_pos)?.voxel_at_world_pos(world_pos)
    }

    /// Height of the column containing `world_pos`.
    pub fn column_height_at_world_pos(&self, world_pos: Point3<f32>) -> Option<i32> {
        self.chunk_at_world_pos(world_pos)?
            .column_height_at_world_pos(world_pos)
    }

    /// Places a voxel, see [`Chunk::add_voxel_at_world_pos`].
    pub fn add_voxel_at_world_pos(&mut self, world_pos: Point3<f32>, biome: BiomeId) -> bool {
        match self.chunk_index_at_world_pos(world_pos) {
            Some(index) => self.chunks[index].add_voxel_at_world_pos(world_pos, biome),
            None => false,
        }
    }

    /// Removes a voxel and exposes its neighbours, including those in
    /// adjacent chunks of this sector.
    ///
    /// # Returns
    /// The removed voxel, or `None` if nothing was removed.
    pub fn remove_voxel_at_world_pos(&mut self, world_pos: Point3<f32>) -> Option<VoxelInfo> {
        let index = self.chunk_index_at_world_pos(world_pos)?;
        let removed = self.chunks[index].remove_voxel_at_world_pos(world_pos)?;

        let neighbours = self.chunks[index].neighbours();
        for exposure in removed.cross_chunk {
            if let Some(neighbour) = neighbours.get(exposure.side) {
                self.chunks[neighbour].expose_voxel(exposure.index);
            }
        }

        Some(removed.voxel)
    }

    /// Finds the first voxel of this sector struck by `ray`.
    ///
    /// Chunks are tried in order of ray entry distance. Chunks entered beyond
    /// `max_distance` are skipped, and so are hits farther than it.
    pub fn get_ray_hit(&self, ray: &Ray, max_distance: f32) -> VoxelResult<Option<VoxelHit>> {
        let mut candidates: Vec<(f32, usize)> = self
            .chunks
            .iter()
            .enumerate()
            .filter_map(|(index, chunk)| {
                chunk
                    .bounds()
                    .intersect_ray(ray)
                    .filter(|distance| *distance <= max_distance)
                    .map(|distance| (distance, index))
            })
            .collect();
        candidates.sort_by(|a, b| a.0.total_cmp(&b.0));

        for (_, index) in candidates {
            if let Some(hit) = self.chunks[index].get_ray_hit_info(ray)? {
                if hit.distance <= max_distance {
                    return Ok(Some(hit));
                }
            }
        }

        Ok(None)
    }

    /// Whether any chunk has mesh changes not yet consumed.
    pub fn is_dirty(&self) -> bool {
        self.chunks.iter().any(Chunk::is_dirty)
    }
}
