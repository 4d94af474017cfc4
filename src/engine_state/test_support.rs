//! Fixtures shared by the unit tests of the engine.

use std::collections::HashMap;
use std::path::PathBuf;
use std::rc::Rc;

use cgmath::Point3;

use super::settings::{GenerationMethod, TerrainSettings};
use super::voxels::biome::{BiomeDescriptor, BiomeTable};
use super::voxels::chunk::mesh_buffers::{MeshBuffers, VERTICES_PER_VOXEL};
use super::voxels::chunk::{Chunk, ChunkEdgeHeights, EMPTY_COLUMN};
use super::voxels::voxel::VoxelInfo;

/// Settings for a flat world of single-chunk sectors.
pub(crate) fn flat_settings(
    chunk_size: usize,
    world_height: usize,
    flat_height: i32,
) -> (Rc<TerrainSettings>, Rc<BiomeTable>) {
    flat_settings_with_sector(chunk_size, chunk_size, world_height, flat_height)
}

/// Settings for a flat world with unit voxels.
pub(crate) fn flat_settings_with_sector(
    chunk_size: usize,
    sector_size: usize,
    world_height: usize,
    flat_height: i32,
) -> (Rc<TerrainSettings>, Rc<BiomeTable>) {
    let settings = TerrainSettings {
        chunk_size,
        sector_size,
        world_height,
        generation_method: GenerationMethod::Flat {
            height: flat_height,
        },
        sector_generate_threshold: 0.0,
        ..TerrainSettings::default()
    };
    let biomes = BiomeTable::new(BiomeDescriptor::default_set());
    (Rc::new(settings), Rc::new(biomes))
}

/// Small flat world: 4-voxel chunks, 2×2-chunk sectors, a 9×9 slot table.
pub(crate) fn world_settings(sector_generate_threshold: f32) -> (Rc<TerrainSettings>, Rc<BiomeTable>) {
    let settings = TerrainSettings {
        chunk_size: 4,
        sector_size: 8,
        world_height: 8,
        generation_method: GenerationMethod::Flat { height: 2 },
        window_span: 3,
        max_sector_rows_columns: 9,
        sector_generate_threshold,
        ..TerrainSettings::default()
    };
    let biomes = BiomeTable::new(settings.biomes.clone());
    (Rc::new(settings), Rc::new(biomes))
}

/// A generated chunk at the origin with every column at `height` and no
/// neighbours.
pub(crate) fn flat_chunk(settings: &Rc<TerrainSettings>, biomes: &Rc<BiomeTable>, height: i32) -> Chunk {
    let chunk_size = settings.chunk_size;
    let mut chunk = Chunk::new(
        vec![height; chunk_size * chunk_size],
        Point3::new(0.0, 0.0, 0.0),
        settings.clone(),
        biomes.clone(),
    );
    chunk.generate(&ChunkEdgeHeights::default());
    chunk
}

/// A file path in the system temp directory, unique to this test process.
pub(crate) fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("voxel_terrain_{}_{}.json", name, std::process::id()))
}

/// Order-independent copy of a chunk's state.
#[derive(Debug, PartialEq)]
pub(crate) struct ChunkSnapshot {
    mesh: MeshBuffers,
    column_heights: Vec<i32>,
    voxels: Vec<((usize, usize, usize), VoxelInfo)>,
}

impl ChunkSnapshot {
    pub(crate) fn of(chunk: &Chunk) -> Self {
        let mut voxels: Vec<((usize, usize, usize), VoxelInfo)> = chunk
            .voxels()
            .map(|(index, voxel)| ((index.x, index.y, index.z), voxel.clone()))
            .collect();
        voxels.sort_by_key(|(index, _)| *index);

        ChunkSnapshot {
            mesh: chunk.mesh().clone(),
            column_heights: chunk.column_heights().to_vec(),
            voxels,
        }
    }
}

/// Checks the bookkeeping between voxels, mesh buffers and column heights.
pub(crate) fn assert_chunk_invariants(chunk: &Chunk) {
    let mesh = chunk.mesh();
    assert_eq!(mesh.uvs().len(), mesh.len());
    assert_eq!(mesh.indices().len(), mesh.len());
    for (position, index) in mesh.indices().iter().enumerate() {
        assert_eq!(*index as usize, position, "index buffer out of order");
    }

    let mut starts: Vec<usize> = chunk.voxels().filter_map(|(_, voxel)| voxel.mesh_start).collect();
    starts.sort_unstable();
    let expected: Vec<usize> = (0..mesh.block_count()).map(|block| block * VERTICES_PER_VOXEL).collect();
    assert_eq!(starts, expected, "mesh blocks do not match drawn voxels");

    let mut tops: HashMap<(usize, usize), i32> = HashMap::new();
    for (index, voxel) in chunk.voxels() {
        assert!(chunk.is_voxel_solid(*index));
        assert_eq!(voxel.is_enclosed, voxel.mesh_start.is_none());

        if let Some(start) = voxel.mesh_start {
            let block_min = mesh.vertices()[start..start + VERTICES_PER_VOXEL]
                .iter()
                .fold([f32::MAX; 3], |min, vertex| {
                    [min[0].min(vertex[0]), min[1].min(vertex[1]), min[2].min(vertex[2])]
                });
            let local = [
                voxel.world_position.x - chunk.position.x,
                voxel.world_position.y,
                voxel.world_position.z - chunk.position.z,
            ];
            assert_eq!(block_min, local, "mesh block of {:?} is misplaced", index);
        }

        let top = tops.entry((index.x, index.z)).or_insert(EMPTY_COLUMN);
        *top = (*top).max(index.y as i32);
    }

    let chunk_size = (chunk.column_heights().len() as f64).sqrt() as usize;
    for z in 0..chunk_size {
        for x in 0..chunk_size {
            let expected = tops.get(&(x, z)).copied().unwrap_or(EMPTY_COLUMN);
            assert_eq!(chunk.column_height(x, z), expected, "column ({}, {})", x, z);
        }
    }
}
