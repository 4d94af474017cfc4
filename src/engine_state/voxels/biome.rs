//! # Biome Module
//!
//! This module maps normalized terrain heights to surface descriptors.
//! The table is built once from configuration and never mutated afterwards.

use serde::{Deserialize, Serialize};

/// Identifies a biome by its position in the height-ordered [`BiomeTable`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BiomeId(pub usize);

/// Describes the surface of one height band of the terrain.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BiomeDescriptor {
    /// Human readable name
    pub name: String,
    /// Normalized height (0..1) from which this biome starts
    pub threshold_height_norm: f32,
    /// Where the texture of this biome starts in the biome atlas
    pub texture_uv: [f32; 2],
    /// How hard a voxel of this biome is to destroy
    pub destruction_cost: f32,
}

impl BiomeDescriptor {
    /// Creates a new biome descriptor.
    pub fn new(name: &str, threshold_height_norm: f32, texture_uv: [f32; 2], destruction_cost: f32) -> Self {
        BiomeDescriptor {
            name: name.to_string(),
            threshold_height_norm,
            texture_uv,
            destruction_cost,
        }
    }

    /// The biome set used when no configuration provides one.
    pub fn default_set() -> Vec<BiomeDescriptor> {
        vec![
            BiomeDescriptor::new("water", 0.0, [0.0, 0.0], 1.0),
            BiomeDescriptor::new("sand", 0.2, [0.25, 0.0], 1.0),
            BiomeDescriptor::new("grass", 0.35, [0.5, 0.0], 2.0),
            BiomeDescriptor::new("rock", 0.6, [0.75, 0.0], 4.0),
            BiomeDescriptor::new("snow", 0.8, [0.0, 0.25], 1.5),
        ]
    }
}

/// Height-ordered lookup table of biomes.
///
/// # Examples
///
/// ```
/// use voxel_terrain::engine_state::voxels::biome::{BiomeDescriptor, BiomeId, BiomeTable};
///
/// let table = BiomeTable::new(BiomeDescriptor::default_set());
/// assert_eq!(table.biome_by_norm_height(0.5), BiomeId(2));
/// ```
#[derive(Clone, Debug)]
pub struct BiomeTable {
    biomes: Vec<BiomeDescriptor>,
}

impl BiomeTable {
    /// Builds the table, ordering the biomes by ascending threshold.
    pub fn new(mut biomes: Vec<BiomeDescriptor>) -> Self {
        biomes.sort_by(|a, b| a.threshold_height_norm.total_cmp(&b.threshold_height_norm));
        BiomeTable { biomes }
    }

    /// Returns the biome with the greatest threshold not above `norm_height`,
    /// or the lowest biome if `norm_height` is below every threshold.
    pub fn biome_by_norm_height(&self, norm_height: f32) -> BiomeId {
        let at_or_below = self
            .biomes
            .partition_point(|biome| biome.threshold_height_norm <= norm_height);
        BiomeId(at_or_below.saturating_sub(1))
    }

    /// Looks up a biome descriptor.
    pub fn get(&self, id: BiomeId) -> Option<&BiomeDescriptor> {
        self.biomes.get(id.0)
    }

    /// Number of biomes in the table.
    pub fn len(&self) -> usize {
        self.biomes.len()
    }

    /// Whether the table holds no biomes.
    pub fn is_empty(&self) -> bool {
        self.biomes.is_empty()
    }
}
