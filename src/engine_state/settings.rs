//! # Terrain Settings
//!
//! Configuration shared by every chunk, sector and the world cache.
//!
//! Settings are loaded once (from JSON or from `Default`), validated, and then
//! handed to constructors behind an `Rc`. Nothing in the engine looks them up
//! globally.
//!
//! ```json
//! {
//!   "chunk_size": 16,
//!   "sector_size": 64,
//!   "generation_method": { "method": "flat", "height": 4 }
//! }
//! ```

use std::path::Path;

use cgmath::Vector3;
use serde::{Deserialize, Serialize};

use super::error::{VoxelError, VoxelResult};
use super::voxels::biome::BiomeDescriptor;

/// The method used to produce column heights for new sectors.
///
/// Possible values:
/// - `perlin`: 2D Perlin noise scaled by `noise_scale`
/// - `flat`: every column has the same height (useful for testing)
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum GenerationMethod {
    /// Coherent noise height field
    Perlin,
    /// Constant height field, `height` is the topmost voxel index of every column
    Flat {
        /// Topmost voxel index
        height: i32,
    },
}

/// Terrain configuration.
///
/// Sizes ending in `_size` are measured in voxels unless stated otherwise.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainSettings {
    /// Voxels along one side of a chunk
    pub chunk_size: usize,
    /// Voxels along one side of a sector; a multiple of `chunk_size`
    pub sector_size: usize,
    /// Voxels in a column
    pub world_height: usize,
    /// Edge length of one voxel in world units
    pub voxel_size: f32,
    /// Noise scale; x and z stretch the noise field, y scales the height
    pub noise_scale: [f32; 3],
    /// Seed of the Perlin permutation table
    pub noise_seed: u32,
    /// Height field used for new sectors
    pub generation_method: GenerationMethod,
    /// Sectors along one side of the resident window; odd and at least 3
    pub window_span: usize,
    /// Sectors along one side of the slot table
    pub max_sector_rows_columns: usize,
    /// How far into a non-center sector the player must walk (world units)
    /// before a new row or column of sectors is generated
    pub sector_generate_threshold: f32,
    /// Binary refinement steps performed by ray queries
    pub raycast_precision_iterations: usize,
    /// Size of one biome tile in the texture atlas (uv units)
    pub biome_uv_scale: f32,
    /// Terrain surface descriptors
    pub biomes: Vec<BiomeDescriptor>,
}

impl Default for TerrainSettings {
    fn default() -> Self {
        TerrainSettings {
            chunk_size: 16,
            sector_size: 64,
            world_height: 64,
            voxel_size: 1.0,
            noise_scale: [1.0, 0.5, 1.0],
            noise_seed: 0,
            generation_method: GenerationMethod::Perlin,
            window_span: 3,
            max_sector_rows_columns: 100,
            sector_generate_threshold: 8.0,
            raycast_precision_iterations: 8,
            biome_uv_scale: 0.25,
            biomes: BiomeDescriptor::default_set(),
        }
    }
}

impl TerrainSettings {
    /// Loads settings from a JSON file and validates them.
    ///
    /// Missing fields fall back to their defaults.
    pub fn load(path: &Path) -> VoxelResult<Self> {
        let content = std::fs::read_to_string(path).map_err(VoxelError::SettingsIo)?;
        let settings: TerrainSettings =
            serde_json::from_str(&content).map_err(VoxelError::SettingsFormat)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Rejects configurations the engine cannot work with.
    pub fn validate(&self) -> VoxelResult<()> {
        let invalid = |message: &str| Err(VoxelError::InvalidSettings(message.to_string()));

        if self.chunk_size == 0 || self.sector_size == 0 || self.world_height == 0 {
            return invalid("chunk_size, sector_size and world_height must be positive");
        }
        if self.sector_size % self.chunk_size != 0 {
            return invalid("sector_size must be a multiple of chunk_size");
        }
        if self.voxel_size.is_nan() || self.voxel_size <= 0.0 {
            return invalid("voxel_size must be positive");
        }
        if self.window_span < 3 || self.window_span % 2 == 0 {
            return invalid("window_span must be odd and at least 3");
        }
        if self.window_span + 2 > self.max_sector_rows_columns {
            return invalid("max_sector_rows_columns must leave room around the window");
        }
        if self.sector_generate_threshold < 0.0
            || self.sector_generate_threshold >= self.sector_size_ws()
        {
            return invalid("sector_generate_threshold must lie inside a sector");
        }
        if self.biomes.is_empty() {
            return invalid("at least one biome is required");
        }
        if let GenerationMethod::Flat { height } = self.generation_method {
            if height < 0 || height as usize >= self.world_height {
                return invalid("flat height must be a valid voxel index");
            }
        }
        Ok(())
    }

    /// Edge length of a chunk in world units.
    pub fn chunk_size_ws(&self) -> f32 {
        self.chunk_size as f32 * self.voxel_size
    }

    /// Edge length of a sector in world units.
    pub fn sector_size_ws(&self) -> f32 {
        self.sector_size as f32 * self.voxel_size
    }

    /// Height of a column in world units.
    pub fn world_height_ws(&self) -> f32 {
        self.world_height as f32 * self.voxel_size
    }

    /// Chunks along one side of a sector.
    pub fn chunks_per_sector(&self) -> usize {
        self.sector_size / self.chunk_size
    }

    /// Sectors between the window center and its edge.
    pub fn half_window(&self) -> usize {
        self.window_span / 2
    }

    /// Noise scale as a vector.
    pub fn noise_scale(&self) -> Vector3<f32> {
        Vector3::from(self.noise_scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_are_valid() {
        assert!(TerrainSettings::default().validate().is_ok());
    }

    #[test]
    fn test_even_window_rejected() {
        let settings = TerrainSettings {
            window_span: 4,
            ..TerrainSettings::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(VoxelError::InvalidSettings(_))
        ));
    }

    #[test]
    fn test_sector_must_hold_whole_chunks() {
        let settings = TerrainSettings {
            sector_size: 40,
            chunk_size: 16,
            ..TerrainSettings::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{ "chunk_size": 8, "generation_method": { "method": "flat", "height": 3 } }"#;
        let settings: TerrainSettings = serde_json::from_str(json).unwrap();
        assert_eq!(settings.chunk_size, 8);
        assert_eq!(settings.sector_size, 64);
        assert_eq!(
            settings.generation_method,
            GenerationMethod::Flat { height: 3 }
        );
        assert!(settings.validate().is_ok());
    }
}
