//! # Engine State Module
//!
//! The frame-synchronous front of the terrain engine.
//!
//! ## Key Components
//!
//! * `EngineState` - Owns the settings, the biome table, the world and the change log location
//! * `settings` - Terrain configuration loaded from JSON
//! * `error` - The engine error type
//! * `voxels` - Chunks, sectors, the streaming world and the change log
//!
//! ## Architecture
//!
//! Everything runs on the caller's thread. A frame calls [`EngineState::tick`]
//! once with the player position, then issues any number of queries and
//! edits, then drains the queued [`WorldEvent`]s for the rendering and UI
//! layers. Every call completes before it returns.
//!
//! The five query/edit methods are the only entry points the surrounding
//! systems (movement, build tools, UI) are expected to use.

use std::path::{Path, PathBuf};
use std::rc::Rc;

use cgmath::Point3;
use log::info;

use crate::core::Ray;

pub mod error;
pub mod settings;
pub mod voxels;

#[cfg(test)]
pub(crate) mod test_support;

use error::VoxelResult;
use settings::TerrainSettings;
use voxels::biome::{BiomeId, BiomeTable};
use voxels::change_log::ChangeLog;
use voxels::chunk::VoxelHit;
use voxels::voxel::VoxelInfo;
use voxels::world::{World, WorldEvent};

/// The main state container for the terrain engine
///
/// # Examples
///
/// ```no_run
/// use cgmath::{Point3, Vector3};
/// use voxel_terrain::core::Ray;
/// use voxel_terrain::engine_state::{settings::TerrainSettings, EngineState};
///
/// let mut engine = EngineState::new(TerrainSettings::default(), "changes.json").unwrap();
/// let player = engine.world().spawn_position();
///
/// // Main loop
/// loop {
///     engine.tick(player);
///     let ray = Ray::new(player, Vector3::new(0.0, -1.0, 0.0));
///     if let Some(hit) = engine.get_voxel_ray_intersection(&ray, Some(64.0)).unwrap() {
///         engine.remove_voxel_on_world_pos(hit.voxel.world_position + Vector3::new(0.5, 0.5, 0.5));
///     }
///     for event in engine.drain_events() {
///         println!("{:?}", event);
///     }
/// }
/// ```
pub struct EngineState {
    /// Validated terrain settings shared with every sector and chunk
    settings: Rc<TerrainSettings>,
    /// The streaming world
    world: World,
    /// Where the change log is read from and written to
    change_log_path: PathBuf,
}

impl EngineState {
    /// Creates the engine, loading recorded edits from `change_log_path`.
    ///
    /// A missing or unreadable change log starts the world without edits.
    ///
    /// # Arguments
    ///
    /// * `settings` - Terrain configuration; validated here
    /// * `change_log_path` - Location of the change log file
    ///
    /// # Returns
    ///
    /// The engine with its initial sector window generated, or
    /// [`error::VoxelError::InvalidSettings`].
    pub fn new(settings: TerrainSettings, change_log_path: impl Into<PathBuf>) -> VoxelResult<Self> {
        settings.validate()?;
        let change_log_path = change_log_path.into();

        let biomes = Rc::new(BiomeTable::new(settings.biomes.clone()));
        let settings = Rc::new(settings);
        let change_log = ChangeLog::load(&change_log_path);
        let world = World::new(settings.clone(), biomes, &change_log)?;

        Ok(Self {
            settings,
            world,
            change_log_path,
        })
    }

    /// Advances sector streaming for the player's position.
    pub fn tick(&mut self, player_position: Point3<f32>) {
        self.world.tick(player_position);
    }

    /// The voxel containing `world_pos`, if resident and occupied.
    pub fn get_voxel_at_world_pos(&self, world_pos: Point3<f32>) -> Option<&VoxelInfo> {
        self.world.get_voxel_at_world_pos(world_pos)
    }

    /// World-space height of the top face of the column containing `world_pos`.
    pub fn get_column_top_height(&self, world_pos: Point3<f32>) -> Option<f32> {
        self.world.get_column_top_height(world_pos)
    }

    /// First voxel struck by `ray`, at most `max_distance` away.
    pub fn get_voxel_ray_intersection(
        &self,
        ray: &Ray,
        max_distance: Option<f32>,
    ) -> VoxelResult<Option<VoxelHit>> {
        self.world.get_voxel_ray_intersection(ray, max_distance)
    }

    /// Places a voxel of `biome` in the empty slot containing `world_pos`.
    pub fn add_voxel_to_world_pos(&mut self, world_pos: Point3<f32>, biome: BiomeId) -> VoxelResult<bool> {
        self.world.add_voxel_to_world_pos(world_pos, biome)
    }

    /// Removes the voxel containing `world_pos`.
    pub fn remove_voxel_on_world_pos(&mut self, world_pos: Point3<f32>) -> bool {
        self.world.remove_voxel_on_world_pos(world_pos)
    }

    /// How hard `voxel` is to destroy, taken from its biome.
    pub fn destruction_cost(&self, voxel: &VoxelInfo) -> Option<f32> {
        self.world
            .biome(voxel.biome)
            .map(|biome| biome.destruction_cost)
    }

    /// Writes every recorded edit to the change log file.
    pub fn save(&mut self) -> VoxelResult<()> {
        let change_log = self.world.to_change_log();
        change_log.save(&self.change_log_path)?;

        let edit_count = change_log.len();
        info!(
            "Saved {} edits to {}",
            edit_count,
            self.change_log_path.display()
        );
        self.world.push_event(WorldEvent::ChangesSaved { edit_count });
        Ok(())
    }

    /// Discards every recorded edit and regenerates the resident sectors.
    ///
    /// The change log file is left untouched until the next [`EngineState::save`].
    pub fn reset_changes(&mut self) {
        self.world.reset_changes();
    }

    /// Takes every event queued since the last call.
    pub fn drain_events(&mut self) -> Vec<WorldEvent> {
        self.world.drain_events()
    }

    /// The streaming world.
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Mutable access to the streaming world.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// The active terrain settings.
    pub fn settings(&self) -> &TerrainSettings {
        &self.settings
    }

    /// Where the change log is written.
    pub fn change_log_path(&self) -> &Path {
        &self.change_log_path
    }
}
