#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::invalid_rust_codeblocks)]

//! # Voxel Terrain
//!
//! A streaming, editable voxel terrain engine.
//!
//! The crate procedurally generates an effectively unbounded height-field
//! terrain, keeps a window of it resident around the player, builds and
//! patches the surface mesh of every chunk as voxels are placed or removed,
//! answers point and ray queries against the voxel volume, and persists only
//! the player's edits.
//!
//! ## Key Modules
//!
//! * `core` - Geometry primitives (bounds, rays) used throughout the engine
//! * `engine_state` - The engine façade, configuration, errors and the voxel terrain itself
//!
//! ## Architecture
//!
//! Terrain is stored as a hierarchy of fixed-size cells:
//! * Chunks own voxels, column heights and mesh buffers
//! * Sectors own a square grid of chunks and are generated as a unit
//! * The world keeps a square window of sectors around the player
//!
//! Rendering, input, UI and physics live outside this crate. They read the
//! chunk mesh buffers, call the query/edit API and drain world events.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use voxel_terrain::engine_state::{settings::TerrainSettings, EngineState};
//!
//! let mut engine = EngineState::new(TerrainSettings::default(), "changes.json").unwrap();
//! let player = engine.world().spawn_position();
//! engine.tick(player);
//! println!("ground at {:?}", engine.get_column_top_height(player));
//! engine.save().unwrap();
//! ```

pub mod core;
pub mod engine_state;

pub use engine_state::error::{VoxelError, VoxelResult};
pub use engine_state::settings::{GenerationMethod, TerrainSettings};
pub use engine_state::EngineState;
