//! # Voxel Terrain Core
//!
//! This module contains the voxel terrain itself: how voxels are stored,
//! drawn, edited, queried and streamed.
//!
//! ## Architecture
//!
//! The terrain is organized as a hierarchy of fixed-size cells:
//!
//! * **Voxel**: Per-voxel data and the cube geometry tables
//! * **Biome**: Maps normalized heights to surface descriptors
//! * **Chunk**: A column of voxels with its height map and mesh buffers
//! * **Sector**: A square grid of chunks, generated from a height field
//! * **World**: The streaming window of sectors around the player
//! * **Change Log**: Persisted player edits, replayed into regenerated sectors
//!
//! ## Data Flow
//!
//! 1. Queries and edits enter through the `World`
//! 2. The `World` finds the resident sector, the sector finds the chunk
//! 3. The chunk answers or edits in place, patching its mesh buffers
//! 4. Applied edits are recorded per sector slot and written to the change log on save

pub mod biome;
pub mod change_log;
pub mod chunk;
pub mod sector;
pub mod voxel;
pub mod world;
