//! # Engine Error Types
//!
//! All errors that can be surfaced by the voxel engine.

use cgmath::Point3;
use thiserror::Error;

/// Errors that can occur in the voxel engine.
#[derive(Error, Debug)]
pub enum VoxelError {
    /// Ray refinement produced a hit point that lies on none of the six faces
    /// of the resolved voxel.
    #[error("cannot determine hit face: point {point:?} is not on any face of voxel at {voxel_position:?}")]
    FaceClassification {
        /// The computed hit point
        point: Point3<f32>,
        /// World-space minimum corner of the voxel that was hit
        voxel_position: Point3<f32>,
    },

    /// The change log file exists but could not be read or written.
    #[error("change log io error: {0}")]
    ChangeLogIo(#[source] std::io::Error),

    /// The change log file could not be parsed or serialized.
    #[error("change log format error: {0}")]
    ChangeLogFormat(#[source] serde_json::Error),

    /// The settings file could not be read.
    #[error("settings io error: {0}")]
    SettingsIo(#[source] std::io::Error),

    /// The settings file could not be parsed.
    #[error("settings format error: {0}")]
    SettingsFormat(#[source] serde_json::Error),

    /// The settings failed validation.
    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    /// An add edit referenced a biome that is not in the biome table.
    #[error("unknown biome id: {0}")]
    UnknownBiome(usize),
}

/// Result alias used across the engine.
pub type VoxelResult<T> = Result<T, VoxelError>;
