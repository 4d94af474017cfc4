//! # Change Log Module
//!
//! Persistence of player edits as deltas from the procedural terrain.
//!
//! The log is a JSON document with two lists, one for placed voxels and one
//! for removed voxels, plus the noise offset of the world they were made in.
//! It is read once at startup and rewritten as a whole on every save.
//!
//! ```json
//! {
//!   "noise_offset": [12.5, 3.0],
//!   "add_changes": [{ "sequence": 1, "world_position": [4.5, 9.5, 2.5], "biome_index": 2 }],
//!   "remove_changes": [{ "sequence": 0, "world_position": [4.5, 8.5, 2.5] }]
//! }
//! ```
//!
//! Each record carries a sequence number so the two lists can be merged back
//! into the order the edits were made in.

use std::path::Path;

use cgmath::Point3;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::engine_state::error::{VoxelError, VoxelResult};

use super::biome::BiomeId;

/// What an edit did.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EditKind {
    /// A voxel of `biome` was placed
    Add {
        /// Biome of the placed voxel
        biome: BiomeId,
    },
    /// A voxel was removed
    Remove,
}

/// One recorded edit, as kept in memory by the world.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct EditRecord {
    /// Position in the global edit order
    pub sequence: u64,
    /// World position the edit targeted
    pub position: Point3<f32>,
    /// What the edit did
    pub kind: EditKind,
}

/// A persisted voxel placement.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AddChange {
    /// Position in the global edit order
    #[serde(default)]
    pub sequence: u64,
    /// World position the edit targeted
    pub world_position: [f32; 3],
    /// Index of the biome in the biome table
    pub biome_index: usize,
}

/// A persisted voxel removal.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RemoveChange {
    /// Position in the global edit order
    #[serde(default)]
    pub sequence: u64,
    /// World position the edit targeted
    pub world_position: [f32; 3],
}

/// Every edit made to a world, in persisted form.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChangeLog {
    /// Noise offset the world was generated with; `None` before the first save
    pub noise_offset: Option<[f32; 2]>,
    /// Placed voxels
    pub add_changes: Vec<AddChange>,
    /// Removed voxels
    pub remove_changes: Vec<RemoveChange>,
}

impl ChangeLog {
    /// Loads the change log at `path`.
    ///
    /// A missing or unreadable file yields an empty log; only a warning is
    /// logged for the latter.
    pub fn load(path: &Path) -> Self {
        match Self::try_load(path) {
            Ok(Some(change_log)) => {
                info!(
                    "Loaded change log from {} ({} edits)",
                    path.display(),
                    change_log.len()
                );
                change_log
            }
            Ok(None) => {
                info!("No change log at {}, starting without edits", path.display());
                ChangeLog::default()
            }
            Err(err) => {
                warn!("Ignoring change log at {}: {}", path.display(), err);
                ChangeLog::default()
            }
        }
    }

    /// Loads the change log at `path`.
    ///
    /// # Returns
    /// `Ok(None)` if no file exists at `path`.
    ///
    /// # Errors
    /// [`VoxelError::ChangeLogIo`] or [`VoxelError::ChangeLogFormat`] if the
    /// file exists but cannot be read or parsed.
    pub fn try_load(path: &Path) -> VoxelResult<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(path).map_err(VoxelError::ChangeLogIo)?;
        let change_log = serde_json::from_str(&content).map_err(VoxelError::ChangeLogFormat)?;
        Ok(Some(change_log))
    }

    /// Writes the whole log to `path`, replacing any previous content.
    pub fn save(&self, path: &Path) -> VoxelResult<()> {
        let content = serde_json::to_string_pretty(self).map_err(VoxelError::ChangeLogFormat)?;
        std::fs::write(path, content).map_err(VoxelError::ChangeLogIo)
    }

    /// Builds the persisted form of `records`.
    pub fn from_records(noise_offset: Option<[f32; 2]>, records: &[EditRecord]) -> Self {
        let mut change_log = ChangeLog {
            noise_offset,
            ..ChangeLog::default()
        };

        for record in records {
            let world_position = [record.position.x, record.position.y, record.position.z];
            match record.kind {
                EditKind::Add { biome } => change_log.add_changes.push(AddChange {
                    sequence: record.sequence,
                    world_position,
                    biome_index: biome.0,
                }),
                EditKind::Remove => change_log.remove_changes.push(RemoveChange {
                    sequence: record.sequence,
                    world_position,
                }),
            }
        }

        change_log
    }

    /// Merges both lists back into a single list ordered by sequence number.
    ///
    /// Records with equal sequence numbers keep additions before removals.
    pub fn to_records(&self) -> Vec<EditRecord> {
        let adds = self.add_changes.iter().map(|change| EditRecord {
            sequence: change.sequence,
            position: Point3::from(change.world_position),
            kind: EditKind::Add {
                biome: BiomeId(change.biome_index),
            },
        });
        let removes = self.remove_changes.iter().map(|change| EditRecord {
            sequence: change.sequence,
            position: Point3::from(change.world_position),
            kind: EditKind::Remove,
        });

        let mut records: Vec<EditRecord> = adds.chain(removes).collect();
        records.sort_by_key(|record| record.sequence);
        records
    }

    /// Drops every recorded edit. The noise offset is kept.
    pub fn reset(&mut self) {
        self.add_changes.clear();
        self.remove_changes.clear();
    }

    /// Number of recorded edits.
    pub fn len(&self) -> usize {
        self.add_changes.len() + self.remove_changes.len()
    }

    /// Whether no edits are recorded.
    pub fn is_empty(&self) -> bool {
        self.add_changes.is_empty() && self.remove_changes.is_empty()
    }
}
