//! # Chunk Editing Module
//!
//! Adding and removing single voxels while keeping the mesh buffers, the
//! column height map and the enclosure flags consistent.
//!
//! ## Invariants kept by every edit
//! - each drawn voxel's `mesh_start` points at its own 36-entry block
//! - `column_heights[x, z]` is the highest occupied y of the column
//! - a voxel is enclosed only while all six neighbours are occupied
//!
//! Removing a voxel can expose neighbours in adjacent chunks. Those chunks
//! are owned by the sector, so the removal reports them as
//! [`CrossChunkExposure`]s and the sector applies them with
//! [`Chunk::expose_voxel`].

use cgmath::Point3;

use super::mesh_buffers::VERTICES_PER_VOXEL;
use super::{Chunk, ChunkSide, EMPTY_COLUMN};
use crate::engine_state::voxels::biome::BiomeId;
use crate::engine_state::voxels::voxel::{VoxelIndex, VoxelInfo};

/// A voxel in a neighbouring chunk that may have become exposed.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CrossChunkExposure {
    /// Which neighbour of the edited chunk holds the voxel
    pub side: ChunkSide,
    /// Index of the voxel inside that neighbour
    pub index: VoxelIndex,
}

/// Result of a successful voxel removal.
#[derive(Clone, Debug, PartialEq)]
pub struct RemovedVoxel {
    /// The voxel that was removed
    pub voxel: VoxelInfo,
    /// Neighbour-chunk voxels to expose
    pub cross_chunk: Vec<CrossChunkExposure>,
}

impl Chunk {
    /// Places a voxel in the empty slot containing `world_pos`.
    ///
    /// A placed voxel is always drawn. Neighbours keep their mesh blocks even
    /// if the new voxel covers their last open face.
    ///
    /// # Returns
    /// `true` if the voxel was placed, `false` if the position is outside the
    /// chunk or the slot is already occupied.
    pub fn add_voxel_at_world_pos(&mut self, world_pos: Point3<f32>, biome: BiomeId) -> bool {
        let Some(index) = self.world_pos_to_voxel_index(world_pos) else {
            return false;
        };
        if self.is_voxel_solid(index) {
            return false;
        }

        let mesh_start = self.draw_voxel(index, biome);
        self.insert_voxel(index, biome, false, Some(mesh_start));

        let column = index.x + self.settings.chunk_size * index.z;
        if self.column_heights[column] < index.y as i32 {
            self.column_heights[column] = index.y as i32;
        }

        true
    }

    /// Removes the voxel in the slot containing `world_pos`.
    ///
    /// Voxels on the grid floor (y = 0) are never removed.
    ///
    /// # Returns
    /// The removed voxel and the cross-chunk exposures to apply, or `None` if
    /// nothing was removed.
    pub fn remove_voxel_at_world_pos(&mut self, world_pos: Point3<f32>) -> Option<RemovedVoxel> {
        let index = self.world_pos_to_voxel_index(world_pos)?;
        if index.y == 0 {
            return None;
        }
        let removed = self.voxels.remove(&index)?;
        let offset = self.solid_offset(index);
        self.solid_array.set(offset, false);

        if let Some(start) = removed.mesh_start {
            self.mesh.free_block(start);
            for voxel in self.voxels.values_mut() {
                if let Some(other_start) = voxel.mesh_start.as_mut() {
                    if *other_start > start {
                        *other_start -= VERTICES_PER_VOXEL;
                    }
                }
            }
            self.dirty = true;
        }

        self.rescan_column_height(index);
        let cross_chunk = self.expose_neighbours(index);

        Some(RemovedVoxel {
            voxel: removed,
            cross_chunk,
        })
    }

    /// Draws an enclosed voxel that has lost a neighbour.
    ///
    /// # Returns
    /// `true` if the voxel existed, was enclosed and is now drawn.
    pub fn expose_voxel(&mut self, index: VoxelIndex) -> bool {
        let biome = match self.voxels.get(&index) {
            Some(voxel) if voxel.is_enclosed => voxel.biome,
            _ => return false,
        };

        let mesh_start = self.draw_voxel(index, biome);
        if let Some(voxel) = self.voxels.get_mut(&index) {
            voxel.mesh_start = Some(mesh_start);
            voxel.is_enclosed = false;
        }
        true
    }

    fn rescan_column_height(&mut self, removed: VoxelIndex) {
        let column = removed.x + self.settings.chunk_size * removed.z;
        if self.column_heights[column] != removed.y as i32 {
            return;
        }

        let new_height = (0..removed.y)
            .rev()
            .find(|y| self.is_voxel_solid(Point3::new(removed.x, *y, removed.z)))
            .map_or(EMPTY_COLUMN, |y| y as i32);
        self.column_heights[column] = new_height;
    }

    /// Exposes the six face neighbours of a removed voxel in the order
    /// left, right, back, front, below, above.
    fn expose_neighbours(&mut self, removed: VoxelIndex) -> Vec<CrossChunkExposure> {
        let last = self.settings.chunk_size - 1;
        let Point3 { x, y, z } = removed;
        let mut cross_chunk = Vec::new();

        let lateral = [
            (x == 0, ChunkSide::LEFT, Point3::new(last, y, z), (x.wrapping_sub(1), z)),
            (x == last, ChunkSide::RIGHT, Point3::new(0, y, z), (x + 1, z)),
            (z == 0, ChunkSide::BACK, Point3::new(x, y, last), (x, z.wrapping_sub(1))),
            (z == last, ChunkSide::FRONT, Point3::new(x, y, 0), (x, z + 1)),
        ];

        for (on_edge, side, across_index, (local_x, local_z)) in lateral {
            if on_edge {
                if self.neighbours.get(side).is_some() {
                    cross_chunk.push(CrossChunkExposure {
                        side,
                        index: across_index,
                    });
                }
            } else {
                self.expose_voxel(Point3::new(local_x, y, local_z));
            }
        }

        self.expose_voxel(Point3::new(x, y - 1, z));
        if y + 1 < self.settings.world_height {
            self.expose_voxel(Point3::new(x, y + 1, z));
        }

        cross_chunk
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use cgmath::{Vector2, Vector3};

    use super::*;
    use crate::engine_state::settings::TerrainSettings;
    use crate::engine_state::test_support::{assert_chunk_invariants, flat_chunk, flat_settings};
    use crate::engine_state::voxels::biome::BiomeTable;
    use crate::engine_state::voxels::sector::{HeightField, Sector};

    /// Every enclosed voxel of `sector` has its six neighbours occupied, as far
    /// as they lie inside the sector.
    fn assert_enclosed_voxels_are_covered(sector: &Sector, world_height: f32) {
        let offsets = [
            Vector3::new(-1.0, 0.0, 0.0),
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(0.0, -1.0, 0.0),
            Vector3::new(0.0, 1.0, 0.0),
            Vector3::new(0.0, 0.0, -1.0),
            Vector3::new(0.0, 0.0, 1.0),
        ];
        for chunk in sector.chunks() {
            for (_, voxel) in chunk.voxels().filter(|(_, voxel)| voxel.is_enclosed) {
                let center = voxel.world_position + Vector3::new(0.5, 0.5, 0.5);
                for offset in offsets {
                    let neighbour = center + offset;
                    let inside = sector.bounds().contains_xz(neighbour)
                        && neighbour.y >= 0.0
                        && neighbour.y < world_height;
                    if inside {
                        assert!(
                            sector.voxel_at_world_pos(neighbour).is_some(),
                            "enclosed voxel at {:?} has an empty neighbour",
                            voxel.world_position
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_add_on_top_raises_column() {
        let (settings, biomes) = flat_settings(4, 8, 2);
        let mut chunk = flat_chunk(&settings, &biomes, 2);
        let before = chunk.mesh().len();

        assert!(chunk.add_voxel_at_world_pos(Point3::new(0.5, 3.5, 0.5), BiomeId(1)));

        assert_eq!(chunk.column_height(0, 0), 3);
        assert_eq!(chunk.mesh().len(), before + VERTICES_PER_VOXEL);
        let added = chunk.voxel_at_index(Point3::new(0, 3, 0)).unwrap();
        assert_eq!(added.mesh_start, Some(before));
        assert!(!added.is_enclosed);
        assert_eq!(added.biome, BiomeId(1));
        assert_chunk_invariants(&chunk);
    }

    #[test]
    fn test_add_into_occupied_slot_is_rejected() {
        let (settings, biomes) = flat_settings(4, 8, 2);
        let mut chunk = flat_chunk(&settings, &biomes, 2);
        let before = chunk.mesh().len();

        assert!(!chunk.add_voxel_at_world_pos(Point3::new(1.5, 1.5, 1.5), BiomeId(0)));
        assert_eq!(chunk.mesh().len(), before);
    }

    #[test]
    fn test_add_then_remove_restores_chunk() {
        let (settings, biomes) = flat_settings(4, 8, 2);
        let mut chunk = flat_chunk(&settings, &biomes, 2);
        let mesh_before = chunk.mesh().clone();
        let heights_before = chunk.column_heights().to_vec();
        let position = Point3::new(2.5, 3.5, 1.5);

        chunk.add_voxel_at_world_pos(position, BiomeId(0));
        let removed = chunk.remove_voxel_at_world_pos(position).unwrap();

        assert!(removed.cross_chunk.is_empty());
        assert_eq!(chunk.voxel_at_world_pos(position), None);
        assert_eq!(chunk.column_heights(), heights_before.as_slice());
        assert_eq!(chunk.mesh(), &mesh_before);
        assert_chunk_invariants(&chunk);
    }

    #[test]
    fn test_remove_exposes_enclosed_neighbours() {
        let (settings, biomes) = flat_settings(4, 8, 2);
        let mut chunk = flat_chunk(&settings, &biomes, 2);

        // (1,1,1) is enclosed; removing the surface above it exposes it
        assert!(chunk.voxel_at_index(Point3::new(1, 1, 1)).unwrap().is_enclosed);
        let before = chunk.mesh().len();

        chunk.remove_voxel_at_world_pos(Point3::new(1.5, 2.5, 1.5)).unwrap();

        let exposed = chunk.voxel_at_index(Point3::new(1, 1, 1)).unwrap();
        assert!(!exposed.is_enclosed);
        // one block freed, one block drawn
        assert_eq!(chunk.mesh().len(), before);
        assert_eq!(exposed.mesh_start, Some(before - VERTICES_PER_VOXEL));
        assert_eq!(chunk.column_height(1, 1), 1);
        assert_chunk_invariants(&chunk);
    }

    #[test]
    fn test_remove_inside_column_exposes_all_enclosed_sides() {
        let (settings, biomes) = flat_settings(4, 8, 3);
        let mut chunk = flat_chunk(&settings, &biomes, 3);

        // (1,1,1) is buried: its neighbours at y=1 are enclosed, (1,0,1) too
        let before = chunk.mesh().len();
        chunk.remove_voxel_at_world_pos(Point3::new(1.5, 1.5, 1.5)).unwrap();

        let newly_drawn = [
            Point3::new(0, 1, 1),
            Point3::new(2, 1, 1),
            Point3::new(1, 1, 0),
            Point3::new(1, 1, 2),
            Point3::new(1, 0, 1),
            Point3::new(1, 2, 1),
        ];
        // (0,1,1) and (1,1,0) sit on chunk edges and were already drawn
        let previously_enclosed = [
            Point3::new(2, 1, 1),
            Point3::new(1, 1, 2),
            Point3::new(1, 0, 1),
            Point3::new(1, 2, 1),
        ];
        for index in newly_drawn {
            assert!(!chunk.voxel_at_index(index).unwrap().is_enclosed);
        }
        assert_eq!(
            chunk.mesh().len(),
            before + previously_enclosed.len() * VERTICES_PER_VOXEL
        );
        // the removed voxel was not the top of its column
        assert_eq!(chunk.column_height(1, 1), 3);
        assert_chunk_invariants(&chunk);
    }

    #[test]
    fn test_remove_on_floor_is_noop() {
        let (settings, biomes) = flat_settings(4, 8, 0);
        let mut chunk = flat_chunk(&settings, &biomes, 0);
        let before = chunk.mesh().clone();

        assert_eq!(chunk.remove_voxel_at_world_pos(Point3::new(0.5, 0.5, 0.5)), None);
        assert!(chunk.voxel_at_index(Point3::new(0, 0, 0)).is_some());
        assert_eq!(chunk.mesh(), &before);
    }

    #[test]
    fn test_remove_empty_slot_is_noop() {
        let (settings, biomes) = flat_settings(4, 8, 2);
        let mut chunk = flat_chunk(&settings, &biomes, 2);
        assert_eq!(chunk.remove_voxel_at_world_pos(Point3::new(0.5, 5.5, 0.5)), None);
    }

    #[test]
    fn test_removing_whole_column_leaves_floor() {
        let (settings, biomes) = flat_settings(4, 8, 3);
        let mut chunk = flat_chunk(&settings, &biomes, 3);

        for y in (1..=3).rev() {
            chunk.remove_voxel_at_world_pos(Point3::new(2.5, y as f32 + 0.5, 2.5)).unwrap();
            assert_eq!(chunk.column_height(2, 2), y - 1);
            assert_chunk_invariants(&chunk);
        }
    }

    #[test]
    fn test_edge_removal_reports_linked_neighbours_only() {
        let (settings, biomes) = flat_settings(4, 8, 2);
        let mut chunk = flat_chunk(&settings, &biomes, 2);
        chunk.set_neighbours(super::super::ChunkNeighbours {
            left: Some(0),
            ..Default::default()
        });

        let removed = chunk.remove_voxel_at_world_pos(Point3::new(0.5, 1.5, 0.5)).unwrap();

        assert_eq!(
            removed.cross_chunk,
            vec![CrossChunkExposure {
                side: ChunkSide::LEFT,
                index: Point3::new(3, 1, 0),
            }]
        );
    }

    #[test]
    fn test_random_edit_sequences_keep_invariants() {
        let settings = Rc::new(TerrainSettings {
            chunk_size: 4,
            sector_size: 8,
            world_height: 16,
            sector_generate_threshold: 0.0,
            ..TerrainSettings::default()
        });
        let biomes = Rc::new(BiomeTable::new(settings.biomes.clone()));
        let height_field = HeightField::new(&settings);

        for seed in 0..8u64 {
            let mut rng = fastrand::Rng::with_seed(seed);
            let noise_offset = Vector2::new(rng.f32() * 100.0, rng.f32() * 100.0);
            let mut sector = Sector::generate(
                Point3::new(0.0, 0.0, 0.0),
                noise_offset,
                &height_field,
                settings.clone(),
                biomes.clone(),
            );

            for _ in 0..300 {
                let position = Point3::new(
                    rng.usize(0..8) as f32 + 0.5,
                    rng.usize(0..16) as f32 + 0.5,
                    rng.usize(0..8) as f32 + 0.5,
                );
                if rng.bool() {
                    sector.add_voxel_at_world_pos(position, BiomeId(rng.usize(0..biomes.len())));
                } else {
                    sector.remove_voxel_at_world_pos(position);
                }

                for chunk in sector.chunks() {
                    assert_chunk_invariants(chunk);
                }
            }
            assert_enclosed_voxels_are_covered(&sector, 16.0);
        }
    }
}
