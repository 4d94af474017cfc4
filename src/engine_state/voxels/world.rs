//! # World Module
//!
//! This module provides the `World` struct which keeps a square window of
//! sectors resident around the player and dispatches every query and edit to
//! the right sector.
//!
//! ## Slot Table
//!
//! Sectors live in a fixed `max_sector_rows_columns²` table of slots. The slot
//! in the middle of the table holds the sector whose origin is the world
//! origin, and every other slot maps to the sector one sector size further
//! along x or z. Each slot also keeps the edits recorded for its footprint,
//! whether or not its sector is currently resident.
//!
//! ## Streaming
//!
//! Every tick, the tracked current sector follows the player by at most one
//! slot per axis. Once the player is far enough inside a sector that is not
//! the window middle, the window moves one slot along that axis:
//! 1. the stripe of sectors beyond the leading edge is generated
//! 2. the edits recorded for that stripe are replayed into it
//! 3. the stripe at the trailing edge is dropped
//!
//! The x and z axes are handled independently, so a diagonal walk can move
//! the window along both in the same tick.
//!
//! ## Queries
//!
//! Positions outside the resident window are never generated on demand. Point
//! queries return `None` and edits return `false` for them.

use std::rc::Rc;

use cgmath::{Point3, Vector2};
use log::{debug, info, warn};

use crate::core::Ray;
use crate::engine_state::error::{VoxelError, VoxelResult};
use crate::engine_state::settings::TerrainSettings;

use super::biome::{BiomeDescriptor, BiomeId, BiomeTable};
use super::change_log::{ChangeLog, EditKind, EditRecord};
use super::chunk::VoxelHit;
use super::sector::{HeightField, Sector};
use super::voxel::VoxelInfo;

/// Upper bound of a randomly drawn noise offset component.
const NOISE_OFFSET_RANGE: f32 = 1000.0;

/// Position of a slot in the sector slot table.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct SlotIndex {
    /// Column of the slot (world x)
    pub x: usize,
    /// Row of the slot (world z)
    pub z: usize,
}

impl SlotIndex {
    /// Creates a slot index.
    pub fn new(x: usize, z: usize) -> Self {
        SlotIndex { x, z }
    }
}

/// Notifications for layers outside the terrain core (rendering, UI).
#[derive(Clone, Debug, PartialEq)]
pub enum WorldEvent {
    /// A sector was generated into a slot
    SectorGenerated {
        /// Slot of the new sector
        slot: SlotIndex,
    },
    /// A sector was dropped from a slot
    SectorEvicted {
        /// Slot of the dropped sector
        slot: SlotIndex,
    },
    /// A voxel was placed by a live edit
    VoxelAdded {
        /// World position of the placed voxel
        position: Point3<f32>,
        /// Biome of the placed voxel
        biome: BiomeId,
    },
    /// A voxel was removed by a live edit
    VoxelRemoved {
        /// World position of the removed voxel
        position: Point3<f32>,
    },
    /// The change log was written
    ChangesSaved {
        /// Number of edits written
        edit_count: usize,
    },
}

#[derive(Copy, Clone, Debug)]
enum Axis {
    X,
    Z,
}

impl Axis {
    /// Splits a slot into its coordinate along this axis and across it.
    fn split(self, slot: SlotIndex) -> (usize, usize) {
        match self {
            Axis::X => (slot.x, slot.z),
            Axis::Z => (slot.z, slot.x),
        }
    }

    fn join(self, along: usize, across: usize) -> SlotIndex {
        match self {
            Axis::X => SlotIndex::new(along, across),
            Axis::Z => SlotIndex::new(across, along),
        }
    }
}

#[derive(Default)]
struct SectorSlot {
    sector: Option<Sector>,
    /// Edits whose position falls in this slot, in recorded order
    pending: Vec<EditRecord>,
}

/// The streaming sector cache.
pub struct World {
    slots: Vec<SectorSlot>,
    slots_per_side: usize,
    /// Slot holding the sector at the world origin
    origin_slot: usize,
    middle: SlotIndex,
    current: SlotIndex,
    noise_offset: Vector2<f32>,
    next_sequence: u64,
    height_field: HeightField,
    events: Vec<WorldEvent>,
    settings: Rc<TerrainSettings>,
    biomes: Rc<BiomeTable>,
}

impl World {
    /// Creates the world, generates the initial window around the world
    /// origin and replays the edits of `change_log` into it.
    ///
    /// The noise offset is taken from the change log, or drawn at random when
    /// the log has none (first run).
    ///
    /// # Errors
    /// [`VoxelError::InvalidSettings`] if `settings` fail validation.
    pub fn new(
        settings: Rc<TerrainSettings>,
        biomes: Rc<BiomeTable>,
        change_log: &ChangeLog,
    ) -> VoxelResult<Self> {
        settings.validate()?;

        let noise_offset = match change_log.noise_offset {
            Some(offset) => Vector2::from(offset),
            None => Vector2::new(
                fastrand::f32() * NOISE_OFFSET_RANGE,
                fastrand::f32() * NOISE_OFFSET_RANGE,
            ),
        };
        debug!("World noise offset: {:?}", noise_offset);

        let slots_per_side = settings.max_sector_rows_columns;
        let origin_slot = slots_per_side / 2;
        let middle = SlotIndex::new(origin_slot, origin_slot);

        let mut world = World {
            slots: (0..slots_per_side * slots_per_side)
                .map(|_| SectorSlot::default())
                .collect(),
            slots_per_side,
            origin_slot,
            middle,
            current: middle,
            noise_offset,
            next_sequence: 0,
            height_field: HeightField::new(&settings),
            events: Vec::new(),
            settings,
            biomes,
        };

        world.queue_records(change_log.to_records());

        let window = world.window_slots();
        for slot in &window {
            world.generate_slot(*slot);
        }
        for slot in &window {
            world.replay_slot(*slot);
        }
        info!("Generated initial window of {} sectors", window.len());

        Ok(world)
    }

    fn queue_records(&mut self, records: Vec<EditRecord>) {
        for record in records {
            self.next_sequence = self.next_sequence.max(record.sequence + 1);
            match self.slot_index_at_world_pos(record.position) {
                Some(slot) => {
                    let index = self.slot_offset(slot);
                    self.slots[index].pending.push(record);
                }
                None => warn!(
                    "Dropping edit at {:?}: outside the sector slot table",
                    record.position
                ),
            }
        }
    }

    /// Advances the streaming state for the player's current position.
    pub fn tick(&mut self, player_position: Point3<f32>) {
        let Some(target) = self.slot_index_at_world_pos(player_position) else {
            warn!("Player at {:?} is outside the sector slot table", player_position);
            return;
        };

        let half = self.settings.half_window();
        self.current = SlotIndex::new(
            Self::step_toward(self.current.x, target.x, self.middle.x, half),
            Self::step_toward(self.current.z, target.z, self.middle.z, half),
        );

        let threshold = self.settings.sector_generate_threshold;
        let current_origin = self.slot_origin(self.current);
        let sector_size_ws = self.settings.sector_size_ws();

        for (axis, player, origin) in [
            (Axis::X, player_position.x, current_origin.x),
            (Axis::Z, player_position.z, current_origin.z),
        ] {
            let (current, _) = axis.split(self.current);
            let (middle, _) = axis.split(self.middle);
            if current == middle {
                continue;
            }

            let forward = current > middle;
            // distance walked into the current sector from the edge shared
            // with the middle sector
            let depth = if forward {
                player - origin
            } else {
                origin + sector_size_ws - player
            };
            if depth >= threshold {
                self.advance(axis, forward);
            }
        }
    }

    /// Moves `current` one slot towards `target`, staying inside the window.
    fn step_toward(current: usize, target: usize, middle: usize, half: usize) -> usize {
        let next = match target.cmp(&current) {
            std::cmp::Ordering::Greater => current + 1,
            std::cmp::Ordering::Less => current - 1,
            std::cmp::Ordering::Equal => current,
        };
        if next.abs_diff(middle) <= half {
            next
        } else {
            current
        }
    }

    fn advance(&mut self, axis: Axis, forward: bool) {
        let half = self.settings.half_window();
        let (middle_along, middle_across) = axis.split(self.middle);

        let leading = if forward {
            Some(middle_along + half + 1).filter(|leading| *leading < self.slots_per_side)
        } else {
            middle_along.checked_sub(half + 1)
        };
        let Some(leading) = leading else {
            warn!(
                "Cannot move window along {:?} past slot {}: end of sector slot table",
                axis, middle_along
            );
            return;
        };
        let (trailing, new_middle) = if forward {
            (middle_along - half, middle_along + 1)
        } else {
            (middle_along + half, middle_along - 1)
        };

        let stripe = middle_across - half..=middle_across + half;
        for across in stripe.clone() {
            self.generate_slot(axis.join(leading, across));
        }
        for across in stripe.clone() {
            self.replay_slot(axis.join(leading, across));
        }
        for across in stripe {
            self.dispose_slot(axis.join(trailing, across));
        }

        self.middle = axis.join(new_middle, middle_across);
        info!(
            "Window moved along {:?}: middle slot is now ({}, {})",
            axis, self.middle.x, self.middle.z
        );
    }

    /// Builds the sector of `slot`. Recorded edits are not applied.
    fn generate_slot(&mut self, slot: SlotIndex) {
        let sector = Sector::generate(
            self.slot_origin(slot),
            self.noise_offset,
            &self.height_field,
            self.settings.clone(),
            self.biomes.clone(),
        );
        let index = self.slot_offset(slot);
        self.slots[index].sector = Some(sector);
        self.events.push(WorldEvent::SectorGenerated { slot });
    }

    /// Applies the recorded edits of `slot` to its resident sector.
    fn replay_slot(&mut self, slot: SlotIndex) {
        let index = self.slot_offset(slot);
        let biomes = self.biomes.clone();
        let SectorSlot { sector, pending } = &mut self.slots[index];
        let Some(sector) = sector else {
            return;
        };

        let mut applied = 0;
        for record in pending.iter() {
            let changed = match record.kind {
                EditKind::Add { biome } if biomes.get(biome).is_some() => {
                    sector.add_voxel_at_world_pos(record.position, biome)
                }
                EditKind::Add { biome } => {
                    warn!("Skipping recorded edit with unknown biome {}", biome.0);
                    false
                }
                EditKind::Remove => sector.remove_voxel_at_world_pos(record.position).is_some(),
            };
            if changed {
                applied += 1;
            }
        }

        if !pending.is_empty() {
            debug!(
                "Replayed {}/{} edits into slot ({}, {})",
                applied,
                pending.len(),
                slot.x,
                slot.z
            );
        }
    }

    fn dispose_slot(&mut self, slot: SlotIndex) {
        let index = self.slot_offset(slot);
        if self.slots[index].sector.take().is_some() {
            self.events.push(WorldEvent::SectorEvicted { slot });
        }
    }

    fn slot_offset(&self, slot: SlotIndex) -> usize {
        slot.x + self.slots_per_side * slot.z
    }

    /// World position of the minimum corner of the sector in `slot`.
    pub fn slot_origin(&self, slot: SlotIndex) -> Point3<f32> {
        let sector_size_ws = self.settings.sector_size_ws();
        Point3::new(
            (slot.x as f32 - self.origin_slot as f32) * sector_size_ws,
            0.0,
            (slot.z as f32 - self.origin_slot as f32) * sector_size_ws,
        )
    }

    /// The slot whose footprint contains `world_pos`, resident or not.
    pub fn slot_index_at_world_pos(&self, world_pos: Point3<f32>) -> Option<SlotIndex> {
        let sector_size_ws = self.settings.sector_size_ws();
        let x = (world_pos.x / sector_size_ws).floor() + self.origin_slot as f32;
        let z = (world_pos.z / sector_size_ws).floor() + self.origin_slot as f32;

        let limit = self.slots_per_side as f32;
        if x < 0.0 || z < 0.0 || x >= limit || z >= limit {
            return None;
        }
        Some(SlotIndex::new(x as usize, z as usize))
    }

    /// Slots of the resident window, row by row.
    fn window_slots(&self) -> Vec<SlotIndex> {
        let half = self.settings.half_window();
        let mut slots = Vec::with_capacity(self.settings.window_span * self.settings.window_span);
        for z in self.middle.z - half..=self.middle.z + half {
            for x in self.middle.x - half..=self.middle.x + half {
                slots.push(SlotIndex::new(x, z));
            }
        }
        slots
    }

    /// The resident sector containing `world_pos`.
    fn resident_slot_at_world_pos(&self, world_pos: Point3<f32>) -> Option<SlotIndex> {
        let found = self.window_slots().into_iter().find(|slot| {
            self.sector_at_slot(*slot)
                .is_some_and(|sector| sector.bounds().contains_xz(world_pos))
        });
        if found.is_none() {
            debug!("Query at {:?} is outside the resident window", world_pos);
        }
        found
    }

    /// The voxel containing `world_pos`.
    ///
    /// # Returns
    /// `None` for empty slots and for positions outside the resident window.
    pub fn get_voxel_at_world_pos(&self, world_pos: Point3<f32>) -> Option<&VoxelInfo> {
        let slot = self.resident_slot_at_world_pos(world_pos)?;
        self.sector_at_slot(slot)?.voxel_at_world_pos(world_pos)
    }

    /// World-space height of the top face of the column containing
    /// `world_pos`.
    ///
    /// # Returns
    /// `None` for positions outside the resident window.
    pub fn get_column_top_height(&self, world_pos: Point3<f32>) -> Option<f32> {
        let slot = self.resident_slot_at_world_pos(world_pos)?;
        let height = self
            .sector_at_slot(slot)?
            .column_height_at_world_pos(world_pos)?;
        let voxel_size = self.settings.voxel_size;
        Some(height as f32 * voxel_size + voxel_size)
    }

    /// Finds the first voxel struck by `ray` in the resident window.
    ///
    /// Sectors are tried in order of ray entry distance, except that the
    /// sector of the current slot goes first when the ray touches it.
    ///
    /// # Arguments
    /// * `ray` - The ray to cast
    /// * `max_distance` - Hits farther than this are ignored; `None` for no limit
    ///
    /// # Errors
    /// [`VoxelError::FaceClassification`] if a hit could not be resolved to a face.
    pub fn get_voxel_ray_intersection(
        &self,
        ray: &Ray,
        max_distance: Option<f32>,
    ) -> VoxelResult<Option<VoxelHit>> {
        let max_distance = max_distance.unwrap_or(f32::MAX);

        let mut candidates: Vec<(f32, SlotIndex)> = self
            .window_slots()
            .into_iter()
            .filter_map(|slot| {
                self.sector_at_slot(slot)?
                    .bounds()
                    .intersect_ray(ray)
                    .filter(|distance| *distance <= max_distance)
                    .map(|distance| (distance, slot))
            })
            .collect();
        candidates.sort_by(|a, b| a.0.total_cmp(&b.0));

        if let Some(position) = candidates.iter().position(|(_, slot)| *slot == self.current) {
            let current = candidates.remove(position);
            candidates.insert(0, current);
        }

        for (_, slot) in candidates {
            let Some(sector) = self.sector_at_slot(slot) else {
                continue;
            };
            if let Some(hit) = sector.get_ray_hit(ray, max_distance)? {
                return Ok(Some(hit));
            }
        }

        Ok(None)
    }

    /// Places a voxel of `biome` in the empty slot containing `world_pos` and
    /// records the edit.
    ///
    /// # Returns
    /// `Ok(false)` if the position is outside the resident window or the slot
    /// is occupied.
    ///
    /// # Errors
    /// [`VoxelError::UnknownBiome`] if `biome` is not in the biome table.
    pub fn add_voxel_to_world_pos(&mut self, world_pos: Point3<f32>, biome: BiomeId) -> VoxelResult<bool> {
        if self.biomes.get(biome).is_none() {
            return Err(VoxelError::UnknownBiome(biome.0));
        }
        let Some(slot) = self.resident_slot_at_world_pos(world_pos) else {
            return Ok(false);
        };

        let index = self.slot_offset(slot);
        let added = self.slots[index]
            .sector
            .as_mut()
            .is_some_and(|sector| sector.add_voxel_at_world_pos(world_pos, biome));

        if added {
            self.record(slot, world_pos, EditKind::Add { biome });
            self.events.push(WorldEvent::VoxelAdded {
                position: world_pos,
                biome,
            });
        }
        Ok(added)
    }

    /// Removes the voxel containing `world_pos` and records the edit.
    ///
    /// # Returns
    /// `false` if nothing was removed: the position is outside the resident
    /// window, the slot is empty, or the voxel is on the grid floor.
    pub fn remove_voxel_on_world_pos(&mut self, world_pos: Point3<f32>) -> bool {
        let Some(slot) = self.resident_slot_at_world_pos(world_pos) else {
            return false;
        };

        let index = self.slot_offset(slot);
        let removed = self.slots[index]
            .sector
            .as_mut()
            .and_then(|sector| sector.remove_voxel_at_world_pos(world_pos));

        match removed {
            Some(voxel) => {
                self.record(slot, world_pos, EditKind::Remove);
                self.events.push(WorldEvent::VoxelRemoved {
                    position: voxel.world_position,
                });
                true
            }
            None => false,
        }
    }

    fn record(&mut self, slot: SlotIndex, position: Point3<f32>, kind: EditKind) {
        let record = EditRecord {
            sequence: self.next_sequence,
            position,
            kind,
        };
        self.next_sequence += 1;
        let index = self.slot_offset(slot);
        self.slots[index].pending.push(record);
    }

    /// Builds the persisted form of every recorded edit.
    pub fn to_change_log(&self) -> ChangeLog {
        let mut records: Vec<EditRecord> = self
            .slots
            .iter()
            .flat_map(|slot| slot.pending.iter().copied())
            .collect();
        records.sort_by_key(|record| record.sequence);
        ChangeLog::from_records(Some(self.noise_offset.into()), &records)
    }

    /// Forgets every recorded edit and regenerates the resident window
    /// without them.
    ///
    /// Each resident sector is reported as evicted and then generated again.
    pub fn reset_changes(&mut self) {
        for slot in self.slots.iter_mut() {
            slot.pending.clear();
        }
        for slot in self.window_slots() {
            self.dispose_slot(slot);
            self.generate_slot(slot);
        }
        info!("Discarded all recorded edits");
    }

    /// Number of edits recorded across all slots.
    pub fn recorded_edit_count(&self) -> usize {
        self.slots.iter().map(|slot| slot.pending.len()).sum()
    }

    /// Slots that currently hold a sector.
    pub fn resident_slots(&self) -> Vec<SlotIndex> {
        self.window_slots()
            .into_iter()
            .filter(|slot| self.sector_at_slot(*slot).is_some())
            .collect()
    }

    /// The sector in `slot`, if resident.
    pub fn sector_at_slot(&self, slot: SlotIndex) -> Option<&Sector> {
        if slot.x >= self.slots_per_side || slot.z >= self.slots_per_side {
            return None;
        }
        self.slots[self.slot_offset(slot)].sector.as_ref()
    }

    /// Mutable access to the sector in `slot`, used by the renderer to clear
    /// dirty flags.
    pub fn sector_at_slot_mut(&mut self, slot: SlotIndex) -> Option<&mut Sector> {
        if slot.x >= self.slots_per_side || slot.z >= self.slots_per_side {
            return None;
        }
        let index = self.slot_offset(slot);
        self.slots[index].sector.as_mut()
    }

    /// Center slot of the resident window.
    pub fn middle_slot(&self) -> SlotIndex {
        self.middle
    }

    /// Slot the player was last seen in.
    pub fn current_slot(&self) -> SlotIndex {
        self.current
    }

    /// Noise offset shared by every sector of this world.
    pub fn noise_offset(&self) -> Vector2<f32> {
        self.noise_offset
    }

    /// A position above the center of the window middle sector.
    pub fn spawn_position(&self) -> Point3<f32> {
        let origin = self.slot_origin(self.middle);
        let half_sector = self.settings.sector_size_ws() * 0.5;
        Point3::new(
            origin.x + half_sector,
            self.settings.world_height_ws(),
            origin.z + half_sector,
        )
    }

    /// Looks up the descriptor of a biome.
    pub fn biome(&self, id: BiomeId) -> Option<&BiomeDescriptor> {
        self.biomes.get(id)
    }

    /// Queues an event for the outer layers.
    pub(crate) fn push_event(&mut self, event: WorldEvent) {
        self.events.push(event);
    }

    /// Takes every event queued since the last call.
    pub fn drain_events(&mut self) -> Vec<WorldEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use cgmath::Vector3;

    use super::*;
    use crate::engine_state::test_support::{world_settings, ChunkSnapshot};
    use crate::engine_state::voxels::voxel::voxel_side::VoxelSide;

    fn new_world(threshold: f32) -> World {
        let (settings, biomes) = world_settings(threshold);
        World::new(settings, biomes, &ChangeLog::default()).unwrap()
    }

    /// Ticks the world at every half unit along the x/z segment `from -> to`.
    fn walk(world: &mut World, from: (f32, f32), to: (f32, f32)) {
        let steps = ((to.0 - from.0).abs().max((to.1 - from.1).abs()) * 2.0).ceil() as usize;
        for step in 0..=steps {
            let t = if steps == 0 { 1.0 } else { step as f32 / steps as f32 };
            let x = from.0 + (to.0 - from.0) * t;
            let z = from.1 + (to.1 - from.1) * t;
            world.tick(Point3::new(x, 10.0, z));
        }
    }

    fn expected_window(middle: SlotIndex) -> HashSet<SlotIndex> {
        let mut slots = HashSet::new();
        for z in middle.z - 1..=middle.z + 1 {
            for x in middle.x - 1..=middle.x + 1 {
                slots.insert(SlotIndex::new(x, z));
            }
        }
        slots
    }

    fn snapshot(world: &World, slot: SlotIndex) -> Vec<ChunkSnapshot> {
        world
            .sector_at_slot(slot)
            .unwrap()
            .chunks()
            .iter()
            .map(ChunkSnapshot::of)
            .collect()
    }

    #[test]
    fn test_initial_window_surrounds_origin() {
        let world = new_world(0.0);

        assert_eq!(world.middle_slot(), SlotIndex::new(4, 4));
        assert_eq!(world.current_slot(), SlotIndex::new(4, 4));
        let resident: HashSet<SlotIndex> = world.resident_slots().into_iter().collect();
        assert_eq!(resident, expected_window(SlotIndex::new(4, 4)));
        assert_eq!(world.slot_origin(SlotIndex::new(5, 3)), Point3::new(8.0, 0.0, -8.0));
        assert_eq!(world.spawn_position(), Point3::new(4.0, 8.0, 4.0));
    }

    #[test]
    fn test_window_waits_for_threshold() {
        let mut world = new_world(2.0);
        world.drain_events();

        world.tick(Point3::new(9.0, 10.0, 4.0));
        assert_eq!(world.current_slot(), SlotIndex::new(5, 4));
        assert_eq!(world.middle_slot(), SlotIndex::new(4, 4));
        assert!(world.drain_events().is_empty());

        world.tick(Point3::new(10.5, 10.0, 4.0));
        assert_eq!(world.middle_slot(), SlotIndex::new(5, 4));
        let resident: HashSet<SlotIndex> = world.resident_slots().into_iter().collect();
        assert_eq!(resident, expected_window(SlotIndex::new(5, 4)));

        let events = world.drain_events();
        let generated = events
            .iter()
            .filter(|event| matches!(event, WorldEvent::SectorGenerated { slot } if slot.x == 6))
            .count();
        let evicted = events
            .iter()
            .filter(|event| matches!(event, WorldEvent::SectorEvicted { slot } if slot.x == 3))
            .count();
        assert_eq!((generated, evicted), (3, 3));
    }

    #[test]
    fn test_window_follows_player_on_any_path() {
        let mut world = new_world(0.0);
        let path = [(4.0, 4.0), (30.0, 4.0), (30.0, 20.0), (-20.0, -12.0), (4.0, -20.0), (4.0, 4.0)];

        for leg in path.windows(2) {
            let steps = 40;
            for step in 0..=steps {
                let t = step as f32 / steps as f32;
                let x = leg[0].0 + (leg[1].0 - leg[0].0) * t;
                let z = leg[0].1 + (leg[1].1 - leg[0].1) * t;
                world.tick(Point3::new(x, 10.0, z));

                let player_slot = world.slot_index_at_world_pos(Point3::new(x, 0.0, z)).unwrap();
                assert_eq!(world.current_slot(), player_slot);
                assert_eq!(world.middle_slot(), player_slot);
                let resident: HashSet<SlotIndex> = world.resident_slots().into_iter().collect();
                assert_eq!(resident, expected_window(player_slot));
            }
        }
    }

    #[test]
    fn test_window_stops_at_slot_table_edge() {
        let mut world = new_world(0.0);
        walk(&mut world, (4.0, 4.0), (-30.0, 4.0));

        assert_eq!(world.middle_slot(), SlotIndex::new(1, 4));
        assert_eq!(world.current_slot(), SlotIndex::new(0, 4));
        assert_eq!(world.resident_slots().len(), 9);
    }

    #[test]
    fn test_out_of_window_queries_return_nothing() {
        let mut world = new_world(0.0);
        let far = Point3::new(100.5, 1.5, 100.5);

        assert!(world.get_voxel_at_world_pos(far).is_none());
        assert!(world.get_column_top_height(far).is_none());
        assert!(!world.remove_voxel_on_world_pos(far));
        assert!(!world.add_voxel_to_world_pos(far, BiomeId(0)).unwrap());
        assert_eq!(world.recorded_edit_count(), 0);
    }

    #[test]
    fn test_point_queries() {
        let world = new_world(0.0);

        let voxel = world.get_voxel_at_world_pos(Point3::new(-3.5, 2.5, 9.5)).unwrap();
        assert_eq!(voxel.world_position, Point3::new(-4.0, 2.0, 9.0));
        assert_eq!(world.get_column_top_height(Point3::new(1.5, 0.0, 1.5)), Some(3.0));
    }

    #[test]
    fn test_edits_are_recorded_once_applied() {
        let mut world = new_world(0.0);
        world.drain_events();
        let position = Point3::new(1.5, 2.5, 1.5);

        assert!(world.remove_voxel_on_world_pos(position));
        assert!(!world.remove_voxel_on_world_pos(position));
        assert!(!world.remove_voxel_on_world_pos(Point3::new(1.5, 0.5, 6.5)));
        assert!(world.add_voxel_to_world_pos(position, BiomeId(2)).unwrap());
        assert!(!world.add_voxel_to_world_pos(position, BiomeId(2)).unwrap());

        let change_log = world.to_change_log();
        assert_eq!(change_log.remove_changes.len(), 1);
        assert_eq!(change_log.add_changes.len(), 1);
        assert!(change_log.remove_changes[0].sequence < change_log.add_changes[0].sequence);
        assert_eq!(world.drain_events().len(), 2);
    }

    #[test]
    fn test_unknown_biome_is_rejected() {
        let mut world = new_world(0.0);
        assert!(matches!(
            world.add_voxel_to_world_pos(Point3::new(1.5, 3.5, 1.5), BiomeId(99)),
            Err(VoxelError::UnknownBiome(99))
        ));
    }

    #[test]
    fn test_replayed_sector_matches_live_edits() {
        let mut world = new_world(0.0);
        let edited = SlotIndex::new(5, 4);

        assert!(world.remove_voxel_on_world_pos(Point3::new(11.5, 2.5, 3.5)));
        assert!(world.remove_voxel_on_world_pos(Point3::new(11.5, 1.5, 3.5)));
        assert!(world.remove_voxel_on_world_pos(Point3::new(12.5, 2.5, 3.5)));
        assert!(world.add_voxel_to_world_pos(Point3::new(9.5, 3.5, 6.5), BiomeId(1)).unwrap());
        assert!(world.add_voxel_to_world_pos(Point3::new(9.5, 4.5, 6.5), BiomeId(3)).unwrap());
        assert!(world.remove_voxel_on_world_pos(Point3::new(9.5, 3.5, 6.5)));
        let live = snapshot(&world, edited);

        // walk away until the edited sector is evicted, then come back
        walk(&mut world, (4.0, 4.0), (-4.0, 4.0));
        assert!(world.sector_at_slot(edited).is_none());
        walk(&mut world, (-4.0, 4.0), (4.0, 4.0));
        assert!(world.sector_at_slot(edited).is_some());

        assert_eq!(snapshot(&world, edited), live);
    }

    #[test]
    fn test_change_log_restores_world() {
        let (settings, biomes) = world_settings(0.0);
        let mut world = World::new(settings.clone(), biomes.clone(), &ChangeLog::default()).unwrap();
        world.remove_voxel_on_world_pos(Point3::new(-2.5, 2.5, -6.5));
        world.add_voxel_to_world_pos(Point3::new(3.5, 3.5, 3.5), BiomeId(4)).unwrap();
        let change_log = world.to_change_log();

        let restored = World::new(settings, biomes, &change_log).unwrap();

        assert_eq!(restored.noise_offset(), world.noise_offset());
        assert!(restored.get_voxel_at_world_pos(Point3::new(-2.5, 2.5, -6.5)).is_none());
        let added = restored.get_voxel_at_world_pos(Point3::new(3.5, 3.5, 3.5)).unwrap();
        assert_eq!(added.biome, BiomeId(4));
        assert_eq!(restored.to_change_log(), change_log);
        let origin = SlotIndex::new(4, 4);
        assert_eq!(snapshot(&restored, origin), snapshot(&world, origin));
    }

    #[test]
    fn test_reset_discards_edits() {
        let mut world = new_world(0.0);
        let position = Point3::new(1.5, 2.5, 1.5);
        world.remove_voxel_on_world_pos(position);
        world.drain_events();

        world.reset_changes();

        assert_eq!(world.recorded_edit_count(), 0);
        assert!(world.get_voxel_at_world_pos(position).is_some());
        assert!(world.to_change_log().is_empty());

        // every regenerated sector is evicted first, so event counts balance
        let events = world.drain_events();
        assert_eq!(events.len(), 18);
        for pair in events.chunks(2) {
            match pair {
                [WorldEvent::SectorEvicted { slot: evicted }, WorldEvent::SectorGenerated { slot: generated }] => {
                    assert_eq!(evicted, generated)
                }
                _ => panic!("unexpected events {:?}", pair),
            }
        }
    }

    #[test]
    fn test_ray_query_hits_surface_below() {
        let world = new_world(0.0);
        let ray = Ray::new(Point3::new(9.5, 10.0, 1.5), Vector3::new(0.0, -1.0, 0.0));

        let hit = world.get_voxel_ray_intersection(&ray, None).unwrap().unwrap();
        assert_eq!(hit.voxel.world_position, Point3::new(9.0, 2.0, 1.0));
        assert_eq!(hit.side, VoxelSide::TOP);

        assert!(world.get_voxel_ray_intersection(&ray, Some(3.0)).unwrap().is_none());
    }

    #[test]
    fn test_ray_query_crosses_sectors() {
        let world = new_world(0.0);
        // starts above the middle sector, travels into the +x neighbour
        let ray = Ray::new(Point3::new(6.5, 3.5, 1.5), Vector3::new(1.0, -0.25, 0.0));

        let hit = world.get_voxel_ray_intersection(&ray, None).unwrap().unwrap();
        assert_eq!(hit.side, VoxelSide::TOP);
        assert!(hit.voxel.world_position.x >= 8.0);
    }

    #[test]
    fn test_noise_offset_comes_from_change_log() {
        let (settings, biomes) = world_settings(0.0);
        let change_log = ChangeLog {
            noise_offset: Some([12.0, 34.0]),
            ..ChangeLog::default()
        };
        let world = World::new(settings.clone(), biomes.clone(), &change_log).unwrap();
        assert_eq!(world.noise_offset(), Vector2::new(12.0, 34.0));

        let random = World::new(settings, biomes, &ChangeLog::default()).unwrap();
        let offset = random.noise_offset();
        assert!((0.0..NOISE_OFFSET_RANGE).contains(&offset.x));
        assert!((0.0..NOISE_OFFSET_RANGE).contains(&offset.y));
    }
}
