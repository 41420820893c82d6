//! Incremental zone merging.
//!
//! Each time a tile lands on the board its local zones are matched against the
//! neighbors' zones through rotated sub-edges. A local zone that touches
//! nothing opens a new merged zone, one that touches a single zone extends it,
//! and one that bridges several zones fuses them. When several zones meet, the
//! one with the lowest id is kept so every peer replaying the same placements
//! ends up with identical ids.

use crate::board::Board;
use crate::edge::Coord;
use crate::player::{Meeple, MeepleKey, PlacedMeeples};
use crate::tile::{Tile, ZoneType};
use crate::zones::{MergedZone, ZoneError, ZoneId, ZoneMember, ZoneRegistry};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use tracing::{debug, warn};

/// What a placement changed in the registry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneUpdate {
    /// Final zone of each local zone of the placed tile, deduplicated
    pub touched: Vec<ZoneId>,
    /// Zones that were incomplete before this placement and are now complete
    pub newly_completed: Vec<ZoneId>,
}

/// Maintains the zone registry as tiles are placed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneMerger {
    registry: ZoneRegistry,
}

impl ZoneMerger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registry(&self) -> &ZoneRegistry {
        &self.registry
    }

    /// Swap in a registry, e.g. one restored from a snapshot
    pub fn replace_registry(&mut self, registry: ZoneRegistry) {
        self.registry = registry;
    }

    pub fn reset(&mut self) {
        self.registry.clear();
    }

    /// Fold the tile just placed at `coord` into the registry.
    pub fn update_zones_for_new_tile(
        &mut self,
        board: &Board,
        coord: Coord,
    ) -> Result<ZoneUpdate, ZoneError> {
        let Some(tile) = board.get(coord) else {
            warn!(?coord, "no tile to merge at coordinate");
            return Ok(ZoneUpdate::default());
        };

        let complete_before: HashSet<ZoneId> = self
            .registry
            .zones()
            .filter(|z| z.is_complete)
            .map(|z| z.id)
            .collect();

        for index in 0..tile.zones.len() {
            self.process_new_zone(board, coord, tile, index)?;
        }
        self.resolve_adjacent_cities(coord, tile);
        self.update_completion_status(board);

        let mut newly_completed = Vec::new();
        let mut closed = Vec::new();
        for zone in self.registry.zones().filter(|z| z.is_complete) {
            if !complete_before.contains(&zone.id) {
                newly_completed.push(zone.id);
            }
            if zone.zone_type == ZoneType::City {
                closed.push(zone.id);
            }
        }
        for id in closed {
            self.registry.mark_city_as_closed(id);
        }

        let mut touched = Vec::new();
        for index in 0..tile.zones.len() {
            if let Some(id) = self.registry.zone_id_of(coord, index) {
                if !touched.contains(&id) {
                    touched.push(id);
                }
            }
        }

        debug!(
            ?coord,
            tile = %tile.id,
            zones = self.registry.len(),
            completed = newly_completed.len(),
            "zones updated"
        );
        Ok(ZoneUpdate {
            touched,
            newly_completed,
        })
    }

    fn process_new_zone(
        &mut self,
        board: &Board,
        coord: Coord,
        tile: &Tile,
        index: usize,
    ) -> Result<(), ZoneError> {
        let Some(zone) = tile.zone(index) else {
            return Ok(());
        };
        let member = ZoneMember::new(coord, index);
        let adjacent = self.find_adjacent_zones(board, coord, tile, index);

        let target = match adjacent.as_slice() {
            [] => self.registry.create_zone(zone.zone_type).id,
            [only] => *only,
            [primary, others @ ..] => {
                for other in others {
                    let same_tile = self
                        .registry
                        .get(*other)
                        .map_or(false, |z| z.has_member_on(coord));
                    if same_tile {
                        debug!(%other, ?coord, "skipping merge with unconnected zone of the same tile");
                        continue;
                    }
                    self.registry.merge_zones(*primary, *other)?;
                }
                *primary
            }
        };

        self.registry.add_member(target, member)?;
        if zone.has_shield() {
            if let Some(merged) = self.registry.get_mut(target) {
                merged.shields += 1;
            }
        }

        // Siblings on this tile declared as the same feature, in either direction
        for sibling in 0..index {
            let declared = zone.connected_to.contains(&sibling)
                || tile
                    .zone(sibling)
                    .map_or(false, |s| s.connected_to.contains(&index));
            if !declared {
                continue;
            }
            let current = self.registry.zone_id_of(coord, index);
            let other = self.registry.zone_id_of(coord, sibling);
            let (Some(current), Some(other)) = (current, other) else {
                continue;
            };
            if current == other {
                continue;
            }
            let types = (
                self.registry.get(current).map(|z| z.zone_type),
                self.registry.get(other).map(|z| z.zone_type),
            );
            if types.0 != types.1 {
                warn!(tile = %tile.id, index, sibling, "connected zones differ in type, not merging");
                continue;
            }
            self.registry.merge_zones(current.min(other), current.max(other))?;
        }
        Ok(())
    }

    /// Distinct merged zones, in id order, that a local zone touches across
    /// the tile's sides.
    fn find_adjacent_zones(
        &self,
        board: &Board,
        coord: Coord,
        tile: &Tile,
        index: usize,
    ) -> Vec<ZoneId> {
        let Some(zone) = tile.zone(index) else {
            return Vec::new();
        };
        let mut found = BTreeSet::new();

        for edge in tile.rotated_edges(index) {
            let Some(neighbor_coord) = coord.step(edge.side()) else {
                continue;
            };
            let Some(neighbor) = board.get(neighbor_coord) else {
                continue;
            };
            let opposite = edge.opposite();
            for (neighbor_index, neighbor_zone) in neighbor.zones.iter().enumerate() {
                if neighbor_zone.zone_type != zone.zone_type {
                    continue;
                }
                if neighbor.rotated_edges(neighbor_index).contains(&opposite) {
                    if let Some(id) = self.registry.zone_id_of(neighbor_coord, neighbor_index) {
                        found.insert(id);
                    }
                }
            }
        }

        found.into_iter().collect()
    }

    /// Turn the tile's local field-to-city references into merged city ids
    fn resolve_adjacent_cities(&mut self, coord: Coord, tile: &Tile) {
        for (index, zone) in tile.zones.iter().enumerate() {
            if zone.zone_type != ZoneType::Field || zone.features.adjacent_cities.is_empty() {
                continue;
            }
            let Some(field_id) = self.registry.zone_id_of(coord, index) else {
                continue;
            };

            let cities: Vec<ZoneId> = zone
                .features
                .adjacent_cities
                .iter()
                .filter(|&&local| {
                    tile.zone(local)
                        .map_or(false, |z| z.zone_type == ZoneType::City)
                })
                .filter_map(|&local| self.registry.zone_id_of(coord, local))
                .collect();

            if let Some(field) = self.registry.get_mut(field_id) {
                for city in cities {
                    if !field.adjacent_cities.contains(&city) {
                        field.adjacent_cities.push(city);
                    }
                }
            }
        }
    }

    fn update_completion_status(&mut self, board: &Board) {
        let statuses: Vec<(ZoneId, bool)> = self
            .registry
            .zones()
            .map(|zone| (zone.id, Self::is_zone_complete(board, zone)))
            .collect();
        for (id, complete) in statuses {
            if let Some(zone) = self.registry.get_mut(id) {
                zone.is_complete = complete;
            }
        }
    }

    /// Whether a zone is closed on the current board
    pub fn is_zone_complete(board: &Board, zone: &MergedZone) -> bool {
        match zone.zone_type {
            ZoneType::City | ZoneType::Road => Self::edges_closed(board, zone),
            ZoneType::Monastery => zone
                .members
                .first()
                .map_or(false, |m| board.occupied_neighbor_count(m.coord()) == 8),
            ZoneType::Field => false,
        }
    }

    /// Every edge of every member faces a neighbor zone of the same type
    fn edges_closed(board: &Board, zone: &MergedZone) -> bool {
        if zone.members.is_empty() {
            return false;
        }
        for member in &zone.members {
            let coord = member.coord();
            let Some(tile) = board.get(coord) else {
                return false;
            };
            for edge in tile.rotated_edges(member.zone_index) {
                let Some(neighbor) = board.neighbor(coord, edge.side()) else {
                    return false;
                };
                let opposite = edge.opposite();
                let matched = neighbor.zones.iter().enumerate().any(|(i, nz)| {
                    nz.zone_type == zone.zone_type && neighbor.rotated_edges(i).contains(&opposite)
                });
                if !matched {
                    return false;
                }
            }
        }
        true
    }

    /// The merged zone under a meeple anchor of a placed tile
    pub fn find_merged_zone_for_position(
        &self,
        board: &Board,
        coord: Coord,
        position: u8,
    ) -> Option<&MergedZone> {
        let tile = board.get(coord)?;
        let index = tile.zone_at_position(position)?;
        self.registry.find_zone_containing(coord, index)
    }

    /// Meeples standing anywhere in `zone`.
    ///
    /// Anchors are mapped through each member tile's current rotation.
    /// Members on cells that no longer hold a tile are skipped.
    pub fn zone_meeples(
        &self,
        board: &Board,
        zone: &MergedZone,
        meeples: &PlacedMeeples,
    ) -> Vec<(MeepleKey, Meeple)> {
        let mut found = Vec::new();
        for member in &zone.members {
            let coord = member.coord();
            let Some(tile) = board.get(coord) else {
                warn!(zone = %zone.id, ?coord, "stale zone member");
                continue;
            };
            for position in tile.rotated_meeple_positions(member.zone_index) {
                let key = MeepleKey::new(coord, position);
                if let Some(meeple) = meeples.get(&key) {
                    found.push((key, *meeple));
                }
            }
        }
        found
    }
}
