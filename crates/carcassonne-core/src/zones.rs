//! Registry of merged zones.
//!
//! A merged zone is one contiguous feature (a city, road, field or monastery)
//! that may span many tiles. Each member points at a local zone of a placed
//! tile. The registry keeps a `(coord, local index) -> zone` index alongside
//! the records so membership lookups never scan.

use crate::board::Board;
use crate::edge::Coord;
use crate::tile::ZoneType;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use thiserror::Error;
use tracing::debug;

/// Identifier of a merged zone, allocated monotonically per registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ZoneId(pub u32);

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "zone_{}", self.0)
    }
}

/// Reference to one local zone of a placed tile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneMember {
    pub x: i32,
    pub y: i32,
    pub zone_index: usize,
}

impl ZoneMember {
    pub fn new(coord: Coord, zone_index: usize) -> Self {
        Self {
            x: coord.x,
            y: coord.y,
            zone_index,
        }
    }

    pub fn coord(&self) -> Coord {
        Coord::new(self.x, self.y)
    }
}

/// A contiguous feature tracked across tiles
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergedZone {
    pub id: ZoneId,
    #[serde(rename = "type")]
    pub zone_type: ZoneType,
    pub members: Vec<ZoneMember>,
    pub shields: u32,
    pub is_complete: bool,
    /// Fields only: ids of city zones this field touches
    #[serde(default)]
    pub adjacent_cities: Vec<ZoneId>,
}

impl MergedZone {
    fn new(id: ZoneId, zone_type: ZoneType) -> Self {
        Self {
            id,
            zone_type,
            members: Vec::new(),
            shields: 0,
            is_complete: false,
            adjacent_cities: Vec::new(),
        }
    }

    /// Number of distinct tiles contributing to this zone.
    ///
    /// A single tile may contribute several members to the same zone.
    pub fn tile_count(&self) -> usize {
        let mut coords: Vec<Coord> = self.members.iter().map(ZoneMember::coord).collect();
        coords.sort();
        coords.dedup();
        coords.len()
    }

    pub fn has_member_on(&self, coord: Coord) -> bool {
        self.members.iter().any(|m| m.coord() == coord)
    }
}

/// Invariant violations when manipulating the registry
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum ZoneError {
    #[error("Unknown zone {0}")]
    UnknownZone(ZoneId),

    #[error("Cannot merge {kept} ({kept_type:?}) with {merged} ({merged_type:?})")]
    TypeMismatch {
        kept: ZoneId,
        kept_type: ZoneType,
        merged: ZoneId,
        merged_type: ZoneType,
    },
}

/// Store of all merged zones of a game
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RegistryJson", into = "RegistryJson")]
pub struct ZoneRegistry {
    zones: BTreeMap<ZoneId, MergedZone>,
    member_index: HashMap<ZoneMember, ZoneId>,
    closed_cities: Vec<ZoneId>,
    next_id: u32,
}

impl ZoneRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    /// Allocate an empty, incomplete zone
    pub fn create_zone(&mut self, zone_type: ZoneType) -> &mut MergedZone {
        let id = ZoneId(self.next_id);
        self.next_id += 1;
        debug!(%id, ?zone_type, "zone created");
        self.zones.entry(id).or_insert_with(|| MergedZone::new(id, zone_type))
    }

    pub fn get(&self, id: ZoneId) -> Option<&MergedZone> {
        self.zones.get(&id)
    }

    pub fn get_mut(&mut self, id: ZoneId) -> Option<&mut MergedZone> {
        self.zones.get_mut(&id)
    }

    /// All zones in id order
    pub fn zones(&self) -> impl Iterator<Item = &MergedZone> {
        self.zones.values()
    }

    /// Attach a local zone to an existing merged zone
    pub fn add_member(&mut self, id: ZoneId, member: ZoneMember) -> Result<(), ZoneError> {
        let zone = self.zones.get_mut(&id).ok_or(ZoneError::UnknownZone(id))?;
        zone.members.push(member);
        self.member_index.insert(member, id);
        Ok(())
    }

    /// Fold `merged` into `kept`.
    ///
    /// Members, shields and field adjacency move over and `merged` is deleted.
    /// City adjacency held by fields is re-pointed to `kept`.
    pub fn merge_zones(&mut self, kept: ZoneId, merged: ZoneId) -> Result<&MergedZone, ZoneError> {
        let kept_type = self.zones.get(&kept).ok_or(ZoneError::UnknownZone(kept))?.zone_type;
        let merged_type = self
            .zones
            .get(&merged)
            .ok_or(ZoneError::UnknownZone(merged))?
            .zone_type;
        if kept_type != merged_type {
            return Err(ZoneError::TypeMismatch {
                kept,
                kept_type,
                merged,
                merged_type,
            });
        }
        if kept == merged {
            return self.zones.get(&kept).ok_or(ZoneError::UnknownZone(kept));
        }

        let absorbed = self.zones.remove(&merged).ok_or(ZoneError::UnknownZone(merged))?;
        for member in &absorbed.members {
            self.member_index.insert(*member, kept);
        }

        if kept_type == ZoneType::City {
            for zone in self.zones.values_mut() {
                if zone.adjacent_cities.contains(&merged) {
                    zone.adjacent_cities.retain(|c| *c != merged);
                    if !zone.adjacent_cities.contains(&kept) {
                        zone.adjacent_cities.push(kept);
                    }
                }
            }
            if let Some(position) = self.closed_cities.iter().position(|c| *c == merged) {
                self.closed_cities.remove(position);
                if !self.closed_cities.contains(&kept) {
                    self.closed_cities.push(kept);
                }
            }
        }

        let target = self.zones.get_mut(&kept).ok_or(ZoneError::UnknownZone(kept))?;
        target.members.extend(absorbed.members);
        target.shields += absorbed.shields;
        for city in absorbed.adjacent_cities {
            if !target.adjacent_cities.contains(&city) {
                target.adjacent_cities.push(city);
            }
        }
        debug!(%kept, %merged, members = target.members.len(), "zones merged");
        Ok(&*target)
    }

    /// The merged zone holding a tile's local zone
    pub fn find_zone_containing(&self, coord: Coord, zone_index: usize) -> Option<&MergedZone> {
        self.zone_id_of(coord, zone_index)
            .and_then(|id| self.zones.get(&id))
    }

    pub fn zone_id_of(&self, coord: Coord, zone_index: usize) -> Option<ZoneId> {
        self.member_index
            .get(&ZoneMember::new(coord, zone_index))
            .copied()
    }

    /// Record that a city has been completed. Duplicates are ignored.
    pub fn mark_city_as_closed(&mut self, id: ZoneId) {
        if !self.closed_cities.contains(&id) {
            self.closed_cities.push(id);
        }
    }

    /// Ids of every city observed complete, in closing order
    pub fn closed_cities(&self) -> &[ZoneId] {
        &self.closed_cities
    }

    pub fn is_city_closed(&self, id: ZoneId) -> bool {
        self.closed_cities.contains(&id)
    }

    /// Remove members on cells the board no longer holds.
    ///
    /// Zones left without members are deleted. Returns the number of members
    /// dropped.
    pub fn prune_missing(&mut self, board: &Board) -> usize {
        let mut dropped = 0;
        let mut emptied = Vec::new();
        for zone in self.zones.values_mut() {
            let before = zone.members.len();
            zone.members.retain(|m| !board.is_free(m.coord()));
            dropped += before - zone.members.len();
            if zone.members.is_empty() && before > 0 {
                emptied.push(zone.id);
            }
        }
        for id in &emptied {
            self.zones.remove(id);
        }
        if dropped > 0 {
            self.rebuild_index();
            debug!(dropped, emptied = emptied.len(), "pruned stale zone members");
        }
        dropped
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    fn rebuild_index(&mut self) {
        self.member_index = self
            .zones
            .values()
            .flat_map(|zone| zone.members.iter().map(move |m| (*m, zone.id)))
            .collect();
    }
}

/// JSON-friendly registry representation; the member index is rebuilt on load
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryJson {
    pub zones: Vec<MergedZone>,
    pub closed_cities: Vec<ZoneId>,
    pub next_id: u32,
}

impl From<ZoneRegistry> for RegistryJson {
    fn from(registry: ZoneRegistry) -> Self {
        RegistryJson {
            zones: registry.zones.into_values().collect(),
            closed_cities: registry.closed_cities,
            next_id: registry.next_id,
        }
    }
}

impl From<RegistryJson> for ZoneRegistry {
    fn from(json: RegistryJson) -> Self {
        let mut registry = ZoneRegistry {
            zones: json.zones.into_iter().map(|z| (z.id, z)).collect(),
            member_index: HashMap::new(),
            closed_cities: json.closed_cities,
            next_id: json.next_id,
        };
        registry.rebuild_index();
        registry
    }
}
