//! Player state and meeple pools.
//!
//! This module contains:
//! - Player struct with score, per-category breakdown and remaining meeples
//! - Player colors for UI rendering
//! - Meeples placed on the board, keyed by tile and anchor

use crate::edge::Coord;
use crate::tile::ZoneType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Seat index of a player in the game
pub type PlayerId = u8;

/// Meeples each player starts with
pub const DEFAULT_MEEPLES: u8 = 7;

/// Player color for UI rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerColor {
    Blue,
    Red,
    Green,
    Yellow,
    Black,
    Pink,
}

impl PlayerColor {
    /// Get color for a player index
    pub fn for_player(id: PlayerId) -> Self {
        match id % 6 {
            0 => PlayerColor::Blue,
            1 => PlayerColor::Red,
            2 => PlayerColor::Green,
            3 => PlayerColor::Yellow,
            4 => PlayerColor::Black,
            _ => PlayerColor::Pink,
        }
    }
}

/// Points earned per feature category
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreDetail {
    pub cities: u32,
    pub roads: u32,
    pub monasteries: u32,
    pub fields: u32,
}

impl ScoreDetail {
    pub fn add(&mut self, zone_type: ZoneType, points: u32) {
        match zone_type {
            ZoneType::City => self.cities += points,
            ZoneType::Road => self.roads += points,
            ZoneType::Monastery => self.monasteries += points,
            ZoneType::Field => self.fields += points,
        }
    }

    pub fn total(&self) -> u32 {
        self.cities + self.roads + self.monasteries + self.fields
    }
}

/// A player's state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub color: PlayerColor,
    pub score: u32,
    /// Meeples still in the player's pool
    pub meeples: u8,
    pub score_detail: ScoreDetail,
}

impl Player {
    pub fn new(id: PlayerId, name: impl Into<String>, meeples: u8) -> Self {
        Self {
            id,
            name: name.into(),
            color: PlayerColor::for_player(id),
            score: 0,
            meeples,
            score_detail: ScoreDetail::default(),
        }
    }

    pub fn has_meeples(&self) -> bool {
        self.meeples > 0
    }

    /// Credit points to the total and to the matching category
    pub fn award(&mut self, zone_type: ZoneType, points: u32) {
        self.score += points;
        self.score_detail.add(zone_type, points);
    }
}

/// Role a meeple takes depending on the zone it stands in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeepleKind {
    Knight,
    Thief,
    Monk,
    Farmer,
}

impl MeepleKind {
    pub fn for_zone(zone_type: ZoneType) -> Self {
        match zone_type {
            ZoneType::City => MeepleKind::Knight,
            ZoneType::Road => MeepleKind::Thief,
            ZoneType::Monastery => MeepleKind::Monk,
            ZoneType::Field => MeepleKind::Farmer,
        }
    }
}

/// Board location of a meeple: tile cell plus rotated anchor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MeepleKey {
    pub x: i32,
    pub y: i32,
    pub position: u8,
}

impl MeepleKey {
    pub fn new(coord: Coord, position: u8) -> Self {
        Self {
            x: coord.x,
            y: coord.y,
            position,
        }
    }

    pub fn coord(&self) -> Coord {
        Coord::new(self.x, self.y)
    }
}

/// A meeple standing on the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meeple {
    pub kind: MeepleKind,
    pub color: PlayerColor,
    pub player: PlayerId,
}

/// Every meeple on the board
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<PlacedMeeple>", into = "Vec<PlacedMeeple>")]
pub struct PlacedMeeples(BTreeMap<MeepleKey, Meeple>);

impl PlacedMeeples {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &MeepleKey) -> Option<&Meeple> {
        self.0.get(key)
    }

    pub fn contains(&self, key: &MeepleKey) -> bool {
        self.0.contains_key(key)
    }

    /// Put a meeple down. Returns the meeple previously at `key`, if any.
    pub fn insert(&mut self, key: MeepleKey, meeple: Meeple) -> Option<Meeple> {
        self.0.insert(key, meeple)
    }

    pub fn remove(&mut self, key: &MeepleKey) -> Option<Meeple> {
        self.0.remove(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&MeepleKey, &Meeple)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// Meeples a player currently has on the board
    pub fn count_for(&self, player: PlayerId) -> usize {
        self.0.values().filter(|m| m.player == player).count()
    }
}

/// Flat form of a placed meeple for serialization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacedMeeple {
    pub x: i32,
    pub y: i32,
    pub position: u8,
    pub kind: MeepleKind,
    pub color: PlayerColor,
    pub player: PlayerId,
}

impl From<Vec<PlacedMeeple>> for PlacedMeeples {
    fn from(list: Vec<PlacedMeeple>) -> Self {
        PlacedMeeples(
            list.into_iter()
                .map(|p| {
                    (
                        MeepleKey {
                            x: p.x,
                            y: p.y,
                            position: p.position,
                        },
                        Meeple {
                            kind: p.kind,
                            color: p.color,
                            player: p.player,
                        },
                    )
                })
                .collect(),
        )
    }
}

impl From<PlacedMeeples> for Vec<PlacedMeeple> {
    fn from(placed: PlacedMeeples) -> Self {
        placed
            .0
            .into_iter()
            .map(|(key, meeple)| PlacedMeeple {
                x: key.x,
                y: key.y,
                position: key.position,
                kind: meeple.kind,
                color: meeple.color,
                player: meeple.player,
            })
            .collect()
    }
}
