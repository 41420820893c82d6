//! Tiles and their zone layouts.
//!
//! A `TileDefinition` is static data: an ordered list of local zones declared in
//! the unrotated frame. A `Tile` pairs that layout with a rotation. The stored
//! layout is never rewritten; every lookup maps through the rotation instead.

use crate::edge::{rotate_position, Direction, EdgeLabel, Rotation};
use serde::{Deserialize, Serialize};

/// Kind of feature a zone represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoneType {
    City,
    Road,
    Field,
    #[serde(alias = "abbey")]
    Monastery,
}

/// Optional feature flags of a local zone
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneFeatures {
    /// City segment carries a pennant worth extra points
    #[serde(default)]
    pub shield: bool,
    /// Local indices of sibling city zones this field touches
    #[serde(default)]
    pub adjacent_cities: Vec<usize>,
}

/// One zone segment as declared by a single tile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalZone {
    #[serde(rename = "type")]
    pub zone_type: ZoneType,
    #[serde(default)]
    pub edges: Vec<EdgeLabel>,
    #[serde(default)]
    pub features: ZoneFeatures,
    #[serde(default)]
    pub meeple_positions: Vec<u8>,
    /// Other local zones on the same tile that form one feature with this one
    #[serde(default)]
    pub connected_to: Vec<usize>,
}

impl LocalZone {
    pub fn new(zone_type: ZoneType, edges: &[EdgeLabel]) -> Self {
        Self {
            zone_type,
            edges: edges.to_vec(),
            features: ZoneFeatures::default(),
            meeple_positions: Vec::new(),
            connected_to: Vec::new(),
        }
    }

    pub fn city(edges: &[EdgeLabel]) -> Self {
        Self::new(ZoneType::City, edges)
    }

    pub fn road(edges: &[EdgeLabel]) -> Self {
        Self::new(ZoneType::Road, edges)
    }

    pub fn field(edges: &[EdgeLabel]) -> Self {
        Self::new(ZoneType::Field, edges)
    }

    pub fn monastery() -> Self {
        Self::new(ZoneType::Monastery, &[])
    }

    pub fn with_shield(mut self) -> Self {
        self.features.shield = true;
        self
    }

    pub fn touching(mut self, cities: &[usize]) -> Self {
        self.features.adjacent_cities = cities.to_vec();
        self
    }

    pub fn anchors(mut self, positions: &[u8]) -> Self {
        self.meeple_positions = positions.to_vec();
        self
    }

    pub fn connected(mut self, zones: &[usize]) -> Self {
        self.connected_to = zones.to_vec();
        self
    }

    pub fn has_shield(&self) -> bool {
        self.features.shield
    }
}

fn one() -> u32 {
    1
}

/// Static description of a tile kind as found in the tile data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileDefinition {
    pub id: String,
    pub zones: Vec<LocalZone>,
    /// Copies of this tile in a full deck
    #[serde(default = "one")]
    pub quantity: u32,
    /// Artwork reference, carried for the renderer only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl TileDefinition {
    pub fn new(id: impl Into<String>, quantity: u32, zones: Vec<LocalZone>) -> Self {
        Self {
            id: id.into(),
            zones,
            quantity,
            image: None,
        }
    }
}

/// A tile drawn from the deck or placed on the board
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    pub id: String,
    pub zones: Vec<LocalZone>,
    pub rotation: Rotation,
}

impl Tile {
    pub fn new(definition: &TileDefinition) -> Self {
        Self {
            id: definition.id.clone(),
            zones: definition.zones.clone(),
            rotation: Rotation::R0,
        }
    }

    pub fn zone(&self, index: usize) -> Option<&LocalZone> {
        self.zones.get(index)
    }

    pub fn rotate_clockwise(&mut self) {
        self.rotation = self.rotation.clockwise();
    }

    pub fn set_rotation(&mut self, rotation: Rotation) {
        self.rotation = rotation;
    }

    /// Copy of this tile turned to `rotation`
    pub fn with_rotation(&self, rotation: Rotation) -> Tile {
        let mut tile = self.clone();
        tile.rotation = rotation;
        tile
    }

    /// Type of the zone found at a sub-edge of the rotated tile.
    ///
    /// The label is mapped back into the unrotated frame. A zone claiming the
    /// exact sub-edge wins; otherwise a zone declared on the plain side label
    /// (e.g. `north` for `north-left`) is used.
    pub fn edge_type(&self, label: EdgeLabel) -> Option<ZoneType> {
        let unrotated = label.rotated(self.rotation.inverse());

        if let Some(zone) = self.zones.iter().find(|z| z.edges.contains(&unrotated)) {
            return Some(zone.zone_type);
        }

        let side = unrotated.side().label();
        if side != unrotated {
            return self
                .zones
                .iter()
                .find(|z| z.edges.contains(&side))
                .map(|z| z.zone_type);
        }
        None
    }

    /// Zone types along one side of the rotated tile
    pub fn side_types(&self, side: Direction) -> [Option<ZoneType>; 3] {
        side.sub_edges().map(|label| self.edge_type(label))
    }

    /// Edges of a local zone in board orientation
    pub fn rotated_edges(&self, index: usize) -> Vec<EdgeLabel> {
        self.zone(index)
            .map(|zone| zone.edges.iter().map(|e| e.rotated(self.rotation)).collect())
            .unwrap_or_default()
    }

    /// Meeple anchors of a local zone in board orientation
    pub fn rotated_meeple_positions(&self, index: usize) -> Vec<u8> {
        self.zone(index)
            .map(|zone| {
                zone.meeple_positions
                    .iter()
                    .map(|&p| rotate_position(p, self.rotation))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Local zone index owning a rotated meeple anchor
    pub fn zone_at_position(&self, position: u8) -> Option<usize> {
        (0..self.zones.len()).find(|&i| self.rotated_meeple_positions(i).contains(&position))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use EdgeLabel::*;

    fn road_with_city_north() -> Tile {
        Tile::new(&TileDefinition::new(
            "test",
            1,
            vec![
                LocalZone::city(&[North]).anchors(&[3]),
                LocalZone::road(&[East, West]).anchors(&[13]),
                LocalZone::field(&[EastTop, WestTop]).touching(&[0]).anchors(&[8]),
                LocalZone::field(&[EastBottom, SouthLeft, South, SouthRight, WestBottom])
                    .anchors(&[23]),
            ],
        ))
    }

    #[test]
    fn test_edge_type_unrotated() {
        let tile = road_with_city_north();
        assert_eq!(tile.edge_type(North), Some(ZoneType::City));
        // Falls back to the plain side label
        assert_eq!(tile.edge_type(NorthLeft), Some(ZoneType::City));
        assert_eq!(tile.edge_type(East), Some(ZoneType::Road));
        assert_eq!(tile.edge_type(EastTop), Some(ZoneType::Field));
        assert_eq!(tile.edge_type(SouthRight), Some(ZoneType::Field));
    }

    #[test]
    fn test_edge_type_rotated() {
        let mut tile = road_with_city_north();
        tile.rotate_clockwise();
        assert_eq!(tile.rotation, Rotation::R90);
        assert_eq!(tile.edge_type(East), Some(ZoneType::City));
        assert_eq!(tile.edge_type(North), Some(ZoneType::Road));
        assert_eq!(tile.edge_type(South), Some(ZoneType::Road));
        assert_eq!(tile.edge_type(West), Some(ZoneType::Field));
    }

    #[test]
    fn test_edge_type_round_trip_all_rotations() {
        let base = road_with_city_north();
        for rotation in Rotation::ALL {
            let turned = base.with_rotation(rotation);
            for label in EdgeLabel::ALL {
                assert_eq!(turned.edge_type(label.rotated(rotation)), base.edge_type(label));
            }
        }
    }

    #[test]
    fn test_missing_edge_is_none() {
        let tile = Tile::new(&TileDefinition::new(
            "bare",
            1,
            vec![LocalZone::monastery().anchors(&[13])],
        ));
        assert_eq!(tile.edge_type(North), None);
    }

    #[test]
    fn test_rotated_lookups() {
        let tile = road_with_city_north().with_rotation(Rotation::R180);
        assert_eq!(tile.rotated_edges(0), vec![South]);
        assert_eq!(tile.rotated_meeple_positions(0), vec![23]);
        assert_eq!(tile.zone_at_position(23), Some(0));
        assert_eq!(tile.zone_at_position(3), Some(3));
        assert_eq!(tile.zone_at_position(1), None);
        assert!(tile.rotated_edges(9).is_empty());
    }

    #[test]
    fn test_clone_preserves_rotation() {
        let mut tile = road_with_city_north();
        tile.set_rotation(Rotation::R270);
        let copy = tile.clone();
        assert_eq!(copy, tile);
        assert_eq!(copy.rotation, Rotation::R270);
    }

    #[test]
    fn test_definition_from_json() {
        let json = r#"{
            "id": "base-07",
            "quantity": 3,
            "image": "07.png",
            "zones": [
                { "type": "abbey", "meeplePositions": [13] },
                { "type": "field", "edges": ["north", "east", "south", "west"],
                  "features": { "adjacentCities": [] }, "meeplePositions": [7] },
                { "type": "city", "edges": ["north"], "features": { "shield": true } }
            ]
        }"#;
        let def: TileDefinition = serde_json::from_str(json).unwrap();
        assert_eq!(def.quantity, 3);
        assert_eq!(def.zones[0].zone_type, ZoneType::Monastery);
        assert!(def.zones[2].has_shield());
        assert_eq!(def.zones[1].edges.len(), 4);
    }
}
