//! Sparse grid of placed tiles.
//!
//! The board only stores tiles. Placement legality is checked here, but the
//! caller decides when the check applies (the first tile of a game skips it).

use crate::edge::{Coord, Direction, Rotation};
use crate::tile::Tile;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// The game board
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BoardJson", into = "BoardJson")]
pub struct Board {
    tiles: BTreeMap<Coord, Tile>,
}

impl Board {
    /// Create an empty board
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn get(&self, coord: Coord) -> Option<&Tile> {
        self.tiles.get(&coord)
    }

    /// Placed tiles in coordinate order
    pub fn tiles(&self) -> impl Iterator<Item = (Coord, &Tile)> {
        self.tiles.iter().map(|(coord, tile)| (*coord, tile))
    }

    /// The set of occupied cells
    pub fn occupied(&self) -> BTreeSet<Coord> {
        self.tiles.keys().copied().collect()
    }

    pub fn is_free(&self, coord: Coord) -> bool {
        !self.tiles.contains_key(&coord)
    }

    /// Check whether `tile`, at its current rotation, fits at `coord`.
    ///
    /// The cell must be free, touch at least one placed tile, and every
    /// sub-edge along each shared side must carry the same zone type on both
    /// tiles.
    pub fn can_place_tile(&self, coord: Coord, tile: &Tile) -> bool {
        if !self.is_free(coord) {
            return false;
        }

        let mut has_neighbor = false;
        for (direction, neighbor_coord) in coord.neighbors() {
            let Some(neighbor) = self.tiles.get(&neighbor_coord) else {
                continue;
            };
            has_neighbor = true;

            let matches = direction
                .sub_edges()
                .iter()
                .all(|label| tile.edge_type(*label) == neighbor.edge_type(label.opposite()));
            if !matches {
                return false;
            }
        }

        has_neighbor
    }

    /// Insert a tile without any legality check
    pub fn add_tile(&mut self, coord: Coord, tile: Tile) {
        self.tiles.insert(coord, tile);
    }

    pub fn remove_tile(&mut self, coord: Coord) -> Option<Tile> {
        self.tiles.remove(&coord)
    }

    /// Drop every tile whose cell is not in `keep`
    pub fn retain(&mut self, keep: &BTreeSet<Coord>) {
        self.tiles.retain(|coord, _| keep.contains(coord));
    }

    pub fn reset(&mut self) {
        self.tiles.clear();
    }

    /// Free cells orthogonally adjacent to a placed tile
    pub fn open_positions(&self) -> BTreeSet<Coord> {
        self.tiles
            .keys()
            .flat_map(|coord| coord.neighbors().into_iter().map(|(_, n)| n))
            .filter(|coord| self.is_free(*coord))
            .collect()
    }

    /// Whether `tile` fits anywhere under any rotation.
    ///
    /// An empty board accepts any tile.
    pub fn is_tile_placeable(&self, tile: &Tile) -> bool {
        if self.is_empty() {
            return true;
        }
        self.open_positions().into_iter().any(|coord| {
            Rotation::ALL
                .iter()
                .any(|rotation| self.can_place_tile(coord, &tile.with_rotation(*rotation)))
        })
    }

    /// Every placement (cell and rotation) accepting `tile`
    pub fn valid_placements(&self, tile: &Tile) -> Vec<(Coord, Rotation)> {
        let mut spots = Vec::new();
        for coord in self.open_positions() {
            for rotation in Rotation::ALL {
                if self.can_place_tile(coord, &tile.with_rotation(rotation)) {
                    spots.push((coord, rotation));
                }
            }
        }
        spots
    }

    /// Number of occupied cells among the eight surrounding `coord`
    pub fn occupied_neighbor_count(&self, coord: Coord) -> usize {
        coord
            .surrounding()
            .iter()
            .filter(|c| !self.is_free(**c))
            .count()
    }

    /// Tile across the given side of `coord`
    pub fn neighbor(&self, coord: Coord, direction: Direction) -> Option<&Tile> {
        coord.step(direction).and_then(|c| self.tiles.get(&c))
    }
}

/// A single placed tile, as carried in board snapshots
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacedTile {
    pub x: i32,
    pub y: i32,
    pub tile: Tile,
}

/// JSON-friendly board representation with an array instead of a coordinate map
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardJson {
    pub tiles: Vec<PlacedTile>,
}

impl From<Board> for BoardJson {
    fn from(board: Board) -> Self {
        BoardJson {
            tiles: board
                .tiles
                .into_iter()
                .map(|(coord, tile)| PlacedTile {
                    x: coord.x,
                    y: coord.y,
                    tile,
                })
                .collect(),
        }
    }
}

impl From<BoardJson> for Board {
    fn from(json: BoardJson) -> Self {
        Board {
            tiles: json
                .tiles
                .into_iter()
                .map(|placed| (Coord::new(placed.x, placed.y), placed.tile))
                .collect(),
        }
    }
}
