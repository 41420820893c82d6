//! The draw pile.

use crate::catalog::{base_tiles, START_TILE_ID};
use crate::tile::{Tile, TileDefinition};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// Order of the fixed deck used for scripted games
pub const TEST_DECK_ORDER: [&str; 15] = [
    "base-24", "base-03", "base-02", "base-01", "base-04", "base-05", "base-06", "base-07",
    "base-08", "base-09", "base-10", "base-11", "base-12", "base-13", "base-14",
];

/// Errors raised while loading tile data
#[derive(Debug, Error)]
pub enum DeckError {
    #[error("Invalid tile data: {0}")]
    Json(#[from] serde_json::Error),
}

/// Remaining copies of one tile kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemainingTiles {
    pub id: String,
    pub count: u32,
}

/// An ordered pile of tiles, drawn front to back
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deck {
    tiles: Vec<Tile>,
    current_index: usize,
}

impl Deck {
    /// Every copy of every definition, in definition order
    pub fn from_definitions(definitions: &[TileDefinition]) -> Self {
        let tiles = definitions
            .iter()
            .flat_map(|def| std::iter::repeat(def).take(def.quantity as usize))
            .map(Tile::new)
            .collect();
        Self {
            tiles,
            current_index: 0,
        }
    }

    /// Load definitions from a JSON array of tile records
    pub fn from_json(json: &str) -> Result<Self, DeckError> {
        let definitions: Vec<TileDefinition> = serde_json::from_str(json)?;
        Ok(Self::from_definitions(&definitions))
    }

    /// Full base deck, shuffled, starting tile on top
    pub fn standard() -> Self {
        let mut rng = rand::thread_rng();
        Self::standard_with_rng(&mut rng)
    }

    /// Full base deck shuffled with a provided RNG
    pub fn standard_with_rng<R: Rng>(rng: &mut R) -> Self {
        let mut deck = Self::from_definitions(&base_tiles());
        deck.shuffle_with_rng(rng);
        deck
    }

    /// Shuffle the undrawn tiles, then move the starting tile to the top
    pub fn shuffle_with_rng<R: Rng>(&mut self, rng: &mut R) {
        self.tiles[self.current_index..].shuffle(rng);
        match self.tiles[self.current_index..]
            .iter()
            .position(|t| t.id == START_TILE_ID)
        {
            Some(offset) => {
                let start = self.tiles.remove(self.current_index + offset);
                self.tiles.insert(self.current_index, start);
            }
            None => warn!("deck has no starting tile"),
        }
    }

    /// One copy each of a fixed selection of base tiles, unshuffled
    pub fn test_deck() -> Self {
        let definitions = base_tiles();
        let tiles = TEST_DECK_ORDER
            .iter()
            .filter_map(|id| definitions.iter().find(|def| def.id == *id))
            .map(Tile::new)
            .collect();
        Self {
            tiles,
            current_index: 0,
        }
    }

    /// Take the next tile, or `None` once the pile is exhausted
    pub fn draw(&mut self) -> Option<Tile> {
        let tile = self.tiles.get(self.current_index).cloned()?;
        self.current_index += 1;
        debug!(tile = %tile.id, remaining = self.remaining(), "tile drawn");
        Some(tile)
    }

    pub fn peek(&self) -> Option<&Tile> {
        self.tiles.get(self.current_index)
    }

    pub fn remaining(&self) -> usize {
        self.tiles.len() - self.current_index
    }

    pub fn total(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Undrawn tiles grouped by kind, most plentiful first
    pub fn remaining_by_type(&self) -> Vec<RemainingTiles> {
        let mut groups: Vec<RemainingTiles> = Vec::new();
        for tile in &self.tiles[self.current_index..] {
            match groups.iter_mut().find(|g| g.id == tile.id) {
                Some(group) => group.count += 1,
                None => groups.push(RemainingTiles {
                    id: tile.id.clone(),
                    count: 1,
                }),
            }
        }
        groups.sort_by(|a, b| b.count.cmp(&a.count));
        groups
    }
}
