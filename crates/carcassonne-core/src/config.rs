//! Per-game options shared by every peer.

use crate::deck::Deck;
use crate::edge::Coord;
use crate::player::DEFAULT_MEEPLES;
use serde::{Deserialize, Serialize};

/// Cell the first tile of a game is placed on
pub const DEFAULT_ORIGIN: Coord = Coord::new(50, 50);

/// Options agreed on when a game starts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GameConfig {
    /// Allow farmers and score fields at game end
    pub play_fields: bool,
    pub starting_meeples: u8,
    pub origin: Coord,
    /// Use the fixed test deck instead of a shuffled full deck
    pub test_deck: bool,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            play_fields: true,
            starting_meeples: DEFAULT_MEEPLES,
            origin: DEFAULT_ORIGIN,
            test_deck: false,
        }
    }
}

impl GameConfig {
    /// A fresh deck of the kind this game plays with
    pub fn deck(&self) -> Deck {
        if self.test_deck {
            Deck::test_deck()
        } else {
            Deck::standard()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: GameConfig = serde_json::from_str(r#"{ "playFields": false }"#).unwrap();
        assert!(!config.play_fields);
        assert_eq!(config.starting_meeples, 7);
        assert_eq!(config.origin, Coord::new(50, 50));
        assert!(!config.test_deck);
    }

    #[test]
    fn test_deck_follows_config() {
        let config = GameConfig {
            test_deck: true,
            ..GameConfig::default()
        };
        assert_eq!(config.deck(), Deck::test_deck());
        assert_eq!(GameConfig::default().deck().total(), 72);
    }
}
