//! Game actions that players can take.
//!
//! This module defines all possible actions in the game, the events that
//! result from those actions, and the `Publisher` seam through which events
//! reach a renderer.

use crate::edge::{Coord, Rotation};
use crate::player::{MeepleKey, MeepleKind, PlayerColor, PlayerId};
use crate::scoring::{FinalScoreRow, ScoreAward};
use crate::zones::ZoneId;
use serde::{Deserialize, Serialize};
use std::sync::mpsc;

/// All possible actions a player can take
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameAction {
    /// Take the next tile from the deck
    DrawTile,
    /// Turn the tile in hand a quarter clockwise
    RotateTile,
    /// Set the tile in hand to an explicit rotation
    SetRotation(Rotation),
    /// Put the tile in hand on the board
    PlaceTile(Coord),
    /// Stand a meeple on an anchor of the tile placed this turn
    PlaceMeeple {
        coord: Coord,
        position: u8,
        kind: MeepleKind,
    },
    /// Discard a tile that fits nowhere and draw again
    DestroyTile,
    /// Take back the last placement of this turn
    Undo,
    /// End your turn
    EndTurn,
}

/// What an undo took back, as seen by other peers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum UndoneAction {
    Meeple {
        x: i32,
        y: i32,
        position: u8,
    },
    #[serde(rename_all = "camelCase")]
    Tile {
        x: i32,
        y: i32,
        tile_id: String,
    },
}

/// Events that occur as a result of actions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    /// A new game began
    GameStarted {
        players: Vec<PlayerId>,
        first_player: PlayerId,
    },

    /// A tile was drawn
    TileDrawn {
        player: PlayerId,
        tile_id: String,
        remaining: usize,
    },

    /// The tile in hand was turned
    TileRotated {
        player: PlayerId,
        rotation: Rotation,
    },

    /// A tile was placed on the board
    TilePlaced {
        player: PlayerId,
        location: Coord,
        tile_id: String,
        rotation: Rotation,
    },

    /// Zone topology changed after a placement
    ZonesUpdated {
        touched: Vec<ZoneId>,
        completed: Vec<ZoneId>,
    },

    /// A meeple was placed
    MeeplePlaced {
        player: PlayerId,
        key: MeepleKey,
        kind: MeepleKind,
        color: PlayerColor,
    },

    /// Closed zones were scored
    ScoresAwarded {
        awards: Vec<ScoreAward>,
        returned: Vec<MeepleKey>,
    },

    /// A player's meeple pool changed
    MeepleCountChanged {
        player: PlayerId,
        meeples: u8,
    },

    /// An undeployable tile was discarded
    TileDestroyed {
        player: PlayerId,
        tile_id: String,
    },

    /// A placement was taken back
    ActionUndone { undone: UndoneAction },

    /// Undo was requested with nothing to take back
    NothingToUndo,

    /// Turn ended
    TurnEnded {
        player: PlayerId,
        next_player: PlayerId,
    },

    /// The deck ran out
    DeckExhausted,

    /// Final scores are in
    GameEnded { scores: Vec<FinalScoreRow> },
}

/// Sink for events, decoupling producers from whoever renders them
pub trait Publisher<E> {
    fn publish(&mut self, event: E);

    fn publish_all(&mut self, events: impl IntoIterator<Item = E>)
    where
        Self: Sized,
    {
        for event in events {
            self.publish(event);
        }
    }
}

impl<E> Publisher<E> for Vec<E> {
    fn publish(&mut self, event: E) {
        self.push(event);
    }
}

impl<E> Publisher<E> for mpsc::Sender<E> {
    fn publish(&mut self, event: E) {
        // A dropped receiver only means nobody is listening any more
        let _ = self.send(event);
    }
}
