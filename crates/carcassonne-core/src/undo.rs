//! Turn snapshots and undo.
//!
//! Two snapshots are held per turn: one when the tile is drawn and one right
//! after it is placed. Undoing a meeple goes back to the second, undoing the
//! tile goes back to the first.

use crate::actions::UndoneAction;
use crate::board::Board;
use crate::edge::Coord;
use crate::game::GameState;
use crate::merger::ZoneMerger;
use crate::player::{MeepleKey, PlacedMeeples, PlayerId};
use crate::tile::Tile;
use crate::zones::ZoneRegistry;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Point-in-time copy of everything a turn can change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub occupied: BTreeSet<Coord>,
    pub registry: ZoneRegistry,
    pub meeples: PlacedMeeples,
    pub meeple_counts: BTreeMap<PlayerId, u8>,
}

impl Snapshot {
    pub fn capture(
        board: &Board,
        merger: &ZoneMerger,
        meeples: &PlacedMeeples,
        state: &GameState,
    ) -> Self {
        Self {
            occupied: board.occupied(),
            registry: merger.registry().clone(),
            meeples: meeples.clone(),
            meeple_counts: state.players.iter().map(|p| (p.id, p.meeples)).collect(),
        }
    }

    /// Put the captured state back.
    ///
    /// Tiles placed since the capture are lifted off the board, and any zone
    /// member left pointing at an empty cell is pruned.
    pub fn restore(
        &self,
        board: &mut Board,
        merger: &mut ZoneMerger,
        meeples: &mut PlacedMeeples,
        state: &mut GameState,
    ) {
        board.retain(&self.occupied);

        let mut registry = self.registry.clone();
        registry.prune_missing(board);
        merger.replace_registry(registry);

        *meeples = self.meeples.clone();
        for player in &mut state.players {
            if let Some(count) = self.meeple_counts.get(&player.id) {
                player.meeples = *count;
            }
        }
    }
}

/// Result of a successful undo
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Undone {
    Meeple(MeepleKey),
    /// The tile comes back so it can return to the player's hand
    Tile { coord: Coord, tile: Tile },
}

impl Undone {
    pub fn descriptor(&self) -> UndoneAction {
        match self {
            Undone::Meeple(key) => UndoneAction::Meeple {
                x: key.x,
                y: key.y,
                position: key.position,
            },
            Undone::Tile { coord, tile } => UndoneAction::Tile {
                x: coord.x,
                y: coord.y,
                tile_id: tile.id.clone(),
            },
        }
    }
}

/// Snapshot keeper for the turn in progress
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UndoManager {
    turn_start: Option<Snapshot>,
    after_tile: Option<Snapshot>,
    last_tile: Option<(Coord, Tile)>,
    last_meeple: Option<MeepleKey>,
}

impl UndoManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the state at the start of a turn and forget anything older
    pub fn save_turn_start(&mut self, snapshot: Snapshot) {
        debug!("turn start snapshot saved");
        *self = Self {
            turn_start: Some(snapshot),
            ..Self::default()
        };
    }

    /// Record the state right after the turn's tile went down
    pub fn save_after_tile(&mut self, snapshot: Snapshot, coord: Coord, tile: Tile) {
        debug!(?coord, "post-placement snapshot saved");
        self.after_tile = Some(snapshot);
        self.last_tile = Some((coord, tile));
        self.last_meeple = None;
    }

    pub fn mark_meeple_placed(&mut self, key: MeepleKey) {
        self.last_meeple = Some(key);
    }

    pub fn tile_placed(&self) -> bool {
        self.last_tile.is_some()
    }

    pub fn meeple_placed(&self) -> bool {
        self.last_meeple.is_some()
    }

    pub fn can_undo(&self) -> bool {
        (self.meeple_placed() && self.after_tile.is_some())
            || (self.tile_placed() && self.turn_start.is_some())
    }

    /// Take back the most recent placement of the turn.
    ///
    /// A meeple goes first; the post-placement snapshot stays available so the
    /// tile can still be undone afterwards. Returns `None` when there is
    /// nothing to take back.
    pub fn undo(
        &mut self,
        board: &mut Board,
        merger: &mut ZoneMerger,
        meeples: &mut PlacedMeeples,
        state: &mut GameState,
    ) -> Option<Undone> {
        if let (Some(key), Some(snapshot)) = (self.last_meeple, &self.after_tile) {
            snapshot.restore(board, merger, meeples, state);
            self.last_meeple = None;
            return Some(Undone::Meeple(key));
        }

        if self.last_tile.is_some() {
            if let Some(snapshot) = &self.turn_start {
                snapshot.restore(board, merger, meeples, state);
                self.after_tile = None;
                self.last_meeple = None;
                return self
                    .last_tile
                    .take()
                    .map(|(coord, tile)| Undone::Tile { coord, tile });
            }
        }

        None
    }

    /// Restore the snapshot matching an undo performed by another peer.
    ///
    /// No turn bookkeeping is consulted beyond which snapshots exist locally.
    /// Returns `None` when the matching snapshot is missing.
    pub fn restore_for_remote(
        &mut self,
        undone: &UndoneAction,
        board: &mut Board,
        merger: &mut ZoneMerger,
        meeples: &mut PlacedMeeples,
        state: &mut GameState,
    ) -> Option<Undone> {
        match undone {
            UndoneAction::Meeple { x, y, position } => {
                let snapshot = self.after_tile.as_ref()?;
                snapshot.restore(board, merger, meeples, state);
                self.last_meeple = None;
                Some(Undone::Meeple(MeepleKey {
                    x: *x,
                    y: *y,
                    position: *position,
                }))
            }
            UndoneAction::Tile { .. } => {
                let snapshot = self.turn_start.as_ref()?;
                snapshot.restore(board, merger, meeples, state);
                self.after_tile = None;
                self.last_meeple = None;
                self.last_tile
                    .take()
                    .map(|(coord, tile)| Undone::Tile { coord, tile })
            }
        }
    }

    /// Forget the turn's snapshots
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
