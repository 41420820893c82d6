//! Core game state machine.
//!
//! `GameState` is the small replicated part of a game (players and whose turn
//! it is). `GameSession` owns everything else a peer keeps locally: the board,
//! the zone registry, the meeples, the deck and the undo snapshots.

use crate::actions::{GameAction, GameEvent, UndoneAction};
use crate::board::Board;
use crate::config::GameConfig;
use crate::deck::Deck;
use crate::edge::{Coord, Direction, Rotation};
use crate::merger::ZoneMerger;
use crate::player::{Meeple, MeepleKey, MeepleKind, PlacedMeeples, Player, PlayerId};
use crate::scoring::{apply_awards, FinalScoreRow, ScoreAward, Scorer};
use crate::tile::{Tile, ZoneType};
use crate::undo::{Snapshot, UndoManager, Undone};
use crate::zones::{ZoneError, ZoneRegistry};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Smallest and largest supported table
pub const MIN_PLAYERS: usize = 2;
pub const MAX_PLAYERS: usize = 6;

/// Where the current turn stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TurnPhase {
    /// The current player has to draw
    AwaitingDraw,
    /// A tile is in hand and can be rotated, placed or destroyed
    TileInHand,
    /// The tile is down; a meeple may follow before the turn ends
    TilePlaced,
    /// Final scores are in
    Finished,
}

/// Errors that can occur when applying actions
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum GameError {
    #[error("Not your turn")]
    NotYourTurn,

    #[error("Invalid action for current phase")]
    InvalidPhase,

    #[error("Invalid placement location")]
    InvalidLocation,

    #[error("Tile edges do not match its neighbors")]
    EdgeMismatch,

    #[error("No tile in hand")]
    NoTileInHand,

    #[error("No meeples remaining")]
    NoMeeplesRemaining,

    #[error("Zone already has a meeple")]
    ZoneOccupied,

    #[error("A meeple was already placed this turn")]
    MeepleAlreadyPlaced,

    #[error("A {got:?} cannot stand there, expected a {expected:?}")]
    InvalidMeepleKind {
        expected: MeepleKind,
        got: MeepleKind,
    },

    #[error("No zone at that position")]
    NoZoneAtPosition,

    #[error("Fields are disabled in this game")]
    FieldsDisabled,

    #[error("Tile can still be placed somewhere")]
    TilePlaceable,

    #[error("Game has not started")]
    NotStarted,

    #[error("Game is over")]
    GameOver,

    #[error("Unknown player {0}")]
    UnknownPlayer(PlayerId),

    #[error("Unsupported number of players: {0}")]
    InvalidPlayerCount(usize),

    #[error(transparent)]
    Zone(#[from] ZoneError),
}

/// The replicated part of a game: players and the turn pointer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    pub players: Vec<Player>,
    pub current_player_index: usize,
}

impl GameState {
    /// Seat players in the given order, ids following seat order
    pub fn new<S: AsRef<str>>(names: &[S], starting_meeples: u8) -> Self {
        let players = names
            .iter()
            .enumerate()
            .map(|(i, name)| Player::new(i as PlayerId, name.as_ref(), starting_meeples))
            .collect();
        Self {
            players,
            current_player_index: 0,
        }
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn current_player(&self) -> Option<&Player> {
        self.players.get(self.current_player_index)
    }

    pub fn current_player_id(&self) -> Option<PlayerId> {
        self.current_player().map(|p| p.id)
    }

    pub fn get_player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn get_player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == id)
    }

    pub fn is_player_turn(&self, id: PlayerId) -> bool {
        self.current_player_id() == Some(id)
    }

    /// Pass the turn to the next seat and return its player id
    pub fn advance_turn(&mut self) -> Option<PlayerId> {
        if self.players.is_empty() {
            return None;
        }
        self.current_player_index = (self.current_player_index + 1) % self.players.len();
        self.current_player_id()
    }
}

/// All mutable state of one game on one peer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSession {
    config: GameConfig,
    board: Board,
    merger: ZoneMerger,
    meeples: PlacedMeeples,
    state: GameState,
    deck: Deck,
    phase: TurnPhase,
    tile_in_hand: Option<Tile>,
    placed_this_turn: Option<Coord>,
    meeple_this_turn: Option<MeepleKey>,
    undo: UndoManager,
    final_scores: Option<Vec<FinalScoreRow>>,
}

impl GameSession {
    /// Start a game for the named players with an explicit deck
    pub fn new<S: AsRef<str>>(
        names: &[S],
        config: GameConfig,
        deck: Deck,
    ) -> Result<Self, GameError> {
        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&names.len()) {
            return Err(GameError::InvalidPlayerCount(names.len()));
        }
        let state = GameState::new(names, config.starting_meeples);
        info!(players = names.len(), tiles = deck.total(), "game created");
        Ok(Self::from_state(state, config, deck))
    }

    /// Start a game with the deck the config asks for
    pub fn from_config<S: AsRef<str>>(names: &[S], config: GameConfig) -> Result<Self, GameError> {
        Self::new(names, config, config.deck())
    }

    /// Build a session around state received from another peer
    pub fn from_state(state: GameState, config: GameConfig, deck: Deck) -> Self {
        Self {
            config,
            board: Board::new(),
            merger: ZoneMerger::new(),
            meeples: PlacedMeeples::new(),
            state,
            deck,
            phase: TurnPhase::AwaitingDraw,
            tile_in_hand: None,
            placed_this_turn: None,
            meeple_this_turn: None,
            undo: UndoManager::new(),
            final_scores: None,
        }
    }

    /// Wipe the table and begin again with new players and deck
    pub fn restart(&mut self, state: GameState, config: GameConfig, deck: Deck) {
        self.board.reset();
        self.merger.reset();
        self.meeples.clear();
        self.undo.reset();
        self.config = config;
        self.state = state;
        self.deck = deck;
        self.phase = TurnPhase::AwaitingDraw;
        self.tile_in_hand = None;
        self.placed_this_turn = None;
        self.meeple_this_turn = None;
        self.final_scores = None;
        info!(players = self.state.player_count(), "game restarted");
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn merger(&self) -> &ZoneMerger {
        &self.merger
    }

    pub fn registry(&self) -> &ZoneRegistry {
        self.merger.registry()
    }

    pub fn meeples(&self) -> &PlacedMeeples {
        &self.meeples
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn deck(&self) -> &Deck {
        &self.deck
    }

    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    pub fn tile_in_hand(&self) -> Option<&Tile> {
        self.tile_in_hand.as_ref()
    }

    pub fn placed_this_turn(&self) -> Option<Coord> {
        self.placed_this_turn
    }

    pub fn final_scores(&self) -> Option<&[FinalScoreRow]> {
        self.final_scores.as_deref()
    }

    pub fn is_finished(&self) -> bool {
        self.phase == TurnPhase::Finished
    }

    pub fn can_undo(&self) -> bool {
        self.undo.can_undo()
    }

    /// Capture what a turn can change
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(&self.board, &self.merger, &self.meeples, &self.state)
    }

    /// Cells and rotations that accept the tile in hand
    pub fn placements_for_tile_in_hand(&self) -> Vec<(Coord, Rotation)> {
        let Some(tile) = &self.tile_in_hand else {
            return Vec::new();
        };
        if self.board.is_empty() {
            return Rotation::ALL
                .iter()
                .map(|rotation| (self.config.origin, *rotation))
                .collect();
        }
        self.board.valid_placements(tile)
    }

    /// Apply an action to the game state
    pub fn apply_action(
        &mut self,
        player: PlayerId,
        action: GameAction,
    ) -> Result<Vec<GameEvent>, GameError> {
        if self.phase == TurnPhase::Finished {
            return Err(GameError::GameOver);
        }
        if self.state.get_player(player).is_none() {
            return Err(GameError::UnknownPlayer(player));
        }
        if !self.state.is_player_turn(player) {
            return Err(GameError::NotYourTurn);
        }

        match action {
            GameAction::DrawTile => self.draw_tile(player),
            GameAction::RotateTile => {
                let rotation = self.tile_for_rotation()?.rotation.clockwise();
                self.rotate_to(player, rotation)
            }
            GameAction::SetRotation(rotation) => {
                self.tile_for_rotation()?;
                self.rotate_to(player, rotation)
            }
            GameAction::PlaceTile(coord) => self.place_tile(player, coord),
            GameAction::PlaceMeeple {
                coord,
                position,
                kind,
            } => self.place_meeple(player, coord, position, kind),
            GameAction::DestroyTile => self.destroy_tile(player),
            GameAction::Undo => Ok(self.undo_last()),
            GameAction::EndTurn => self.end_turn(player),
        }
    }

    fn draw_tile(&mut self, player: PlayerId) -> Result<Vec<GameEvent>, GameError> {
        if self.phase != TurnPhase::AwaitingDraw {
            return Err(GameError::InvalidPhase);
        }

        self.undo.save_turn_start(self.snapshot());
        let mut events = Vec::new();
        match self.deck.draw() {
            Some(tile) => {
                events.push(GameEvent::TileDrawn {
                    player,
                    tile_id: tile.id.clone(),
                    remaining: self.deck.remaining(),
                });
                self.tile_in_hand = Some(tile);
                self.phase = TurnPhase::TileInHand;
            }
            None => {
                events.push(GameEvent::DeckExhausted);
                events.extend(self.finish_game());
            }
        }
        Ok(events)
    }

    fn tile_for_rotation(&self) -> Result<&Tile, GameError> {
        if self.phase != TurnPhase::TileInHand {
            return Err(GameError::InvalidPhase);
        }
        self.tile_in_hand.as_ref().ok_or(GameError::NoTileInHand)
    }

    fn rotate_to(
        &mut self,
        player: PlayerId,
        rotation: Rotation,
    ) -> Result<Vec<GameEvent>, GameError> {
        let tile = self.tile_in_hand.as_mut().ok_or(GameError::NoTileInHand)?;
        tile.set_rotation(rotation);
        Ok(vec![GameEvent::TileRotated { player, rotation }])
    }

    fn place_tile(&mut self, player: PlayerId, coord: Coord) -> Result<Vec<GameEvent>, GameError> {
        if self.phase != TurnPhase::TileInHand {
            return Err(GameError::InvalidPhase);
        }
        let tile = self.tile_in_hand.as_ref().ok_or(GameError::NoTileInHand)?;

        if self.board.is_empty() {
            // The opening tile goes to the origin whatever its edges
            if coord != self.config.origin {
                return Err(GameError::InvalidLocation);
            }
        } else {
            let touches = Direction::ALL
                .iter()
                .any(|d| self.board.neighbor(coord, *d).is_some());
            if !self.board.is_free(coord) || !touches {
                return Err(GameError::InvalidLocation);
            }
            if !self.board.can_place_tile(coord, tile) {
                return Err(GameError::EdgeMismatch);
            }
        }

        let Some(tile) = self.tile_in_hand.take() else {
            return Err(GameError::NoTileInHand);
        };
        let registry_before = self.merger.registry().clone();
        self.board.add_tile(coord, tile.clone());
        let update = match self.merger.update_zones_for_new_tile(&self.board, coord) {
            Ok(update) => update,
            Err(err) => {
                warn!(%err, ?coord, "zone merge failed, placement rolled back");
                self.board.remove_tile(coord);
                self.merger.replace_registry(registry_before);
                self.tile_in_hand = Some(tile);
                return Err(err.into());
            }
        };

        self.placed_this_turn = Some(coord);
        self.phase = TurnPhase::TilePlaced;
        self.undo.save_after_tile(self.snapshot(), coord, tile.clone());
        debug!(player, ?coord, tile = %tile.id, rotation = tile.rotation.degrees(), "tile placed");

        Ok(vec![
            GameEvent::TilePlaced {
                player,
                location: coord,
                tile_id: tile.id,
                rotation: tile.rotation,
            },
            GameEvent::ZonesUpdated {
                touched: update.touched,
                completed: update.newly_completed,
            },
        ])
    }

    fn place_meeple(
        &mut self,
        player: PlayerId,
        coord: Coord,
        position: u8,
        kind: MeepleKind,
    ) -> Result<Vec<GameEvent>, GameError> {
        if self.phase != TurnPhase::TilePlaced {
            return Err(GameError::InvalidPhase);
        }
        if self.placed_this_turn != Some(coord) {
            return Err(GameError::InvalidLocation);
        }
        if self.meeple_this_turn.is_some() {
            return Err(GameError::MeepleAlreadyPlaced);
        }
        let owner = self
            .state
            .get_player(player)
            .ok_or(GameError::UnknownPlayer(player))?;
        if !owner.has_meeples() {
            return Err(GameError::NoMeeplesRemaining);
        }
        let color = owner.color;

        let zone = self
            .merger
            .find_merged_zone_for_position(&self.board, coord, position)
            .ok_or(GameError::NoZoneAtPosition)?;
        if zone.zone_type == ZoneType::Field && !self.config.play_fields {
            return Err(GameError::FieldsDisabled);
        }
        let expected = MeepleKind::for_zone(zone.zone_type);
        if kind != expected {
            return Err(GameError::InvalidMeepleKind {
                expected,
                got: kind,
            });
        }
        if !self
            .merger
            .zone_meeples(&self.board, zone, &self.meeples)
            .is_empty()
        {
            return Err(GameError::ZoneOccupied);
        }
        let zone_id = zone.id;

        let key = MeepleKey::new(coord, position);
        self.meeples.insert(key, Meeple { kind, color, player });
        let remaining = match self.state.get_player_mut(player) {
            Some(p) => {
                p.meeples -= 1;
                p.meeples
            }
            None => 0,
        };
        self.meeple_this_turn = Some(key);
        self.undo.mark_meeple_placed(key);
        debug!(player, zone = %zone_id, position, "meeple placed");

        Ok(vec![
            GameEvent::MeeplePlaced {
                player,
                key,
                kind,
                color,
            },
            GameEvent::MeepleCountChanged {
                player,
                meeples: remaining,
            },
        ])
    }

    fn destroy_tile(&mut self, player: PlayerId) -> Result<Vec<GameEvent>, GameError> {
        if self.phase != TurnPhase::TileInHand {
            return Err(GameError::InvalidPhase);
        }
        let tile = self.tile_in_hand.as_ref().ok_or(GameError::NoTileInHand)?;
        if self.board.is_tile_placeable(tile) {
            return Err(GameError::TilePlaceable);
        }

        let Some(tile) = self.tile_in_hand.take() else {
            return Err(GameError::NoTileInHand);
        };
        self.phase = TurnPhase::AwaitingDraw;
        info!(player, tile = %tile.id, "unplaceable tile destroyed");
        Ok(vec![GameEvent::TileDestroyed {
            player,
            tile_id: tile.id,
        }])
    }

    fn undo_last(&mut self) -> Vec<GameEvent> {
        let undone = self.undo.undo(
            &mut self.board,
            &mut self.merger,
            &mut self.meeples,
            &mut self.state,
        );
        match undone {
            Some(undone) => self.after_undo(undone),
            None => vec![GameEvent::NothingToUndo],
        }
    }

    /// Take back a placement another peer undid.
    ///
    /// Turn ownership is not checked; the matching local snapshot is trusted.
    pub fn apply_remote_undo(&mut self, undone: &UndoneAction) -> Vec<GameEvent> {
        let restored = self.undo.restore_for_remote(
            undone,
            &mut self.board,
            &mut self.merger,
            &mut self.meeples,
            &mut self.state,
        );
        match restored {
            Some(undone) => self.after_undo(undone),
            None => {
                warn!(?undone, "no local snapshot for remote undo");
                Vec::new()
            }
        }
    }

    fn after_undo(&mut self, undone: Undone) -> Vec<GameEvent> {
        let descriptor = undone.descriptor();
        let mut events = Vec::new();
        match undone {
            Undone::Meeple(key) => {
                self.meeple_this_turn = None;
                debug!(?key, "meeple placement undone");
                events.push(GameEvent::ActionUndone {
                    undone: descriptor,
                });
                if let Some(player) = self.state.current_player() {
                    events.push(GameEvent::MeepleCountChanged {
                        player: player.id,
                        meeples: player.meeples,
                    });
                }
            }
            Undone::Tile { coord, tile } => {
                self.meeple_this_turn = None;
                self.placed_this_turn = None;
                self.tile_in_hand = Some(tile);
                self.phase = TurnPhase::TileInHand;
                debug!(?coord, "tile placement undone");
                events.push(GameEvent::ActionUndone {
                    undone: descriptor,
                });
            }
        }
        events
    }

    fn end_turn(&mut self, player: PlayerId) -> Result<Vec<GameEvent>, GameError> {
        if self.phase != TurnPhase::TilePlaced {
            return Err(GameError::InvalidPhase);
        }

        let scoring = Scorer::new(&self.board, &self.merger).score_closed_zones(&self.meeples);
        let mut events = self.apply_score_update(&scoring.awards, &scoring.meeples_to_return);

        self.clear_turn();
        let next_player = self.state.advance_turn().unwrap_or(player);
        info!(player, next_player, "turn ended");
        events.push(GameEvent::TurnEnded {
            player,
            next_player,
        });

        if self.deck.is_empty() {
            events.push(GameEvent::DeckExhausted);
            events.extend(self.finish_game());
        }
        Ok(events)
    }

    /// Credit awards and send the listed meeples home.
    ///
    /// Used both after local turn-end scoring and for score updates received
    /// from the peer who ended the turn.
    pub fn apply_score_update(
        &mut self,
        awards: &[ScoreAward],
        meeples_to_return: &[MeepleKey],
    ) -> Vec<GameEvent> {
        apply_awards(&mut self.state, awards);

        let mut changed = BTreeSet::new();
        for key in meeples_to_return {
            let Some(meeple) = self.meeples.remove(key) else {
                warn!(?key, "returned meeple was not on the board");
                continue;
            };
            if let Some(owner) = self.state.get_player_mut(meeple.player) {
                owner.meeples += 1;
                changed.insert(owner.id);
            }
        }

        let mut events = Vec::new();
        if !awards.is_empty() || !meeples_to_return.is_empty() {
            events.push(GameEvent::ScoresAwarded {
                awards: awards.to_vec(),
                returned: meeples_to_return.to_vec(),
            });
        }
        for id in changed {
            if let Some(owner) = self.state.get_player(id) {
                events.push(GameEvent::MeepleCountChanged {
                    player: id,
                    meeples: owner.meeples,
                });
            }
        }
        events
    }

    /// Adopt the state broadcast by the peer who ended the turn
    pub fn receive_turn_ended(&mut self, next_player_index: usize, state: GameState) -> Vec<GameEvent> {
        let player = self.state.current_player_id().unwrap_or_default();
        self.state = state;
        self.state.current_player_index = next_player_index;
        self.clear_turn();

        let next_player = self.state.current_player_id().unwrap_or_default();
        info!(player, next_player, "remote turn ended");
        vec![GameEvent::TurnEnded {
            player,
            next_player,
        }]
    }

    /// Take the leaderboard computed by the peer who ended the game
    pub fn receive_game_ended(&mut self, rows: Vec<FinalScoreRow>) -> Vec<GameEvent> {
        for row in &rows {
            if let Some(player) = self.state.get_player_mut(row.id) {
                player.score = row.total;
                player.score_detail.cities = row.cities;
                player.score_detail.roads = row.roads;
                player.score_detail.monasteries = row.monasteries;
                player.score_detail.fields = row.fields;
            }
        }
        self.clear_turn();
        self.phase = TurnPhase::Finished;
        self.final_scores = Some(rows.clone());
        info!("remote game ended");
        vec![GameEvent::GameEnded { scores: rows }]
    }

    fn clear_turn(&mut self) {
        self.undo.reset();
        self.tile_in_hand = None;
        self.placed_this_turn = None;
        self.meeple_this_turn = None;
        self.phase = TurnPhase::AwaitingDraw;
    }

    fn finish_game(&mut self) -> Vec<GameEvent> {
        let rows = Scorer::new(&self.board, &self.merger)
            .with_fields(self.config.play_fields)
            .apply_and_get_final_scores(&self.meeples, &mut self.state);
        self.clear_turn();
        self.phase = TurnPhase::Finished;
        self.final_scores = Some(rows.clone());
        info!(
            winner = rows.first().map(|r| r.name.as_str()).unwrap_or(""),
            "game finished"
        );
        vec![GameEvent::GameEnded { scores: rows }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{base_tile, START_TILE_ID};
    use crate::edge::EdgeLabel;
    use crate::tile::{LocalZone, TileDefinition};
    use pretty_assertions::assert_eq;

    fn deck_of(ids: &[&str]) -> Deck {
        let definitions: Vec<TileDefinition> = ids
            .iter()
            .filter_map(|id| base_tile(id))
            .map(|mut def| {
                def.quantity = 1;
                def
            })
            .collect();
        Deck::from_definitions(&definitions)
    }

    fn session(ids: &[&str]) -> GameSession {
        GameSession::new(&["Ann", "Ben"], GameConfig::default(), deck_of(ids)).unwrap()
    }

    fn origin() -> Coord {
        GameConfig::default().origin
    }

    #[test]
    fn test_player_count_limits() {
        assert_eq!(
            GameSession::new(&["Solo"], GameConfig::default(), Deck::test_deck()).unwrap_err(),
            GameError::InvalidPlayerCount(1)
        );
        assert!(GameSession::new(&["A", "B", "C"], GameConfig::default(), Deck::test_deck()).is_ok());

        let config = GameConfig {
            test_deck: true,
            ..GameConfig::default()
        };
        let game = GameSession::from_config(&["A", "B", "C", "D", "E", "F"], config).unwrap();
        assert_eq!(game.state().player_count(), 6);
        assert_eq!(game.deck().remaining(), Deck::test_deck().remaining());
        assert_eq!(
            GameSession::from_config(&["A", "B", "C", "D", "E", "F", "G"], config).unwrap_err(),
            GameError::InvalidPlayerCount(7)
        );
    }

    #[test]
    fn test_game_state_turn_order() {
        let mut state = GameState::new(&["Ann", "Ben", "Cid"], 7);
        assert!(state.is_player_turn(0));
        assert_eq!(state.advance_turn(), Some(1));
        assert_eq!(state.advance_turn(), Some(2));
        assert_eq!(state.advance_turn(), Some(0));
        assert_eq!(state.get_player(2).unwrap().meeples, 7);
    }

    #[test]
    fn test_draw_requires_turn_and_phase() {
        let mut game = session(&[START_TILE_ID]);
        assert_eq!(
            game.apply_action(1, GameAction::DrawTile).unwrap_err(),
            GameError::NotYourTurn
        );
        assert_eq!(
            game.apply_action(9, GameAction::DrawTile).unwrap_err(),
            GameError::UnknownPlayer(9)
        );

        let events = game.apply_action(0, GameAction::DrawTile).unwrap();
        assert!(matches!(
            events[0],
            GameEvent::TileDrawn { player: 0, remaining: 0, .. }
        ));
        assert_eq!(game.phase(), TurnPhase::TileInHand);
        assert_eq!(
            game.apply_action(0, GameAction::DrawTile).unwrap_err(),
            GameError::InvalidPhase
        );
    }

    #[test]
    fn test_first_tile_must_go_to_origin() {
        let mut game = session(&[START_TILE_ID]);
        game.apply_action(0, GameAction::DrawTile).unwrap();
        assert_eq!(
            game.apply_action(0, GameAction::PlaceTile(Coord::new(3, 3)))
                .unwrap_err(),
            GameError::InvalidLocation
        );
        game.apply_action(0, GameAction::PlaceTile(origin())).unwrap();
        assert_eq!(game.phase(), TurnPhase::TilePlaced);
        assert_eq!(game.board().len(), 1);
    }

    #[test]
    fn test_rotation_actions() {
        let mut game = session(&[START_TILE_ID]);
        assert_eq!(
            game.apply_action(0, GameAction::RotateTile).unwrap_err(),
            GameError::InvalidPhase
        );
        game.apply_action(0, GameAction::DrawTile).unwrap();
        game.apply_action(0, GameAction::RotateTile).unwrap();
        game.apply_action(0, GameAction::RotateTile).unwrap();
        assert_eq!(game.tile_in_hand().unwrap().rotation, Rotation::R180);
        let events = game
            .apply_action(0, GameAction::SetRotation(Rotation::R270))
            .unwrap();
        assert_eq!(
            events,
            vec![GameEvent::TileRotated {
                player: 0,
                rotation: Rotation::R270
            }]
        );
    }

    #[test]
    fn test_placement_rejections() {
        // Start tile has a city on its north side, base-05 is a city cap
        let mut game = session(&[START_TILE_ID, "base-05", "base-05"]);
        game.apply_action(0, GameAction::DrawTile).unwrap();
        game.apply_action(0, GameAction::PlaceTile(origin())).unwrap();
        game.apply_action(0, GameAction::EndTurn).unwrap();

        game.apply_action(1, GameAction::DrawTile).unwrap();
        assert_eq!(
            game.apply_action(1, GameAction::PlaceTile(Coord::new(10, 10)))
                .unwrap_err(),
            GameError::InvalidLocation
        );
        assert_eq!(
            game.apply_action(1, GameAction::PlaceTile(origin()))
                .unwrap_err(),
            GameError::InvalidLocation
        );
        // Unrotated, the cap's city would face the start tile's southern field
        assert_eq!(
            game.apply_action(1, GameAction::PlaceTile(Coord::new(50, 51)))
                .unwrap_err(),
            GameError::EdgeMismatch
        );
        assert!(game.tile_in_hand().is_some());
    }

    #[test]
    fn test_placement_at_grid_rim() {
        let mut game = session(&[START_TILE_ID, "base-05"]);
        game.apply_action(0, GameAction::DrawTile).unwrap();
        game.apply_action(0, GameAction::PlaceTile(origin())).unwrap();
        game.apply_action(0, GameAction::EndTurn).unwrap();

        game.apply_action(1, GameAction::DrawTile).unwrap();
        for coord in [Coord::new(i32::MAX, 0), Coord::new(i32::MIN, i32::MIN)] {
            assert_eq!(
                game.apply_action(1, GameAction::PlaceTile(coord)).unwrap_err(),
                GameError::InvalidLocation
            );
        }

        // A game anchored in the corner of the grid still plays out
        let config = GameConfig {
            origin: Coord::new(i32::MAX, i32::MAX),
            ..GameConfig::default()
        };
        let mut game =
            GameSession::new(&["Ann", "Ben"], config, deck_of(&[START_TILE_ID])).unwrap();
        game.apply_action(0, GameAction::DrawTile).unwrap();
        game.apply_action(0, GameAction::PlaceTile(config.origin)).unwrap();
        game.apply_action(0, GameAction::EndTurn).unwrap();
        assert!(game.is_finished());
    }

    #[test]
    fn test_meeple_validation() {
        let config = GameConfig {
            play_fields: false,
            ..GameConfig::default()
        };
        let mut game = GameSession::new(&["Ann", "Ben"], config, deck_of(&[START_TILE_ID])).unwrap();
        game.apply_action(0, GameAction::DrawTile).unwrap();
        assert_eq!(
            game.apply_action(
                0,
                GameAction::PlaceMeeple {
                    coord: origin(),
                    position: 3,
                    kind: MeepleKind::Knight
                }
            )
            .unwrap_err(),
            GameError::InvalidPhase
        );
        game.apply_action(0, GameAction::PlaceTile(origin())).unwrap();

        let place = |position, kind| GameAction::PlaceMeeple {
            coord: origin(),
            position,
            kind,
        };
        assert_eq!(
            game.apply_action(0, place(3, MeepleKind::Thief)).unwrap_err(),
            GameError::InvalidMeepleKind {
                expected: MeepleKind::Knight,
                got: MeepleKind::Thief
            }
        );
        assert_eq!(
            game.apply_action(0, place(23, MeepleKind::Farmer)).unwrap_err(),
            GameError::FieldsDisabled
        );
        assert_eq!(
            game.apply_action(0, place(1, MeepleKind::Knight)).unwrap_err(),
            GameError::NoZoneAtPosition
        );

        game.apply_action(0, place(13, MeepleKind::Thief)).unwrap();
        assert_eq!(game.state().players[0].meeples, 6);
        assert_eq!(
            game.apply_action(0, place(3, MeepleKind::Knight)).unwrap_err(),
            GameError::MeepleAlreadyPlaced
        );
    }

    #[test]
    fn test_zone_occupied_by_earlier_meeple() {
        // Two straight roads in a row: the second tile's road is the same zone
        let mut game = session(&[START_TILE_ID, "base-04"]);
        game.apply_action(0, GameAction::DrawTile).unwrap();
        game.apply_action(0, GameAction::PlaceTile(origin())).unwrap();
        game.apply_action(
            0,
            GameAction::PlaceMeeple {
                coord: origin(),
                position: 13,
                kind: MeepleKind::Thief,
            },
        )
        .unwrap();
        game.apply_action(0, GameAction::EndTurn).unwrap();

        let east = Coord::new(51, 50);
        game.apply_action(1, GameAction::DrawTile).unwrap();
        game.apply_action(1, GameAction::PlaceTile(east)).unwrap();
        assert_eq!(
            game.apply_action(
                1,
                GameAction::PlaceMeeple {
                    coord: east,
                    position: 13,
                    kind: MeepleKind::Thief
                }
            )
            .unwrap_err(),
            GameError::ZoneOccupied
        );
    }

    #[test]
    fn test_undo_meeple_then_tile() {
        let mut game = session(&[START_TILE_ID]);
        assert_eq!(
            game.apply_action(0, GameAction::Undo).unwrap(),
            vec![GameEvent::NothingToUndo]
        );
        game.apply_action(0, GameAction::DrawTile).unwrap();
        let before_tile = game.snapshot();
        game.apply_action(0, GameAction::PlaceTile(origin())).unwrap();
        let after_tile = game.snapshot();
        game.apply_action(
            0,
            GameAction::PlaceMeeple {
                coord: origin(),
                position: 3,
                kind: MeepleKind::Knight,
            },
        )
        .unwrap();
        assert!(game.can_undo());

        let events = game.apply_action(0, GameAction::Undo).unwrap();
        assert_eq!(
            events[0],
            GameEvent::ActionUndone {
                undone: UndoneAction::Meeple {
                    x: 50,
                    y: 50,
                    position: 3
                }
            }
        );
        assert_eq!(game.snapshot(), after_tile);
        assert_eq!(game.phase(), TurnPhase::TilePlaced);

        let events = game.apply_action(0, GameAction::Undo).unwrap();
        assert_eq!(
            events,
            vec![GameEvent::ActionUndone {
                undone: UndoneAction::Tile {
                    x: 50,
                    y: 50,
                    tile_id: START_TILE_ID.into()
                }
            }]
        );
        assert_eq!(game.snapshot(), before_tile);
        assert_eq!(game.phase(), TurnPhase::TileInHand);
        assert_eq!(game.tile_in_hand().unwrap().id, START_TILE_ID);
        assert_eq!(
            game.apply_action(0, GameAction::Undo).unwrap(),
            vec![GameEvent::NothingToUndo]
        );
    }

    #[test]
    fn test_destroy_only_unplaceable_tiles() {
        let mut game = session(&[START_TILE_ID, "base-05"]);
        game.apply_action(0, GameAction::DrawTile).unwrap();
        assert_eq!(
            game.apply_action(0, GameAction::DestroyTile).unwrap_err(),
            GameError::TilePlaceable
        );
    }

    #[test]
    fn test_destroy_returns_to_draw() {
        // Roads on every side never fit against a field on every side
        let cloister = TileDefinition::new(
            "cloister",
            1,
            vec![
                LocalZone::monastery().anchors(&[13]),
                LocalZone::field(&[
                    EdgeLabel::North,
                    EdgeLabel::East,
                    EdgeLabel::South,
                    EdgeLabel::West,
                ])
                .anchors(&[1]),
            ],
        );
        let crossing = TileDefinition::new(
            "crossing",
            1,
            vec![LocalZone::road(&[
                EdgeLabel::North,
                EdgeLabel::East,
                EdgeLabel::South,
                EdgeLabel::West,
            ])
            .anchors(&[13])],
        );
        let mut game = GameSession::new(
            &["Ann", "Ben"],
            GameConfig::default(),
            Deck::from_definitions(&[cloister, crossing]),
        )
        .unwrap();
        game.apply_action(0, GameAction::DrawTile).unwrap();
        game.apply_action(0, GameAction::PlaceTile(origin())).unwrap();
        game.apply_action(0, GameAction::EndTurn).unwrap();

        game.apply_action(1, GameAction::DrawTile).unwrap();
        assert!(game.placements_for_tile_in_hand().is_empty());
        let events = game.apply_action(1, GameAction::DestroyTile).unwrap();
        assert_eq!(
            events,
            vec![GameEvent::TileDestroyed {
                player: 1,
                tile_id: "crossing".into()
            }]
        );
        assert_eq!(game.phase(), TurnPhase::AwaitingDraw);
        assert!(game.state().is_player_turn(1));

        // Deck is now empty: drawing ends the game
        let events = game.apply_action(1, GameAction::DrawTile).unwrap();
        assert_eq!(events[0], GameEvent::DeckExhausted);
        assert!(game.is_finished());
        assert_eq!(
            game.apply_action(1, GameAction::DrawTile).unwrap_err(),
            GameError::GameOver
        );
    }

    #[test]
    fn test_end_turn_requires_placed_tile() {
        let mut game = session(&[START_TILE_ID, "base-05"]);
        assert_eq!(
            game.apply_action(0, GameAction::EndTurn).unwrap_err(),
            GameError::InvalidPhase
        );
        game.apply_action(0, GameAction::DrawTile).unwrap();
        game.apply_action(0, GameAction::PlaceTile(origin())).unwrap();
        let events = game.apply_action(0, GameAction::EndTurn).unwrap();
        assert_eq!(
            events,
            vec![GameEvent::TurnEnded {
                player: 0,
                next_player: 1
            }]
        );
        assert!(!game.can_undo());
        assert_eq!(game.phase(), TurnPhase::AwaitingDraw);
    }

    #[test]
    fn test_last_turn_finishes_game() {
        let mut game = session(&[START_TILE_ID]);
        game.apply_action(0, GameAction::DrawTile).unwrap();
        game.apply_action(0, GameAction::PlaceTile(origin())).unwrap();
        game.apply_action(
            0,
            GameAction::PlaceMeeple {
                coord: origin(),
                position: 3,
                kind: MeepleKind::Knight,
            },
        )
        .unwrap();
        let events = game.apply_action(0, GameAction::EndTurn).unwrap();
        assert!(events.contains(&GameEvent::DeckExhausted));
        assert!(game.is_finished());

        // Unfinished one-tile city: one point for its single tile
        let rows = game.final_scores().unwrap();
        assert_eq!(rows[0].name, "Ann");
        assert_eq!(rows[0].cities, 1);
        assert_eq!(rows[0].total, 1);
    }

    #[test]
    fn test_receive_game_ended_overwrites_scores() {
        let mut game = session(&[START_TILE_ID]);
        let mut rows = crate::scoring::final_rows(game.state());
        rows[1].roads = 4;
        rows[1].total = 4;
        let events = game.receive_game_ended(rows.clone());
        assert_eq!(events, vec![GameEvent::GameEnded { scores: rows }]);
        assert_eq!(game.state().players[1].score, 4);
        assert_eq!(game.state().players[1].score_detail.roads, 4);
        assert!(game.is_finished());
    }

    #[test]
    fn test_restart_clears_table() {
        let mut game = session(&[START_TILE_ID]);
        game.apply_action(0, GameAction::DrawTile).unwrap();
        game.apply_action(0, GameAction::PlaceTile(origin())).unwrap();

        game.restart(
            GameState::new(&["Cid", "Dee", "Eve"], 5),
            GameConfig::default(),
            Deck::test_deck(),
        );
        assert!(game.board().is_empty());
        assert!(game.registry().is_empty());
        assert_eq!(game.state().player_count(), 3);
        assert_eq!(game.phase(), TurnPhase::AwaitingDraw);
        assert!(!game.can_undo());
    }
}
