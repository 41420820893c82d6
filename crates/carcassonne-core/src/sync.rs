//! Peer synchronization.
//!
//! Every local action is applied to the local session first, then turned into
//! network messages and broadcast. Remote messages are replayed through the
//! same session entry points, so tile placements rebuild the zone topology on
//! every peer while scores and meeple returns are taken verbatim from the peer
//! that ended the turn.

use crate::actions::{GameAction, GameEvent, Publisher, UndoneAction};
use crate::config::GameConfig;
use crate::deck::Deck;
use crate::edge::{Coord, Rotation};
use crate::game::{GameError, GameSession, GameState};
use crate::player::{MeepleKey, MeepleKind, PlayerColor, PlayerId};
use crate::scoring::{FinalScoreRow, ScoreAward};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::{debug, warn};

/// Messages exchanged between peers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum NetMessage {
    #[serde(rename_all = "camelCase")]
    GameStart {
        deck: Deck,
        game_state: GameState,
        config: GameConfig,
    },
    #[serde(rename_all = "camelCase")]
    TileDrawn { tile_id: String },
    TileRotated { rotation: Rotation },
    #[serde(rename_all = "camelCase")]
    TilePlaced {
        x: i32,
        y: i32,
        tile_id: String,
        rotation: Rotation,
    },
    MeeplePlaced {
        x: i32,
        y: i32,
        position: u8,
        kind: MeepleKind,
        color: PlayerColor,
    },
    #[serde(rename_all = "camelCase")]
    ScoreUpdate {
        awards: Vec<ScoreAward>,
        meeples_to_return: Vec<MeepleKey>,
    },
    #[serde(rename_all = "camelCase")]
    TurnEnded {
        next_player_index: usize,
        game_state: GameState,
    },
    TurnUndo { descriptor: UndoneAction },
    #[serde(rename_all = "camelCase")]
    TileDestroyed { tile_id: String },
    #[serde(rename_all = "camelCase")]
    GameEnded { detailed_scores: Vec<FinalScoreRow> },
}

/// A message stamped with the id of the player who sent it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub origin: PlayerId,
    #[serde(flatten)]
    pub message: NetMessage,
}

/// Best-effort channel to the other peers
pub trait Transport {
    /// Send to every other peer
    fn broadcast(&mut self, frame: String);

    /// Send to one peer
    fn send_to(&mut self, peer: PlayerId, frame: String);
}

/// Transport that queues frames until the host drains them
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outbox {
    frames: VecDeque<(Option<PlayerId>, String)>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Take every queued frame with its recipient (`None` for broadcast)
    pub fn drain(&mut self) -> Vec<(Option<PlayerId>, String)> {
        self.frames.drain(..).collect()
    }
}

impl Transport for Outbox {
    fn broadcast(&mut self, frame: String) {
        self.frames.push_back((None, frame));
    }

    fn send_to(&mut self, peer: PlayerId, frame: String) {
        self.frames.push_back((Some(peer), frame));
    }
}

/// Messages other peers need to mirror a batch of local events
pub fn outbound_messages(session: &GameSession, events: &[GameEvent]) -> Vec<NetMessage> {
    events
        .iter()
        .filter_map(|event| match event {
            GameEvent::TileDrawn { tile_id, .. } => Some(NetMessage::TileDrawn {
                tile_id: tile_id.clone(),
            }),
            GameEvent::TileRotated { rotation, .. } => Some(NetMessage::TileRotated {
                rotation: *rotation,
            }),
            GameEvent::TilePlaced {
                location,
                tile_id,
                rotation,
                ..
            } => Some(NetMessage::TilePlaced {
                x: location.x,
                y: location.y,
                tile_id: tile_id.clone(),
                rotation: *rotation,
            }),
            GameEvent::MeeplePlaced {
                key, kind, color, ..
            } => Some(NetMessage::MeeplePlaced {
                x: key.x,
                y: key.y,
                position: key.position,
                kind: *kind,
                color: *color,
            }),
            GameEvent::ScoresAwarded { awards, returned } => Some(NetMessage::ScoreUpdate {
                awards: awards.clone(),
                meeples_to_return: returned.clone(),
            }),
            GameEvent::TurnEnded { .. } => Some(NetMessage::TurnEnded {
                next_player_index: session.state().current_player_index,
                game_state: session.state().clone(),
            }),
            GameEvent::ActionUndone { undone } => Some(NetMessage::TurnUndo {
                descriptor: undone.clone(),
            }),
            GameEvent::TileDestroyed { tile_id, .. } => Some(NetMessage::TileDestroyed {
                tile_id: tile_id.clone(),
            }),
            GameEvent::GameEnded { scores } => Some(NetMessage::GameEnded {
                detailed_scores: scores.clone(),
            }),
            _ => None,
        })
        .collect()
}

/// One peer's view of a networked game
pub struct GameSync<T, P> {
    local_player: PlayerId,
    session: Option<GameSession>,
    transport: T,
    publisher: P,
}

impl<T: Transport, P: Publisher<GameEvent>> GameSync<T, P> {
    pub fn new(local_player: PlayerId, transport: T, publisher: P) -> Self {
        Self {
            local_player,
            session: None,
            transport,
            publisher,
        }
    }

    pub fn local_player(&self) -> PlayerId {
        self.local_player
    }

    pub fn session(&self) -> Option<&GameSession> {
        self.session.as_ref()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn publisher(&self) -> &P {
        &self.publisher
    }

    pub fn publisher_mut(&mut self) -> &mut P {
        &mut self.publisher
    }

    /// Host a new game and tell every peer about it
    pub fn start_game<S: AsRef<str>>(
        &mut self,
        names: &[S],
        config: GameConfig,
        deck: Deck,
    ) -> Result<(), GameError> {
        let session = GameSession::new(names, config, deck.clone())?;
        let message = NetMessage::GameStart {
            deck,
            game_state: session.state().clone(),
            config,
        };
        let started = Self::started_event(&session);
        self.session = Some(session);

        Self::send(&mut self.transport, self.local_player, message);
        self.publisher.publish(started);
        Ok(())
    }

    /// Apply a local action and broadcast what changed
    pub fn submit(&mut self, action: GameAction) -> Result<Vec<GameEvent>, GameError> {
        let session = self.session.as_mut().ok_or(GameError::NotStarted)?;
        let events = session.apply_action(self.local_player, action)?;

        for message in outbound_messages(session, &events) {
            Self::send(&mut self.transport, self.local_player, message);
        }
        self.publisher.publish_all(events.iter().cloned());
        Ok(events)
    }

    /// Replay a frame received from the network.
    ///
    /// Malformed frames, our own echoed frames and messages the session
    /// rejects are dropped with a log line.
    pub fn receive(&mut self, frame: &str) -> Vec<GameEvent> {
        let envelope: Envelope = match serde_json::from_str(frame) {
            Ok(envelope) => envelope,
            Err(err) => {
                warn!(%err, "ignoring malformed message");
                return Vec::new();
            }
        };
        if envelope.origin == self.local_player {
            debug!("ignoring own message");
            return Vec::new();
        }

        let origin = envelope.origin;
        debug!(origin, message = ?envelope.message, "replaying remote message");
        let events = match self.replay(origin, envelope.message) {
            Ok(events) => events,
            Err(err) => {
                warn!(%err, origin, "remote message rejected");
                return Vec::new();
            }
        };
        self.publisher.publish_all(events.iter().cloned());
        events
    }

    fn replay(&mut self, origin: PlayerId, message: NetMessage) -> Result<Vec<GameEvent>, GameError> {
        if let NetMessage::GameStart {
            deck,
            game_state,
            config,
        } = message
        {
            let session = match self.session.take() {
                Some(mut session) => {
                    session.restart(game_state, config, deck);
                    session
                }
                None => GameSession::from_state(game_state, config, deck),
            };
            let started = Self::started_event(&session);
            self.session = Some(session);
            return Ok(vec![started]);
        }

        let session = self.session.as_mut().ok_or(GameError::NotStarted)?;
        match message {
            NetMessage::GameStart { .. } => Ok(Vec::new()),
            NetMessage::TileDrawn { tile_id } => {
                if let Some(next) = session.deck().peek() {
                    if next.id != tile_id {
                        warn!(expected = %tile_id, found = %next.id, "deck out of step with peer");
                    }
                }
                session.apply_action(origin, GameAction::DrawTile)
            }
            NetMessage::TileRotated { rotation } => {
                session.apply_action(origin, GameAction::SetRotation(rotation))
            }
            NetMessage::TilePlaced {
                x,
                y,
                tile_id,
                rotation,
            } => {
                if session.tile_in_hand().map(|t| t.id.as_str()) != Some(tile_id.as_str()) {
                    warn!(%tile_id, "placed tile differs from the tile in hand");
                }
                let mut events = session.apply_action(origin, GameAction::SetRotation(rotation))?;
                events.extend(session.apply_action(origin, GameAction::PlaceTile(Coord::new(x, y)))?);
                Ok(events)
            }
            NetMessage::MeeplePlaced {
                x,
                y,
                position,
                kind,
                ..
            } => session.apply_action(
                origin,
                GameAction::PlaceMeeple {
                    coord: Coord::new(x, y),
                    position,
                    kind,
                },
            ),
            NetMessage::ScoreUpdate {
                awards,
                meeples_to_return,
            } => Ok(session.apply_score_update(&awards, &meeples_to_return)),
            NetMessage::TurnEnded {
                next_player_index,
                game_state,
            } => Ok(session.receive_turn_ended(next_player_index, game_state)),
            NetMessage::TurnUndo { descriptor } => Ok(session.apply_remote_undo(&descriptor)),
            NetMessage::TileDestroyed { .. } => session.apply_action(origin, GameAction::DestroyTile),
            NetMessage::GameEnded { detailed_scores } => {
                Ok(session.receive_game_ended(detailed_scores))
            }
        }
    }

    fn started_event(session: &GameSession) -> GameEvent {
        GameEvent::GameStarted {
            players: session.state().players.iter().map(|p| p.id).collect(),
            first_player: session.state().current_player_id().unwrap_or_default(),
        }
    }

    fn send(transport: &mut T, origin: PlayerId, message: NetMessage) {
        let envelope = Envelope { origin, message };
        match serde_json::to_string(&envelope) {
            Ok(frame) => transport.broadcast(frame),
            Err(err) => warn!(%err, "failed to encode message"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::START_TILE_ID;
    use pretty_assertions::assert_eq;

    fn peers() -> (GameSync<Outbox, Vec<GameEvent>>, GameSync<Outbox, Vec<GameEvent>>) {
        (
            GameSync::new(0, Outbox::new(), Vec::new()),
            GameSync::new(1, Outbox::new(), Vec::new()),
        )
    }

    fn deliver(from: &mut GameSync<Outbox, Vec<GameEvent>>, to: &mut GameSync<Outbox, Vec<GameEvent>>) {
        for (_, frame) in from.transport_mut().drain() {
            to.receive(&frame);
        }
    }

    #[test]
    fn test_envelope_wire_format() {
        let envelope = Envelope {
            origin: 2,
            message: NetMessage::TilePlaced {
                x: 50,
                y: 49,
                tile_id: "base-05".into(),
                rotation: Rotation::R180,
            },
        };
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["type"], "tile-placed");
        assert_eq!(json["origin"], 2);
        assert_eq!(json["tileId"], "base-05");
        assert_eq!(json["rotation"], 180);

        let back: Envelope = serde_json::from_value(json).unwrap();
        assert_eq!(back, envelope);
    }

    #[test]
    fn test_malformed_and_unknown_messages_ignored() {
        let (_, mut guest) = peers();
        assert!(guest.receive("not json").is_empty());
        assert!(guest
            .receive(r#"{"origin":0,"type":"fireworks"}"#)
            .is_empty());
        // Valid message, but no game yet
        assert!(guest
            .receive(r#"{"origin":0,"type":"tile-rotated","rotation":90}"#)
            .is_empty());
        assert!(guest.publisher().is_empty());
    }

    #[test]
    fn test_own_messages_filtered() {
        let (mut host, _) = peers();
        host.start_game(&["Ann", "Ben"], GameConfig::default(), Deck::test_deck())
            .unwrap();
        let frames = host.transport_mut().drain();
        assert_eq!(frames.len(), 1);
        assert!(host.receive(&frames[0].1).is_empty());
    }

    #[test]
    fn test_submit_without_game() {
        let (mut host, _) = peers();
        assert_eq!(
            host.submit(GameAction::DrawTile).unwrap_err(),
            GameError::NotStarted
        );
    }

    #[test]
    fn test_guest_mirrors_first_turn() {
        let (mut host, mut guest) = peers();
        let config = GameConfig {
            test_deck: true,
            ..GameConfig::default()
        };
        host.start_game(&["Ann", "Ben"], config, Deck::test_deck())
            .unwrap();
        deliver(&mut host, &mut guest);
        assert!(matches!(
            guest.publisher()[0],
            GameEvent::GameStarted { first_player: 0, .. }
        ));

        host.submit(GameAction::DrawTile).unwrap();
        host.submit(GameAction::RotateTile).unwrap();
        host.submit(GameAction::PlaceTile(config.origin)).unwrap();
        host.submit(GameAction::EndTurn).unwrap();
        deliver(&mut host, &mut guest);

        let h = host.session().unwrap();
        let g = guest.session().unwrap();
        assert_eq!(g.board(), h.board());
        assert_eq!(g.registry(), h.registry());
        assert_eq!(g.state(), h.state());
        assert!(g.state().is_player_turn(1));
        assert_eq!(g.deck().remaining(), h.deck().remaining());
    }

    #[test]
    fn test_remote_tile_undo() {
        let (mut host, mut guest) = peers();
        let deck = Deck::from_definitions(&[crate::catalog::base_tile(START_TILE_ID).unwrap()]);
        host.start_game(&["Ann", "Ben"], GameConfig::default(), deck)
            .unwrap();
        host.submit(GameAction::DrawTile).unwrap();
        host.submit(GameAction::PlaceTile(GameConfig::default().origin))
            .unwrap();
        deliver(&mut host, &mut guest);
        assert_eq!(guest.session().unwrap().board().len(), 1);

        host.submit(GameAction::Undo).unwrap();
        deliver(&mut host, &mut guest);
        let g = guest.session().unwrap();
        assert!(g.board().is_empty());
        assert!(g.registry().is_empty());
        assert_eq!(g.tile_in_hand().unwrap().id, START_TILE_ID);
    }

    #[test]
    fn test_remote_meeple_undo() {
        let (mut host, mut guest) = peers();
        let mut start = crate::catalog::base_tile(START_TILE_ID).unwrap();
        start.quantity = 2;
        let origin = GameConfig::default().origin;
        let knight = GameAction::PlaceMeeple {
            coord: origin,
            position: 3,
            kind: MeepleKind::Knight,
        };
        host.start_game(&["Ann", "Ben"], GameConfig::default(), Deck::from_definitions(&[start]))
            .unwrap();
        host.submit(GameAction::DrawTile).unwrap();
        host.submit(GameAction::PlaceTile(origin)).unwrap();
        host.submit(knight.clone()).unwrap();
        deliver(&mut host, &mut guest);
        assert_eq!(guest.session().unwrap().meeples().len(), 1);

        host.submit(GameAction::Undo).unwrap();
        deliver(&mut host, &mut guest);
        let g = guest.session().unwrap();
        assert!(g.meeples().is_empty());
        assert_eq!(g.board().len(), 1);
        assert_eq!(g.state().get_player(0).unwrap().meeples, 7);
        assert_eq!(g.snapshot(), host.session().unwrap().snapshot());

        host.submit(knight).unwrap();
        host.submit(GameAction::EndTurn).unwrap();
        deliver(&mut host, &mut guest);
        let h = host.session().unwrap();
        let g = guest.session().unwrap();
        assert_eq!(g.snapshot(), h.snapshot());
        assert_eq!(g.state(), h.state());
        assert_eq!(g.state().get_player(0).unwrap().meeples, 6);
        assert!(g.state().is_player_turn(1));
    }

    #[test]
    fn test_outbox_direct_frames() {
        let mut outbox = Outbox::new();
        outbox.broadcast("a".into());
        outbox.send_to(3, "b".into());
        assert_eq!(outbox.len(), 2);
        assert_eq!(
            outbox.drain(),
            vec![(None, "a".to_string()), (Some(3), "b".to_string())]
        );
        assert!(outbox.is_empty());
    }
}
