//! Room and seat management.

use carcassonne_core::game::{MAX_PLAYERS, MIN_PLAYERS};
use carcassonne_core::{GameConfig, PlayerId};
use std::collections::HashMap;
use thiserror::Error;
use uuid::Uuid;

use crate::protocol::{PlayerInfo, RoomInfo, RoomStatus, SeatInfo};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RoomError {
    #[error("Room is full")]
    RoomFull,

    #[error("Room not found")]
    RoomNotFound,

    #[error("Player not in room")]
    PlayerNotInRoom,

    #[error("Not the host")]
    NotHost,

    #[error("Game already started")]
    GameAlreadyStarted,

    #[error("Not enough players")]
    NotEnoughPlayers,

    #[error("Game not started")]
    GameNotStarted,

    #[error("Nobody sits at seat {0}")]
    UnknownSeat(PlayerId),
}

/// A player in a room.
#[derive(Debug, Clone)]
pub struct RoomPlayer {
    pub id: Uuid,
    pub name: String,
    pub connected: bool,
    /// Seat in the game, assigned when the game starts
    pub seat: Option<PlayerId>,
}

impl RoomPlayer {
    pub fn new(id: Uuid, name: String) -> Self {
        Self {
            id,
            name,
            connected: true,
            seat: None,
        }
    }

    pub fn to_info(&self) -> PlayerInfo {
        PlayerInfo {
            id: self.id,
            name: self.name.clone(),
            seat: self.seat,
            connected: self.connected,
        }
    }
}

/// A room of peers playing one game.
pub struct GameRoom {
    pub id: Uuid,
    pub name: String,
    pub max_players: u8,
    pub host_id: Uuid,
    pub status: RoomStatus,
    pub players: HashMap<Uuid, RoomPlayer>,
    /// Join order, which becomes seat order
    pub player_order: Vec<Uuid>,
    /// Options the host started the game with
    pub config: Option<GameConfig>,
}

impl GameRoom {
    pub fn new(id: Uuid, host_id: Uuid, host_name: String, max_players: u8) -> Self {
        let mut players = HashMap::new();
        players.insert(host_id, RoomPlayer::new(host_id, host_name.clone()));

        Self {
            id,
            name: format!("{}'s Game", host_name),
            max_players: max_players.clamp(MIN_PLAYERS as u8, MAX_PLAYERS as u8),
            host_id,
            status: RoomStatus::Waiting,
            players,
            player_order: vec![host_id],
            config: None,
        }
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn is_full(&self) -> bool {
        self.players.len() >= self.max_players as usize
    }

    pub fn add_player(&mut self, player_id: Uuid, name: String) -> Result<(), RoomError> {
        if self.status != RoomStatus::Waiting {
            return Err(RoomError::GameAlreadyStarted);
        }
        if self.is_full() {
            return Err(RoomError::RoomFull);
        }

        self.players.insert(player_id, RoomPlayer::new(player_id, name));
        self.player_order.push(player_id);
        Ok(())
    }

    pub fn remove_player(&mut self, player_id: Uuid) -> Result<bool, RoomError> {
        if !self.players.contains_key(&player_id) {
            return Err(RoomError::PlayerNotInRoom);
        }

        self.players.remove(&player_id);
        self.player_order.retain(|&id| id != player_id);

        // If host left, assign new host
        if player_id == self.host_id && !self.player_order.is_empty() {
            self.host_id = self.player_order[0];
        }

        // Return true if room is now empty
        Ok(self.players.is_empty())
    }

    pub fn set_player_connected(&mut self, player_id: Uuid, connected: bool) {
        if let Some(player) = self.players.get_mut(&player_id) {
            player.connected = connected;
        }
    }

    /// Whether anyone in the room still has a live connection
    pub fn has_connected_players(&self) -> bool {
        self.players.values().any(|p| p.connected)
    }

    /// Seat players in join order and lock the room
    pub fn start_game(
        &mut self,
        requester_id: Uuid,
        config: GameConfig,
    ) -> Result<Vec<SeatInfo>, RoomError> {
        if requester_id != self.host_id {
            return Err(RoomError::NotHost);
        }
        if self.status != RoomStatus::Waiting {
            return Err(RoomError::GameAlreadyStarted);
        }
        if self.players.len() < MIN_PLAYERS {
            return Err(RoomError::NotEnoughPlayers);
        }

        let mut seats = Vec::with_capacity(self.player_order.len());
        for (idx, &player_id) in self.player_order.iter().enumerate() {
            if let Some(player) = self.players.get_mut(&player_id) {
                let seat = idx as PlayerId;
                player.seat = Some(seat);
                seats.push(SeatInfo {
                    seat,
                    player_id,
                    name: player.name.clone(),
                });
            }
        }

        self.config = Some(config);
        self.status = RoomStatus::InGame;
        Ok(seats)
    }

    pub fn seat_of(&self, player_id: Uuid) -> Result<PlayerId, RoomError> {
        let player = self
            .players
            .get(&player_id)
            .ok_or(RoomError::PlayerNotInRoom)?;
        player.seat.ok_or(RoomError::GameNotStarted)
    }

    pub fn player_at_seat(&self, seat: PlayerId) -> Option<Uuid> {
        self.players
            .values()
            .find(|p| p.seat == Some(seat))
            .map(|p| p.id)
    }

    /// Sender seat and recipients of a relayed game message.
    ///
    /// Without a target seat the message goes to everyone but the sender.
    pub fn relay_targets(
        &self,
        from: Uuid,
        to: Option<PlayerId>,
    ) -> Result<(PlayerId, Vec<Uuid>), RoomError> {
        if self.status != RoomStatus::InGame {
            return Err(RoomError::GameNotStarted);
        }
        let seat = self.seat_of(from)?;

        let targets = match to {
            Some(target) => vec![self
                .player_at_seat(target)
                .ok_or(RoomError::UnknownSeat(target))?],
            None => self
                .player_order
                .iter()
                .copied()
                .filter(|id| *id != from)
                .collect(),
        };
        Ok((seat, targets))
    }

    pub fn to_info(&self) -> RoomInfo {
        RoomInfo {
            id: self.id,
            name: self.name.clone(),
            players: self
                .player_order
                .iter()
                .filter_map(|id| self.players.get(id).map(|p| p.to_info()))
                .collect(),
            max_players: self.max_players,
            host_id: self.host_id,
            status: self.status,
        }
    }
}
