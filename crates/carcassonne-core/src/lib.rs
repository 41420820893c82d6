//! Carcassonne - a peer-to-peer tile-laying game engine
//!
//! This crate provides the core game logic, including:
//! - Square grid geometry with rotation-aware sub-edges
//! - Tile definitions and the base game catalog
//! - Incremental zone merging as tiles are placed
//! - Turn-end and game-end scoring
//! - A turn state machine with two-level undo
//! - Message replay keeping several peers in step
//!
//! # Architecture
//!
//! The engine is platform-agnostic. It can be compiled to:
//! - Native Rust for tests and tooling
//! - WebAssembly for the browser client (`wasm` feature)
//!
//! # Modules
//!
//! - [`edge`]: Coordinates, sides, sub-edge labels and rotations
//! - [`tile`]: Tile layouts and rotated lookups
//! - [`catalog`]: The 24 base tile kinds
//! - [`deck`]: The draw pile
//! - [`board`]: Placed tiles and placement legality
//! - [`zones`]: Merged zone records
//! - [`merger`]: Folding new tiles into the zone registry
//! - [`scoring`]: Points for closed and unfinished zones
//! - [`game`]: Game state and the per-peer session
//! - [`undo`]: Turn snapshots
//! - [`sync`]: Network messages and replay

pub mod actions;
pub mod board;
pub mod catalog;
pub mod config;
pub mod deck;
pub mod edge;
pub mod game;
pub mod merger;
pub mod player;
pub mod scoring;
pub mod sync;
pub mod tile;
pub mod undo;
#[cfg(feature = "wasm")]
pub mod wasm;
pub mod zones;

// Re-export commonly used types
pub use actions::{GameAction, GameEvent, Publisher, UndoneAction};
pub use board::Board;
pub use catalog::{base_tile, base_tiles, START_TILE_ID};
pub use config::GameConfig;
pub use deck::{Deck, DeckError};
pub use edge::{Coord, Direction, EdgeLabel, Rotation};
pub use game::{GameError, GameSession, GameState, TurnPhase};
pub use merger::{ZoneMerger, ZoneUpdate};
pub use player::{Meeple, MeepleKey, MeepleKind, PlacedMeeples, Player, PlayerColor, PlayerId};
pub use scoring::{ClosedZoneScoring, FinalScoreRow, ScoreAward, Scorer};
pub use sync::{Envelope, GameSync, NetMessage, Outbox, Transport};
pub use tile::{LocalZone, Tile, TileDefinition, ZoneType};
pub use undo::{Snapshot, UndoManager};
pub use zones::{MergedZone, ZoneError, ZoneId, ZoneRegistry};
