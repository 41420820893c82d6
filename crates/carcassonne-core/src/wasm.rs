//! WebAssembly bindings for the Carcassonne engine.
//!
//! This module exposes a networked game to JavaScript through wasm-bindgen.
//! Outgoing frames are queued and drained by the page, which owns the actual
//! peer connection.

use wasm_bindgen::prelude::*;

use crate::actions::{GameAction, GameEvent};
use crate::config::GameConfig;
use crate::sync::{GameSync, Outbox};

/// Initialize panic hook for better error messages in browser console
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// WASM-exposed game wrapper
#[wasm_bindgen]
pub struct WasmGame {
    sync: GameSync<Outbox, Vec<GameEvent>>,
}

#[wasm_bindgen]
impl WasmGame {
    /// Create a peer with no game yet
    #[wasm_bindgen(constructor)]
    pub fn new(local_player: u8) -> WasmGame {
        WasmGame {
            sync: GameSync::new(local_player, Outbox::new(), Vec::new()),
        }
    }

    /// Host a game; `config_json` may be empty for defaults
    #[wasm_bindgen(js_name = startGame)]
    pub fn start_game(&mut self, player_names_json: &str, config_json: &str) -> Result<(), JsValue> {
        let names: Vec<String> = serde_json::from_str(player_names_json)
            .map_err(|e| JsValue::from_str(&format!("Invalid player names: {}", e)))?;
        let config: GameConfig = if config_json.trim().is_empty() {
            GameConfig::default()
        } else {
            serde_json::from_str(config_json)
                .map_err(|e| JsValue::from_str(&format!("Invalid config: {}", e)))?
        };
        self.sync
            .start_game(&names, config, config.deck())
            .map_err(|e| JsValue::from_str(&format!("Cannot start game: {}", e)))
    }

    /// Apply a local action from JSON, returns events JSON or error
    #[wasm_bindgen(js_name = applyAction)]
    pub fn apply_action(&mut self, action_json: &str) -> Result<String, JsValue> {
        let action: GameAction = serde_json::from_str(action_json)
            .map_err(|e| JsValue::from_str(&format!("Invalid action JSON: {}", e)))?;

        match self.sync.submit(action) {
            Ok(events) => Ok(serde_json::to_string(&events).unwrap_or_else(|_| "[]".to_string())),
            Err(e) => Err(JsValue::from_str(&format!("Action failed: {}", e))),
        }
    }

    /// Replay a frame from another peer, returns events JSON
    #[wasm_bindgen(js_name = receive)]
    pub fn receive(&mut self, frame: &str) -> String {
        let events = self.sync.receive(frame);
        serde_json::to_string(&events).unwrap_or_else(|_| "[]".to_string())
    }

    /// Frames waiting to be sent, as `[{to, frame}]`
    #[wasm_bindgen(js_name = drainOutbox)]
    pub fn drain_outbox(&mut self) -> String {
        let frames: Vec<serde_json::Value> = self
            .sync
            .transport_mut()
            .drain()
            .into_iter()
            .map(|(to, frame)| serde_json::json!({ "to": to, "frame": frame }))
            .collect();
        serde_json::to_string(&frames).unwrap_or_else(|_| "[]".to_string())
    }

    /// Get the whole session as JSON
    #[wasm_bindgen(js_name = getSession)]
    pub fn get_session(&self) -> String {
        match self.sync.session() {
            Some(session) => serde_json::to_string(session).unwrap_or_else(|_| "null".to_string()),
            None => "null".to_string(),
        }
    }

    /// Get the replicated players and turn pointer as JSON
    #[wasm_bindgen(js_name = getState)]
    pub fn get_state(&self) -> String {
        match self.sync.session() {
            Some(session) => {
                serde_json::to_string(session.state()).unwrap_or_else(|_| "null".to_string())
            }
            None => "null".to_string(),
        }
    }

    /// Get board state as JSON (for rendering)
    #[wasm_bindgen(js_name = getBoard)]
    pub fn get_board(&self) -> String {
        match self.sync.session() {
            Some(session) => serde_json::to_string(session.board()).unwrap_or_else(|_| "{}".to_string()),
            None => "{}".to_string(),
        }
    }

    /// Cells and rotations accepting the tile in hand, as `[[{x, y}, rotation]]`
    #[wasm_bindgen(js_name = getPlacements)]
    pub fn get_placements(&self) -> String {
        let placements = self
            .sync
            .session()
            .map(|s| s.placements_for_tile_in_hand())
            .unwrap_or_default();
        serde_json::to_string(&placements).unwrap_or_else(|_| "[]".to_string())
    }

    /// Undrawn tiles per kind as `[{id, count}]`, most plentiful first
    #[wasm_bindgen(js_name = getRemainingTiles)]
    pub fn get_remaining_tiles(&self) -> String {
        let remaining = self
            .sync
            .session()
            .map(|s| s.deck().remaining_by_type())
            .unwrap_or_default();
        serde_json::to_string(&remaining).unwrap_or_else(|_| "[]".to_string())
    }

    /// Whether it is this peer's turn
    #[wasm_bindgen(js_name = isMyTurn)]
    pub fn is_my_turn(&self) -> bool {
        self.sync
            .session()
            .map_or(false, |s| s.state().is_player_turn(self.sync.local_player()))
    }

    /// Check if the game is finished
    #[wasm_bindgen(js_name = isFinished)]
    pub fn is_finished(&self) -> bool {
        self.sync.session().map_or(false, |s| s.is_finished())
    }

    /// Final leaderboard JSON, or null while the game runs
    #[wasm_bindgen(js_name = getFinalScores)]
    pub fn get_final_scores(&self) -> String {
        match self.sync.session().and_then(|s| s.final_scores()) {
            Some(rows) => serde_json::to_string(rows).unwrap_or_else(|_| "null".to_string()),
            None => "null".to_string(),
        }
    }

    /// Events published since the last call, as JSON
    #[wasm_bindgen(js_name = takeEvents)]
    pub fn take_events(&mut self) -> String {
        let events: Vec<GameEvent> = self.sync.publisher_mut().drain(..).collect();
        serde_json::to_string(&events).unwrap_or_else(|_| "[]".to_string())
    }
}
