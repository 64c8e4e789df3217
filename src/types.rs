//! Core types for dartbridge
//!
//! This module contains the domain types shared by the scoring engine, the
//! session aggregator and the upstream/publish layers: throws as reported by
//! the board, the projection of the current player's score, link and stream
//! status, and the published telemetry record.

use crate::error::{BridgeError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Maximum number of darts in one visit
pub const DARTS_PER_VISIT: usize = 3;

/// Highest segment number reported by the board (25 = bull)
pub const MAX_SEGMENT_NUMBER: u8 = 25;

/// Highest multiplier (triple)
pub const MAX_MULTIPLIER: u8 = 3;

/// Label used for a missed or absent dart
pub const MISS_LABEL: &str = "M";

/// A single dart as reported by the board
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Throw {
    /// Segment number (0-25, 0 = miss)
    pub segment_number: u8,
    /// Multiplier (0 = miss, 1 = single, 2 = double, 3 = triple)
    pub multiplier: u8,
    /// Display name provided by the board, if any
    pub label: Option<String>,
}

impl Throw {
    /// Create a throw from a segment number and multiplier
    pub fn new(segment_number: u8, multiplier: u8) -> Self {
        Self {
            segment_number,
            multiplier,
            label: None,
        }
    }

    /// The miss sentinel
    pub fn miss() -> Self {
        Self::new(0, 0)
    }

    /// Attach the board's display name
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Parse a throw from the board's JSON representation
    ///
    /// Expects `{ "segment": { "number": n, "multiplier": m, "name": "..." } }`.
    /// Absent or out-of-range fields are read as a miss.
    pub fn from_value(value: &Value) -> Self {
        let segment = value.get("segment");
        let field = |name: &str| segment.and_then(|s| s.get(name)).and_then(Value::as_u64);

        let number = field("number")
            .filter(|n| *n <= MAX_SEGMENT_NUMBER as u64)
            .map(|n| n as u8);
        let multiplier = field("multiplier")
            .filter(|m| *m <= MAX_MULTIPLIER as u64)
            .map(|m| m as u8);

        let mut throw = match (number, multiplier) {
            (Some(number), Some(multiplier)) => Throw::new(number, multiplier),
            _ => Throw::miss(),
        };
        throw.label = segment
            .and_then(|s| s.get("name"))
            .and_then(Value::as_str)
            .map(str::to_owned);
        throw
    }

    /// Points scored by this dart
    pub fn value(&self) -> u32 {
        if self.multiplier == 0 {
            0
        } else {
            self.segment_number as u32 * self.multiplier as u32
        }
    }

    /// Whether this dart hit the treble twenty
    pub fn is_treble_twenty(&self) -> bool {
        self.multiplier == 3 && self.segment_number == 20
    }
}

/// The darts of the visit in progress (at most three)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThrowSet {
    throws: Vec<Throw>,
}

impl ThrowSet {
    /// Build a throw set, keeping at most the first three darts
    pub fn new(throws: impl IntoIterator<Item = Throw>) -> Self {
        Self {
            throws: throws.into_iter().take(DARTS_PER_VISIT).collect(),
        }
    }

    /// Number of darts thrown this visit
    pub fn len(&self) -> usize {
        self.throws.len()
    }

    /// Whether no dart has been thrown yet
    pub fn is_empty(&self) -> bool {
        self.throws.is_empty()
    }

    /// Dart at the given slot, if thrown
    pub fn get(&self, slot: usize) -> Option<&Throw> {
        self.throws.get(slot)
    }

    /// All darts thrown this visit
    pub fn as_slice(&self) -> &[Throw] {
        &self.throws
    }
}

/// Read-only projection of the current player's score
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlayerScoreView {
    /// Points still needed to finish the leg
    pub remaining: u32,
    /// Whether the player has just won the leg
    pub has_won: bool,
}

/// The parts of a fetched board state the engine consumes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GameState {
    /// Darts of the visit in progress
    pub throws: ThrowSet,
    /// Current player's score
    pub player: PlayerScoreView,
}

impl GameState {
    /// Read a game state from a fetched JSON document
    ///
    /// Missing fields take their neutral value. A `throws` field that is not
    /// an array makes the whole document unusable.
    pub fn from_value(state: &Value) -> Result<Self> {
        let root = state
            .as_object()
            .ok_or_else(|| BridgeError::Payload("state is not a JSON object".to_string()))?;

        let throws = match root.get("throws") {
            None | Some(Value::Null) => ThrowSet::default(),
            Some(Value::Array(items)) => ThrowSet::new(items.iter().map(Throw::from_value)),
            Some(other) => {
                return Err(BridgeError::Payload(format!(
                    "throws is not an array: {}",
                    other
                )))
            }
        };

        Ok(Self {
            throws,
            player: player_view(state),
        })
    }
}

fn player_view(state: &Value) -> PlayerScoreView {
    let index = state
        .get("player")
        .or_else(|| state.get("currentPlayer"))
        .and_then(Value::as_u64)
        .unwrap_or(0) as usize;
    let entry = state
        .get("players")
        .and_then(Value::as_array)
        .and_then(|players| players.get(index));

    let remaining = state
        .get("gameScores")
        .and_then(Value::as_array)
        .and_then(|scores| scores.get(index))
        .and_then(Value::as_i64)
        .or_else(|| entry.and_then(|p| p.get("remaining")).and_then(Value::as_i64))
        .or_else(|| entry.and_then(|p| p.get("score")).and_then(Value::as_i64))
        .or_else(|| state.get("remaining").and_then(Value::as_i64))
        .unwrap_or(0)
        .max(0) as u32;

    let has_won = state
        .get("winner")
        .and_then(Value::as_i64)
        .map(|winner| winner >= 0 && winner as usize == index)
        .or_else(|| {
            entry
                .and_then(|p| p.get("hasWon").or_else(|| p.get("won")))
                .and_then(Value::as_bool)
        })
        .or_else(|| state.get("hasWon").and_then(Value::as_bool))
        .unwrap_or(false);

    PlayerScoreView { remaining, has_won }
}

/// Reachability of the upstream board manager
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkStatus {
    /// Probe answered with success
    Online,
    /// Probe failed or timed out
    Offline,
}

impl LinkStatus {
    /// Wire representation published on the status topic
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkStatus::Online => "online",
            LinkStatus::Offline => "offline",
        }
    }
}

impl std::fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// State of the event stream supervisor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamState {
    /// Opening the WebSocket
    #[default]
    Connecting,
    /// Connected and reading messages
    Streaming,
    /// Waiting before the next connection attempt
    Backoff,
}

impl std::fmt::Display for StreamState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StreamState::Connecting => write!(f, "Connecting"),
            StreamState::Streaming => write!(f, "Streaming"),
            StreamState::Backoff => write!(f, "Backoff"),
        }
    }
}

/// Outcome of the leg as seen by the last record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LegResult {
    Playing,
    Win,
    Offline,
}

/// What the board is waiting for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoardStatus {
    /// Player is throwing
    Throw,
    /// A checkout is on and darts are in the board
    TakeoutInProgress,
    /// The leg was just won; darts should be pulled
    Takeout,
    /// Upstream is unreachable
    Offline,
}

/// The record published on the telemetry topic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryRecord {
    pub dart1: String,
    pub dart2: String,
    pub dart3: String,
    pub dart1_value: u32,
    pub dart2_value: u32,
    pub dart3_value: u32,
    /// Dart labels joined by `" | "`
    pub summary: String,
    pub total: u32,
    pub is_180: bool,
    pub remaining: u32,
    pub checkout_possible: bool,
    pub leg_result: LegResult,
    pub board_status: BoardStatus,
    pub number_of_throws: usize,
    pub three_dart_average: f64,
    pub leg_average: f64,
}

impl TelemetryRecord {
    /// Zeroed snapshot published when the upstream goes offline
    pub fn offline() -> Self {
        Self {
            dart1: MISS_LABEL.to_string(),
            dart2: MISS_LABEL.to_string(),
            dart3: MISS_LABEL.to_string(),
            dart1_value: 0,
            dart2_value: 0,
            dart3_value: 0,
            summary: [MISS_LABEL; DARTS_PER_VISIT].join(" | "),
            total: 0,
            is_180: false,
            remaining: 0,
            checkout_possible: false,
            leg_result: LegResult::Offline,
            board_status: BoardStatus::Offline,
            number_of_throws: 0,
            three_dart_average: 0.0,
            leg_average: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_throw_value() {
        assert_eq!(Throw::new(20, 3).value(), 60);
        assert_eq!(Throw::new(16, 2).value(), 32);
        assert_eq!(Throw::new(5, 1).value(), 5);
        assert_eq!(Throw::new(25, 2).value(), 50);
    }

    #[test]
    fn test_miss_carries_no_score() {
        assert_eq!(Throw::new(20, 0).value(), 0);
        assert_eq!(Throw::miss().value(), 0);
    }

    #[test]
    fn test_throw_from_value() {
        let throw = Throw::from_value(&json!({
            "segment": { "number": 20, "multiplier": 3, "name": "T20" }
        }));
        assert_eq!(throw.segment_number, 20);
        assert_eq!(throw.multiplier, 3);
        assert_eq!(throw.label.as_deref(), Some("T20"));
    }

    #[test]
    fn test_malformed_throw_reads_as_miss() {
        assert_eq!(Throw::from_value(&json!({})), Throw::miss());
        assert_eq!(
            Throw::from_value(&json!({ "segment": { "number": "20", "multiplier": 3 } })),
            Throw::miss()
        );
        assert_eq!(
            Throw::from_value(&json!({ "segment": { "number": 20, "multiplier": 7 } })),
            Throw::miss()
        );
        assert_eq!(
            Throw::from_value(&json!({ "segment": { "number": 40, "multiplier": 1 } })),
            Throw::miss()
        );
    }

    #[test]
    fn test_throw_set_truncates_to_three() {
        let set = ThrowSet::new(vec![Throw::new(1, 1); 5]);
        assert_eq!(set.len(), DARTS_PER_VISIT);
    }

    #[test]
    fn test_game_state_from_match_document() {
        let state = json!({
            "player": 1,
            "gameScores": [501, 40],
            "winner": -1,
            "throws": [{ "segment": { "number": 20, "multiplier": 1 } }]
        });
        let game = GameState::from_value(&state).unwrap();
        assert_eq!(game.throws.len(), 1);
        assert_eq!(game.player.remaining, 40);
        assert!(!game.player.has_won);
    }

    #[test]
    fn test_game_state_winner() {
        let state = json!({ "player": 0, "gameScores": [0, 301], "winner": 0 });
        let game = GameState::from_value(&state).unwrap();
        assert_eq!(game.player.remaining, 0);
        assert!(game.player.has_won);
    }

    #[test]
    fn test_game_state_players_array() {
        let state = json!({
            "currentPlayer": 0,
            "players": [{ "score": 121, "hasWon": false }]
        });
        let game = GameState::from_value(&state).unwrap();
        assert_eq!(game.player.remaining, 121);
        assert!(game.throws.is_empty());
    }

    #[test]
    fn test_game_state_board_only_document() {
        let state = json!({ "connected": true, "status": "Throw", "throws": [] });
        let game = GameState::from_value(&state).unwrap();
        assert_eq!(game.player, PlayerScoreView::default());
    }

    #[test]
    fn test_game_state_rejects_non_array_throws() {
        let state = json!({ "throws": "T20" });
        assert!(matches!(
            GameState::from_value(&state),
            Err(BridgeError::Payload(_))
        ));
        assert!(GameState::from_value(&json!([1, 2])).is_err());
    }

    #[test]
    fn test_offline_record() {
        let record = TelemetryRecord::offline();
        assert_eq!(record.summary, "M | M | M");
        assert_eq!(record.board_status, BoardStatus::Offline);
        assert_eq!(record.leg_result, LegResult::Offline);
        assert_eq!(record.number_of_throws, 0);
    }

    #[test]
    fn test_enum_wire_names() {
        assert_eq!(serde_json::to_value(LegResult::Win).unwrap(), json!("win"));
        assert_eq!(
            serde_json::to_value(BoardStatus::TakeoutInProgress).unwrap(),
            json!("TakeoutInProgress")
        );
        assert_eq!(LinkStatus::Offline.to_string(), "offline");
    }
}
