//! Test data builders for creating test objects

use dartbridge::config::BridgeConfig;
use serde_json::{json, Value};

/// Builder for board manager state documents
#[derive(Debug, Clone, Default)]
pub struct GameStateBuilder {
    player: usize,
    scores: Vec<i64>,
    throws: Vec<Value>,
    winner: Option<i64>,
}

impl GameStateBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn player(mut self, player: usize) -> Self {
        self.player = player;
        self
    }

    pub fn scores(mut self, scores: &[i64]) -> Self {
        self.scores = scores.to_vec();
        self
    }

    pub fn throw(mut self, number: u8, multiplier: u8) -> Self {
        self.throws
            .push(json!({ "segment": { "number": number, "multiplier": multiplier } }));
        self
    }

    pub fn winner(mut self, winner: i64) -> Self {
        self.winner = Some(winner);
        self
    }

    pub fn build(self) -> Value {
        json!({
            "player": self.player,
            "gameScores": self.scores,
            "winner": self.winner.unwrap_or(-1),
            "throws": self.throws,
        })
    }

    /// The state as an HTTP body
    pub fn body(self) -> String {
        self.build().to_string()
    }
}

/// Configuration with fast timings for tests
pub fn test_config() -> BridgeConfig {
    let mut config = BridgeConfig::sample();
    config.upstream.settle_delay_ms = 0;
    config.upstream.reconnect_delay_secs = 1;
    config.liveness.interval_secs = 1;
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_game_state_builder() {
        let state = GameStateBuilder::new()
            .player(1)
            .scores(&[501, 60])
            .throw(20, 3)
            .build();

        assert_eq!(state["player"], 1);
        assert_eq!(state["gameScores"][1], 60);
        assert_eq!(state["winner"], -1);
        assert_eq!(state["throws"][0]["segment"]["number"], 20);
    }
}
