//! Test to verify test infrastructure works correctly

mod common;

use common::builders::{test_config, GameStateBuilder};
use dartbridge::GameState;

#[test]
fn test_infrastructure_setup() {
    // Test that builders produce documents the bridge understands
    let state = GameStateBuilder::new()
        .player(0)
        .scores(&[141])
        .throw(20, 3)
        .throw(19, 3)
        .build();

    let game = GameState::from_value(&state).unwrap();
    assert_eq!(game.throws.len(), 2);
    assert_eq!(game.player.remaining, 141);
    assert!(!game.player.has_won);
}

#[test]
fn test_config_is_valid() {
    test_config().validate().unwrap();
}
