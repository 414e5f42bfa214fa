//! Test assertion helpers - fluent API for verifying snapshots
#![allow(dead_code)] // Test utilities may not all be used in every test

use courtside::stats::{Side, StatValue, StatlineSnapshot, TeamSnapshot};

// ============================================================================
// Assertion Helpers
// ============================================================================

pub struct SnapshotAssertion<'a> {
    snapshot: &'a StatlineSnapshot,
}

impl<'a> SnapshotAssertion<'a> {
    pub fn of(snapshot: &'a StatlineSnapshot) -> Self {
        Self { snapshot }
    }

    fn side(&self, side: Side) -> &'a TeamSnapshot {
        self.snapshot
            .teams
            .side(side)
            .unwrap_or_else(|| panic!("snapshot has no {} side", side))
    }

    pub fn game_stat(self, name: &str, expected: i64) -> Self {
        assert_eq!(
            self.snapshot.game_stats.get(name),
            Some(&StatValue::Count(expected)),
            "game stat {}",
            name
        );
        self
    }

    pub fn team_stat(self, side: Side, name: &str, expected: i64) -> Self {
        self.team_value(side, name, StatValue::Count(expected))
    }

    /// For text-valued stats such as percentages
    pub fn team_text(self, side: Side, name: &str, expected: &str) -> Self {
        self.team_value(side, name, StatValue::Text(expected.to_string()))
    }

    fn team_value(self, side: Side, name: &str, expected: StatValue) -> Self {
        assert_eq!(
            self.side(side).team_stats.get(name),
            Some(&expected),
            "{} team stat {}",
            side,
            name
        );
        self
    }

    pub fn player_stat(
        self,
        side: Side,
        pin: &str,
        name: &str,
        expected: i64,
    ) -> Self {
        let player = self
            .side(side)
            .player_stats
            .get(pin)
            .unwrap_or_else(|| panic!("no player {} on the {} side", pin, side));
        assert_eq!(
            player.get(name),
            Some(&StatValue::Count(expected)),
            "player {} stat {}",
            pin,
            name
        );
        self
    }
}
