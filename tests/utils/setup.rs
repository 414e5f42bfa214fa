#![allow(dead_code)] // Test utilities may not all be used in every test

use std::sync::Arc;
use std::time::Duration;

use courtside::config::HubConfig;
use courtside::hub::{
    GameRecord, Hub, HubError, HubRegistry, InMemoryGameRepository, MembershipView, UserId,
};
use serde_json::json;

use super::mocks::{mock_connection, MockClient, StalledSink};

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

pub struct TestSetup {
    pub registry: HubRegistry,
    pub hub: Hub,
    pub pin: String,
    pub owner: UserId,
}

pub struct TestSetupBuilder {
    record: GameRecord,
    config: HubConfig,
}

impl TestSetupBuilder {
    pub fn new() -> Self {
        Self {
            record: GameRecord {
                pin: "gm4xq2".to_string(),
                owner_id: 7,
                home_team_pin: Some("hm0001".to_string()),
                away_team_pin: Some("aw0001".to_string()),
                home_player_pins: vec!["A".to_string(), "B".to_string()],
                away_player_pins: vec!["C".to_string()],
                game_type: "target".to_string(),
                period_length: 600,
                period_count: 4,
                score_target: Some(21),
                team_size: 2,
                blueprint: "GamePointsSimple".to_string(),
                keeper_ids: vec![],
            },
            config: HubConfig::default(),
        }
    }

    pub fn with_owner(mut self, owner: UserId) -> Self {
        self.record.owner_id = owner;
        self
    }

    pub fn with_keeper(mut self, user: UserId) -> Self {
        self.record.keeper_ids.push(user);
        self
    }

    pub fn with_blueprint(mut self, blueprint: &str) -> Self {
        self.record.blueprint = blueprint.to_string();
        self
    }

    pub fn with_players(mut self, home: Vec<&str>, away: Vec<&str>) -> Self {
        self.record.home_player_pins = home.into_iter().map(str::to_string).collect();
        self.record.away_player_pins = away.into_iter().map(str::to_string).collect();
        self
    }

    /// A timed game whose clock ticks every `tick` instead of every second
    pub fn timed(mut self, period_length_secs: i32, period_count: i32, tick: Duration) -> Self {
        self.record.game_type = "timed".to_string();
        self.record.period_length = period_length_secs;
        self.record.period_count = period_count;
        self.config.clock_tick = tick;
        self
    }

    pub fn with_watcher_queue(mut self, capacity: usize) -> Self {
        self.config = self.config.with_watcher_queue(capacity);
        self
    }

    pub fn with_config(mut self, config: HubConfig) -> Self {
        self.config = config;
        self
    }

    pub async fn build(self) -> TestSetup {
        let repository = Arc::new(InMemoryGameRepository::new());
        let pin = self.record.pin.clone();
        let owner = self.record.owner_id;
        repository.insert(self.record);

        let registry = HubRegistry::new(repository, self.config);
        let hub = registry
            .start_game(&pin, owner)
            .await
            .expect("game should start");

        TestSetup {
            registry,
            hub,
            pin,
            owner,
        }
    }
}

impl TestSetup {
    /// Connects a watcher and consumes its initial snapshot
    pub async fn connect_watcher(&self) -> MockClient {
        let (sink, _stream, mut client) = mock_connection();
        self.registry
            .join_watcher(&self.pin, sink)
            .await
            .expect("watcher should join");
        client.next_snapshot().await;
        client
    }

    pub async fn connect_stalled_watcher(&self) {
        self.registry
            .join_watcher(&self.pin, StalledSink)
            .await
            .expect("watcher should join");
    }

    pub async fn connect_keeper(&self, user: UserId) -> Result<MockClient, HubError> {
        let (sink, stream, client) = mock_connection();
        self.registry
            .join_keeper(&self.pin, user, sink, stream)
            .await?;
        Ok(client)
    }

    pub async fn membership(&self) -> MembershipView {
        self.hub.membership().await.expect("hub should be running")
    }

    /// Polls until the hub reports the given membership
    pub async fn wait_for_membership(&self, watchers: usize, keepers: &[UserId]) {
        for _ in 0..50 {
            let view = self.membership().await;
            if view.watchers == watchers && view.keepers == keepers {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!(
            "membership never reached {} watchers / {:?} keepers, last {:?}",
            watchers,
            keepers,
            self.membership().await
        );
    }
}

// ============================================================================
// Event builders
// ============================================================================

pub fn add(pin: &str, stat: &str) -> serde_json::Value {
    json!({"type": 0, "player_pin": pin, "stat": stat, "action": 0})
}

pub fn subtract(pin: &str, stat: &str) -> serde_json::Value {
    json!({"type": 0, "player_pin": pin, "stat": stat, "action": 1})
}

pub fn clock(action: u8, value: Option<&str>) -> serde_json::Value {
    match value {
        Some(value) => json!({"type": 1, "action": action, "value": value}),
        None => json!({"type": 1, "action": action}),
    }
}
