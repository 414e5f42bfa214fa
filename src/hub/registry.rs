use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::config::HubConfig;

use super::game_hub::Hub;
use super::errors::HubError;
use super::models::UserId;
use super::repository::GameRepository;
use super::socket::{FrameSink, FrameStream};

/// Active hubs keyed by game pin
#[derive(Clone)]
pub struct HubRegistry {
    hubs: Arc<Mutex<HashMap<String, Hub>>>,
    repository: Arc<dyn GameRepository + Send + Sync>,
    config: HubConfig,
}

impl HubRegistry {
    pub fn new(repository: Arc<dyn GameRepository + Send + Sync>, config: HubConfig) -> Self {
        Self {
            hubs: Arc::new(Mutex::new(HashMap::new())),
            repository,
            config,
        }
    }

    fn hubs(&self) -> MutexGuard<'_, HashMap<String, Hub>> {
        self.hubs.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Starts hosting `pin` for its owner, or returns the hub already hosting it.
    #[instrument(skip(self))]
    pub async fn start_game(&self, pin: &str, user_id: UserId) -> Result<Hub, HubError> {
        let record = timeout(self.config.db_timeout, self.repository.find_game(pin, user_id))
            .await
            .map_err(|_| {
                warn!(game_pin = %pin, "Game lookup timed out");
                HubError::Timeout
            })??
            .ok_or_else(|| HubError::GameNotFound(pin.to_string()))?;

        if let Some(hub) = self.get(pin) {
            debug!(game_pin = %pin, "Game already live");
            return Ok(hub);
        }

        let game = record.into_live_game()?;
        let hub = Hub::start(game, self.config.clone())?;

        let existing = {
            let mut hubs = self.hubs();
            match hubs.get(pin).filter(|h| !h.is_terminated()) {
                Some(existing) => Some(existing.clone()),
                None => {
                    hubs.insert(pin.to_string(), hub.clone());
                    None
                }
            }
        };
        if let Some(existing) = existing {
            // Lost a race with a concurrent start
            let _ = hub.end().await;
            return Ok(existing);
        }
        self.remove_when_terminated(hub.clone());

        info!(game_pin = %pin, user_id, "Game started");
        Ok(hub)
    }

    /// Ends the live game `pin`, closing every connection.
    #[instrument(skip(self))]
    pub async fn end(&self, pin: &str) -> Result<(), HubError> {
        let hub = self
            .hubs()
            .remove(pin)
            .ok_or_else(|| HubError::GameNotFound(pin.to_string()))?;

        info!(game_pin = %pin, "Ending game");
        match hub.end().await {
            // Already shutting down on its own
            Err(HubError::HubClosed) => Ok(()),
            other => other,
        }
    }

    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    /// Live hub for `pin`, if any.
    pub fn get(&self, pin: &str) -> Option<Hub> {
        self.hubs()
            .get(pin)
            .filter(|hub| !hub.is_terminated())
            .cloned()
    }

    pub fn active_games(&self) -> Vec<String> {
        let mut pins: Vec<String> = self.hubs().keys().cloned().collect();
        pins.sort();
        pins
    }

    #[instrument(skip(self, sink, stream))]
    pub async fn join_keeper<S, R>(
        &self,
        pin: &str,
        user_id: UserId,
        sink: S,
        stream: R,
    ) -> Result<Uuid, HubError>
    where
        S: FrameSink + 'static,
        R: FrameStream + 'static,
    {
        let hub = self
            .get(pin)
            .ok_or_else(|| HubError::GameNotFound(pin.to_string()))?;
        hub.join_keeper(user_id, sink, stream).await
    }

    #[instrument(skip(self, sink))]
    pub async fn join_watcher<S>(&self, pin: &str, sink: S) -> Result<Uuid, HubError>
    where
        S: FrameSink + 'static,
    {
        let hub = self
            .get(pin)
            .ok_or_else(|| HubError::GameNotFound(pin.to_string()))?;
        hub.join_watcher(sink).await
    }

    fn remove_when_terminated(&self, hub: Hub) {
        let hubs = self.hubs.clone();
        tokio::spawn(async move {
            let reason = hub.terminated().await;
            let mut hubs = hubs.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            if hubs.get(hub.pin()).map(Hub::id) == Some(hub.id()) {
                hubs.remove(hub.pin());
                debug!(game_pin = %hub.pin(), reason = %reason, "Removed terminated hub");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hub::models::{test_records::record, GameRecord};
    use crate::hub::repository::InMemoryGameRepository;
    use async_trait::async_trait;
    use std::time::Duration;

    fn registry_with(records: Vec<GameRecord>) -> HubRegistry {
        let repository = InMemoryGameRepository::new();
        for record in records {
            repository.insert(record);
        }
        HubRegistry::new(Arc::new(repository), HubConfig::default())
    }

    #[tokio::test]
    async fn unknown_game_is_not_found() {
        let registry = registry_with(vec![]);
        assert_eq!(
            registry.start_game("nope00", 7).await.unwrap_err(),
            HubError::GameNotFound("nope00".to_string())
        );
    }

    #[tokio::test]
    async fn only_the_owner_can_start() {
        let registry = registry_with(vec![record("abc123", 7)]);
        assert!(matches!(
            registry.start_game("abc123", 8).await,
            Err(HubError::GameNotFound(_))
        ));
        assert!(registry.active_games().is_empty());
    }

    #[tokio::test]
    async fn game_without_two_teams_creates_no_hub() {
        let mut game = record("abc123", 7);
        game.home_team_pin = None;
        let registry = registry_with(vec![game]);

        assert_eq!(
            registry.start_game("abc123", 7).await.unwrap_err(),
            HubError::TwoTeamsRequired
        );
        assert!(registry.get("abc123").is_none());
    }

    #[tokio::test]
    async fn starting_a_live_game_returns_the_running_hub() {
        let registry = registry_with(vec![record("abc123", 7)]);
        let first = registry.start_game("abc123", 7).await.unwrap();
        let second = registry.start_game("abc123", 7).await.unwrap();
        assert_eq!(first.id(), second.id());
        assert_eq!(registry.active_games(), vec!["abc123".to_string()]);
    }

    #[tokio::test]
    async fn end_removes_and_terminates() {
        let registry = registry_with(vec![record("abc123", 7)]);
        let hub = registry.start_game("abc123", 7).await.unwrap();

        registry.end("abc123").await.unwrap();
        assert_eq!(hub.terminated().await, "Game ended");
        assert!(registry.get("abc123").is_none());
        assert!(matches!(
            registry.end("abc123").await,
            Err(HubError::GameNotFound(_))
        ));
    }

    struct SlowRepository;

    #[async_trait]
    impl GameRepository for SlowRepository {
        async fn find_game(&self, _pin: &str, _user_id: UserId) -> Result<Option<GameRecord>, HubError> {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok(None)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn slow_lookup_times_out() {
        let registry = HubRegistry::new(Arc::new(SlowRepository), HubConfig::default());
        assert_eq!(
            registry.start_game("abc123", 7).await.unwrap_err(),
            HubError::Timeout
        );
    }
}
